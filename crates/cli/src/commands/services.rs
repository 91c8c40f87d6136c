//! `ragchat services`: list the search services a session would see.

use ragchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let backends = ragchat_providers::build_from_config(&config)?;

    let services = backends.directory.list_services().await?;

    println!("🔎 Search services ({})", backends.directory.name());
    println!("========================\n");

    if services.is_empty() {
        println!("  No services found.");
        if !config.search.discover {
            println!("  Add [[search.services]] entries to config.toml or set search.discover = true.");
        }
        return Ok(());
    }

    println!("  {:<40} SEARCH COLUMN", "NAME");
    for service in &services {
        println!("  {:<40} {}", service.name, service.search_column);
    }
    println!();

    Ok(())
}
