//! `ragchat onboard`: first-time setup.

use ragchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("📚 RagChat: First-Time Setup");
    println!("============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set SNOWFLAKE_ACCOUNT_URL and SNOWFLAKE_TOKEN");
    println!("      (or point [completion] at an OpenAI-compatible endpoint)");
    println!("   2. Add [[search.services]] entries, or set search.discover = true");
    println!("      with search.database and search.schema");
    println!("   3. Run: ragchat doctor");
    println!("   4. Run: ragchat chat\n");

    Ok(())
}
