//! `ragchat models`: list the models a turn may select.

use ragchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("🧠 Supported models (backend: {})", config.completion.provider);
    println!("==========================\n");

    for model in &config.models {
        let marker = if *model == config.chat.default_model { "*" } else { " " };
        println!("  {marker} {model}");
    }
    println!("\n  * default (override with --model or RAGCHAT_MODEL)");

    Ok(())
}
