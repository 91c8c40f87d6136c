//! `ragchat doctor`: diagnose configuration and backend health.

use ragchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 RagChat Doctor: System Diagnostics");
    println!("=====================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file, using defaults (run `ragchat onboard`)");
        issues += 1;
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the config before running further checks.");
            return Ok(());
        }
    };

    let needs_account = config.completion.provider == "cortex" || config.search.backend == "cortex";
    if needs_account {
        if config.has_snowflake_credentials() {
            println!("  ✅ Snowflake credentials configured");
        } else {
            println!("  ❌ Missing Snowflake credentials: set SNOWFLAKE_ACCOUNT_URL and SNOWFLAKE_TOKEN");
            issues += 1;
        }
    }

    let backends = match ragchat_providers::build_from_config(&config) {
        Ok(backends) => {
            println!(
                "  ✅ Backends: completion={}, search={}, directory={}",
                backends.completion.name(),
                backends.search.name(),
                backends.directory.name()
            );
            backends
        }
        Err(e) => {
            println!("  ❌ Backends could not be built: {e}");
            println!("\n  ⚠️  {} issue(s) found. See above for details.", issues + 1);
            return Ok(());
        }
    };

    match backends.completion.health_check().await {
        Ok(true) => println!("  ✅ Completion backend reachable"),
        Ok(false) => {
            println!("  ⚠️  Completion backend responded but reported unhealthy");
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Completion backend unreachable: {e}");
            issues += 1;
        }
    }

    match backends.directory.list_services().await {
        Ok(services) if services.is_empty() => {
            println!("  ❌ No search services available, chat input would be disabled");
            issues += 1;
        }
        Ok(services) => println!("  ✅ {} search service(s) available", services.len()),
        Err(e) => {
            println!("  ❌ Service discovery failed: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
