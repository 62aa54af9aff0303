//! `briefly doctor` — Check config, API key, and upstream reachability.

use briefly_config::AppConfig;
use briefly_core::provider::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Briefly Doctor");
    println!("=================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found: {}", config_path.display());
    } else {
        println!("  ⚠️  No config file, using defaults (run `briefly init` to create one)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Config valid (model: {})", config.model);
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  1 issue found. Fix the config and re-run.");
            return Ok(());
        }
    };

    match briefly_providers::build_from_config(&config) {
        Ok(providers) => {
            println!("  ✅ API key configured");
            match providers.completion.health_check().await {
                Ok(true) => println!("  ✅ Model endpoint reachable: {}", config.api_url),
                Ok(false) => {
                    println!("  ❌ Model endpoint rejected the key: {}", config.api_url);
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Model endpoint unreachable: {e}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ {e}");
            issues += 1;
        }
    }

    println!("  ✅ Article reader: {}", config.article.reader_url);

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
