//! `briefly serve` — Start the HTTP gateway and web UI.

use briefly_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    if !config.has_api_key() {
        return Err("No API key found. Set OPEN_AI_KEY or run `briefly init` and edit config.toml.".into());
    }

    println!("📰 Briefly");
    println!("   Listening: http://{}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {}", config.model);

    briefly_gateway::start(config).await?;

    Ok(())
}
