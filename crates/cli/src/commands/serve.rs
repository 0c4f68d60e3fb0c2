//! `smartpick serve` — Start the HTTP gateway.

use smartpick_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("💳 SmartPick Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Agent:     {}", config.agent.base_url);
    println!("   UI origin: {}", config.gateway.allowed_origin);

    smartpick_gateway::start(config).await?;

    Ok(())
}
