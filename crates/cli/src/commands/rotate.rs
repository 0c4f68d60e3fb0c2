//! `smartpick rotate` — Carousel command for bringing a card to the front.

use smartpick_config::AppConfig;
use smartpick_core::catalog::Catalog;
use smartpick_core::rotation::{Carousel, RotationCommand};

pub fn run(angle: f64, entity: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !angle.is_finite() {
        return Err("angle must be a finite number".into());
    }

    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let catalog = smartpick_gateway::load_catalog(&config.catalog)?;

    match command_for(&catalog, angle, entity) {
        Some(command) => println!("{}", serde_json::to_string_pretty(&command)?),
        None => println!("\"{entity}\" is not on the carousel; holding at {angle}°"),
    }
    Ok(())
}

fn command_for(catalog: &Catalog, angle: f64, entity: &str) -> Option<RotationCommand> {
    let mut carousel = Carousel::from_catalog(catalog);
    carousel.observe(angle);
    carousel.highlight(Some(entity))
}
