//! `smartpick resolve` — Match free text to a catalog card.

use smartpick_config::AppConfig;
use smartpick_core::catalog::Catalog;

pub fn run(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let catalog = smartpick_gateway::load_catalog(&config.catalog)?;

    println!("{}", describe(&catalog, name));
    Ok(())
}

fn describe(catalog: &Catalog, name: &str) -> String {
    match catalog.resolve(name).and_then(|id| catalog.get(id)) {
        Some(entry) => format!("{}  {} ({})", entry.id, entry.name, entry.company),
        None => format!("No card matches \"{name}\""),
    }
}
