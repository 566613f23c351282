pub mod catalog;

use std::sync::Arc;

use libris_kernel::{settings::Settings, ModuleRegistry};
use tokio::sync::Mutex;

/// Register all application modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, settings: &Settings) -> anyhow::Result<()> {
    let catalog = Arc::new(Mutex::new(catalog::open_catalog(settings)?));
    registry.register(catalog::create_module(catalog))?;
    Ok(())
}
