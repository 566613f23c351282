//! libris application library
//!
//! Hosts the catalog module and the bootstrap shared by the server binary
//! and the command-line tool.
#![recursion_limit = "256"]

pub mod modules;

use anyhow::Context;
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Re-export commonly used types
pub use modules::catalog;

/// Register modules, run their lifecycle, and serve HTTP until Ctrl-C.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings).with_context(|| "failed to register modules")?;

    let ctx = InitCtx { settings };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = libris_http::start_server(&registry, settings).await;

    registry.stop_all().await?;
    served
}
