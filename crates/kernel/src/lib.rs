//! Kernel for libris: layered settings, the `Module` lifecycle trait, and
//! the registry that drives modules through it.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
pub use settings::Settings;
