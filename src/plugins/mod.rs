// src/plugins/mod.rs — Hook pipeline: points, registry, executor, built-in plugins

pub mod clean_text;
pub mod executor;
pub mod hooks;
pub mod loader;
pub mod payload;
pub mod registry;
pub mod translate;

pub use executor::HookExecutor;
pub use hooks::{priority, Hook, HookContext, HookPoint};
pub use loader::{Plugin, PluginInit, PluginLoader};
pub use payload::{AudioStream, Payload};
pub use registry::HookRegistry;
