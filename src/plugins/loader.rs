// src/plugins/loader.rs — Plugin catalog and descriptor-directory discovery
//
// Plugins are compiled in. A plugin's only job is to register hooks at
// startup. Which ones run is decided either by loading the whole catalog
// or by a directory of descriptors:
//
//   plugins/
//     clean/plugin.toml      implementation = "clean_text"
//     translate/plugin.toml  implementation = "translate"
//                            enabled = false

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::infra::config::Config;
use crate::infra::errors::BridgeError;
use crate::infra::http::HttpClients;
use crate::plugins::clean_text::CleanTextPlugin;
use crate::plugins::registry::HookRegistry;
use crate::plugins::translate::TranslatePlugin;

/// What a plugin may use while registering its hooks.
pub struct PluginInit<'a> {
    pub config: &'a Config,
    pub clients: &'a HttpClients,
}

/// A unit of extension: registers zero or more hooks on the registry.
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn init(&self, registry: &mut HookRegistry, init: &PluginInit<'_>) -> anyhow::Result<()>;
}

/// `plugin.toml` inside a descriptor directory.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginDescriptor {
    /// Catalog name of the implementation to run.
    pub implementation: String,
    #[serde(default)]
    pub enabled: Option<bool>,
}

impl PluginDescriptor {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

/// Outcome of a load pass. Names are catalog names, or directory names
/// when a descriptor could not be resolved.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        format!(
            "{} loaded ({}), {} skipped, {} failed",
            self.loaded.len(),
            self.loaded.join(", "),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

#[derive(Default)]
pub struct PluginLoader {
    catalog: BTreeMap<String, Arc<dyn Plugin>>,
}

impl PluginLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every plugin shipped in this binary.
    pub fn builtin() -> Self {
        Self::new()
            .with_plugin(CleanTextPlugin)
            .with_plugin(TranslatePlugin)
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.catalog
            .insert(plugin.name().to_string(), Arc::new(plugin));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Plugin>> {
        self.catalog.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.catalog.keys().map(String::as_str).collect()
    }

    /// Initialize every catalog plugin, in name order.
    pub fn load_all(&self, registry: &mut HookRegistry, init: &PluginInit<'_>) -> LoadReport {
        let mut report = LoadReport::default();
        for (name, plugin) in &self.catalog {
            init_plugin(name, plugin.as_ref(), registry, init, &mut report);
        }
        report
    }

    /// Initialize the plugins described under `dir`, in directory-name order.
    /// A missing directory loads nothing.
    pub fn load_from_dir(
        &self,
        dir: &Path,
        registry: &mut HookRegistry,
        init: &PluginInit<'_>,
    ) -> LoadReport {
        let mut report = LoadReport::default();

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Plugin directory {} unreadable: {e}", dir.display());
                return report;
            }
        };

        let mut subdirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        subdirs.sort();

        for subdir in subdirs {
            let dir_name = subdir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let descriptor_path = subdir.join("plugin.toml");
            if !descriptor_path.exists() {
                tracing::debug!("Skipping {}: no plugin.toml", subdir.display());
                continue;
            }

            let descriptor = match PluginDescriptor::load(&descriptor_path) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Invalid plugin descriptor {}: {e}", descriptor_path.display());
                    report.failed.push(dir_name);
                    continue;
                }
            };

            if descriptor.enabled == Some(false) {
                tracing::info!("Plugin {dir_name} disabled by descriptor");
                report.skipped.push(descriptor.implementation);
                continue;
            }

            match self.catalog.get(&descriptor.implementation) {
                Some(plugin) => init_plugin(
                    &descriptor.implementation,
                    plugin.as_ref(),
                    registry,
                    init,
                    &mut report,
                ),
                None => {
                    tracing::warn!(
                        "Plugin {dir_name} names unknown implementation '{}' (known: {})",
                        descriptor.implementation,
                        self.names().join(", ")
                    );
                    report.failed.push(dir_name);
                }
            }
        }

        report
    }
}

fn init_plugin(
    name: &str,
    plugin: &dyn Plugin,
    registry: &mut HookRegistry,
    init: &PluginInit<'_>,
    report: &mut LoadReport,
) {
    let before = registry.len();
    let outcome = catch_unwind(AssertUnwindSafe(|| plugin.init(registry, init)));
    match outcome {
        Ok(Ok(())) => {
            tracing::info!(
                "Loaded plugin {name} ({} hooks registered)",
                registry.len() - before
            );
            report.loaded.push(name.to_string());
        }
        Ok(Err(e)) => {
            let err = BridgeError::Plugin {
                name: name.to_string(),
                message: format!("initialization failed: {e}"),
            };
            tracing::warn!("{err}");
            report.failed.push(name.to_string());
        }
        Err(_) => {
            let err = BridgeError::Plugin {
                name: name.to_string(),
                message: "panicked during initialization".into(),
            };
            tracing::error!("{err}");
            report.failed.push(name.to_string());
        }
    }
}
