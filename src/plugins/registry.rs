// src/plugins/registry.rs — Per-point ordered hook registrations

use std::collections::HashMap;
use std::sync::Arc;

use crate::infra::config::DuplicatePolicy;
use crate::plugins::hooks::{sync_hook, Hook, HookContext, HookPoint};
use crate::plugins::payload::Payload;

/// One registered hook: (priority, identifier, callable).
#[derive(Clone)]
pub struct Registration {
    pub priority: i32,
    pub name: String,
    hook: Arc<dyn Hook>,
}

impl Registration {
    pub fn hook(&self) -> &Arc<dyn Hook> {
        &self.hook
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("priority", &self.priority)
            .field("name", &self.name)
            .finish()
    }
}

/// Stores, per hook point, registrations sorted by ascending priority.
/// Ties keep insertion order.
#[derive(Debug, Default)]
pub struct HookRegistry {
    chains: HashMap<String, Vec<Registration>>,
    duplicates: DuplicatePolicy,
}

impl HookRegistry {
    pub fn new(duplicates: DuplicatePolicy) -> Self {
        Self {
            chains: HashMap::new(),
            duplicates,
        }
    }

    /// Register a hook. Returns false when the duplicate policy dropped it.
    pub fn register(
        &mut self,
        point: &HookPoint,
        name: impl Into<String>,
        priority: i32,
        hook: impl Hook + 'static,
    ) -> bool {
        self.register_arc(point, name, priority, Arc::new(hook))
    }

    /// Register a synchronous callable.
    pub fn register_fn<F>(
        &mut self,
        point: &HookPoint,
        name: impl Into<String>,
        priority: i32,
        f: F,
    ) -> bool
    where
        F: Fn(Payload, &HookContext) -> anyhow::Result<Payload> + Send + Sync + 'static,
    {
        self.register(point, name, priority, sync_hook(f))
    }

    pub fn register_arc(
        &mut self,
        point: &HookPoint,
        name: impl Into<String>,
        priority: i32,
        hook: Arc<dyn Hook>,
    ) -> bool {
        let name = name.into();
        let chain = self.chains.entry(point.as_str().to_string()).or_default();

        if chain.iter().any(|r| r.name == name) {
            match self.duplicates {
                DuplicatePolicy::Allow => {
                    tracing::warn!(
                        hook = %name,
                        point = %point,
                        "Hook registered more than once; every copy will run"
                    );
                }
                DuplicatePolicy::Skip => {
                    tracing::warn!(
                        hook = %name,
                        point = %point,
                        "Ignoring duplicate hook registration"
                    );
                    return false;
                }
            }
        }

        tracing::debug!(hook = %name, point = %point, priority, "Registered hook");
        chain.push(Registration {
            priority,
            name,
            hook,
        });
        // sort_by_key is stable: equal priorities keep insertion order
        chain.sort_by_key(|r| r.priority);
        true
    }

    /// Ordered registrations for a point; empty when nothing is registered.
    pub fn registrations(&self, point: &HookPoint) -> &[Registration] {
        self.chains
            .get(point.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Names of points with at least one registration, sorted.
    pub fn points(&self) -> Vec<&str> {
        let mut points: Vec<&str> = self
            .chains
            .iter()
            .filter(|(_, chain)| !chain.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        points.sort_unstable();
        points
    }

    /// Total number of registrations across all points.
    pub fn len(&self) -> usize {
        self.chains.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short human summary for startup logs.
    pub fn status_summary(&self) -> String {
        if self.is_empty() {
            return "No hooks registered".into();
        }
        self.points()
            .into_iter()
            .map(|point| {
                let names: Vec<&str> = self
                    .registrations(&HookPoint::from_name(point))
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect();
                format!("{point}: [{}]", names.join(", "))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
