// src/core/state.rs — Which weights the backend currently has loaded
//
// Starts as "nothing loaded". Updated only after a successful switch call
// and never rolled back: after a failed switch the next request retries.

use tokio::sync::{Mutex, MutexGuard};

/// The two independently switchable weight sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Gpt,
    Sovits,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt => "gpt",
            Self::Sovits => "sovits",
        }
    }

    /// Backend endpoint that switches this weight set.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Gpt => "set_gpt_weights",
            Self::Sovits => "set_sovits_weights",
        }
    }

    pub fn all() -> [ModelKind; 2] {
        [ModelKind::Gpt, ModelKind::Sovits]
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedModels {
    pub gpt: Option<String>,
    pub sovits: Option<String>,
}

impl LoadedModels {
    pub fn get(&self, kind: ModelKind) -> Option<&str> {
        match kind {
            ModelKind::Gpt => self.gpt.as_deref(),
            ModelKind::Sovits => self.sovits.as_deref(),
        }
    }

    pub fn set(&mut self, kind: ModelKind, path: impl Into<String>) {
        let slot = match kind {
            ModelKind::Gpt => &mut self.gpt,
            ModelKind::Sovits => &mut self.sovits,
        };
        *slot = Some(path.into());
    }

    pub fn is_loaded(&self, kind: ModelKind, path: &str) -> bool {
        self.get(kind) == Some(path)
    }
}

/// Process-wide model state.
///
/// The orchestrator holds the lock across its whole compare-switch-update
/// sequence, so concurrent requests for different characters serialize
/// their switch decisions instead of racing on them.
#[derive(Debug, Default)]
pub struct ModelState {
    inner: Mutex<LoadedModels>,
}

impl ModelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with weights known to be loaded already.
    pub fn with_loaded(loaded: LoadedModels) -> Self {
        Self {
            inner: Mutex::new(loaded),
        }
    }

    pub async fn lock(&self) -> MutexGuard<'_, LoadedModels> {
        self.inner.lock().await
    }

    pub async fn snapshot(&self) -> LoadedModels {
        self.inner.lock().await.clone()
    }
}
