// src/infra/errors.rs — Error types for the bridge

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    // Backend errors (terminal for the request, never retried)
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(#[source] reqwest::Error),

    #[error("Backend returned HTTP {status}: {body}")]
    Backend { status: u16, body: String },

    // Non-fatal, logged by the orchestrator
    #[error("Model switch ({kind}) failed: {message}")]
    ModelSwitch { kind: String, message: String },

    #[error("Plugin '{name}' failed: {message}")]
    Plugin { name: String, message: String },

    // Infra
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BridgeError {
    /// Body text suitable for reporting back to the caller.
    pub fn detail(&self) -> String {
        match self {
            BridgeError::Backend { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }

    /// True when the backend answered at all (as opposed to a transport failure).
    pub fn is_backend_response(&self) -> bool {
        matches!(self, BridgeError::Backend { .. })
    }
}
