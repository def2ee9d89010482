// src/api/types.rs

use serde::{Deserialize, Serialize};

/// Error body for file-mode failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub msg: String,
    pub detail: String,
}

impl ErrorResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            msg: "Error".into(),
            detail: detail.into(),
        }
    }
}

/// Fixed voice categories some front-ends ask for.
pub const SPEAKER_CATEGORIES: [&str; 2] = ["female", "male"];
