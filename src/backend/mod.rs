// src/backend/mod.rs — TTS backend layer

pub mod http;

use async_trait::async_trait;
use axum::body::Bytes;

use crate::core::state::ModelKind;
use crate::core::types::TtsRequest;
use crate::infra::errors::BridgeError;
use crate::plugins::payload::AudioStream;

pub use http::HttpBackend;

/// The synthesis backend as the orchestrator sees it.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Switch the active GPT or SoVITS weights.
    async fn set_weights(&self, kind: ModelKind, weights_path: &str) -> Result<(), BridgeError>;

    /// Streaming synthesis. Lazy: nothing is sent until the stream is polled.
    /// Backend failures surface inside the stream, never as a separate error.
    fn synthesize_stream(&self, request: TtsRequest) -> AudioStream;

    /// Buffered synthesis for file mode.
    async fn synthesize(&self, request: &TtsRequest) -> Result<Bytes, BridgeError>;
}
