// src/backend/http.rs — GPT-SoVITS api_v2 over HTTP
//
// GET  /set_gpt_weights?weights_path=...
// GET  /set_sovits_weights?weights_path=...
// POST /tts  (JSON request record; 200 = audio bytes)

use async_trait::async_trait;
use axum::body::Bytes;
use futures::StreamExt;

use super::TtsBackend;
use crate::core::state::ModelKind;
use crate::core::types::TtsRequest;
use crate::infra::config::BackendConfig;
use crate::infra::errors::BridgeError;
use crate::plugins::payload::AudioStream;

/// Inline stream content when the backend cannot be reached at all.
const CONNECTION_ERROR: &[u8] = b"Connection Error";

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    /// Fail the stream instead of yielding error text as audio.
    strict_stream_errors: bool,
}

impl HttpBackend {
    /// `client` should be the proxy-free backend client from `HttpClients`.
    pub fn new(config: &BackendConfig, client: reqwest::Client) -> Self {
        Self {
            base_url: config.base_url().to_string(),
            client,
            strict_stream_errors: config.strict_stream_errors,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tts_url(&self) -> String {
        format!("{}/tts", self.base_url)
    }
}

#[async_trait]
impl TtsBackend for HttpBackend {
    async fn set_weights(&self, kind: ModelKind, weights_path: &str) -> Result<(), BridgeError> {
        let url = format!("{}/{}", self.base_url, kind.endpoint());
        let response = self
            .client
            .get(&url)
            .query(&[("weights_path", weights_path)])
            .send()
            .await
            .map_err(|e| BridgeError::ModelSwitch {
                kind: kind.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(BridgeError::ModelSwitch {
            kind: kind.to_string(),
            message: format!("status={status} body={body}"),
        })
    }

    fn synthesize_stream(&self, request: TtsRequest) -> AudioStream {
        let client = self.client.clone();
        let url = self.tts_url();
        let strict = self.strict_stream_errors;

        let stream = async_stream::stream! {
            let response = match client.post(&url).json(&request).send().await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Failed to reach backend: {e}");
                    if strict {
                        yield Err(BridgeError::BackendUnavailable(e));
                    } else {
                        yield Ok(Bytes::from_static(CONNECTION_ERROR));
                    }
                    return;
                }
            };

            let status = response.status();
            if !status.is_success() {
                let body = response.bytes().await.unwrap_or_default();
                tracing::error!(
                    "Backend error (HTTP {status}): {}",
                    String::from_utf8_lossy(&body)
                );
                if strict {
                    yield Err(BridgeError::Backend {
                        status: status.as_u16(),
                        body: String::from_utf8_lossy(&body).into_owned(),
                    });
                } else {
                    yield Ok(body);
                }
                return;
            }

            let mut chunks = response.bytes_stream();
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(bytes) => yield Ok(bytes),
                    Err(e) => {
                        tracing::error!("Backend stream interrupted: {e}");
                        if strict {
                            yield Err(BridgeError::BackendUnavailable(e));
                        } else {
                            yield Ok(Bytes::from_static(CONNECTION_ERROR));
                        }
                        return;
                    }
                }
            }
        };

        AudioStream::new(stream)
    }

    async fn synthesize(&self, request: &TtsRequest) -> Result<Bytes, BridgeError> {
        let response = self
            .client
            .post(self.tts_url())
            .json(request)
            .send()
            .await
            .map_err(BridgeError::BackendUnavailable)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Backend error (HTTP {status}): {body}");
            return Err(BridgeError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        response
            .bytes()
            .await
            .map_err(BridgeError::BackendUnavailable)
    }
}
