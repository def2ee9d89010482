// src/api/handlers.rs

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::types::{ErrorResponse, SPEAKER_CATEGORIES};
use crate::api::AppState;
use crate::core::reference::list_speakers;
use crate::core::types::{FileDescriptor, Speaker, TtsRequest};
use crate::infra::errors::BridgeError;

/// POST / and POST /tts — Stream synthesized audio back as it arrives.
pub async fn tts_stream(State(state): State<AppState>, Json(request): Json<TtsRequest>) -> Response {
    let content_type = request.content_type();
    let audio = state.orchestrator.stream(request).await;

    (
        [(header::CONTENT_TYPE, content_type)],
        Body::from_stream(audio.into_stream()),
    )
        .into_response()
}

/// POST /srt — Synthesize to a file and return where to fetch it.
pub async fn tts_file(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TtsRequest>,
) -> Result<Json<FileDescriptor>, (StatusCode, Json<ErrorResponse>)> {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("127.0.0.1");
    let base_url = format!("http://{host}");

    state
        .orchestrator
        .synthesize_file(request, &base_url)
        .await
        .map(Json)
        .map_err(|e| {
            let status = match &e {
                BridgeError::Backend { .. } => StatusCode::BAD_REQUEST,
                BridgeError::BackendUnavailable(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            tracing::error!("File synthesis failed: {e}");
            (status, Json(ErrorResponse::new(e.detail())))
        })
}

/// GET /srt/{file} — Serve a generated file from the output directory.
pub async fn get_output_file(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, StatusCode> {
    if file.is_empty() || file.contains(['/', '\\']) || file.contains("..") {
        return Err(StatusCode::BAD_REQUEST);
    }

    let path = state.orchestrator.settings().output_dir.join(&file);
    let data = tokio::fs::read(&path).await.map_err(|e| {
        tracing::debug!("Output file {} not served: {e}", path.display());
        StatusCode::NOT_FOUND
    })?;

    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("srt") => "application/x-subrip",
        _ => "application/octet-stream",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
}

/// GET /speakers — Reference clips available as voices.
pub async fn speakers(State(state): State<AppState>) -> Json<Vec<Speaker>> {
    Json(list_speakers(&state.orchestrator.settings().ref_audio_dir).await)
}

/// GET /speakers_list
pub async fn speakers_list() -> Json<[&'static str; 2]> {
    Json(SPEAKER_CATEGORIES)
}
