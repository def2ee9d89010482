// tests/pipeline_test.rs — Integration test: full pipeline against a fake GPT-SoVITS server

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, Request, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use tower::ServiceExt;

use sovits_bridge::api::{build_router, AppState};
use sovits_bridge::backend::HttpBackend;
use sovits_bridge::core::orchestrator::{Orchestrator, OrchestratorSettings};
use sovits_bridge::core::profiles::{CharacterProfile, CharacterProfiles};
use sovits_bridge::core::state::ModelState;
use sovits_bridge::core::types::TtsRequest;
use sovits_bridge::infra::config::{BackendConfig, Config};
use sovits_bridge::infra::http::HttpClients;
use sovits_bridge::plugins::{HookExecutor, HookRegistry, PluginInit, PluginLoader};

/// What the fake backend saw.
#[derive(Default)]
struct Seen {
    switches: Vec<String>,
    requests: Vec<serde_json::Value>,
}

type Shared = Arc<Mutex<Seen>>;

async fn set_gpt(State(seen): State<Shared>, Query(q): Query<HashMap<String, String>>) -> &'static str {
    seen.lock().unwrap().switches.push(format!("gpt:{}", q["weights_path"]));
    "success"
}

async fn set_sovits(
    State(seen): State<Shared>,
    Query(q): Query<HashMap<String, String>>,
) -> (StatusCode, &'static str) {
    let path = q["weights_path"].clone();
    seen.lock().unwrap().switches.push(format!("sovits:{path}"));
    if path.contains("broken") {
        (StatusCode::BAD_REQUEST, "no such weights")
    } else {
        (StatusCode::OK, "success")
    }
}

async fn tts(State(seen): State<Shared>, Json(body): Json<serde_json::Value>) -> axum::response::Response {
    use axum::response::IntoResponse;

    let text = body["text"].as_str().unwrap_or_default().to_string();
    seen.lock().unwrap().requests.push(body);
    if text == "fail" {
        return (StatusCode::BAD_REQUEST, "{\"message\":\"tts failed\"}").into_response();
    }
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
        Ok(Bytes::from_static(b"RIFF")),
        Ok(Bytes::from_static(b"-chunk-")),
        Ok(Bytes::from(text.into_bytes())),
    ];
    Body::from_stream(futures::stream::iter(chunks)).into_response()
}

async fn spawn_fake_backend() -> (String, Shared) {
    let seen = Shared::default();
    let app = Router::new()
        .route("/set_gpt_weights", get(set_gpt))
        .route("/set_sovits_weights", get(set_sovits))
        .route("/tts", post(tts))
        .with_state(seen.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

struct Harness {
    app: Router,
    seen: Shared,
    dir: tempfile::TempDir,
}

async fn harness() -> Harness {
    let (url, seen) = spawn_fake_backend().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("voice")).unwrap();
    std::fs::write(dir.path().join("voice/alice.txt"), "アリスです。").unwrap();

    let mut config = Config::default();
    config.paths.base_dir = Some(dir.path().to_path_buf());
    config.backend = BackendConfig {
        url,
        ..BackendConfig::default()
    };
    config.plugins.translate.api_key = String::new();

    let clients = HttpClients::from_config(&config).unwrap();
    let mut registry = HookRegistry::new(config.hooks.duplicates);
    PluginLoader::builtin().load_all(
        &mut registry,
        &PluginInit {
            config: &config,
            clients: &clients,
        },
    );

    let mut profiles = HashMap::new();
    profiles.insert(
        "alice".to_string(),
        CharacterProfile {
            gpt: Some("/w/alice.ckpt".into()),
            sovits: Some("/w/alice.pth".into()),
            prompt_lang: Some("ja".into()),
        },
    );
    profiles.insert(
        "bob".to_string(),
        CharacterProfile {
            gpt: Some("/w/bob.ckpt".into()),
            sovits: Some("/w/broken.pth".into()),
            prompt_lang: None,
        },
    );

    let orchestrator = Orchestrator::new(
        HookExecutor::new(Arc::new(registry)),
        Arc::new(HttpBackend::new(&config.backend, clients.backend.clone())),
        Arc::new(CharacterProfiles::new(profiles)),
        Arc::new(ModelState::new()),
        OrchestratorSettings::from_config(&config),
    );

    Harness {
        app: build_router(AppState {
            orchestrator: Arc::new(orchestrator),
        }),
        seen,
        dir,
    }
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::HOST, "127.0.0.1:9881")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_body(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_streaming_request_end_to_end() {
    let h = harness().await;

    let resp = h
        .app
        .clone()
        .oneshot(post_json(
            "/tts",
            serde_json::json!({
                "text": "#FF0000こんにちは",
                "text_lang": "ja",
                "ref_audio_path": "C:\\SillyTavern\\voices\\alice.wav.mp3",
                "streaming_mode": "true",
                "my_custom_field": 7
            }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "audio/wav");
    assert_eq!(
        String::from_utf8(read_body(resp).await).unwrap(),
        "RIFF-chunk-こんにちは"
    );

    let seen = h.seen.lock().unwrap();
    assert_eq!(seen.switches, vec!["gpt:/w/alice.ckpt", "sovits:/w/alice.pth"]);
    let sent = &seen.requests[0];
    assert_eq!(sent["text"], "こんにちは");
    assert_eq!(sent["prompt_text"], "アリスです。");
    assert_eq!(sent["prompt_lang"], "ja");
    assert_eq!(sent["streaming_mode"], true);
    assert_eq!(sent["my_custom_field"], 7);
    assert!(sent["ref_audio_path"].as_str().unwrap().ends_with("alice.mp3"));
}

#[tokio::test]
async fn test_second_request_skips_model_switch() {
    let h = harness().await;
    let body = serde_json::json!({"text": "hi", "text_lang": "ja", "ref_audio_path": "alice.wav"});

    for _ in 0..2 {
        let resp = h.app.clone().oneshot(post_json("/", body.clone())).await.unwrap();
        read_body(resp).await;
    }

    let seen = h.seen.lock().unwrap();
    assert_eq!(seen.switches.len(), 2);
    assert_eq!(seen.requests.len(), 2);
}

#[tokio::test]
async fn test_failed_switch_is_retried_and_request_proceeds() {
    let h = harness().await;
    let body = serde_json::json!({"text": "hi", "text_lang": "zh", "ref_audio_path": "bob.wav"});

    for _ in 0..2 {
        let resp = h.app.clone().oneshot(post_json("/tts", body.clone())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        read_body(resp).await;
    }

    let seen = h.seen.lock().unwrap();
    assert_eq!(
        seen.switches,
        vec!["gpt:/w/bob.ckpt", "sovits:/w/broken.pth", "sovits:/w/broken.pth"]
    );
    assert_eq!(seen.requests[0]["prompt_lang"], "zh");
    assert_eq!(seen.requests[0]["prompt_text"], "bob");
}

#[tokio::test]
async fn test_backend_error_body_streams_inline() {
    let h = harness().await;
    let resp = h
        .app
        .clone()
        .oneshot(post_json(
            "/tts",
            serde_json::json!({"text": "fail", "text_lang": "zh", "ref_audio_path": "carol.wav"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(read_body(resp).await, b"{\"message\":\"tts failed\"}");
}

#[tokio::test]
async fn test_file_mode_writes_and_serves_audio() {
    let h = harness().await;
    let resp = h
        .app
        .clone()
        .oneshot(post_json(
            "/srt",
            serde_json::json!({
                "text": "hello",
                "text_lang": "en",
                "ref_audio_path": "alice.wav",
                "streaming_mode": true
            }),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let descriptor: serde_json::Value = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(
        descriptor,
        serde_json::json!({
            "code": "200",
            "srt": "http://127.0.0.1:9881/srt/tts-out.srt",
            "audio": "http://127.0.0.1:9881/srt/audio.wav"
        })
    );
    assert_eq!(h.seen.lock().unwrap().requests[0]["streaming_mode"], false);

    let written = std::fs::read(h.dir.path().join("output/audio.wav")).unwrap();
    assert_eq!(written, b"RIFF-chunk-hello");

    let resp = h
        .app
        .clone()
        .oneshot(Request::get("/srt/audio.wav").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(read_body(resp).await, b"RIFF-chunk-hello");
}

#[tokio::test]
async fn test_file_mode_backend_error_is_400() {
    let h = harness().await;
    let resp = h
        .app
        .clone()
        .oneshot(post_json(
            "/srt",
            serde_json::json!({"text": "fail", "text_lang": "zh", "ref_audio_path": "alice.wav"}),
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = serde_json::from_slice(&read_body(resp).await).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"msg": "Error", "detail": "{\"message\":\"tts failed\"}"})
    );
    assert!(!h.dir.path().join("output/audio.wav").exists());
}

#[tokio::test]
async fn test_direct_orchestrator_stream_is_lazy() {
    // Building the stream does not call the backend yet
    let dir = tempfile::tempdir().unwrap();
    let (url, seen) = spawn_fake_backend().await;
    let config = BackendConfig {
        url,
        ..BackendConfig::default()
    };
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let orchestrator = Orchestrator::new(
        HookExecutor::empty(),
        Arc::new(HttpBackend::new(&config, client)),
        Arc::new(CharacterProfiles::default()),
        Arc::new(ModelState::new()),
        OrchestratorSettings {
            ref_audio_dir: dir.path().join("voice"),
            output_dir: dir.path().join("output"),
            default_lang: "zh".into(),
        },
    );

    let audio = orchestrator
        .stream(TtsRequest::new("later", "zh", "alice.wav"))
        .await;
    assert!(seen.lock().unwrap().requests.is_empty());

    let chunks = audio.collect_chunks().await;
    let joined: Vec<u8> = chunks
        .into_iter()
        .flat_map(|c| c.unwrap().to_vec())
        .collect();
    assert_eq!(joined, b"RIFF-chunk-later");
    assert_eq!(seen.lock().unwrap().requests.len(), 1);
}
