// src/core/types.rs — Request/response records for the synthesis pipeline

use serde::{Deserialize, Deserializer, Serialize};

/// A synthesis request as accepted from the front-end and forwarded to the backend.
///
/// Only `ref_audio_path`, `prompt_text`, `prompt_lang`, `text` (and, in
/// file mode, `streaming_mode`) are rewritten by the pipeline. Everything
/// else, including fields this struct does not know about, passes through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub text_lang: String,
    pub ref_audio_path: String,
    #[serde(default)]
    pub aux_ref_audio_paths: Vec<String>,
    #[serde(default)]
    pub prompt_lang: String,
    #[serde(default)]
    pub prompt_text: String,
    #[serde(default = "default_top_k")]
    pub top_k: i64,
    #[serde(default = "default_one")]
    pub top_p: f64,
    #[serde(default = "default_one")]
    pub temperature: f64,
    #[serde(default = "default_split_method")]
    pub text_split_method: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    #[serde(default = "default_batch_threshold")]
    pub batch_threshold: f64,
    #[serde(default = "default_true")]
    pub split_bucket: bool,
    #[serde(default = "default_one")]
    pub speed_factor: f64,
    #[serde(default = "default_fragment_interval")]
    pub fragment_interval: f64,
    #[serde(default = "default_seed")]
    pub seed: i64,
    #[serde(default = "default_media_type")]
    pub media_type: String,
    #[serde(default, deserialize_with = "bool_or_string")]
    pub streaming_mode: bool,
    #[serde(default = "default_true")]
    pub parallel_infer: bool,
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f64,
    #[serde(default = "default_sample_steps")]
    pub sample_steps: i64,
    #[serde(default)]
    pub super_sampling: bool,
    /// Fields unknown to the bridge, forwarded untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TtsRequest {
    /// A request with the given text and reference path and every tuning field at its default.
    pub fn new(
        text: impl Into<String>,
        text_lang: impl Into<String>,
        ref_audio_path: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            text_lang: text_lang.into(),
            ref_audio_path: ref_audio_path.into(),
            aux_ref_audio_paths: Vec::new(),
            prompt_lang: String::new(),
            prompt_text: String::new(),
            top_k: default_top_k(),
            top_p: default_one(),
            temperature: default_one(),
            text_split_method: default_split_method(),
            batch_size: default_batch_size(),
            batch_threshold: default_batch_threshold(),
            split_bucket: true,
            speed_factor: default_one(),
            fragment_interval: default_fragment_interval(),
            seed: default_seed(),
            media_type: default_media_type(),
            streaming_mode: false,
            parallel_infer: true,
            repetition_penalty: default_repetition_penalty(),
            sample_steps: default_sample_steps(),
            super_sampling: false,
            extra: serde_json::Map::new(),
        }
    }

    /// MIME type for the audio this request asks for.
    pub fn content_type(&self) -> &'static str {
        match self.media_type.to_ascii_lowercase().as_str() {
            "ogg" => "audio/ogg",
            "aac" => "audio/aac",
            "mp3" => "audio/mpeg",
            "flac" => "audio/flac",
            _ => "audio/wav",
        }
    }
}

fn default_top_k() -> i64 {
    5
}

fn default_one() -> f64 {
    1.0
}

fn default_split_method() -> String {
    "cut5".into()
}

fn default_batch_size() -> i64 {
    1
}

fn default_batch_threshold() -> f64 {
    0.75
}

fn default_true() -> bool {
    true
}

fn default_fragment_interval() -> f64 {
    0.3
}

fn default_seed() -> i64 {
    -1
}

fn default_media_type() -> String {
    "wav".into()
}

fn default_repetition_penalty() -> f64 {
    1.35
}

fn default_sample_steps() -> i64 {
    32
}

/// Front-ends send `streaming_mode` as either a JSON bool or a "true"/"false" string.
fn bool_or_string<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    Ok(match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => b,
        BoolOrString::Str(s) => s.trim().eq_ignore_ascii_case("true"),
    })
}

/// Returned to the caller after a file-mode synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub code: String,
    pub srt: String,
    pub audio: String,
}

/// A selectable voice, derived from a reference audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Speaker {
    pub name: String,
    pub voice_id: String,
}
