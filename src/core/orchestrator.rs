// src/core/orchestrator.rs — Per-request synthesis pipeline
//
// Received → PathNormalized → PromptResolved → TextCleaned → ModelSynced
//   → RequestTransformed → BackendCalled → {Streaming | FilePersisted}
//
// Nothing here is retried. Hook and model-switch failures degrade to a
// best-effort continuation; only the backend call can end a request.

use std::path::PathBuf;
use std::sync::Arc;

use super::profiles::CharacterProfiles;
use super::reference::{character_id, normalize_ref_filename, resolve_prompt_text};
use super::state::{ModelKind, ModelState};
use super::types::{FileDescriptor, TtsRequest};
use crate::backend::TtsBackend;
use crate::infra::config::Config;
use crate::infra::errors::BridgeError;
use crate::plugins::executor::HookExecutor;
use crate::plugins::hooks::{HookContext, HookPoint, CHARACTER, TARGET_LANG};
use crate::plugins::payload::AudioStream;

/// Fixed name of the file-mode output inside the output directory.
pub const OUTPUT_AUDIO_FILE: &str = "audio.wav";
/// Subtitle file a file-mode caller is told to expect.
pub const OUTPUT_SRT_FILE: &str = "tts-out.srt";

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub ref_audio_dir: PathBuf,
    pub output_dir: PathBuf,
    pub default_lang: String,
}

impl OrchestratorSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            ref_audio_dir: config.paths.ref_audio_dir(),
            output_dir: config.paths.output_dir(),
            default_lang: config.default_lang.clone(),
        }
    }
}

/// A request after path normalization, prompt resolution and text cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub request: TtsRequest,
    pub character: String,
    pub target_lang: String,
}

/// What the model-sync step did for one weight set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// The profile names no weights for this kind.
    NotConfigured,
    /// Already loaded; no call issued.
    Unchanged,
    Switched,
    /// Call failed; state left as it was.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSyncReport {
    pub gpt: SwitchOutcome,
    pub sovits: SwitchOutcome,
}

impl ModelSyncReport {
    fn unconfigured() -> Self {
        Self {
            gpt: SwitchOutcome::NotConfigured,
            sovits: SwitchOutcome::NotConfigured,
        }
    }

    fn slot(&mut self, kind: ModelKind) -> &mut SwitchOutcome {
        match kind {
            ModelKind::Gpt => &mut self.gpt,
            ModelKind::Sovits => &mut self.sovits,
        }
    }

    /// Number of switch calls issued.
    pub fn calls(&self) -> usize {
        [&self.gpt, &self.sovits]
            .into_iter()
            .filter(|o| matches!(o, SwitchOutcome::Switched | SwitchOutcome::Failed(_)))
            .count()
    }
}

pub struct Orchestrator {
    hooks: HookExecutor,
    backend: Arc<dyn TtsBackend>,
    profiles: Arc<CharacterProfiles>,
    models: Arc<ModelState>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        hooks: HookExecutor,
        backend: Arc<dyn TtsBackend>,
        profiles: Arc<CharacterProfiles>,
        models: Arc<ModelState>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            hooks,
            backend,
            profiles,
            models,
            settings,
        }
    }

    pub fn hooks(&self) -> &HookExecutor {
        &self.hooks
    }

    pub fn profiles(&self) -> &CharacterProfiles {
        &self.profiles
    }

    pub fn models(&self) -> &ModelState {
        &self.models
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Normalize the reference path, resolve prompt language and text, and
    /// run the clean-text hooks.
    pub async fn prepare(&self, mut request: TtsRequest) -> PreparedRequest {
        let filename = normalize_ref_filename(&request.ref_audio_path);
        let character = character_id(&filename);
        let audio_path = self.settings.ref_audio_dir.join(&filename);

        let target_lang = self
            .profiles
            .prompt_lang(&character, &self.settings.default_lang)
            .to_string();

        // An empty name would turn the sidecar lookup into `<parent>/<dir>.txt`
        request.prompt_text = if filename.is_empty() {
            character.clone()
        } else {
            resolve_prompt_text(&audio_path, &character).await
        };
        request.ref_audio_path = audio_path.to_string_lossy().into_owned();
        request.prompt_lang = target_lang.clone();

        let ctx = HookContext::new()
            .with(CHARACTER, character.as_str())
            .with(TARGET_LANG, target_lang.as_str());
        let text = std::mem::take(&mut request.text);
        request.text = self.hooks.run_text(&HookPoint::CleanText, text, &ctx).await;

        tracing::debug!(character = %character, "Prepared request: {:?}", request);
        PreparedRequest {
            request,
            character,
            target_lang,
        }
    }

    /// Bring the backend's loaded weights in line with the character's
    /// profile. Never fails: a failed switch is logged and the request
    /// goes ahead with whatever is loaded.
    ///
    /// The state lock is held for the whole compare-switch-update sequence.
    pub async fn sync_models(&self, character: &str) -> ModelSyncReport {
        let mut report = ModelSyncReport::unconfigured();
        let Some(profile) = self.profiles.get(character) else {
            return report;
        };

        let mut loaded = self.models.lock().await;
        for kind in ModelKind::all() {
            let target = match kind {
                ModelKind::Gpt => profile.gpt.as_deref(),
                ModelKind::Sovits => profile.sovits.as_deref(),
            };
            let Some(target) = target.filter(|t| !t.is_empty()) else {
                continue;
            };
            if loaded.is_loaded(kind, target) {
                *report.slot(kind) = SwitchOutcome::Unchanged;
                continue;
            }

            tracing::info!("[{character}] Switching {kind} weights: {}", tail(target));
            *report.slot(kind) = match self.backend.set_weights(kind, target).await {
                Ok(()) => {
                    loaded.set(kind, target);
                    tracing::info!("{kind} weights switched");
                    SwitchOutcome::Switched
                }
                Err(e) => {
                    tracing::error!("{kind} weight switch failed: {e}");
                    SwitchOutcome::Failed(e.to_string())
                }
            };
        }

        report
    }

    /// Streaming mode: returns a lazy audio stream. Backend failures arrive
    /// inside the stream.
    pub async fn stream(&self, request: TtsRequest) -> AudioStream {
        let prepared = self.prepare(request).await;
        self.sync_models(&prepared.character).await;

        let ctx = HookContext::new().with(TARGET_LANG, prepared.target_lang.as_str());
        let request = self
            .hooks
            .run_request(&HookPoint::RequestStreaming, prepared.request, &ctx)
            .await;
        tracing::debug!("Request after hooks: {:?}", request);

        let audio = self.backend.synthesize_stream(request);

        let ctx = HookContext::new()
            .with(CHARACTER, prepared.character.as_str())
            .with(TARGET_LANG, prepared.target_lang.as_str());
        self.hooks
            .run_audio(&HookPoint::ResponseStreaming, audio, &ctx)
            .await
    }

    /// File mode: buffer the whole result into the output directory and
    /// describe where the caller can fetch it. `base_url` is the public
    /// root of this service, without a trailing slash.
    pub async fn synthesize_file(
        &self,
        mut request: TtsRequest,
        base_url: &str,
    ) -> Result<FileDescriptor, BridgeError> {
        request.streaming_mode = false;
        let prepared = self.prepare(request).await;
        self.sync_models(&prepared.character).await;

        let ctx = HookContext::new()
            .with(TARGET_LANG, prepared.target_lang.as_str())
            .with(CHARACTER, prepared.character.as_str());
        let request = self
            .hooks
            .run_request(&HookPoint::RequestFile, prepared.request, &ctx)
            .await;

        let audio = self.backend.synthesize(&request).await?;

        tokio::fs::create_dir_all(&self.settings.output_dir).await?;
        let path = self.settings.output_dir.join(OUTPUT_AUDIO_FILE);
        tokio::fs::write(&path, &audio).await?;
        tracing::info!("Wrote {} bytes to {}", audio.len(), path.display());

        let base_url = base_url.trim_end_matches('/');
        Ok(FileDescriptor {
            code: "200".into(),
            srt: format!("{base_url}/srt/{OUTPUT_SRT_FILE}"),
            audio: format!("{base_url}/srt/{OUTPUT_AUDIO_FILE}"),
        })
    }
}

/// Last 15 characters of a weights file name, for logs.
fn tail(path: &str) -> String {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    let chars: Vec<char> = name.chars().collect();
    chars[chars.len().saturating_sub(15)..].iter().collect()
}
