// src/plugins/translate.rs — Translate request text into the reference voice's language
//
// Uses an OpenAI-compatible chat completions endpoint (SiliconFlow by
// default). With no API key configured the hook is a no-op. Failures are
// returned as hook errors, so the executor keeps the untranslated request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::infra::config::TranslateConfig;
use crate::plugins::hooks::{priority, Hook, HookContext, HookPoint};
use crate::plugins::loader::{Plugin, PluginInit};
use crate::plugins::payload::Payload;
use crate::plugins::registry::HookRegistry;

/// Backend language codes mapped to names an LLM understands.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("zh", "Chinese (Simplified)"),
    ("en", "English"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("auto", "the target language suitable for the context"),
];

pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

fn system_prompt(language: &str) -> String {
    format!(
        "You are a professional translator. Translate the user's input text into {language}. \
         Output ONLY the translated text. Do not output any explanation, notes, or punctuation \
         marks that were not in the original tone."
    )
}

pub struct Translator {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl Translator {
    /// `client` should honor the ambient proxy; this talks to an external service.
    pub fn new(client: reqwest::Client, config: &TranslateConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Translate `text` into `target`. `Ok(None)` means translation was
    /// skipped (blank text or an unknown language code).
    pub async fn translate(&self, text: &str, target: &str) -> anyhow::Result<Option<String>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let Some(language) = language_name(target) else {
            tracing::warn!("Unknown target language '{target}', skipping translation");
            return Ok(None);
        };

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt(language)},
                {"role": "user", "content": text},
            ],
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("translation API returned HTTP {status}: {detail}");
        }

        let parsed: serde_json::Value = response.json().await?;
        let translated = parsed["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("translation API response has no message content"))?
            .trim()
            .to_string();

        let before: String = text.chars().take(10).collect();
        let after: String = translated.chars().take(10).collect();
        tracing::info!("Translated [{before}...] -> [{target}] -> [{after}...]");
        Ok(Some(translated))
    }
}

struct TranslateHook {
    translator: Arc<Translator>,
}

#[async_trait]
impl Hook for TranslateHook {
    async fn call(&self, payload: Payload, ctx: &HookContext) -> anyhow::Result<Payload> {
        let mut request = match payload {
            Payload::Request(request) => request,
            other => anyhow::bail!("expected a request payload, got {}", other.kind()),
        };

        if request.text.is_empty() || !self.translator.is_configured() {
            return Ok(Payload::Request(request));
        }

        let target = ctx.target_lang().unwrap_or("zh").to_string();
        if let Some(translated) = self.translator.translate(&request.text, &target).await? {
            request.text = translated;
            // The text is now in the target language
            request.text_lang = target;
        }
        Ok(Payload::Request(request))
    }
}

pub struct TranslatePlugin;

impl Plugin for TranslatePlugin {
    fn name(&self) -> &str {
        "translate"
    }

    fn init(&self, registry: &mut HookRegistry, init: &PluginInit<'_>) -> anyhow::Result<()> {
        let config = &init.config.plugins.translate;
        if !config.enabled {
            tracing::info!("translate plugin disabled");
            return Ok(());
        }
        if config.api_key.is_empty() {
            tracing::info!("translate plugin has no API key; requests pass through untranslated");
        }

        let translator = Arc::new(Translator::new(init.clients.external.clone(), config));
        for point in [HookPoint::RequestStreaming, HookPoint::RequestFile] {
            registry.register(
                &point,
                "translate_text",
                priority::HIGH,
                TranslateHook {
                    translator: Arc::clone(&translator),
                },
            );
        }
        Ok(())
    }
}
