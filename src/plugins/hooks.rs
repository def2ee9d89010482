// src/plugins/hooks.rs — Hook points, the Hook trait and per-run context
//
// A hook point names a stage in the request pipeline where plugins can
// observe or rewrite the payload. Points are identified by their string
// name; the four built-in ones are the ones the orchestrator fires.

use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;

use crate::plugins::payload::Payload;

/// Priority presets. Lower runs earlier.
pub mod priority {
    pub const VERY_HIGH: i32 = 5;
    pub const HIGH: i32 = 10;
    pub const NORMAL: i32 = 50;
    pub const LOW: i32 = 80;
    pub const VERY_LOW: i32 = 90;
}

/// Named extension points in the synthesis pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HookPoint {
    /// Text payload, before the model switch.
    CleanText,
    /// Request payload, streaming mode, before the backend call.
    RequestStreaming,
    /// Request payload, file mode, before the backend call.
    RequestFile,
    /// Audio payload, streaming mode, before the caller sees it.
    ResponseStreaming,
    /// Any other name. Never fired by the orchestrator.
    Custom(String),
}

impl HookPoint {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CleanText => "on_clean_text",
            Self::RequestStreaming => "on_tts_request_streaming",
            Self::RequestFile => "on_srt_request_streaming",
            Self::ResponseStreaming => "on_tts_response_streaming",
            Self::Custom(name) => name,
        }
    }

    /// Resolve a point by name; unknown names become `Custom`.
    pub fn from_name(name: &str) -> Self {
        Self::builtin()
            .into_iter()
            .find(|p| p.as_str() == name)
            .unwrap_or_else(|| Self::Custom(name.to_string()))
    }

    /// The points the orchestrator fires.
    pub fn builtin() -> [HookPoint; 4] {
        [
            HookPoint::CleanText,
            HookPoint::RequestStreaming,
            HookPoint::RequestFile,
            HookPoint::ResponseStreaming,
        ]
    }
}

impl std::fmt::Display for HookPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const CHARACTER: &str = "character_name";
pub const TARGET_LANG: &str = "target_lang";

/// Auxiliary values handed to every hook of one run.
///
/// The orchestrator decides what goes in; hooks only read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HookContext {
    values: BTreeMap<String, serde_json::Value>,
}

impl HookContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(|v| v.as_str())
    }

    pub fn character(&self) -> Option<&str> {
        self.get_str(CHARACTER)
    }

    pub fn target_lang(&self) -> Option<&str> {
        self.get_str(TARGET_LANG)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// A transform stage. Receives the current payload, returns the next one.
///
/// Returning an error discards the stage's effect; the executor continues
/// with the payload as it was before this hook ran.
#[async_trait]
pub trait Hook: Send + Sync {
    async fn call(&self, payload: Payload, ctx: &HookContext) -> anyhow::Result<Payload>;
}

/// Adapter for synchronous callables.
pub struct FnHook<F>(F);

#[async_trait]
impl<F> Hook for FnHook<F>
where
    F: Fn(Payload, &HookContext) -> anyhow::Result<Payload> + Send + Sync,
{
    async fn call(&self, payload: Payload, ctx: &HookContext) -> anyhow::Result<Payload> {
        (self.0)(payload, ctx)
    }
}

pub fn sync_hook<F>(f: F) -> FnHook<F>
where
    F: Fn(Payload, &HookContext) -> anyhow::Result<Payload> + Send + Sync,
{
    FnHook(f)
}

/// Adapter for async closures. The closure gets its own copy of the context.
pub struct AsyncFnHook<F>(F);

#[async_trait]
impl<F, Fut> Hook for AsyncFnHook<F>
where
    F: Fn(Payload, HookContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Payload>> + Send,
{
    async fn call(&self, payload: Payload, ctx: &HookContext) -> anyhow::Result<Payload> {
        (self.0)(payload, ctx.clone()).await
    }
}

pub fn async_hook<F, Fut>(f: F) -> AsyncFnHook<F>
where
    F: Fn(Payload, HookContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Payload>> + Send,
{
    AsyncFnHook(f)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_point_as_str() {
        assert_eq!(HookPoint::CleanText.as_str(), "on_clean_text");
        assert_eq!(
            HookPoint::RequestStreaming.as_str(),
            "on_tts_request_streaming"
        );
        assert_eq!(HookPoint::RequestFile.as_str(), "on_srt_request_streaming");
        assert_eq!(
            HookPoint::ResponseStreaming.as_str(),
            "on_tts_response_streaming"
        );
    }

    #[test]
    fn test_hook_point_from_name() {
        assert_eq!(HookPoint::from_name("on_clean_text"), HookPoint::CleanText);
        assert_eq!(
            HookPoint::from_name("on_something_else"),
            HookPoint::Custom("on_something_else".into())
        );
        for point in HookPoint::builtin() {
            assert_eq!(HookPoint::from_name(point.as_str()), point);
        }
    }

    #[test]
    fn test_hook_point_display() {
        assert_eq!(format!("{}", HookPoint::RequestFile), "on_srt_request_streaming");
        assert_eq!(format!("{}", HookPoint::Custom("x".into())), "x");
    }

    #[test]
    fn test_priorities_ordered() {
        assert!(priority::VERY_HIGH < priority::HIGH);
        assert!(priority::HIGH < priority::NORMAL);
        assert!(priority::NORMAL < priority::LOW);
        assert!(priority::LOW < priority::VERY_LOW);
    }

    #[test]
    fn test_context_accessors() {
        let ctx = HookContext::new()
            .with(CHARACTER, "alice")
            .with(TARGET_LANG, "ja")
            .with("attempt", 2);
        assert_eq!(ctx.character(), Some("alice"));
        assert_eq!(ctx.target_lang(), Some("ja"));
        assert_eq!(ctx.get("attempt"), Some(&serde_json::json!(2)));
        assert_eq!(ctx.get_str("attempt"), None);
        assert_eq!(
            ctx.keys().collect::<Vec<_>>(),
            vec!["attempt", CHARACTER, TARGET_LANG]
        );
    }

    #[tokio::test]
    async fn test_sync_and_async_adapters() {
        let upper = sync_hook(|p: Payload, _ctx: &HookContext| match p {
            Payload::Text(t) => Ok(Payload::Text(t.to_uppercase())),
            other => Ok(other),
        });
        let suffix = async_hook(|p: Payload, ctx: HookContext| async move {
            match p {
                Payload::Text(t) => Ok(Payload::Text(format!(
                    "{t}@{}",
                    ctx.target_lang().unwrap_or("?")
                ))),
                other => Ok(other),
            }
        });

        let ctx = HookContext::new().with(TARGET_LANG, "en");
        let out = upper.call(Payload::Text("hi".into()), &ctx).await.unwrap();
        let out = suffix.call(out, &ctx).await.unwrap();
        assert_eq!(out.into_text().as_deref(), Some("HI@en"));
    }
}
