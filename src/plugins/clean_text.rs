// src/plugins/clean_text.rs — Strip front-end garbage from text to synthesize
//
// Chat front-ends and character cards leak markup into the spoken text:
// color codes, key/value status lines, affection meters, stat brackets.
// Different cards may need different rules; these cover the common ones.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;

use crate::plugins::hooks::{priority, Hook, HookContext, HookPoint};
use crate::plugins::loader::{Plugin, PluginInit};
use crate::plugins::payload::Payload;
use crate::plugins::registry::HookRegistry;

static GARBAGE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // #RRGGBB, optionally backslash-escaped
        r"\\?#[0-9a-fA-F]{6}",
        // "key"."value".
        r#""[^"]+"\.\s*"[^"]+"\."#,
        // "好感度" ... 。
        r#""好感度".*?。"#,
        // [-3, 10] ... 。
        r"\[-?\d+,\s*\d+\].*?。",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

pub fn clean_garbage_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let cleaned = GARBAGE_PATTERNS
        .iter()
        .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());
    cleaned.replace("\"\"", "").trim().to_string()
}

struct CleanTextHook;

#[async_trait]
impl Hook for CleanTextHook {
    async fn call(&self, payload: Payload, _ctx: &HookContext) -> anyhow::Result<Payload> {
        match payload {
            Payload::Text(text) => Ok(Payload::Text(clean_garbage_text(&text))),
            other => anyhow::bail!("expected a text payload, got {}", other.kind()),
        }
    }
}

pub struct CleanTextPlugin;

impl Plugin for CleanTextPlugin {
    fn name(&self) -> &str {
        "clean_text"
    }

    fn init(&self, registry: &mut HookRegistry, init: &PluginInit<'_>) -> anyhow::Result<()> {
        if !init.config.plugins.clean_text.enabled {
            tracing::info!("clean_text plugin disabled");
            return Ok(());
        }
        registry.register(
            &HookPoint::CleanText,
            "clean_garbage_text",
            priority::HIGH,
            CleanTextHook,
        );
        Ok(())
    }
}
