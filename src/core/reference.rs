// src/core/reference.rs — Reference audio naming and prompt text lookup
//
// Front-ends send odd reference paths: full client-side paths, Windows
// separators, and doubled extensions such as `alice.wav.mp3`. The file
// name without its extension is the character id.

use std::path::{Path, PathBuf};

use crate::core::types::Speaker;

/// Extensions that, when followed by another extension, get collapsed.
pub const DOUBLED_EXTENSIONS: &[&str] = &["wav", "mp3", "flac", "ogg"];

/// Extensions listed as selectable speakers.
pub const SPEAKER_EXTENSIONS: &[&str] = &["wav", "mp3", "ogg"];

/// Strip directories and collapse `name.wav.mp3` into `name.mp3`.
pub fn normalize_ref_filename(raw: &str) -> String {
    let filename = raw
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(raw);

    let parts: Vec<&str> = filename.split('.').collect();
    let n = parts.len();
    if n >= 3 && DOUBLED_EXTENSIONS.contains(&parts[n - 2]) {
        format!("{}.{}", parts[..n - 2].join("."), parts[n - 1])
    } else {
        filename.to_string()
    }
}

/// Character id: the file name without its last extension.
pub fn character_id(filename: &str) -> String {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
        .to_string()
}

/// `voice/alice.mp3` → `voice/alice.txt`
pub fn sidecar_path(audio_path: &Path) -> PathBuf {
    audio_path.with_extension("txt")
}

/// Prompt text for a reference clip: the trimmed sidecar file when it can be
/// read, otherwise the character id itself.
pub async fn resolve_prompt_text(audio_path: &Path, character: &str) -> String {
    let sidecar = sidecar_path(audio_path);
    if !tokio::fs::try_exists(&sidecar).await.unwrap_or(false) {
        return character.to_string();
    }

    match tokio::fs::read_to_string(&sidecar).await {
        Ok(content) => {
            let text = content.trim().to_string();
            let preview: String = text.chars().take(10).collect();
            tracing::info!("Loaded prompt text for {character}: \"{preview}...\"");
            text
        }
        Err(e) => {
            tracing::warn!(
                "Failed to read prompt text {} for {character}: {e}; using the character name",
                sidecar.display()
            );
            character.to_string()
        }
    }
}

/// Reference clips in `dir`, sorted by name. A missing directory lists nothing.
pub async fn list_speakers(dir: &Path) -> Vec<Speaker> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot list speakers in {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut speakers = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else {
            continue;
        };
        let is_audio = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| SPEAKER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if is_audio {
            speakers.push(Speaker {
                name: character_id(name),
                voice_id: name.to_string(),
            });
        }
    }

    speakers.sort_by(|a, b| a.voice_id.cmp(&b.voice_id));
    speakers
}
