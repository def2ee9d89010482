// src/infra/paths.rs — Config file location and runtime directories
//
// SOVITS_BRIDGE_CONFIG overrides the config file path. Without it the bridge
// looks for config.toml in the working directory.

use std::path::PathBuf;

use crate::infra::config::Config;

/// Config file path
pub fn config_file_path() -> PathBuf {
    match std::env::var_os("SOVITS_BRIDGE_CONFIG") {
        Some(path) => PathBuf::from(path),
        None => PathBuf::from("config.toml"),
    }
}

/// Ensure the reference-audio and output directories exist
pub async fn ensure_dirs(config: &Config) -> anyhow::Result<()> {
    let dirs = [config.paths.ref_audio_dir(), config.paths.output_dir()];

    for dir in &dirs {
        tokio::fs::create_dir_all(dir).await?;
    }

    Ok(())
}
