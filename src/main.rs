// src/main.rs — sovits-bridge entry point

use std::sync::Arc;

use clap::Parser;

use sovits_bridge::api::{self, AppState};
use sovits_bridge::backend::HttpBackend;
use sovits_bridge::cli::{Cli, Commands};
use sovits_bridge::core::orchestrator::{Orchestrator, OrchestratorSettings};
use sovits_bridge::core::profiles::CharacterProfiles;
use sovits_bridge::core::reference::list_speakers;
use sovits_bridge::core::state::ModelState;
use sovits_bridge::infra::config::Config;
use sovits_bridge::infra::http::HttpClients;
use sovits_bridge::infra::{logger, paths};
use sovits_bridge::plugins::{HookExecutor, HookRegistry, PluginInit, PluginLoader};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config (falls back to defaults if no config.toml)
    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    cli.apply_overrides(&mut config);

    // Respects RUST_LOG
    logger::init_logging(config.log_level());

    match cli.command {
        Some(Commands::Speakers) => {
            for speaker in list_speakers(&config.paths.ref_audio_dir()).await {
                println!("{}\t{}", speaker.name, speaker.voice_id);
            }
            return Ok(());
        }
        Some(Commands::Hooks) => {
            let clients = HttpClients::from_config(&config)?;
            let hooks = init_hooks(&config, &clients);
            println!("{}", hooks.registry().status_summary());
            return Ok(());
        }
        Some(Commands::Serve) | None => {}
    }

    paths::ensure_dirs(&config).await?;

    let clients = HttpClients::from_config(&config)?;
    let hooks = init_hooks(&config, &clients);
    tracing::info!("Hooks: {}", hooks.registry().status_summary());

    let profiles = Arc::new(CharacterProfiles::load(&config.paths.models_config()));
    let backend = Arc::new(HttpBackend::new(&config.backend, clients.backend.clone()));
    tracing::info!("Backend: {}", backend.base_url());

    let orchestrator = Orchestrator::new(
        hooks,
        backend,
        profiles,
        Arc::new(ModelState::new()),
        OrchestratorSettings::from_config(&config),
    );

    api::start_server(
        &config.server,
        AppState {
            orchestrator: Arc::new(orchestrator),
        },
    )
    .await
}

/// Run plugin bootstraps into a fresh registry and freeze it.
fn init_hooks(config: &Config, clients: &HttpClients) -> HookExecutor {
    let mut registry = HookRegistry::new(config.hooks.duplicates);
    let loader = PluginLoader::builtin();
    let init = PluginInit { config, clients };

    let report = match config.paths.plugins_dir() {
        Some(dir) => loader.load_from_dir(&dir, &mut registry, &init),
        None => loader.load_all(&mut registry, &init),
    };
    tracing::info!("Plugins: {}", report.summary());

    HookExecutor::new(Arc::new(registry))
}
