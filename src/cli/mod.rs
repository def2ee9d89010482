// src/cli/mod.rs — CLI definition (clap derive)

use clap::{Parser, Subcommand};

use crate::infra::config::Config;

#[derive(Parser)]
#[command(
    name = "sovits-bridge",
    about = "Request-adapting proxy between chat front-ends and a GPT-SoVITS server",
    version
)]
pub struct Cli {
    /// Port to listen on (overrides [server].port)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind (overrides [server].host)
    #[arg(long)]
    pub host: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<String>,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Run the proxy (default)
    Serve,
    /// List reference voices found in the reference audio directory
    Speakers,
    /// Show loaded plugins and the hooks they registered
    Hooks,
}

impl Cli {
    /// Fold command-line overrides into the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(ref host) = self.host {
            config.server.host = host.clone();
        }
        if self.debug {
            config.debug = true;
        }
    }
}
