// src/infra/http.rs — Shared HTTP clients
//
// Two pools: the backend client never goes through a proxy (a local proxy
// intercepting 127.0.0.1 traffic turns into spurious 502s), while the
// external client keeps the system/env proxy for auxiliary services.

use std::time::Duration;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct HttpClients {
    /// For the TTS backend: proxy disabled, connect + read timeouts.
    pub backend: reqwest::Client,
    /// For external services (translation): proxy honored, short timeout.
    pub external: reqwest::Client,
}

impl HttpClients {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let user_agent = format!("sovits-bridge/{}", env!("CARGO_PKG_VERSION"));

        let backend = reqwest::Client::builder()
            .no_proxy()
            .connect_timeout(Duration::from_secs(config.backend.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.backend.timeout_secs))
            .user_agent(user_agent.clone())
            .build()?;

        let external = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.plugins.translate.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self { backend, external })
    }
}
