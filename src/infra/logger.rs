// src/infra/logger.rs — Structured logging with tracing

use tracing_subscriber::{fmt, EnvFilter};

/// HTTP plumbing that is chatty at debug level; kept at warn unless
/// `RUST_LOG` asks for it explicitly.
const QUIET_CRATES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "tower_http"];

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(level: &str) -> String {
    let mut directives = vec![level.to_string()];
    directives.extend(QUIET_CRATES.iter().map(|c| format!("{c}=warn")));
    directives.join(",")
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
/// At debug level targets are shown, so hook and backend lines can be told apart.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    fmt()
        .with_env_filter(filter)
        .with_target(level == "debug")
        .compact()
        .init();
}
