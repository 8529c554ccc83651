use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init(cfg: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.log_level));

    let result = match cfg.log_format.as_str() {
        "json" => fmt().json().with_env_filter(filter).try_init(),
        _ => fmt().with_env_filter(filter).try_init(),
    };
    if let Err(err) = result {
        eprintln!("[WARN] logging already initialised: {err}");
    }
}
