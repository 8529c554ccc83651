use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

pub const DEFAULT_BASE_URL: &str = "https://fantasy.premierleague.com/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
// The proxy path is metered, so lean on the memo much harder there.
const PROXIED_CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

const MIN_TIMEOUT_SECS: u64 = 10;
const MAX_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub proxy_url: Option<String>,
    pub webhook_url: Option<String>,
    pub revalidate_secret: Option<String>,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
    pub health_interval: Duration,
    pub notify_window: Duration,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub log_format: String,
    /// Hosting region reported by the diagnostic probe.
    pub region: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            proxy_url: None,
            webhook_url: None,
            revalidate_secret: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: Duration::from_secs(MIN_TIMEOUT_SECS),
            health_interval: Duration::from_secs(60),
            notify_window: Duration::from_secs(5 * 60),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            region: "local".to_string(),
        }
    }
}

impl Config {
    /// Reads the process environment. Call `load_dotenv` first if `.env` files should apply.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).and_then(non_empty);
        let defaults = Config::default();

        let proxy_url = get("RESIDENTIAL_PROXY_URL");
        if let Some(raw) = proxy_url.as_deref() {
            url::Url::parse(raw).context("RESIDENTIAL_PROXY_URL is not a valid url")?;
        }

        let cache_ttl = get("CACHE_TTL_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(if proxy_url.is_some() {
                PROXIED_CACHE_TTL
            } else {
                DEFAULT_CACHE_TTL
            });

        let request_timeout = Duration::from_secs(
            get("REQUEST_TIMEOUT_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(MIN_TIMEOUT_SECS)
                .clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
        );

        let health_interval = Duration::from_secs(
            get("HEALTH_POLL_SECS")
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(60)
                .max(10),
        );

        let notify_window = get("NOTIFY_RATE_LIMIT_SECS")
            .and_then(|val| val.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.notify_window);

        let bind_addr = match get("BIND_ADDR") {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|err| anyhow!("BIND_ADDR {raw:?} is invalid: {err}"))?,
            None => defaults.bind_addr,
        };

        let log_format = get("LOG_FORMAT")
            .map(|val| val.to_lowercase())
            .filter(|val| val == "json" || val == "pretty")
            .unwrap_or(defaults.log_format);

        Ok(Self {
            base_url: get("FPL_BASE_URL")
                .map(|val| val.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            proxy_url,
            webhook_url: get("DISCORD_WEBHOOK_URL"),
            revalidate_secret: get("REVALIDATE_SECRET"),
            cache_ttl,
            request_timeout,
            health_interval,
            notify_window,
            bind_addr,
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format,
            region: get("REGION")
                .or_else(|| get("AWS_REGION"))
                .unwrap_or(defaults.region),
        })
    }

    pub fn proxy_host(&self) -> Option<String> {
        let raw = self.proxy_url.as_deref()?;
        let parsed = url::Url::parse(raw).ok()?;
        parsed.host_str().map(|h| h.to_string())
    }

    pub fn dataset_url(&self) -> String {
        format!("{}/bootstrap-static/", self.base_url)
    }
}

pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

fn non_empty(val: String) -> Option<String> {
    let trimmed = val.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
        assert_eq!(cfg.request_timeout, Duration::from_secs(10));
        assert!(cfg.webhook_url.is_none());
        assert_eq!(cfg.dataset_url(), format!("{DEFAULT_BASE_URL}/bootstrap-static/"));
    }

    #[test]
    fn proxy_switches_to_long_ttl() {
        let cfg = config_from(&[("RESIDENTIAL_PROXY_URL", "http://user:pw@proxy.example:8000")])
            .unwrap();
        assert_eq!(cfg.cache_ttl, Duration::from_secs(4 * 60 * 60));
        assert_eq!(cfg.proxy_host().as_deref(), Some("proxy.example"));
    }

    #[test]
    fn explicit_ttl_wins_and_timeout_is_clamped() {
        let cfg = config_from(&[
            ("RESIDENTIAL_PROXY_URL", "http://proxy.example:8000"),
            ("CACHE_TTL_SECS", "60"),
            ("REQUEST_TIMEOUT_SECS", "90"),
        ])
        .unwrap();
        assert_eq!(cfg.cache_ttl, Duration::from_secs(60));
        assert_eq!(cfg.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn blank_values_are_ignored() {
        let cfg = config_from(&[("DISCORD_WEBHOOK_URL", "   "), ("CACHE_TTL_SECS", "nope")])
            .unwrap();
        assert!(cfg.webhook_url.is_none());
        assert_eq!(cfg.cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn bad_proxy_url_is_an_error() {
        assert!(config_from(&[("RESIDENTIAL_PROXY_URL", "not a url")]).is_err());
    }
}
