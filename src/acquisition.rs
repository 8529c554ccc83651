use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::clock::{Clock, system_time_to_millis};
use crate::config::Config;
use crate::error::{AcquisitionError, FetchError};
use crate::fpl_payload::{Bootstrap, dataset_from_bootstrap, parse_bootstrap_json};
use crate::http_client::{BROWSER_HEADERS, MINIMAL_HEADERS, Route, Transport, UpstreamRequest};
use crate::state::FplDataset;
use crate::stats_cache::{CacheEntry, TtlCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionMode {
    Server,
    ClientFallback,
    Disconnected,
}

impl ConnectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionMode::Server => "SERVER",
            ConnectionMode::ClientFallback => "CLIENT_FALLBACK",
            ConnectionMode::Disconnected => "DISCONNECTED",
        }
    }

    /// Human label used in alerts.
    pub fn describe(self) -> &'static str {
        match self {
            ConnectionMode::Server => "Server Proxy",
            ConnectionMode::ClientFallback => "Client Fallback",
            ConnectionMode::Disconnected => "Disconnected",
        }
    }
}

/// One tier of the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Cached dataset still inside its TTL; no network.
    FreshCache,
    /// Proxied request with the browser header set.
    Primary,
    /// Whatever the cache holds, however old.
    StaleCache,
    /// Alternate path: no proxy, minimal headers.
    Direct,
}

pub const DEFAULT_CHAIN: &[Strategy] = &[
    Strategy::FreshCache,
    Strategy::Primary,
    Strategy::StaleCache,
    Strategy::Direct,
];

#[derive(Debug, Clone)]
pub struct Acquired {
    pub data: Arc<FplDataset>,
    pub mode: ConnectionMode,
    pub strategy: Strategy,
    pub fetched_at: SystemTime,
    pub stale: bool,
    /// Failure that pushed us down the chain, if any.
    pub error: Option<FetchError>,
}

enum StrategyOutcome {
    Served {
        data: Arc<FplDataset>,
        mode: ConnectionMode,
        fetched_at: SystemTime,
        stale: bool,
    },
    Skipped,
    Failed(FetchError),
}

/// Result of hitting the primary path on its own, used by the health probe.
#[derive(Debug, Clone)]
pub struct PrimaryProbe {
    pub latency: Duration,
    pub result: Result<Bootstrap, FetchError>,
}

pub struct AcquisitionController {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    cache: TtlCache<Arc<FplDataset>>,
    mode: RwLock<ConnectionMode>,
    chain: Vec<Strategy>,
    dataset_url: String,
    timeout: Duration,
}

impl AcquisitionController {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        dataset_url: impl Into<String>,
        cache_ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            cache: TtlCache::new(cache_ttl, clock.clone()),
            clock,
            mode: RwLock::new(ConnectionMode::Server),
            chain: DEFAULT_CHAIN.to_vec(),
            dataset_url: dataset_url.into(),
            timeout,
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn Transport>, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            transport,
            clock,
            cfg.dataset_url(),
            cfg.cache_ttl,
            cfg.request_timeout,
        )
    }

    pub fn with_chain(mut self, chain: Vec<Strategy>) -> Self {
        self.chain = chain;
        self
    }

    pub fn chain(&self) -> &[Strategy] {
        &self.chain
    }

    /// Walk the chain and stop at the first strategy that serves data.
    pub fn fetch(&self) -> Result<Acquired, AcquisitionError> {
        self.run(&self.chain)
    }

    /// Same chain minus the fresh-cache shortcut.
    pub fn refresh(&self) -> Result<Acquired, AcquisitionError> {
        let chain: Vec<Strategy> = self
            .chain
            .iter()
            .copied()
            .filter(|s| *s != Strategy::FreshCache)
            .collect();
        self.run(&chain)
    }

    pub fn mode(&self) -> ConnectionMode {
        *self.mode.read()
    }

    pub fn has_proxy(&self) -> bool {
        self.transport.has_proxy()
    }

    pub fn dataset_url(&self) -> &str {
        &self.dataset_url
    }

    pub fn cached(&self) -> Option<CacheEntry<Arc<FplDataset>>> {
        self.cache.entry()
    }

    pub fn cache_is_stale(&self) -> bool {
        self.cache.is_stale()
    }

    /// Drop the memo so the next `fetch` goes to the network.
    pub fn invalidate(&self) -> bool {
        let cleared = self.cache.clear();
        info!(cleared, "dataset cache invalidated");
        cleared
    }

    /// Primary path in isolation. Touches neither the cache nor the mode.
    pub fn probe_primary(&self) -> PrimaryProbe {
        let started = Instant::now();
        let result = self
            .send(Route::Proxied, BROWSER_HEADERS)
            .and_then(|body| parse_bootstrap_json(&body));
        PrimaryProbe {
            latency: started.elapsed(),
            result,
        }
    }

    fn run(&self, chain: &[Strategy]) -> Result<Acquired, AcquisitionError> {
        let mut last_error: Option<FetchError> = None;

        for &strategy in chain {
            match self.attempt(strategy, last_error.is_some()) {
                StrategyOutcome::Served {
                    data,
                    mode,
                    fetched_at,
                    stale,
                } => {
                    if strategy != Strategy::FreshCache && strategy != Strategy::StaleCache {
                        self.cache.put(data.clone());
                    }
                    self.set_mode(mode);
                    debug!(?strategy, ?mode, stale, "dataset acquired");
                    return Ok(Acquired {
                        data,
                        mode,
                        strategy,
                        fetched_at,
                        stale,
                        error: last_error,
                    });
                }
                StrategyOutcome::Skipped => {}
                StrategyOutcome::Failed(err) => {
                    warn!(?strategy, error = %err, "acquisition strategy failed");
                    last_error = Some(err);
                }
            }
        }

        self.set_mode(ConnectionMode::Disconnected);
        let source = last_error.unwrap_or_else(|| {
            FetchError::Network("no acquisition strategy produced data".to_string())
        });
        Err(AcquisitionError::Disconnected { source })
    }

    fn attempt(&self, strategy: Strategy, after_failure: bool) -> StrategyOutcome {
        match strategy {
            Strategy::FreshCache => match self.cache.get_fresh() {
                Some(entry) => StrategyOutcome::Served {
                    data: entry.payload,
                    mode: ConnectionMode::Server,
                    fetched_at: entry.fetched_at,
                    stale: false,
                },
                None => StrategyOutcome::Skipped,
            },
            Strategy::StaleCache => match self.cache.entry() {
                Some(entry) => {
                    let stale = self.cache.is_stale();
                    let mode = if after_failure {
                        ConnectionMode::ClientFallback
                    } else {
                        ConnectionMode::Server
                    };
                    StrategyOutcome::Served {
                        data: entry.payload,
                        mode,
                        fetched_at: entry.fetched_at,
                        stale,
                    }
                }
                None => StrategyOutcome::Skipped,
            },
            Strategy::Primary => self.live(Route::Proxied, BROWSER_HEADERS),
            Strategy::Direct => self.live(Route::Direct, MINIMAL_HEADERS),
        }
    }

    fn live(&self, route: Route, headers: &[(&str, &str)]) -> StrategyOutcome {
        let parsed = self
            .send(route, headers)
            .and_then(|body| parse_bootstrap_json(&body));
        match parsed {
            Ok(boot) => StrategyOutcome::Served {
                data: Arc::new(dataset_from_bootstrap(&boot)),
                mode: ConnectionMode::Server,
                fetched_at: self.clock.now(),
                stale: false,
            },
            Err(err) => StrategyOutcome::Failed(err),
        }
    }

    fn send(&self, route: Route, headers: &[(&str, &str)]) -> Result<String, FetchError> {
        let request = UpstreamRequest::get(self.busted_url(), route, self.timeout).with_headers(headers);
        let resp = self.transport.send(&request)?;
        if !resp.is_success() {
            return Err(FetchError::Http {
                status: resp.status,
            });
        }
        Ok(resp.body)
    }

    // The upstream CDN happily serves hours-old copies without this.
    fn busted_url(&self) -> String {
        let sep = if self.dataset_url.contains('?') { '&' } else { '?' };
        let millis = system_time_to_millis(self.clock.now()).unwrap_or_default();
        format!("{}{sep}_cb={millis}", self.dataset_url)
    }

    fn set_mode(&self, mode: ConnectionMode) {
        let previous = std::mem::replace(&mut *self.mode.write(), mode);
        if previous != mode {
            info!(from = previous.as_str(), to = mode.as_str(), "connection mode changed");
        }
    }
}
