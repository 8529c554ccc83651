use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::acquisition::{AcquisitionController, PrimaryProbe};
use crate::clock::Clock;
use crate::notify::{DeliveryOutcome, NotificationDispatcher, NotificationLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Down,
}

impl HealthStatus {
    pub fn level(self) -> NotificationLevel {
        match self {
            HealthStatus::Ok => NotificationLevel::Success,
            HealthStatus::Degraded => NotificationLevel::Warning,
            HealthStatus::Down => NotificationLevel::Critical,
        }
    }

    /// Overall service wording used by the health endpoint.
    pub fn overall(self) -> &'static str {
        match self {
            HealthStatus::Ok => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Down => "unhealthy",
        }
    }

    /// Degraded still serves data, so only `Down` is a 503.
    pub fn http_code(self) -> u16 {
        match self {
            HealthStatus::Ok | HealthStatus::Degraded => 200,
            HealthStatus::Down => 503,
        }
    }
}

/// One classified observation of the primary path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub status: HealthStatus,
    /// Milliseconds.
    pub latency: u64,
    pub teams: usize,
    pub players: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub server_blocked: bool,
    #[serde(skip)]
    pub checked_at: Option<SystemTime>,
}

impl ProbeReport {
    pub fn from_probe(probe: &PrimaryProbe) -> Self {
        let latency = probe.latency.as_millis().min(u128::from(u64::MAX)) as u64;
        match &probe.result {
            Ok(boot) => {
                let teams = boot.teams.len();
                let players = boot.elements.len();
                let (status, error) = if boot.completeness().is_complete() {
                    (HealthStatus::Ok, None)
                } else {
                    (
                        HealthStatus::Degraded,
                        Some(format!("Data incomplete: {teams} teams, {players} players")),
                    )
                };
                Self {
                    status,
                    latency,
                    teams,
                    players,
                    error,
                    server_blocked: false,
                    checked_at: None,
                }
            }
            Err(err) => Self {
                status: err.health_status(),
                latency,
                teams: 0,
                players: 0,
                error: Some(err.to_string()),
                server_blocked: err.is_blocked(),
                checked_at: None,
            },
        }
    }

    fn status_text(&self) -> &'static str {
        match (self.status, self.server_blocked) {
            (HealthStatus::Ok, _) => "Connected",
            (HealthStatus::Degraded, true) => "Degraded (403 Blocked)",
            (HealthStatus::Degraded, false) => "Degraded (Incomplete Data)",
            (HealthStatus::Down, _) => "Down",
        }
    }
}

/// What `observe` decided about a report.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthState {
    pub report: ProbeReport,
    /// Status recorded before this observation; `None` on the first poll.
    pub previous: Option<HealthStatus>,
    pub transitioned: bool,
    pub notification: Option<DeliveryOutcome>,
}

impl HealthState {
    pub fn status(&self) -> HealthStatus {
        self.report.status
    }
}

/// Edge-triggered health tracker. Notifies once per status change, never per poll.
pub struct HealthMonitor {
    controller: Arc<AcquisitionController>,
    dispatcher: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
    last_status: Mutex<Option<HealthStatus>>,
    last_state: Mutex<Option<HealthState>>,
    started: Instant,
}

impl HealthMonitor {
    pub fn new(
        controller: Arc<AcquisitionController>,
        dispatcher: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            controller,
            dispatcher,
            clock,
            last_status: Mutex::new(None),
            last_state: Mutex::new(None),
            started: Instant::now(),
        }
    }

    pub fn probe(&self) -> HealthState {
        let probe = self.controller.probe_primary();
        self.observe(ProbeReport::from_probe(&probe))
    }

    pub fn observe(&self, mut report: ProbeReport) -> HealthState {
        report.checked_at = Some(self.clock.now());
        let status = report.status;

        let previous = {
            let mut last = self.last_status.lock();
            let previous = *last;
            if previous != Some(status) {
                *last = Some(status);
            }
            previous
        };
        let transitioned = previous != Some(status);

        // Booting straight into `ok` is not a recovery.
        let notification = match (previous, status) {
            (None, HealthStatus::Ok) => None,
            _ if transitioned => {
                info!(from = ?previous, to = ?status, "health status changed");
                Some(self.dispatcher.notify(
                    status.level(),
                    report.status_text(),
                    report.latency,
                    report.error.as_deref(),
                ))
            }
            _ => None,
        };
        if !transitioned {
            debug!(?status, "health steady");
        }

        let state = HealthState {
            report,
            previous,
            transitioned,
            notification,
        };
        *self.last_state.lock() = Some(state.clone());
        state
    }

    pub fn last_status(&self) -> Option<HealthStatus> {
        *self.last_status.lock()
    }

    pub fn last_state(&self) -> Option<HealthState> {
        self.last_state.lock().clone()
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn notifications_enabled(&self) -> bool {
        self.dispatcher.is_enabled()
    }

    pub fn dispatcher(&self) -> &Arc<NotificationDispatcher> {
        &self.dispatcher
    }
}

const TICK_SLICE: Duration = Duration::from_millis(250);

/// Poll on a fixed interval, independent of request traffic, until `shutdown` is set.
pub fn spawn_health_ticker(
    monitor: Arc<HealthMonitor>,
    interval: Duration,
    shutdown: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        info!(interval_secs = interval.as_secs(), "health ticker started");
        let mut last_probe: Option<Instant> = None;
        while !shutdown.load(Ordering::Relaxed) {
            if last_probe.is_none_or(|at| at.elapsed() >= interval) {
                let state = monitor.probe();
                if state.status() != HealthStatus::Ok {
                    warn!(
                        status = ?state.status(),
                        error = state.report.error.as_deref().unwrap_or(""),
                        "primary path unhealthy"
                    );
                }
                last_probe = Some(Instant::now());
            }
            thread::sleep(TICK_SLICE.min(interval));
        }
        info!("health ticker stopped");
    })
}
