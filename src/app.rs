use std::sync::Arc;

use anyhow::{Context, Result};

use crate::acquisition::AcquisitionController;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::diagnostic::DiagnosticProbe;
use crate::health::HealthMonitor;
use crate::http_client::{ReqwestTransport, Transport};
use crate::notify::{NotificationDispatcher, ReqwestWebhook, WebhookTransport};

/// Everything a running process shares, built once and handed around by `Arc`.
pub struct AppContext {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub controller: Arc<AcquisitionController>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub monitor: Arc<HealthMonitor>,
    pub diagnostic: Arc<DiagnosticProbe>,
}

impl AppContext {
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(config.proxy_url.as_deref(), config.request_timeout)
            .context("failed to build upstream transport")?;
        Ok(Self::with_parts(
            config,
            Arc::new(transport),
            Arc::new(ReqwestWebhook),
            Arc::new(SystemClock),
        ))
    }

    /// Wire the components around injected I/O and time.
    pub fn with_parts(
        config: Config,
        transport: Arc<dyn Transport>,
        webhook: Arc<dyn WebhookTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let controller = Arc::new(AcquisitionController::from_config(
            &config,
            transport.clone(),
            clock.clone(),
        ));
        let dispatcher = Arc::new(NotificationDispatcher::new(
            config.webhook_url.clone(),
            webhook,
            clock.clone(),
            config.notify_window,
        ));
        let monitor = Arc::new(HealthMonitor::new(
            controller.clone(),
            dispatcher.clone(),
            clock.clone(),
        ));
        let diagnostic = Arc::new(DiagnosticProbe::new(
            transport,
            clock.clone(),
            config.dataset_url(),
            config.region.clone(),
            config.request_timeout,
        ));

        Self {
            config,
            clock,
            controller,
            dispatcher,
            monitor,
            diagnostic,
        }
    }
}
