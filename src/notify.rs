use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::acquisition::ConnectionMode;
use crate::clock::{Clock, elapsed_between, rfc3339};
use crate::error::FetchError;
use crate::http_client::http_client;

const USERNAME: &str = "Axiom Monitor";
const AVATAR_URL: &str = "https://fplaxiom.com/favicon.ico";
const FOOTER: &str = "FPL Axiom Health Monitor";
// Role pinged on critical alerts (mobile push).
const ALERT_ROLE_ID: &str = "1465768895183978789";
const MAX_ERROR_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Warning,
    Critical,
}

impl NotificationLevel {
    pub fn color(self) -> u32 {
        match self {
            NotificationLevel::Success => 5_763_719,
            NotificationLevel::Warning => 16_753_920,
            NotificationLevel::Critical => 15_158_332,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            NotificationLevel::Success => "🟢",
            NotificationLevel::Warning => "🟡",
            NotificationLevel::Critical => "🔴",
        }
    }

    /// Connection tier this level implies.
    pub fn mode(self) -> ConnectionMode {
        match self {
            NotificationLevel::Success => ConnectionMode::Server,
            NotificationLevel::Warning => ConnectionMode::ClientFallback,
            NotificationLevel::Critical => ConnectionMode::Disconnected,
        }
    }

    fn description(self) -> &'static str {
        match self {
            NotificationLevel::Success => "FPL API connection restored. Server proxy is operational.",
            NotificationLevel::Warning => {
                "Server proxy blocked (403). Client-side fallback is active. Data is still accessible."
            }
            NotificationLevel::Critical => {
                "Both server and client connections failed. Data is unavailable."
            }
        }
    }

    fn content(self) -> Option<String> {
        match self {
            NotificationLevel::Critical => Some(format!(
                "🔴 **CRITICAL SYSTEM ALERT** <@&{ALERT_ROLE_ID}>"
            )),
            NotificationLevel::Warning => Some("⚠️ **SYSTEM WARNING**".to_string()),
            NotificationLevel::Success => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub username: String,
    pub avatar_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

fn field(name: &str, value: String, inline: bool) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value,
        inline,
    }
}

pub fn build_payload(
    level: NotificationLevel,
    status: &str,
    latency_ms: u64,
    error: Option<&str>,
    timestamp: String,
) -> WebhookPayload {
    let latency = if latency_ms > 0 {
        format!("{latency_ms}ms")
    } else {
        "N/A".to_string()
    };
    let mut fields = vec![
        field("📊 Status", status.to_string(), true),
        field("⏱️ Latency", latency, true),
        field("🔧 Mode", level.mode().describe().to_string(), true),
    ];
    if let Some(err) = error.filter(|e| !e.is_empty()) {
        let clipped: String = err.chars().take(MAX_ERROR_CHARS).collect();
        fields.push(field("⚠️ Error Details", format!("```{clipped}```"), false));
    }

    WebhookPayload {
        username: USERNAME.to_string(),
        avatar_url: AVATAR_URL.to_string(),
        content: level.content(),
        embeds: vec![Embed {
            title: format!("{} Axiom Connection Status", level.emoji()),
            description: level.description().to_string(),
            color: level.color(),
            fields,
            footer: EmbedFooter {
                text: FOOTER.to_string(),
            },
            timestamp,
        }],
    }
}

/// Outbound POST of a webhook body.
pub trait WebhookTransport: Send + Sync {
    fn post(&self, url: &str, payload: &WebhookPayload) -> Result<(), FetchError>;
}

pub struct ReqwestWebhook;

impl WebhookTransport for ReqwestWebhook {
    fn post(&self, url: &str, payload: &WebhookPayload) -> Result<(), FetchError> {
        let client = http_client().map_err(|err| FetchError::Network(err.to_string()))?;
        let resp = client
            .post(url)
            .json(payload)
            .send()
            .map_err(|err| FetchError::from_reqwest(&err))?;
        if !resp.status().is_success() {
            return Err(FetchError::Http {
                status: resp.status().as_u16(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,
    /// Same level already sent inside the window.
    RateLimited,
    /// No webhook configured.
    Disabled,
    Failed,
}

impl DeliveryOutcome {
    pub fn delivered(self) -> bool {
        matches!(self, DeliveryOutcome::Delivered)
    }
}

/// Formats alerts and rate-limits them per level.
///
/// The `(level, sent_at)` pair is read, released, and written back only after a successful send.
/// Two transitions racing through the check at the same instant can therefore both go out; one
/// extra alert is tolerated rather than holding the lock across network I/O.
pub struct NotificationDispatcher {
    webhook_url: Option<String>,
    transport: Arc<dyn WebhookTransport>,
    clock: Arc<dyn Clock>,
    window: Duration,
    last_sent: Mutex<Option<(NotificationLevel, SystemTime)>>,
    disabled_logged: AtomicBool,
}

impl NotificationDispatcher {
    pub fn new(
        webhook_url: Option<String>,
        transport: Arc<dyn WebhookTransport>,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> Self {
        Self {
            webhook_url,
            transport,
            clock,
            window,
            last_sent: Mutex::new(None),
            disabled_logged: AtomicBool::new(false),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Never fails: every problem is logged and reported as an outcome.
    pub fn notify(
        &self,
        level: NotificationLevel,
        status: &str,
        latency_ms: u64,
        error: Option<&str>,
    ) -> DeliveryOutcome {
        let Some(url) = self.webhook_url.as_deref() else {
            if !self.disabled_logged.swap(true, Ordering::Relaxed) {
                warn!("DISCORD_WEBHOOK_URL not configured, notifications disabled");
            }
            return DeliveryOutcome::Disabled;
        };

        let now = self.clock.now();
        if let Some((last_level, sent_at)) = *self.last_sent.lock() {
            let since = elapsed_between(sent_at, now);
            if last_level == level && since < self.window {
                info!(
                    level = ?level,
                    seconds_ago = since.as_secs(),
                    "notification rate limited"
                );
                return DeliveryOutcome::RateLimited;
            }
        }

        let payload = build_payload(level, status, latency_ms, error, rfc3339(now));
        match self.transport.post(url, &payload) {
            Ok(()) => {
                *self.last_sent.lock() = Some((level, now));
                info!(level = ?level, status, "notification sent");
                DeliveryOutcome::Delivered
            }
            Err(err) => {
                error!(level = ?level, error = %err, "webhook delivery failed");
                DeliveryOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_payload_pings_role_and_clips_error() {
        let long = "x".repeat(500);
        let payload = build_payload(
            NotificationLevel::Critical,
            "Down",
            0,
            Some(&long),
            "2025-01-01T00:00:00+00:00".to_string(),
        );
        assert!(payload.content.as_deref().unwrap().contains(ALERT_ROLE_ID));
        let embed = &payload.embeds[0];
        assert_eq!(embed.color, 15_158_332);
        assert_eq!(embed.fields[1].value, "N/A");
        assert_eq!(embed.fields[2].value, "Disconnected");
        let details = &embed.fields[3];
        assert!(!details.inline);
        assert_eq!(details.value.len(), MAX_ERROR_CHARS + 6);
    }

    #[test]
    fn success_payload_has_no_content() {
        let payload = build_payload(
            NotificationLevel::Success,
            "Connected",
            120,
            None,
            String::new(),
        );
        assert!(payload.content.is_none());
        assert_eq!(payload.embeds[0].fields.len(), 3);
        assert_eq!(payload.embeds[0].fields[1].value, "120ms");
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("content").is_none());
    }
}
