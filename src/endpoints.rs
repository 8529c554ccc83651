//! Request handlers as plain functions over `AppContext`. They block on upstream I/O, so the
//! server runs them off the async runtime.

use serde_json::{Value, json};

use crate::app::AppContext;
use crate::clock::{elapsed_between, rfc3339};
use crate::notify::NotificationLevel;
use crate::player_luck::{FEED_LIMIT, luck_for_all, relevant_players};
use crate::team_analysis::analyze_all;

pub const CACHE_CONTROL: &str = "no-store, max-age=0";
const TEST_WEBHOOK_STATUS: &str = "Test - Webhook Connected";
const TEST_WEBHOOK_LATENCY_MS: u64 = 42;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiReply {
    pub status: u16,
    pub body: Value,
}

impl ApiReply {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

fn now(ctx: &AppContext) -> String {
    rfc3339(ctx.clock.now())
}

/// Live probe of the primary path. Runs through the monitor, so a status change here notifies
/// exactly like a scheduled poll would.
pub fn healthz(ctx: &AppContext) -> ApiReply {
    let state = ctx.monitor.probe();
    let status = state.status();
    ApiReply::with_status(
        status.http_code(),
        json!({
            "status": status.overall(),
            "timestamp": now(ctx),
            "version": env!("CARGO_PKG_VERSION"),
            "fpl": state.report,
            "mode": ctx.controller.mode(),
            "uptime": ctx.monitor.uptime().as_secs_f64(),
            "notificationsEnabled": ctx.monitor.notifications_enabled(),
        }),
    )
}

pub fn revalidate(ctx: &AppContext, path: Option<&str>, secret: Option<&str>) -> ApiReply {
    if let Some(expected) = ctx.config.revalidate_secret.as_deref() {
        if secret != Some(expected) {
            return ApiReply::with_status(401, json!({ "error": "Invalid secret" }));
        }
    }

    let path = path.filter(|p| !p.is_empty()).unwrap_or("/");
    let cleared = ctx.controller.invalidate();
    ApiReply::ok(json!({
        "revalidated": true,
        "path": path,
        "cleared": cleared,
        "timestamp": now(ctx),
        "message": format!("Cache cleared for {path}"),
    }))
}

pub fn proxy_status(ctx: &AppContext) -> ApiReply {
    ApiReply::ok(json!({
        "proxyConfigured": ctx.config.proxy_url.is_some(),
        "proxyHost": ctx.config.proxy_host(),
        "region": ctx.config.region,
        "timestamp": now(ctx),
    }))
}

pub fn test_webhook(ctx: &AppContext) -> ApiReply {
    if !ctx.dispatcher.is_enabled() {
        return ApiReply::with_status(
            400,
            json!({
                "success": false,
                "error": "DISCORD_WEBHOOK_URL not configured in environment",
            }),
        );
    }

    let outcome = ctx.dispatcher.notify(
        NotificationLevel::Success,
        TEST_WEBHOOK_STATUS,
        TEST_WEBHOOK_LATENCY_MS,
        None,
    );
    let sent = outcome.delivered();
    ApiReply::ok(json!({
        "success": sent,
        "message": if sent {
            "Test notification sent to Discord!"
        } else {
            "Failed to send notification - check webhook URL"
        },
        "timestamp": now(ctx),
    }))
}

pub fn deep_diagnostic(ctx: &AppContext) -> ApiReply {
    let report = ctx.diagnostic.run();
    ApiReply::ok(json!(report))
}

/// Current dataset with every team and player classified.
pub fn fpl_snapshot(ctx: &AppContext) -> ApiReply {
    match ctx.controller.fetch() {
        Ok(acquired) => {
            let age = elapsed_between(acquired.fetched_at, ctx.clock.now());
            ApiReply::ok(json!({
                "mode": acquired.mode,
                "strategy": acquired.strategy,
                "stale": acquired.stale,
                "ageSeconds": age.as_secs(),
                "fetchedAt": rfc3339(acquired.fetched_at),
                "gameweek": acquired.data.gameweek,
                "completeness": acquired.data.completeness,
                "warning": acquired.error.as_ref().map(|e| e.to_string()),
                "teams": analyze_all(&acquired.data.teams),
                "players": luck_for_all(&relevant_players(&acquired.data.players, FEED_LIMIT)),
            }))
        }
        Err(err) => ApiReply::with_status(
            503,
            json!({
                "error": err.to_string(),
                "mode": ctx.controller.mode(),
            }),
        ),
    }
}
