#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use fpl_axiom::acquisition::AcquisitionController;
use fpl_axiom::clock::ManualClock;
use fpl_axiom::demo_data;
use fpl_axiom::error::FetchError;
use fpl_axiom::http_client::{Transport, UpstreamRequest, UpstreamResponse};
use fpl_axiom::notify::{NotificationDispatcher, WebhookPayload, WebhookTransport};

pub const DATASET_URL: &str = "https://upstream.test/api/bootstrap-static/";
pub const TTL: Duration = Duration::from_secs(300);
pub const WINDOW: Duration = Duration::from_secs(300);

pub fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

pub type Reply = Result<UpstreamResponse, FetchError>;

pub fn respond(status: u16, body: &str) -> Reply {
    Ok(UpstreamResponse {
        status,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: body.to_string(),
        latency: Duration::from_millis(120),
    })
}

pub fn complete() -> Reply {
    respond(200, &demo_data::synthetic_bootstrap_json(1))
}

pub fn partial() -> Reply {
    respond(200, &read_fixture("bootstrap_partial.json"))
}

pub fn blocked() -> Reply {
    respond(403, "<html><title>Access denied</title></html>")
}

/// Replays queued replies in order; an empty queue is a network failure.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<UpstreamRequest>>,
    proxy: bool,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into()),
            ..Self::default()
        })
    }

    pub fn push(&self, reply: Reply) {
        self.script.lock().push_back(reply);
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        self.calls.lock().push(request.clone());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Network("connection refused".to_string())))
    }

    fn has_proxy(&self) -> bool {
        self.proxy
    }
}

#[derive(Default)]
pub struct RecordingWebhook {
    sent: Mutex<Vec<WebhookPayload>>,
    failing: AtomicBool,
}

impl RecordingWebhook {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<WebhookPayload> {
        self.sent.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().len()
    }
}

impl WebhookTransport for RecordingWebhook {
    fn post(&self, _url: &str, payload: &WebhookPayload) -> Result<(), FetchError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Http { status: 500 });
        }
        self.sent.lock().push(payload.clone());
        Ok(())
    }
}

pub fn controller(transport: Arc<ScriptedTransport>, clock: Arc<ManualClock>) -> AcquisitionController {
    AcquisitionController::new(transport, clock, DATASET_URL, TTL, Duration::from_secs(10))
}

pub fn dispatcher(webhook: Arc<RecordingWebhook>, clock: Arc<ManualClock>) -> NotificationDispatcher {
    NotificationDispatcher::new(
        Some("https://discord.test/webhook".to_string()),
        webhook,
        clock,
        WINDOW,
    )
}
