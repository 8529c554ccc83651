use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::clock::{Clock, rfc3339};
use crate::http_client::{Route, Transport, UpstreamRequest, UpstreamResponse};

pub const IP_CHECK_URL: &str = "https://api.ipify.org?format=json";
const IDENTITY_TIMEOUT: Duration = Duration::from_secs(5);
const SNIPPET_CHARS: usize = 1000;

/// One header profile fired at the dataset URL.
#[derive(Debug, Clone, Copy)]
pub struct Leg {
    pub name: &'static str,
    pub headers: &'static [(&'static str, &'static str)],
}

pub const LEGS: [Leg; 3] = [
    Leg {
        name: "no_headers",
        headers: &[],
    },
    Leg {
        name: "minimalist",
        headers: &[("User-Agent", "FPL-App/1.0")],
    },
    Leg {
        name: "impersonator",
        headers: &[
            (
                "User-Agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            ),
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
            ("Accept-Language", "en-US,en;q=0.5"),
            ("Sec-Fetch-Dest", "document"),
            ("Sec-Fetch-Mode", "navigate"),
            ("Sec-Fetch-Site", "same-origin"),
            ("Referer", "https://fantasy.premierleague.com/"),
        ],
    },
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: u16,
    /// Milliseconds.
    pub latency: u64,
    pub blocked_by: Option<String>,
    pub cf_ray: Option<String>,
    pub server: Option<String>,
    pub content_type: Option<String>,
    pub body_snippet: String,
    pub html_title: Option<String>,
    pub is_json: bool,
    pub data_preview: Option<String>,
}

impl TestResult {
    pub fn from_response(resp: &UpstreamResponse) -> Self {
        let body = resp.body.as_str();
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let cf_ray = resp.header("cf-ray").map(str::to_string);
        let server = resp.header("server").map(str::to_string);

        let (blocked_by, data_preview) = match resp.status {
            200 => {
                let preview = parsed.as_ref().map(|data| {
                    let count = |key: &str| data.get(key).and_then(Value::as_array).map_or(0, Vec::len);
                    format!("Teams: {}, Players: {}", count("teams"), count("elements"))
                });
                (None, preview)
            }
            403 => (
                Some(detect_blocker(body, server.as_deref(), cf_ray.is_some()).to_string()),
                None,
            ),
            other => (Some(format!("HTTP {other}")), None),
        };

        Self {
            status: resp.status,
            latency: millis(resp.latency),
            blocked_by,
            cf_ray,
            server,
            content_type: resp.header("content-type").map(str::to_string),
            body_snippet: body.chars().take(SNIPPET_CHARS).collect(),
            html_title: html_title(body),
            is_json: parsed.is_some(),
            data_preview,
        }
    }

    /// Network-level failure: status 0 and the error text as the blocker.
    pub fn failed(latency: Duration, error: String) -> Self {
        Self {
            latency: millis(latency),
            blocked_by: Some(error),
            ..Self::default()
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

/// Name the thing that produced a 403, from its body and headers.
pub fn detect_blocker(body: &str, server: Option<&str>, has_cf_ray: bool) -> &'static str {
    let body = body.to_lowercase();
    let server = server.unwrap_or("").to_lowercase();
    let has = |needle: &str| body.contains(needle);

    if server.contains("cloudflare") || has_cf_ray {
        if has("challenge") || has("turnstile") {
            return "Cloudflare JS Challenge";
        }
        if has("captcha") || has("hcaptcha") {
            return "Cloudflare CAPTCHA";
        }
        if has("access denied") || has("blocked") {
            return "Cloudflare WAF Block";
        }
        if has("rate limit") || has("too many") {
            return "Cloudflare Rate Limit";
        }
        return "Cloudflare (Generic 403)";
    }
    if has("access denied") || has("forbidden") {
        return "Origin Server Block";
    }
    if has("bot") || has("automated") {
        return "Bot Detection";
    }
    "Unknown (check body_snippet)"
}

pub fn html_title(body: &str) -> Option<String> {
    // ASCII lowercasing keeps byte offsets aligned with `body`.
    let lower = body.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let start = open + lower[open..].find('>')? + 1;
    let end = start + lower[start..].find("</title")?;
    let title = body[start..end].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    AllPassed,
    HeaderBlock,
    CloudflareChallenge,
    CloudflareWaf,
    CompleteBlock,
    PartialAccess,
}

impl Verdict {
    pub fn headline(self) -> &'static str {
        match self {
            Verdict::AllPassed => {
                "✅ ALL TESTS PASSED - FPL API is fully accessible from this server"
            }
            Verdict::HeaderBlock => {
                "🟡 HEADER-BASED BLOCK - Requests without browser headers are rejected"
            }
            Verdict::CloudflareChallenge => {
                "🔴 CLOUDFLARE CHALLENGE - JavaScript execution or CAPTCHA required"
            }
            Verdict::CloudflareWaf => "🔴 CLOUDFLARE WAF BLOCK - Server IP/ASN is blacklisted",
            Verdict::CompleteBlock => "🔴 COMPLETE BLOCK - All server-side requests are rejected",
            Verdict::PartialAccess => "🟡 PARTIAL ACCESS - Some request types blocked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tests {
    pub no_headers: TestResult,
    pub minimalist: TestResult,
    pub impersonator: TestResult,
}

pub fn analyze(tests: &Tests, outgoing_ip: &str) -> (Verdict, Vec<String>) {
    let Tests {
        no_headers,
        minimalist,
        impersonator,
    } = tests;
    let strs = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    if [no_headers, minimalist, impersonator]
        .iter()
        .all(|t| t.status == 200)
    {
        return (
            Verdict::AllPassed,
            strs(&["Server-side fetching should work without issues"]),
        );
    }

    if impersonator.status == 200 && (no_headers.status == 403 || minimalist.status == 403) {
        return (
            Verdict::HeaderBlock,
            strs(&[
                "Always include full browser headers in server-side requests",
                "Current implementation should work with proper headers",
            ]),
        );
    }

    if [no_headers, minimalist, impersonator]
        .iter()
        .all(|t| t.status == 403)
    {
        let blocker = impersonator.blocked_by.as_deref().unwrap_or("Unknown");
        if blocker.contains("Cloudflare") {
            let recommendations = vec![
                format!("IP {outgoing_ip} is blocked at Cloudflare level"),
                "Use client-side fetching as fallback (browser IPs not blocked)".to_string(),
                "Consider using a proxy service or different hosting region".to_string(),
            ];
            let verdict = if blocker.contains("Challenge") || blocker.contains("CAPTCHA") {
                Verdict::CloudflareChallenge
            } else {
                Verdict::CloudflareWaf
            };
            return (verdict, recommendations);
        }
        return (
            Verdict::CompleteBlock,
            strs(&[
                "All request types blocked - likely IP-based block",
                "Use client-side fetching as primary method",
            ]),
        );
    }

    (
        Verdict::PartialAccess,
        strs(&[
            "Check individual test results for details",
            "Use the passing configuration for server-side requests",
        ]),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerIdentity {
    pub outgoing_ip: String,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub server_identity: ServerIdentity,
    pub tests: Tests,
    pub verdict: String,
    pub verdict_kind: Verdict,
    pub recommendations: Vec<String>,
    pub timestamp: String,
}

/// Multi-vector probe: identity check, then three header profiles in parallel.
pub struct DiagnosticProbe {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    target_url: String,
    region: String,
    timeout: Duration,
}

impl DiagnosticProbe {
    pub fn new(
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        target_url: impl Into<String>,
        region: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            clock,
            target_url: target_url.into(),
            region: region.into(),
            timeout,
        }
    }

    pub fn run(&self) -> DiagnosticReport {
        let timestamp = rfc3339(self.clock.now());
        let outgoing_ip = self.outgoing_ip();

        let results = self.run_legs();
        let mut results = results.into_iter();
        let mut next = || results.next().unwrap_or_default();
        let tests = Tests {
            no_headers: next(),
            minimalist: next(),
            impersonator: next(),
        };

        let (verdict, recommendations) = analyze(&tests, &outgoing_ip);
        info!(?verdict, ip = %outgoing_ip, "deep diagnostic finished");

        DiagnosticReport {
            server_identity: ServerIdentity {
                outgoing_ip,
                region: self.region.clone(),
            },
            tests,
            verdict: verdict.headline().to_string(),
            verdict_kind: verdict,
            recommendations,
            timestamp,
        }
    }

    /// Results come back in `LEGS` order regardless of completion order.
    fn run_legs(&self) -> Vec<TestResult> {
        let legs = || LEGS.par_iter().map(|leg| self.run_leg(leg)).collect::<Vec<_>>();
        match rayon::ThreadPoolBuilder::new().num_threads(LEGS.len()).build() {
            Ok(pool) => pool.install(legs),
            Err(err) => {
                warn!(error = %err, "diagnostic pool unavailable, using global pool");
                legs()
            }
        }
    }

    fn run_leg(&self, leg: &Leg) -> TestResult {
        let request =
            UpstreamRequest::get(&self.target_url, Route::Direct, self.timeout).with_headers(leg.headers);
        let started = std::time::Instant::now();
        match self.transport.send(&request) {
            Ok(resp) => TestResult::from_response(&resp),
            Err(err) => TestResult::failed(started.elapsed(), err.to_string()),
        }
    }

    fn outgoing_ip(&self) -> String {
        let request = UpstreamRequest::get(IP_CHECK_URL, Route::Direct, IDENTITY_TIMEOUT);
        match self.transport.send(&request) {
            Ok(resp) if resp.is_success() => serde_json::from_str::<Value>(&resp.body)
                .ok()
                .and_then(|v| v.get("ip").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_else(|| "unknown".to_string()),
            Ok(_) => "unknown".to_string(),
            Err(err) => {
                warn!(error = %err, "identity check failed");
                "fetch_failed".to_string()
            }
        }
    }
}
