use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::error::FetchError;

const REQUEST_TIMEOUT_SECS: u64 = 10;

// Browser-like header set; bare requests from datacenter IPs get 403'd.
pub const BROWSER_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    ),
    ("Accept", "application/json"),
    ("Referer", "https://fantasy.premierleague.com/"),
    ("Cache-Control", "no-cache"),
];

pub const MINIMAL_HEADERS: &[(&str, &str)] = &[("User-Agent", "FPL-App/1.0")];

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared client for one-off calls (webhooks, identity checks).
pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Through the residential proxy when one is configured.
    Proxied,
    Direct,
}

#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub route: Route,
    pub timeout: Duration,
}

impl UpstreamRequest {
    pub fn get(url: impl Into<String>, route: Route, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            route,
            timeout,
        }
    }

    pub fn with_headers(mut self, headers: &[(&str, &str)]) -> Self {
        self.headers
            .extend(headers.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub latency: Duration,
}

impl UpstreamResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One outbound GET. Any HTTP status is a response; only transport failures are errors.
pub trait Transport: Send + Sync {
    fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, FetchError>;

    fn has_proxy(&self) -> bool {
        false
    }
}

pub struct ReqwestTransport {
    direct: Client,
    proxied: Option<Client>,
}

impl ReqwestTransport {
    pub fn new(proxy_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let direct = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build direct http client")?;
        let proxied = match proxy_url {
            Some(url) => {
                let proxy = reqwest::Proxy::all(url).context("invalid proxy url")?;
                Some(
                    Client::builder()
                        .timeout(timeout)
                        .proxy(proxy)
                        .build()
                        .context("failed to build proxied http client")?,
                )
            }
            None => None,
        };
        Ok(Self { direct, proxied })
    }

    fn client_for(&self, route: Route) -> &Client {
        match (route, self.proxied.as_ref()) {
            (Route::Proxied, Some(client)) => client,
            _ => &self.direct,
        }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        let started = Instant::now();
        let mut req = self
            .client_for(request.route)
            .get(&request.url)
            .timeout(request.timeout);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        let resp = req.send().map_err(|err| FetchError::from_reqwest(&err))?;
        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = resp.text().map_err(|err| FetchError::from_reqwest(&err))?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
            latency: started.elapsed(),
        })
    }

    fn has_proxy(&self) -> bool {
        self.proxied.is_some()
    }
}
