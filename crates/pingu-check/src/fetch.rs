//! Resource fetching.
//!
//! A fetch either yields a response (any status code) or a transport
//! failure. Transport failures are check failures, not errors.

use std::time::Duration;

use tracing::debug;

use crate::error::{CheckError, CheckResult};

/// Status code and body of a fetched resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status_code: u16,
    pub body: String,
}

/// Result of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Response(Response),
    /// Connection, timeout, or body read failure.
    TransportFailed(String),
}

pub trait Fetcher {
    fn fetch(&self, url: &str) -> Fetched;
}

/// Blocking HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(timeout: Duration) -> CheckResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pingu/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CheckError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Fetched {
        let resp = match self.client.get(url).send() {
            Ok(resp) => resp,
            Err(e) => {
                debug!(error = %e, %url, "fetch failed");
                return Fetched::TransportFailed(e.to_string());
            }
        };

        let status_code = resp.status().as_u16();
        match resp.text() {
            Ok(body) => {
                debug!(%url, status = status_code, bytes = body.len(), "fetched");
                Fetched::Response(Response { status_code, body })
            }
            Err(e) => {
                debug!(error = %e, %url, "reading response body failed");
                Fetched::TransportFailed(e.to_string())
            }
        }
    }
}
