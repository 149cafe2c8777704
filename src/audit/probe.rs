use crate::error::AuditError;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use std::time::Duration;

/// Upper bound for a single reachability probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Checks whether a hyperlink can be reached.
pub trait ReachabilityProbe {
    /// Returns true only when the URL answers with HTTP 200. Failures of any kind return false.
    fn probe(&self, url: &str) -> bool;
}

impl<F: Fn(&str) -> bool> ReachabilityProbe for F {
    fn probe(&self, url: &str) -> bool {
        self(url)
    }
}

/// Probe used when network checks are disabled; nothing is reachable.
pub struct NoProbe;

impl ReachabilityProbe for NoProbe {
    fn probe(&self, _url: &str) -> bool {
        false
    }
}

/// Issues `HEAD` requests, following redirects.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new() -> Result<HttpProbe, AuditError> {
        let client = Client::builder()
            .timeout(PROBE_TIMEOUT)
            .redirect(Policy::limited(10))
            .build()?;
        Ok(HttpProbe { client })
    }
}

impl ReachabilityProbe for HttpProbe {
    fn probe(&self, url: &str) -> bool {
        match self.client.head(url).send() {
            Ok(response) => {
                tracing::debug!(url, status = response.status().as_u16(), "probed hyperlink");
                response.status() == StatusCode::OK
            }
            Err(error) => {
                tracing::debug!(url, %error, timeout = error.is_timeout(), "hyperlink probe failed");
                false
            }
        }
    }
}
