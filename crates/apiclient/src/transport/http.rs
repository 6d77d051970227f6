//! HTTP transport backed by `ureq`.

use crate::error::{Error, Result};
use crate::transport::{Method, Request, Transport};
use serde_json::Value;
use std::time::Duration;

/// Default timeout for a single request.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Blocking HTTP transport with bearer-token authentication.
///
/// # Example
///
/// ```no_run
/// use apiclient::{HttpTransport, Transport};
///
/// let api = HttpTransport::new("https://abc123.apps.example.com/", "TOKEN")?;
/// assert_eq!(api.base_url(), "https://abc123.apps.example.com");
/// # Ok::<(), apiclient::Error>(())
/// ```
pub struct HttpTransport {
    /// HTTP agent for requests.
    agent: ureq::Agent,
    /// Environment URL without trailing slash.
    base_url: String,
    /// Bearer token.
    token: String,
}

impl HttpTransport {
    /// Create a transport for an environment URL and token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom per-request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("https://") || base_url.starts_with("http://")) {
            return Err(Error::Config(format!(
                "environment URL must start with http:// or https:// (got '{}')",
                base_url
            )));
        }

        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::Config("API token is empty".to_string()));
        }

        // Statuses are inspected here so error bodies can be read
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .into();

        Ok(Self {
            agent,
            base_url,
            token,
        })
    }

    /// Get the environment URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for HttpTransport {
    fn execute(&self, request: Request) -> Result<Value> {
        let url = self.url(&request.path);
        let auth = format!("Bearer {}", self.token);
        log::debug!("{} {} {:?}", request.method, url, request.query);

        let response = match request.method {
            Method::Get => {
                let mut req = self
                    .agent
                    .get(&url)
                    .header("Authorization", &auth)
                    .header("Accept", "application/json");
                for (k, v) in &request.query {
                    req = req.query(k, v);
                }
                req.call()
            }
            method => {
                let mut req = match method {
                    Method::Post => self.agent.post(&url),
                    Method::Put => self.agent.put(&url),
                    _ => self.agent.patch(&url),
                }
                .header("Authorization", &auth)
                .header("Accept", "application/json");
                for (k, v) in &request.query {
                    req = req.query(k, v);
                }
                let body = request.body.unwrap_or(Value::Null);
                req.send_json(&body)
            }
        };

        let mut response = response?;
        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        log::trace!("HTTP {} ({} bytes)", status, text.len());

        if !(200..300).contains(&status) {
            return Err(Error::from_body(status, &text));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}
