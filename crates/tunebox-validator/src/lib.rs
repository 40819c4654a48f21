//! Liveness checks for resolved stream URLs.
//!
//! [`HttpUrlValidator`] asks the media host for a single byte of the stream
//! and judges the URL by the status line alone.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, RANGE};
use reqwest::redirect::Policy;
use std::time::Duration;
use tracing::{debug, trace};
use tunebox_core::UrlValidator;
use typed_builder::TypedBuilder;

pub use tunebox_core::BROWSER_USER_AGENT as DEFAULT_USER_AGENT;

const CHECK_RANGE: &str = "bytes=0-0";

/// Settings for the checker's HTTP client.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ValidatorConfig {
    /// Must match the agent used during extraction: some hosts bind signed
    /// URLs to it.
    #[builder(default = DEFAULT_USER_AGENT.to_string(), setter(into))]
    pub user_agent: String,
    #[builder(default = Duration::from_secs(3))]
    pub connect_timeout: Duration,
    #[builder(default = 5)]
    pub max_redirects: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A [`UrlValidator`] that issues a one-byte ranged `GET`.
///
/// Any 2xx (including `206 Partial Content`) is servable. The response is
/// dropped as soon as the status is known, which closes the connection
/// without reading the body.
#[derive(Debug, Clone)]
pub struct HttpUrlValidator {
    client: reqwest::Client,
}

impl HttpUrlValidator {
    pub fn new(config: ValidatorConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent)
            .connect_timeout(config.connect_timeout)
            .redirect(Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UrlValidator for HttpUrlValidator {
    async fn validate(&self, url: &str, timeout: Duration) -> bool {
        trace!(timeout = ?timeout, "Probing stream url");

        let response = self
            .client
            .get(url)
            .header(RANGE, HeaderValue::from_static(CHECK_RANGE))
            .timeout(timeout)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                drop(response);
                debug!(status = %status, "Stream url checked");
                status.is_success()
            }
            Err(e) => {
                debug!(error = %e, timed_out = e.is_timeout(), "Stream url check failed");
                false
            }
        }
    }
}
