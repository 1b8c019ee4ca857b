//! Response fetcher for JSON endpoints

use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::{CaptureError, Result};

/// Anything that can produce a response body for a URL
pub trait JsonSource {
    /// Perform a single GET. Non-success statuses are errors.
    fn fetch(&self, url: &str) -> Result<FetchedResponse>;
}

/// A fetched body plus its display form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedResponse {
    pub url: String,
    pub status: u16,

    /// Body exactly as received
    pub raw: String,

    /// Pretty-printed JSON, or `raw` unchanged when the body is not JSON
    pub pretty: String,

    /// Whether `pretty` came from parsed JSON
    pub parsed: bool,
}

impl FetchedResponse {
    /// Build a response, degrading to the raw text when it is not JSON
    pub fn from_body(url: impl Into<String>, status: u16, raw: String) -> Self {
        let url = url.into();
        let (pretty, parsed) = match pretty_print(&raw) {
            Ok(pretty) => (pretty, true),
            Err(e) => {
                warn!(url = %url, error = %e, "Rendering raw response text");
                (raw.clone(), false)
            }
        };

        Self {
            url,
            status,
            raw,
            pretty,
            parsed,
        }
    }
}

/// Re-indent JSON with two spaces, keeping object key order and every
/// number exactly as written
pub fn pretty_print(raw: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// HTTP client for JSON endpoints
#[derive(Debug, Clone)]
pub struct ResponseFetcher {
    client: Client,
}

impl ResponseFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("docshot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CaptureError::FetchFailure {
                url: String::new(),
                reason: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Use a preconfigured HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl JsonSource for ResponseFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedResponse> {
        let failure = |reason: String| CaptureError::FetchFailure {
            url: url.to_string(),
            reason,
        };

        debug!(url, "Fetching response");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| failure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(format!("HTTP {status}")));
        }

        let raw = response.text().map_err(|e| failure(e.to_string()))?;
        debug!(url, status = status.as_u16(), bytes = raw.len(), "Response received");

        Ok(FetchedResponse::from_body(url, status.as_u16(), raw))
    }
}
