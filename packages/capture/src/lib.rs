//! # Docshot Capture
//!
//! Screenshot capture for REST API documentation.
//!
//! ## Design Philosophy
//!
//! This is **not** a test framework or a monitoring tool. It materializes a
//! fixed set of documentation images from a running service:
//!
//! - **Live UI captures** drive one block of an interactive docs page (Swagger
//!   UI by default) through expand, "try it out", parameter entry and execute,
//!   then screenshot it once the response has rendered.
//! - **Response captures** fetch a JSON endpoint, highlight the body with
//!   [`docshot_highlight`] and screenshot the resulting static page.
//!
//! ## Core Principles
//!
//! - Descriptors are plain data, loaded from configuration
//! - Strictly sequential: one page, one action at a time
//! - One artifact per descriptor, named by the descriptor
//! - A failing descriptor never aborts the batch
//!
//! ## Usage
//!
//! ```rust,no_run
//! use docshot_capture::{
//!     CaptureOrchestrator, CaptureSettings, ChromeOptions, ChromeSession, DocshotConfig,
//!     ResponseFetcher,
//! };
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DocshotConfig::load(Path::new("docshot.config.json"))?;
//! let session = ChromeSession::launch(&ChromeOptions::from_config(&config))?;
//! let fetcher = ResponseFetcher::new()?;
//!
//! let orchestrator =
//!     CaptureOrchestrator::new(&session, &fetcher, CaptureSettings::from_config(&config)?)?;
//! let report = orchestrator.run(&config.endpoints);
//!
//! for result in report.results() {
//!     println!("{} -> {}", result.descriptor.output_artifact_name, result.succeeded);
//! }
//! # Ok(())
//! # }
//! ```

mod browser;
mod capture;
mod config;
mod driver;
mod fetcher;
mod server;
mod types;
mod wait;

pub use browser::{with_page, BrowserSession, ChromeOptions, ChromeSession, PageHandle};
pub use capture::{BatchReport, CaptureOrchestrator, CaptureSettings};
pub use config::{default_endpoints, DocshotConfig, DEFAULT_CONFIG_NAME};
pub use driver::{UiControls, UiDriver};
pub use fetcher::{pretty_print, FetchedResponse, JsonSource, ResponseFetcher};
pub use server::{serve_document, serve_document_with_timeout, DocumentServer};
pub use types::{
    ArtifactRecord, CaptureManifest, CaptureOptions, CaptureResult, EndpointDescriptor,
    ErrorKind, ImageFormat, Locator, UiState, Viewport,
};
pub use wait::{wait_until, WaitConfig, DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },

    #[error("No input with placeholder '{placeholder}'")]
    ParameterNotFound { placeholder: String },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("Response is not valid JSON: {0}")]
    ParseFailure(#[from] serde_json::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::ElementNotFound { .. } => ErrorKind::ElementNotFound,
            CaptureError::ParameterNotFound { .. } => ErrorKind::ParameterNotFound,
            CaptureError::FetchFailure { .. } => ErrorKind::FetchFailure,
            CaptureError::ParseFailure(_) => ErrorKind::ParseFailure,
            CaptureError::Browser(_) => ErrorKind::Browser,
            CaptureError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            CaptureError::Config(_) => ErrorKind::Config,
            CaptureError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn browser(err: impl std::fmt::Display) -> Self {
        CaptureError::Browser(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CaptureError>;
