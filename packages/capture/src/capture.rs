//! Capture orchestration
//!
//! Runs a batch of descriptors strictly in order. Each descriptor produces
//! exactly one [`CaptureResult`]; a failure is recorded and the batch moves
//! on.

use docshot_highlight::{highlight_json, render_response_page, ResponseHeader};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use url::Url;

use crate::browser::{with_page, BrowserSession};
use crate::config::DocshotConfig;
use crate::driver::{UiControls, UiDriver};
use crate::fetcher::JsonSource;
use crate::types::{CaptureManifest, CaptureOptions, CaptureResult, EndpointDescriptor, Locator};
use crate::Result;

const MANIFEST_NAME: &str = "manifest.json";

/// Everything a batch needs besides the browser and the HTTP client
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub base_url: Url,
    pub docs_path: String,
    pub output_dir: PathBuf,
    pub options: CaptureOptions,
    pub controls: UiControls,
}

impl CaptureSettings {
    pub fn from_config(config: &DocshotConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            docs_path: config.docs_path.clone(),
            output_dir: config.output_dir.clone(),
            options: config.capture_options(),
            controls: config.controls.clone(),
        })
    }

    /// Absolute URL of the interactive docs page
    pub fn docs_url(&self) -> Result<Url> {
        Ok(self.base_url.join(&self.docs_path)?)
    }

    /// Resolve a JSON target against the base URL; absolute URLs pass through
    pub fn resolve(&self, target: &str) -> Result<Url> {
        Ok(self.base_url.join(target)?)
    }
}

/// Results of one batch, in descriptor order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    results: Vec<CaptureResult>,
    manifest_path: Option<PathBuf>,
}

impl BatchReport {
    pub fn results(&self) -> &[CaptureResult] {
        &self.results
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(|r| r.succeeded)
    }

    /// Where the manifest was written, if one was
    pub fn manifest_path(&self) -> Option<&Path> {
        self.manifest_path.as_deref()
    }
}

/// Drives a batch of captures through one browser session
pub struct CaptureOrchestrator<'a> {
    session: &'a dyn BrowserSession,
    source: &'a dyn JsonSource,
    settings: CaptureSettings,
}

impl<'a> CaptureOrchestrator<'a> {
    /// Create an orchestrator, creating the output directory if needed
    pub fn new(
        session: &'a dyn BrowserSession,
        source: &'a dyn JsonSource,
        settings: CaptureSettings,
    ) -> Result<Self> {
        std::fs::create_dir_all(&settings.output_dir)?;

        Ok(Self {
            session,
            source,
            settings,
        })
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    /// Capture every descriptor in order
    pub fn run(&self, descriptors: &[EndpointDescriptor]) -> BatchReport {
        let mut report = BatchReport::default();

        for descriptor in descriptors {
            let result = self.capture_one(descriptor);

            if result.succeeded {
                info!(
                    artifact = %descriptor.output_artifact_name,
                    path = %result.artifact_path.display(),
                    "Captured {}",
                    descriptor.display_name
                );
            } else {
                warn!(
                    artifact = %descriptor.output_artifact_name,
                    error = result.message.as_deref().unwrap_or_default(),
                    "Failed to capture {}",
                    descriptor.display_name
                );
            }

            report.results.push(result);
        }

        if self.settings.options.emit_manifest {
            match self.write_manifest(&report.results) {
                Ok(path) => report.manifest_path = Some(path),
                Err(e) => warn!(error = %e, "Failed to write manifest"),
            }
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch complete"
        );

        report
    }

    /// Capture a single descriptor
    pub fn capture_one(&self, descriptor: &EndpointDescriptor) -> CaptureResult {
        let file_name = descriptor.artifact_file_name(self.settings.options.format);
        let artifact_path = self.settings.output_dir.join(file_name);

        let outcome = match &descriptor.locator {
            Locator::Selector(selector) => {
                self.capture_ui(selector, &descriptor.parameter_fills, &artifact_path)
            }
            Locator::Url(target) => self.capture_json(target, &artifact_path),
        };

        match outcome {
            Ok(()) => CaptureResult::success(descriptor.clone(), artifact_path),
            Err(e) => CaptureResult::failure(descriptor.clone(), artifact_path, &e),
        }
    }

    fn capture_ui(
        &self,
        selector: &str,
        fills: &BTreeMap<String, String>,
        artifact_path: &Path,
    ) -> Result<()> {
        let docs_url = self.settings.docs_url()?;
        let options = &self.settings.options;
        let driver = UiDriver::new(&self.settings.controls, options.settle);

        with_page(self.session, options.viewport, |page| {
            page.navigate(docs_url.as_str())?;
            let state = driver.drive(page, selector, fills, artifact_path, options.format)?;
            debug!(selector, state = %state, "UI capture finished");
            Ok(())
        })
    }

    fn capture_json(&self, target: &str, artifact_path: &Path) -> Result<()> {
        let url = self.settings.resolve(target)?;
        let response = self.source.fetch(url.as_str())?;

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }

        let header = ResponseHeader::get(path, response.status);
        let html = render_response_page(&header, &highlight_json(&response.pretty));
        let options = &self.settings.options;

        with_page(self.session, options.viewport, |page| {
            page.render(&html)?;
            page.screenshot(artifact_path, options.format, true)
        })
    }

    fn write_manifest(&self, results: &[CaptureResult]) -> Result<PathBuf> {
        let mut manifest = CaptureManifest::new(self.settings.base_url.as_str());
        for result in results {
            manifest.add_result(result);
        }

        let path = self.settings.output_dir.join(MANIFEST_NAME);
        let json = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(&path, json)?;
        debug!(path = %path.display(), "Manifest written");

        Ok(path)
    }
}
