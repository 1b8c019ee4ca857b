use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::driver::UiControls;
use crate::types::{CaptureOptions, EndpointDescriptor, ImageFormat, Locator, Viewport};
use crate::wait::WaitConfig;
use crate::{CaptureError, Result};

pub const DEFAULT_CONFIG_NAME: &str = "docshot.config.json";

/// Docshot configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocshotConfig {
    /// Root URL of the running service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the interactive docs page, relative to `base_url`
    #[serde(default = "default_docs_path")]
    pub docs_path: String,

    /// Directory artifacts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub viewport: Viewport,

    #[serde(default)]
    pub format: ImageFormat,

    /// Upper bound on waiting for an executed request to render
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on waiting for a block or control to appear
    #[serde(default = "default_element_timeout_ms")]
    pub element_timeout_ms: u64,

    #[serde(default = "default_emit_manifest")]
    pub emit_manifest: bool,

    #[serde(default)]
    pub controls: UiControls,

    /// Capture targets, processed in order
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointDescriptor>,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_docs_path() -> String {
    "/docs".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("docs/screenshots")
}

fn default_settle_timeout_ms() -> u64 {
    3_000
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_element_timeout_ms() -> u64 {
    5_000
}

fn default_emit_manifest() -> bool {
    true
}

/// Built-in capture list for the ChainCommand supply-chain API
pub fn default_endpoints() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::ui(
            "#operations-dashboard-get_current_kpi_api_kpi_current_get",
            "Swagger: current KPI",
            "swagger_kpi_current",
        ),
        EndpointDescriptor::ui(
            "#operations-dashboard-get_inventory_status_api_inventory_status_get",
            "Swagger: inventory status",
            "swagger_inventory_status",
        ),
        EndpointDescriptor::ui(
            "#operations-dashboard-get_forecast_api_forecast__product_id__get",
            "Swagger: demand forecast",
            "swagger_forecast",
        )
        .with_fill("product_id", "PRD-0001")
        .with_fill("horizon", "14"),
        EndpointDescriptor::ui(
            "#operations-control-simulation_status_api_simulation_status_get",
            "Swagger: simulation status",
            "swagger_simulation_status",
        ),
        EndpointDescriptor::json("/api/health", "Health check", "api_health"),
        EndpointDescriptor::json("/api/kpi/current", "Current KPI", "api_kpi_current"),
        EndpointDescriptor::json(
            "/api/inventory/status",
            "Inventory status",
            "api_inventory_status",
        ),
        EndpointDescriptor::json("/api/agents/status", "Agent status", "api_agents_status"),
    ]
}

impl Default for DocshotConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            docs_path: default_docs_path(),
            output_dir: default_output_dir(),
            viewport: Viewport::default(),
            format: ImageFormat::default(),
            settle_timeout_ms: default_settle_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            element_timeout_ms: default_element_timeout_ms(),
            emit_manifest: default_emit_manifest(),
            controls: UiControls::default(),
            endpoints: default_endpoints(),
        }
    }
}

impl DocshotConfig {
    /// Load config from a file, falling back to defaults when it is missing
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: DocshotConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(DocshotConfig::default())
        }
    }

    /// Serialize in the on-disk format
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject settings no batch can run with
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(CaptureError::Config(
                "pollIntervalMs must be greater than zero".to_string(),
            ));
        }

        for descriptor in &self.endpoints {
            if descriptor.output_artifact_name.trim().is_empty() {
                return Err(CaptureError::Config(format!(
                    "'{}' has an empty outputArtifactName",
                    descriptor.display_name
                )));
            }

            let target = match &descriptor.locator {
                Locator::Selector(s) | Locator::Url(s) => s,
            };
            if target.trim().is_empty() {
                return Err(CaptureError::Config(format!(
                    "'{}' has an empty locator",
                    descriptor.display_name
                )));
            }
        }

        Ok(())
    }

    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            viewport: self.viewport,
            format: self.format,
            settle: WaitConfig::from_millis(self.settle_timeout_ms, self.poll_interval_ms),
            emit_manifest: self.emit_manifest,
        }
    }

    /// Descriptors whose artifact name is in `only`, in configured order.
    /// An empty filter selects everything.
    pub fn select(&self, only: &[String]) -> Vec<EndpointDescriptor> {
        self.endpoints
            .iter()
            .filter(|d| only.is_empty() || only.contains(&d.output_artifact_name))
            .cloned()
            .collect()
    }
}
