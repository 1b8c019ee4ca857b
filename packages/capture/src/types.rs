//! Core types for docshot captures

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::wait::WaitConfig;
use crate::CaptureError;

/// Where a capture target lives
///
/// Serialized flattened into the descriptor as either a `"selector"` or a
/// `"url"` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locator {
    /// CSS selector of a block on the interactive docs page
    Selector(String),

    /// Path (relative to the base URL) or absolute URL of a JSON endpoint
    Url(String),
}

/// Static record identifying one capture target and its output name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    #[serde(flatten)]
    pub locator: Locator,

    /// Human-readable name used in logs and the manifest
    pub display_name: String,

    /// Placeholder text -> value for interactive parameter inputs
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameter_fills: BTreeMap<String, String>,

    /// Artifact file stem (extension comes from the image format)
    pub output_artifact_name: String,
}

impl EndpointDescriptor {
    /// Descriptor for a block on the interactive docs page
    pub fn ui(
        selector: impl Into<String>,
        display_name: impl Into<String>,
        output_artifact_name: impl Into<String>,
    ) -> Self {
        Self {
            locator: Locator::Selector(selector.into()),
            display_name: display_name.into(),
            parameter_fills: BTreeMap::new(),
            output_artifact_name: output_artifact_name.into(),
        }
    }

    /// Descriptor for a rendered JSON response
    pub fn json(
        url: impl Into<String>,
        display_name: impl Into<String>,
        output_artifact_name: impl Into<String>,
    ) -> Self {
        Self {
            locator: Locator::Url(url.into()),
            display_name: display_name.into(),
            parameter_fills: BTreeMap::new(),
            output_artifact_name: output_artifact_name.into(),
        }
    }

    pub fn with_fill(mut self, placeholder: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameter_fills.insert(placeholder.into(), value.into());
        self
    }

    pub fn artifact_file_name(&self, format: ImageFormat) -> String {
        format!("{}.{}", self.output_artifact_name, format.extension())
    }
}

/// Viewport dimensions for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Viewport {
    /// Mobile: 375x667 (iPhone SE)
    Mobile,

    /// Tablet: 768x1024 (iPad)
    Tablet,

    /// Desktop: 1440x900
    #[default]
    Desktop,

    /// Custom dimensions (width, height)
    Custom(u32, u32),
}

impl Viewport {
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Viewport::Mobile => (375, 667),
            Viewport::Tablet => (768, 1024),
            Viewport::Desktop => (1440, 900),
            Viewport::Custom(w, h) => (*w, *h),
        }
    }
}

/// Image output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// Options shared by every capture in a batch
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    /// Viewport size
    pub viewport: Viewport,

    /// Output format
    pub format: ImageFormat,

    /// Bound on waiting for an executed request to render
    pub settle: WaitConfig,

    /// Whether to write `manifest.json` next to the artifacts
    pub emit_manifest: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            viewport: Viewport::Desktop,
            format: ImageFormat::Png,
            settle: WaitConfig::default(),
            emit_manifest: true,
        }
    }
}

/// States a docs block passes through during a live UI capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    Collapsed,
    Expanded,
    InteractiveEnabled,
    ParametersFilled,
    Executed,
    Settled,
    Captured,
}

impl UiState {
    /// The following state, or `None` once captured
    pub fn next(&self) -> Option<UiState> {
        match self {
            UiState::Collapsed => Some(UiState::Expanded),
            UiState::Expanded => Some(UiState::InteractiveEnabled),
            UiState::InteractiveEnabled => Some(UiState::ParametersFilled),
            UiState::ParametersFilled => Some(UiState::Executed),
            UiState::Executed => Some(UiState::Settled),
            UiState::Settled => Some(UiState::Captured),
            UiState::Captured => None,
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UiState::Collapsed => "collapsed",
            UiState::Expanded => "expanded",
            UiState::InteractiveEnabled => "interactive_enabled",
            UiState::ParametersFilled => "parameters_filled",
            UiState::Executed => "executed",
            UiState::Settled => "settled",
            UiState::Captured => "captured",
        };
        f.write_str(name)
    }
}

/// Serializable category of a capture failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ElementNotFound,
    ParameterNotFound,
    FetchFailure,
    ParseFailure,
    Browser,
    InvalidUrl,
    Config,
    Io,
}

/// Outcome of one descriptor
#[derive(Debug, Clone)]
pub struct CaptureResult {
    pub descriptor: EndpointDescriptor,

    /// Where the artifact was (or would have been) written
    pub artifact_path: PathBuf,

    pub succeeded: bool,

    pub error: Option<ErrorKind>,

    /// Error message for reporting
    pub message: Option<String>,
}

impl CaptureResult {
    pub fn success(descriptor: EndpointDescriptor, artifact_path: PathBuf) -> Self {
        Self {
            descriptor,
            artifact_path,
            succeeded: true,
            error: None,
            message: None,
        }
    }

    pub fn failure(
        descriptor: EndpointDescriptor,
        artifact_path: PathBuf,
        error: &CaptureError,
    ) -> Self {
        Self {
            descriptor,
            artifact_path,
            succeeded: false,
            error: Some(error.kind()),
            message: Some(error.to_string()),
        }
    }
}

/// One entry in the manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRecord {
    pub name: String,
    pub display_name: String,
    pub path: PathBuf,
    pub succeeded: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Image width in pixels, read back from the written file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    /// Image height in pixels, read back from the written file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ArtifactRecord {
    pub fn from_result(result: &CaptureResult) -> Self {
        let dimensions = if result.succeeded {
            image_dimensions(&result.artifact_path)
        } else {
            None
        };

        Self {
            name: result.descriptor.output_artifact_name.clone(),
            display_name: result.descriptor.display_name.clone(),
            path: result.artifact_path.clone(),
            succeeded: result.succeeded,
            error: result.error,
            message: result.message.clone(),
            width: dimensions.map(|(w, _)| w),
            height: dimensions.map(|(_, h)| h),
        }
    }
}

fn image_dimensions(path: &Path) -> Option<(u32, u32)> {
    image::image_dimensions(path).ok()
}

/// Metadata manifest for a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureManifest {
    pub base_url: String,
    pub artifacts: Vec<ArtifactRecord>,
    pub generated_at: String,
}

impl CaptureManifest {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            artifacts: Vec::new(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn add_result(&mut self, result: &CaptureResult) {
        self.artifacts.push(ArtifactRecord::from_result(result));
    }
}
