//! Live UI state driver
//!
//! Walks one block of an interactive docs page through
//! [`UiState`] in order, one browser action per transition.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::browser::PageHandle;
use crate::types::{ImageFormat, UiState};
use crate::wait::{wait_until, WaitConfig};
use crate::{CaptureError, Result};

/// Selectors for the controls inside a docs block, relative to the block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UiControls {
    /// Toggle that expands the block
    pub expand: String,

    /// Button that enables interactive mode
    pub try_it_out: String,

    /// Button that sends the request
    pub execute: String,

    /// Present once the response has rendered
    pub response_ready: String,
}

impl Default for UiControls {
    fn default() -> Self {
        Self {
            expand: ".opblock-summary".to_string(),
            try_it_out: ".try-out__btn".to_string(),
            execute: ".execute".to_string(),
            response_ready: ".responses-wrapper .live-responses-table".to_string(),
        }
    }
}

impl UiControls {
    /// Selector for a control scoped to `block`
    pub fn scoped(block: &str, control: &str) -> String {
        format!("{block} {control}")
    }

    /// Selector for parameter inputs with the given placeholder inside `block`
    pub fn parameter_input(block: &str, placeholder: &str) -> String {
        format!(r#"{block} input[placeholder="{placeholder}"]"#)
    }
}

/// One UI capture in progress
struct Capture<'c> {
    page: &'c dyn PageHandle,
    block: &'c str,
    fills: &'c BTreeMap<String, String>,
    artifact: &'c Path,
    format: ImageFormat,
}

pub struct UiDriver<'a> {
    controls: &'a UiControls,
    settle: WaitConfig,
}

impl<'a> UiDriver<'a> {
    pub fn new(controls: &'a UiControls, settle: WaitConfig) -> Self {
        Self { controls, settle }
    }

    /// Drive `block` from collapsed to captured, writing the screenshot to
    /// `artifact`. The page must already show the docs.
    ///
    /// Returns the final state, which is always [`UiState::Captured`] on
    /// success.
    pub fn drive(
        &self,
        page: &dyn PageHandle,
        block: &str,
        fills: &BTreeMap<String, String>,
        artifact: &Path,
        format: ImageFormat,
    ) -> Result<UiState> {
        let capture = Capture {
            page,
            block,
            fills,
            artifact,
            format,
        };

        let mut state = UiState::Collapsed;
        while let Some(next) = state.next() {
            if let Err(e) = self.advance(&capture, next) {
                debug!(selector = block, state = %state, "Stopped before {}", next);
                return Err(e);
            }
            state = next;
            debug!(selector = block, state = %state, "Transition");
        }

        Ok(state)
    }

    /// Perform the action that enters `target`
    fn advance(&self, capture: &Capture<'_>, target: UiState) -> Result<()> {
        let page = capture.page;
        let block = capture.block;

        match target {
            UiState::Collapsed => Ok(()),
            UiState::Expanded => {
                page.scroll_into_view(block)?;
                page.click(&UiControls::scoped(block, &self.controls.expand))
            }
            UiState::InteractiveEnabled => {
                page.click(&UiControls::scoped(block, &self.controls.try_it_out))
            }
            UiState::ParametersFilled => self.fill_parameters(capture),
            UiState::Executed => page.click(&UiControls::scoped(block, &self.controls.execute)),
            UiState::Settled => {
                let ready = UiControls::scoped(block, &self.controls.response_ready);
                if !wait_until(&self.settle, || page.exists(&ready))? {
                    warn!(
                        selector = block,
                        timeout_ms = self.settle.timeout.as_millis() as u64,
                        "Response did not render in time, capturing anyway"
                    );
                }
                Ok(())
            }
            UiState::Captured => {
                page.scroll_into_view(block)?;
                page.screenshot(capture.artifact, capture.format, true)
            }
        }
    }

    fn fill_parameters(&self, capture: &Capture<'_>) -> Result<()> {
        for (placeholder, value) in capture.fills {
            let selector = UiControls::parameter_input(capture.block, placeholder);
            let filled = capture.page.fill(&selector, value)?;

            if filled == 0 {
                let skipped = CaptureError::ParameterNotFound {
                    placeholder: placeholder.clone(),
                };
                debug!(selector = capture.block, "{}", skipped);
            } else {
                debug!(selector = capture.block, placeholder = %placeholder, filled, "Parameter filled");
            }
        }

        Ok(())
    }
}
