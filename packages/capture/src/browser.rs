//! Browser session control
//!
//! One browser process lives for the whole batch; each capture opens its own
//! page and closes it again. [`BrowserSession`] and [`PageHandle`] are the
//! seam the driver and orchestrator work against, and [`ChromeSession`] is
//! the headless Chrome implementation.

use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport as ClipArea};
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::DocshotConfig;
use crate::server::serve_document_with_timeout;
use crate::types::{ImageFormat, Viewport};
use crate::{CaptureError, Result};

/// A single open page
pub trait PageHandle {
    /// Load `url` and wait for navigation to finish
    fn navigate(&self, url: &str) -> Result<()>;

    /// Load a static HTML document
    fn render(&self, html: &str) -> Result<()>;

    /// Click the first element matching `selector`
    fn click(&self, selector: &str) -> Result<()>;

    /// Whether any element currently matches `selector`
    fn exists(&self, selector: &str) -> Result<bool>;

    /// Replace the value of every input matching `selector`.
    /// Returns how many inputs were filled; zero is not an error.
    fn fill(&self, selector: &str, value: &str) -> Result<usize>;

    fn scroll_into_view(&self, selector: &str) -> Result<()>;

    /// Write a screenshot to `path`
    fn screenshot(&self, path: &Path, format: ImageFormat, full_page: bool) -> Result<()>;

    fn close(&self) -> Result<()>;
}

/// Owner of the browser process
pub trait BrowserSession {
    fn open_page(&self, viewport: Viewport) -> Result<Box<dyn PageHandle>>;
}

/// Open a page, run `f` on it and close the page on every exit path
pub fn with_page<T, F>(session: &dyn BrowserSession, viewport: Viewport, f: F) -> Result<T>
where
    F: FnOnce(&dyn PageHandle) -> Result<T>,
{
    let page = session.open_page(viewport)?;
    let outcome = f(page.as_ref());

    if let Err(e) = page.close() {
        warn!(error = %e, "Failed to close page");
    }

    outcome
}

/// Run `setup` on a page that was just opened; close the page again if
/// setup fails so it never outlives the error
fn prepare_page<P, F>(page: P, setup: F) -> Result<P>
where
    P: PageHandle,
    F: FnOnce(&P) -> Result<()>,
{
    if let Err(e) = setup(&page) {
        if let Err(close_err) = page.close() {
            warn!(error = %close_err, "Failed to close page after setup error");
        }
        return Err(e);
    }

    Ok(page)
}

/// Map an element lookup, treating "no such element" as `missing`.
/// Any other browser failure is an error.
fn or_missing<T>(lookup: anyhow::Result<T>, missing: T) -> Result<T> {
    match lookup {
        Ok(found) => Ok(found),
        Err(e) if e.is::<NoElementFound>() => Ok(missing),
        Err(e) => Err(CaptureError::browser(e)),
    }
}

/// Launch settings for headless Chrome
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub headless: bool,

    /// Initial window size; pages resize to their capture viewport
    pub window_size: (u32, u32),

    /// How long to wait for an element to appear before giving up
    pub element_timeout: Duration,
}

impl Default for ChromeOptions {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: Viewport::Desktop.dimensions(),
            element_timeout: Duration::from_secs(5),
        }
    }
}

impl ChromeOptions {
    pub fn from_config(config: &DocshotConfig) -> Self {
        Self {
            headless: true,
            window_size: config.viewport.dimensions(),
            element_timeout: Duration::from_millis(config.element_timeout_ms),
        }
    }
}

/// Headless Chrome browser shared by a batch
pub struct ChromeSession {
    browser: Browser,
    element_timeout: Duration,
}

impl ChromeSession {
    /// Launch headless Chrome
    pub fn launch(options: &ChromeOptions) -> Result<Self> {
        let browser = Browser::new(LaunchOptions {
            headless: options.headless,
            window_size: Some(options.window_size),
            idle_browser_timeout: Duration::from_secs(300),
            ..Default::default()
        })
        .map_err(CaptureError::browser)?;

        debug!(headless = options.headless, "Browser launched");

        Ok(Self {
            browser,
            element_timeout: options.element_timeout,
        })
    }
}

impl BrowserSession for ChromeSession {
    fn open_page(&self, viewport: Viewport) -> Result<Box<dyn PageHandle>> {
        let tab = self.browser.new_tab().map_err(CaptureError::browser)?;
        let page = ChromePage {
            tab,
            element_timeout: self.element_timeout,
        };

        let (width, height) = viewport.dimensions();
        let page = prepare_page(page, |page| {
            page.resize(f64::from(width), f64::from(height))
        })?;

        Ok(Box::new(page))
    }
}

/// Scroll size of the loaded document
#[derive(Debug, Deserialize)]
struct DocumentSize {
    width: f64,
    height: f64,
}

const DOCUMENT_SIZE_SCRIPT: &str = r#"
    JSON.stringify({
        width: Math.max(document.documentElement.scrollWidth, document.body ? document.body.scrollWidth : 0),
        height: Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0)
    });
"#;

/// Upper bound on Chrome requesting a rendered document
const RENDER_SERVE_TIMEOUT: Duration = Duration::from_secs(10);

/// A Chrome tab
pub struct ChromePage {
    tab: Arc<Tab>,
    element_timeout: Duration,
}

impl ChromePage {
    fn resize(&self, width: f64, height: f64) -> Result<()> {
        self.tab
            .set_bounds(Bounds::Normal {
                left: Some(0),
                top: Some(0),
                width: Some(width),
                height: Some(height),
            })
            .map_err(CaptureError::browser)?;
        Ok(())
    }

    fn find(&self, selector: &str) -> Result<Element<'_>> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, self.element_timeout)
            .map_err(|_| CaptureError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    fn document_size(&self) -> Result<DocumentSize> {
        let value = self
            .tab
            .evaluate(DOCUMENT_SIZE_SCRIPT, false)
            .map_err(CaptureError::browser)?
            .value
            .ok_or_else(|| CaptureError::Browser("Failed to measure document".to_string()))?;

        let json = value
            .as_str()
            .ok_or_else(|| CaptureError::Browser("Invalid document size".to_string()))?;

        serde_json::from_str(json)
            .map_err(|e| CaptureError::Browser(format!("Invalid document size: {e}")))
    }
}

impl PageHandle for ChromePage {
    fn navigate(&self, url: &str) -> Result<()> {
        debug!(url, "Navigating");
        self.tab.navigate_to(url).map_err(CaptureError::browser)?;
        self.tab
            .wait_until_navigated()
            .map_err(CaptureError::browser)?;
        Ok(())
    }

    fn render(&self, html: &str) -> Result<()> {
        let (url, server_handle) = serve_document_with_timeout(
            html.to_string(),
            "text/html; charset=UTF-8",
            RENDER_SERVE_TIMEOUT,
        )?;

        let loaded = self.navigate(&url);

        // A failed navigation may never reach the server; its thread exits on
        // its own once the serve timeout passes.
        if loaded.is_ok() && server_handle.join().is_err() {
            warn!(url = %url, "Document server thread panicked");
        }

        loaded
    }

    fn click(&self, selector: &str) -> Result<()> {
        self.find(selector)?
            .click()
            .map_err(CaptureError::browser)?;
        Ok(())
    }

    fn exists(&self, selector: &str) -> Result<bool> {
        or_missing(self.tab.find_element(selector).map(|_| true), false)
    }

    fn fill(&self, selector: &str, value: &str) -> Result<usize> {
        let inputs = or_missing(self.tab.find_elements(selector), Vec::new())?;

        for input in &inputs {
            input.click().map_err(CaptureError::browser)?;
            input
                .call_js_fn("function() { this.select(); }", vec![], false)
                .map_err(CaptureError::browser)?;
            self.tab
                .press_key("Backspace")
                .map_err(CaptureError::browser)?;
            self.tab.type_str(value).map_err(CaptureError::browser)?;
        }

        Ok(inputs.len())
    }

    fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.find(selector)?
            .scroll_into_view()
            .map_err(CaptureError::browser)?;
        Ok(())
    }

    fn screenshot(&self, path: &Path, format: ImageFormat, full_page: bool) -> Result<()> {
        let format_option = match format {
            ImageFormat::Png => CaptureScreenshotFormatOption::Png,
            ImageFormat::Jpeg => CaptureScreenshotFormatOption::Jpeg,
        };

        let clip = if full_page {
            let size = self.document_size()?;
            self.resize(size.width, size.height)?;

            Some(ClipArea {
                x: 0.0,
                y: 0.0,
                width: size.width,
                height: size.height,
                scale: 1.0,
            })
        } else {
            None
        };

        let data = self
            .tab
            .capture_screenshot(format_option, None, clip, true)
            .map_err(CaptureError::browser)?;

        std::fs::write(path, &data)?;
        debug!(path = %path.display(), bytes = data.len(), "Screenshot written");

        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.tab.close(true).map_err(CaptureError::browser)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Default)]
    struct CountingPage {
        closed: Rc<Cell<usize>>,
        fail_close: bool,
    }

    impl PageHandle for CountingPage {
        fn navigate(&self, _url: &str) -> Result<()> {
            Ok(())
        }

        fn render(&self, _html: &str) -> Result<()> {
            Ok(())
        }

        fn click(&self, selector: &str) -> Result<()> {
            Err(CaptureError::ElementNotFound {
                selector: selector.to_string(),
            })
        }

        fn exists(&self, _selector: &str) -> Result<bool> {
            Ok(false)
        }

        fn fill(&self, _selector: &str, _value: &str) -> Result<usize> {
            Ok(0)
        }

        fn scroll_into_view(&self, _selector: &str) -> Result<()> {
            Ok(())
        }

        fn screenshot(&self, _path: &Path, _format: ImageFormat, _full_page: bool) -> Result<()> {
            Ok(())
        }

        fn close(&self) -> Result<()> {
            self.closed.set(self.closed.get() + 1);
            if self.fail_close {
                return Err(CaptureError::Browser("target already gone".to_string()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_prepare_page_keeps_page_open_on_success() {
        let page = prepare_page(CountingPage::default(), |page| page.navigate("about:blank"))
            .unwrap();
        assert_eq!(page.closed.get(), 0);
    }

    #[test]
    fn test_prepare_page_closes_on_setup_failure() {
        let closed = Rc::new(Cell::new(0));
        let page = CountingPage {
            closed: closed.clone(),
            ..Default::default()
        };

        let result = prepare_page(page, |_| {
            Err(CaptureError::Browser("resize refused".to_string()))
        });

        assert!(matches!(result, Err(CaptureError::Browser(ref m)) if m == "resize refused"));
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_prepare_page_reports_setup_error_when_close_fails() {
        let closed = Rc::new(Cell::new(0));
        let page = CountingPage {
            closed: closed.clone(),
            fail_close: true,
        };

        let result = prepare_page(page, |page| page.click("#block"));

        assert!(matches!(result, Err(CaptureError::ElementNotFound { .. })));
        assert_eq!(closed.get(), 1);
    }

    #[test]
    fn test_missing_element_is_not_an_error() {
        let lookup: anyhow::Result<usize> = Err(NoElementFound {}.into());
        assert_eq!(or_missing(lookup, 0).unwrap(), 0);
    }

    #[test]
    fn test_other_lookup_failures_propagate() {
        let lookup: anyhow::Result<bool> = Err(anyhow::anyhow!("connection closed"));
        let err = or_missing(lookup, false).unwrap_err();
        assert!(matches!(err, CaptureError::Browser(ref m) if m == "connection closed"));
    }

    #[test]
    fn test_found_lookup_passes_through() {
        assert_eq!(or_missing(Ok(vec![1, 2]), Vec::new()).unwrap(), vec![1, 2]);
    }
}
