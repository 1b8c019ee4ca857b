//! Batch behaviour against an in-memory browser and JSON source

use docshot_capture::{
    with_page, BrowserSession, CaptureError, CaptureOrchestrator, CaptureSettings, DocshotConfig,
    EndpointDescriptor, ErrorKind, FetchedResponse, ImageFormat, JsonSource, PageHandle, Result,
    Viewport,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const BASE_URL: &str = "http://localhost:8000";
const READY: &str = ".responses-wrapper .live-responses-table";

#[derive(Default)]
struct PageLog {
    actions: Vec<String>,
    rendered: Vec<String>,
    opened: usize,
    closed: usize,
}

/// Fake docs page: a selector exists when it is a present block or scoped
/// inside one
#[derive(Clone, Default)]
struct MockSession {
    blocks: Vec<String>,
    inputs: Vec<String>,
    broken: Vec<String>,
    settles: bool,
    log: Rc<RefCell<PageLog>>,
}

impl MockSession {
    fn with_blocks(blocks: &[&str]) -> Self {
        Self {
            blocks: blocks.iter().map(|b| b.to_string()).collect(),
            settles: true,
            ..Default::default()
        }
    }

    fn actions(&self) -> Vec<String> {
        self.log.borrow().actions.clone()
    }
}

struct MockPage {
    session: MockSession,
}

impl MockPage {
    fn found(&self, selector: &str) -> bool {
        if self.session.broken.iter().any(|b| b == selector) {
            return false;
        }
        self.session
            .blocks
            .iter()
            .any(|b| selector == b || selector.starts_with(&format!("{b} ")))
    }

    fn record(&self, action: String) {
        self.session.log.borrow_mut().actions.push(action);
    }

    fn require(&self, selector: &str) -> Result<()> {
        if self.found(selector) {
            Ok(())
        } else {
            Err(CaptureError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }
}

impl PageHandle for MockPage {
    fn navigate(&self, url: &str) -> Result<()> {
        self.record(format!("navigate:{url}"));
        Ok(())
    }

    fn render(&self, html: &str) -> Result<()> {
        self.record("render".to_string());
        self.session.log.borrow_mut().rendered.push(html.to_string());
        Ok(())
    }

    fn click(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.record(format!("click:{selector}"));
        Ok(())
    }

    fn exists(&self, selector: &str) -> Result<bool> {
        if selector.ends_with(READY) {
            return Ok(self.session.settles && self.found(selector));
        }
        Ok(self.found(selector))
    }

    fn fill(&self, selector: &str, value: &str) -> Result<usize> {
        self.record(format!("fill:{selector}={value}"));
        let matched = self.found(selector)
            && self
                .session
                .inputs
                .iter()
                .any(|p| selector.ends_with(&format!(r#"input[placeholder="{p}"]"#)));
        Ok(usize::from(matched))
    }

    fn scroll_into_view(&self, selector: &str) -> Result<()> {
        self.require(selector)?;
        self.record(format!("scroll:{selector}"));
        Ok(())
    }

    fn screenshot(&self, path: &Path, _format: ImageFormat, full_page: bool) -> Result<()> {
        assert!(full_page);
        image::RgbImage::new(4, 3)
            .save(path)
            .map_err(|e| CaptureError::Browser(e.to_string()))?;
        self.record(format!("screenshot:{}", path.file_name().unwrap().to_string_lossy()));
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.session.log.borrow_mut().closed += 1;
        Ok(())
    }
}

impl BrowserSession for MockSession {
    fn open_page(&self, _viewport: Viewport) -> Result<Box<dyn PageHandle>> {
        self.log.borrow_mut().opened += 1;
        Ok(Box::new(MockPage {
            session: self.clone(),
        }))
    }
}

#[derive(Default)]
struct MockSource {
    bodies: HashMap<String, String>,
    fetched: RefCell<Vec<String>>,
}

impl MockSource {
    fn with(mut self, path: &str, body: &str) -> Self {
        self.bodies.insert(format!("{BASE_URL}{path}"), body.to_string());
        self
    }
}

impl JsonSource for MockSource {
    fn fetch(&self, url: &str) -> Result<FetchedResponse> {
        self.fetched.borrow_mut().push(url.to_string());
        match self.bodies.get(url) {
            Some(body) => Ok(FetchedResponse::from_body(url, 200, body.clone())),
            None => Err(CaptureError::FetchFailure {
                url: url.to_string(),
                reason: "HTTP 404 Not Found".to_string(),
            }),
        }
    }
}

fn settings(dir: &TempDir) -> CaptureSettings {
    let config = DocshotConfig {
        base_url: BASE_URL.to_string(),
        output_dir: dir.path().to_path_buf(),
        settle_timeout_ms: 50,
        poll_interval_ms: 5,
        endpoints: vec![],
        ..Default::default()
    };
    CaptureSettings::from_config(&config).unwrap()
}

fn kpi_source() -> MockSource {
    MockSource::default().with("/api/kpi/current", r#"{"otif":0.97,"stockouts":2,"alert":null}"#)
}

fn scenario() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::ui("#kpi", "KPI", "swagger_kpi"),
        EndpointDescriptor::ui("#missing", "Missing", "swagger_missing"),
        EndpointDescriptor::json("/api/kpi/current", "KPI JSON", "api_kpi"),
    ]
}

#[test]
fn test_scenario_isolates_missing_block() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::with_blocks(&["#kpi"]);
    let source = kpi_source();

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let report = orchestrator.run(&scenario());

    let results = report.results();
    assert_eq!(results.len(), 3);
    assert!(results[0].succeeded);
    assert!(!results[1].succeeded);
    assert_eq!(results[1].error, Some(ErrorKind::ElementNotFound));
    assert!(results[2].succeeded);

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.all_succeeded());

    assert!(dir.path().join("swagger_kpi.png").exists());
    assert!(!dir.path().join("swagger_missing.png").exists());
    assert!(dir.path().join("api_kpi.png").exists());
}

#[test]
fn test_every_opened_page_is_closed() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::with_blocks(&["#kpi"]);
    let source = kpi_source();

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    orchestrator.run(&scenario());

    let log = session.log.borrow();
    assert_eq!(log.opened, 3);
    assert_eq!(log.closed, 3);
}

#[test]
fn test_with_page_closes_on_failure() {
    let session = MockSession::default();

    let outcome: Result<()> = with_page(&session, Viewport::Desktop, |page| page.click("#nope"));

    assert!(matches!(outcome, Err(CaptureError::ElementNotFound { .. })));
    assert_eq!(session.log.borrow().closed, 1);
}

#[test]
fn test_ui_actions_run_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = MockSession::with_blocks(&["#forecast"]);
    session.inputs = vec!["product_id".to_string()];
    let source = MockSource::default();

    let descriptor = EndpointDescriptor::ui("#forecast", "Forecast", "swagger_forecast")
        .with_fill("product_id", "PRD-0001")
        .with_fill("horizon", "14");

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let result = orchestrator.capture_one(&descriptor);

    assert!(result.succeeded, "{:?}", result.message);
    assert_eq!(
        session.actions(),
        vec![
            "navigate:http://localhost:8000/docs",
            "scroll:#forecast",
            "click:#forecast .opblock-summary",
            "click:#forecast .try-out__btn",
            r#"fill:#forecast input[placeholder="horizon"]=14"#,
            r#"fill:#forecast input[placeholder="product_id"]=PRD-0001"#,
            "click:#forecast .execute",
            "scroll:#forecast",
            "screenshot:swagger_forecast.png",
        ]
    );
}

#[test]
fn test_unmatched_parameter_still_captures() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::with_blocks(&["#status"]);
    let source = MockSource::default();

    let descriptor = EndpointDescriptor::ui("#status", "Status", "swagger_status")
        .with_fill("no_such_field", "x");

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let result = orchestrator.capture_one(&descriptor);

    assert!(result.succeeded);
    assert!(result.error.is_none());
    assert!(dir.path().join("swagger_status.png").exists());
}

#[test]
fn test_missing_control_fails_before_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = MockSession::with_blocks(&["#kpi"]);
    session.broken = vec!["#kpi .execute".to_string()];
    let source = MockSource::default();

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let result = orchestrator.capture_one(&EndpointDescriptor::ui("#kpi", "KPI", "swagger_kpi"));

    assert!(!result.succeeded);
    assert_eq!(result.error, Some(ErrorKind::ElementNotFound));
    assert!(!session.actions().iter().any(|a| a.starts_with("screenshot")));
    assert_eq!(session.log.borrow().closed, 1);
}

#[test]
fn test_settle_timeout_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = MockSession::with_blocks(&["#slow"]);
    session.settles = false;
    let source = MockSource::default();

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let start = Instant::now();
    let result = orchestrator.capture_one(&EndpointDescriptor::ui("#slow", "Slow", "swagger_slow"));

    assert!(result.succeeded);
    assert!(start.elapsed() >= Duration::from_millis(50));
    assert!(dir.path().join("swagger_slow.png").exists());
}

#[test]
fn test_fetch_failure_does_not_open_a_page() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::default();
    let source = kpi_source();

    let descriptors = vec![
        EndpointDescriptor::json("/api/agents/status", "Agents", "api_agents"),
        EndpointDescriptor::json("/api/kpi/current", "KPI JSON", "api_kpi"),
    ];

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let report = orchestrator.run(&descriptors);

    assert_eq!(report.results()[0].error, Some(ErrorKind::FetchFailure));
    assert!(report.results()[1].succeeded);
    assert_eq!(session.log.borrow().opened, 1);
    assert_eq!(
        *source.fetched.borrow(),
        vec![
            "http://localhost:8000/api/agents/status",
            "http://localhost:8000/api/kpi/current",
        ]
    );
}

#[test]
fn test_json_capture_renders_highlighted_page() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::default();
    let source = kpi_source();

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let result =
        orchestrator.capture_one(&EndpointDescriptor::json("/api/kpi/current", "KPI", "api_kpi"));
    assert!(result.succeeded);

    let log = session.log.borrow();
    let html = &log.rendered[0];
    assert!(html.contains("/api/kpi/current"));
    assert!(html.contains(r#"<span class="key">"otif"</span>"#));
    assert!(html.contains(r#"<span class="number">0.97</span>"#));
    assert!(html.contains(r#"<span class="null">null</span>"#));
}

#[test]
fn test_non_json_body_renders_raw_text() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::default();
    let source = MockSource::default().with("/api/health", "<b>upstream down</b>");

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let result =
        orchestrator.capture_one(&EndpointDescriptor::json("/api/health", "Health", "api_health"));

    assert!(result.succeeded);
    let log = session.log.borrow();
    assert!(log.rendered[0].contains("&lt;b&gt;upstream down&lt;/b&gt;"));
}

#[test]
fn test_manifest_records_results_and_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::with_blocks(&["#kpi"]);
    let source = kpi_source();

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let report = orchestrator.run(&scenario());

    let manifest_path = report.manifest_path().unwrap();
    assert_eq!(manifest_path, dir.path().join("manifest.json"));

    let manifest: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(manifest_path).unwrap()).unwrap();
    assert_eq!(manifest["baseUrl"], "http://localhost:8000/");

    let artifacts = manifest["artifacts"].as_array().unwrap();
    let names: Vec<_> = artifacts.iter().map(|a| a["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["swagger_kpi", "swagger_missing", "api_kpi"]);

    assert_eq!(artifacts[0]["width"], 4);
    assert_eq!(artifacts[0]["height"], 3);
    assert_eq!(artifacts[1]["succeeded"], false);
    assert_eq!(artifacts[1]["error"], "element_not_found");
    assert!(artifacts[1].get("width").is_none());
}

#[test]
fn test_manifest_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::with_blocks(&["#kpi"]);
    let source = MockSource::default();

    let mut settings = settings(&dir);
    settings.options.emit_manifest = false;

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings).unwrap();
    let report = orchestrator.run(&[EndpointDescriptor::ui("#kpi", "KPI", "swagger_kpi")]);

    assert!(report.all_succeeded());
    assert!(report.manifest_path().is_none());
    assert!(!dir.path().join("manifest.json").exists());
}

#[test]
fn test_output_follows_list_order() {
    let dir = tempfile::tempdir().unwrap();
    let session = MockSession::with_blocks(&["#a", "#b", "#c"]);
    let source = MockSource::default();

    let descriptors = vec![
        EndpointDescriptor::ui("#c", "C", "third"),
        EndpointDescriptor::ui("#a", "A", "first"),
        EndpointDescriptor::ui("#b", "B", "second"),
    ];

    let orchestrator = CaptureOrchestrator::new(&session, &source, settings(&dir)).unwrap();
    let report = orchestrator.run(&descriptors);

    let names: Vec<_> = report
        .results()
        .iter()
        .map(|r| r.descriptor.output_artifact_name.as_str())
        .collect();
    assert_eq!(names, vec!["third", "first", "second"]);

    let shots: Vec<_> = session
        .actions()
        .into_iter()
        .filter(|a| a.starts_with("screenshot:"))
        .collect();
    assert_eq!(
        shots,
        vec!["screenshot:third.png", "screenshot:first.png", "screenshot:second.png"]
    );
}
