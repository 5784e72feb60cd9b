#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;
use diesel::sqlite::SqliteConnection;
use tempfile::TempDir;

use newsdesk_service::AppState;
use newsdesk_service::errors::ApiError;
use newsdesk_service::flipbook::{FlipbookConversion, FlipbookConverter};
use newsdesk_service::magazine::render::PageRenderer;
use newsdesk_service::repositories::SqliteNewsRepository;
use newsdesk_service::routes;
use newsdesk_service::summary::SummaryProvider;
use newsdesk_service::test_helpers::{establish_test_connection, minimal_pdf};

/// Summary provider with a fixed topic line; keeps magazine tests off the
/// network.
#[derive(Clone)]
pub struct StaticSummary;

#[async_trait]
impl SummaryProvider for StaticSummary {
    async fn issue_summary(&self, _titles: &[String]) -> Result<String, ApiError> {
        Ok("Campus | Sports | Research".to_string())
    }
}

/// Flipbook converter that accepts everything and returns a canned viewer
/// URL.
#[derive(Clone)]
pub struct StubFlipbook;

#[async_trait]
impl FlipbookConverter for StubFlipbook {
    async fn convert(&self, pdf_url: &str, _title: &str) -> Result<FlipbookConversion, ApiError> {
        Ok(FlipbookConversion {
            flipbook_url: "https://flipbooks.example/view/abc123".to_string(),
            thumbnail: None,
            source_pdf: pdf_url.to_string(),
        })
    }
}

/// Renderer stub: emits a one-page PDF per page, or a truncated buffer when
/// configured to, for the integrity-failure scenario.
pub struct TestRenderer {
    truncate: bool,
}

impl PageRenderer for TestRenderer {
    fn render_pdf(&self, _html_path: &Path) -> Result<Vec<u8>, ApiError> {
        if self.truncate {
            Ok(b"%PD".to_vec())
        } else {
            Ok(minimal_pdf(1))
        }
    }
}

#[derive(Clone)]
pub struct TestAppState {
    pub db: Arc<Mutex<SqliteConnection>>,
    pub output_dir: PathBuf,
    pub public_base_url: Option<String>,
    pub truncate_renders: bool,
}

impl AppState for TestAppState {
    type Repo = SqliteNewsRepository;
    type Summary = StaticSummary;
    type Flipbook = StubFlipbook;
    type Renderer = TestRenderer;

    fn news_repo(&self) -> SqliteNewsRepository {
        SqliteNewsRepository::new(self.db.clone())
    }

    fn summary_provider(&self) -> StaticSummary {
        StaticSummary
    }

    fn flipbook_converter(&self) -> StubFlipbook {
        StubFlipbook
    }

    fn acquire_renderer(&self) -> Result<TestRenderer, ApiError> {
        Ok(TestRenderer {
            truncate: self.truncate_renders,
        })
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    fn public_base_url(&self) -> Option<String> {
        self.public_base_url.clone()
    }
}

pub struct TestContext {
    pub server: TestServer,
    pub db: Arc<Mutex<SqliteConnection>>,
    // Keeps the output directory alive for the duration of the test.
    pub output_dir: TempDir,
}

pub fn create_test_server() -> TestContext {
    create_test_server_with(|_| {})
}

pub fn create_test_server_with(configure: impl FnOnce(&mut TestAppState)) -> TestContext {
    let connection = establish_test_connection();
    let db = Arc::new(Mutex::new(connection));
    let output_dir = TempDir::new().expect("Failed to create temp output dir");

    let mut state = TestAppState {
        db: db.clone(),
        output_dir: output_dir.path().to_path_buf(),
        public_base_url: None,
        truncate_renders: false,
    };
    configure(&mut state);

    let app = routes::create_router().with_state(state);
    let server = TestServer::new(app).unwrap();

    TestContext {
        server,
        db,
        output_dir,
    }
}
