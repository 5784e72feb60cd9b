use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::Router;
use diesel::sqlite::SqliteConnection;

pub mod config;
pub mod errors;
pub mod flipbook;
pub mod magazine;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod schema;
pub mod shutdown;
pub mod summary;
pub mod validation;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

use errors::ApiError;
use flipbook::{FlipbookConverter, HeyzineClient};
use magazine::render::{ChromeRenderer, PageRenderer};
use repositories::{NewsRepository, SqliteNewsRepository};
use summary::{GeminiSummaryClient, SummaryProvider};

/// Collaborator seams for the request handlers.
///
/// Tests implement this with an in-memory store, a stub renderer, and
/// canned summary/flipbook providers; production wires the real clients in
/// [`DefaultAppState`].
pub trait AppState: Clone + Send + Sync + 'static {
    type Repo: NewsRepository;
    type Summary: SummaryProvider;
    type Flipbook: FlipbookConverter;
    type Renderer: PageRenderer + 'static;

    fn news_repo(&self) -> Self::Repo;
    fn summary_provider(&self) -> Self::Summary;
    fn flipbook_converter(&self) -> Self::Flipbook;

    /// Acquire a fresh rendering session for one magazine request. The
    /// session is dropped (and the underlying browser closed) when the
    /// request finishes, on every exit path.
    fn acquire_renderer(&self) -> Result<Self::Renderer, ApiError>;

    fn output_dir(&self) -> PathBuf;
    fn public_base_url(&self) -> Option<String>;

    fn logo_src(&self) -> String {
        self.public_base_url()
            .map(|base| format!("{}/uploads/logo.png", base.trim_end_matches('/')))
            .unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct DefaultAppState {
    db: Arc<Mutex<SqliteConnection>>,
    summary: GeminiSummaryClient,
    flipbook: HeyzineClient,
    output_dir: PathBuf,
    public_base_url: Option<String>,
}

impl DefaultAppState {
    pub fn new(db: Arc<Mutex<SqliteConnection>>, config: &config::Config) -> Result<Self, ApiError> {
        let summary = GeminiSummaryClient::new(config.gemini_api_key.clone().unwrap_or_default())?;
        let flipbook = HeyzineClient::new(
            config.flipbook_client_id.clone().unwrap_or_default(),
            config.flipbook_api_key.clone().unwrap_or_default(),
        )?;

        Ok(DefaultAppState {
            db,
            summary,
            flipbook,
            output_dir: config.output_dir.clone(),
            public_base_url: config.public_base_url.clone(),
        })
    }
}

impl AppState for DefaultAppState {
    type Repo = SqliteNewsRepository;
    type Summary = GeminiSummaryClient;
    type Flipbook = HeyzineClient;
    type Renderer = ChromeRenderer;

    fn news_repo(&self) -> SqliteNewsRepository {
        SqliteNewsRepository::new(self.db.clone())
    }

    fn summary_provider(&self) -> GeminiSummaryClient {
        self.summary.clone()
    }

    fn flipbook_converter(&self) -> HeyzineClient {
        self.flipbook.clone()
    }

    fn acquire_renderer(&self) -> Result<ChromeRenderer, ApiError> {
        ChromeRenderer::launch()
    }

    fn output_dir(&self) -> PathBuf {
        self.output_dir.clone()
    }

    fn public_base_url(&self) -> Option<String> {
        self.public_base_url.clone()
    }
}

pub fn create_app(state: DefaultAppState) -> Router {
    routes::create_router().with_state(state)
}
