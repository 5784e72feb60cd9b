use axum::{
    Router,
    extract::{Json, Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::AppState;
use crate::errors::ApiError;
use crate::flipbook::{self, FlipbookConverter};
use crate::magazine::{self, PageSpec, output};
use crate::models::{NewNewsItem, NewsItem, NewsStatus};
use crate::repositories::{FeedSection, NewsRepository, ReviewVerdict, Viewer};
use crate::summary::SummaryProvider;
use crate::validation::{self, ValidationError};

const MAGAZINE_TITLE: &str = "The Daily Desk";

#[derive(Debug, Deserialize)]
struct SubmitEntry {
    title: Option<String>,
    content: Option<String>,
    category: Option<String>,
    /// Optional inline image as a `data:image/...;base64,` URI.
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    uploaded_by: Option<String>,
    #[serde(default)]
    entries: Vec<SubmitEntry>,
}

#[derive(Debug, Serialize)]
struct SubmittedEntry {
    id: i32,
    title: String,
    status: String,
    category: String,
}

#[derive(Debug, Serialize)]
struct SubmitResponse {
    message: String,
    results: Vec<SubmittedEntry>,
}

#[instrument(skip_all, fields(entry_count = payload.entries.len(), uploaded_by = ?payload.uploaded_by))]
async fn submit_news<S: AppState>(
    State(state): State<S>,
    Json(payload): Json<SubmitRequest>,
) -> Result<ResponseJson<SubmitResponse>, ApiError> {
    debug!("Processing news submission");

    let uploaded_by = payload
        .uploaded_by
        .filter(|s| !s.trim().is_empty())
        .ok_or(ValidationError::MissingUploader)?;

    if payload.entries.is_empty() {
        return Err(ValidationError::NoEntries.into());
    }

    // Editor submissions skip review; everyone else starts pending.
    let viewer = Viewer::resolve(&uploaded_by);
    let status = if viewer.is_editor() {
        NewsStatus::Approved
    } else {
        NewsStatus::Pending
    };

    let now = Utc::now().naive_utc();
    let today = now.date();

    let mut items = Vec::with_capacity(payload.entries.len());
    for (index, entry) in payload.entries.iter().enumerate() {
        let item = NewNewsItem::new(
            index + 1,
            entry.title.clone().unwrap_or_default(),
            entry.content.clone(),
            entry.category.as_deref(),
            entry.image.as_deref(),
            uploaded_by.clone(),
            status,
            today,
            now,
        )?;
        items.push(item);
    }

    let inserted = state.news_repo().insert_batch(items).await?;

    let message = match status {
        NewsStatus::Approved => format!("{} entries added to the news feed", inserted.len()),
        _ => format!("{} entries submitted for review", inserted.len()),
    };

    info!(count = inserted.len(), status = %status, "News submission stored");

    let results = inserted
        .into_iter()
        .map(|item| SubmittedEntry {
            id: item.id,
            title: item.title,
            status: item.status,
            category: item.category,
        })
        .collect();

    Ok(ResponseJson(SubmitResponse { message, results }))
}

/// News item as surfaced to clients: the stored image blob becomes a
/// `data:` URI.
#[derive(Debug, Serialize)]
struct NewsItemView {
    id: i32,
    date: NaiveDate,
    title: String,
    content: String,
    image: Option<String>,
    category: String,
    uploaded_by: String,
    status: String,
    submitted_at: NaiveDateTime,
    reviewed_at: Option<NaiveDateTime>,
    reviewed_by: Option<String>,
    rejected_reason: Option<String>,
    is_published: bool,
    published_at: Option<NaiveDateTime>,
    priority_order: i32,
}

impl From<NewsItem> for NewsItemView {
    fn from(item: NewsItem) -> Self {
        let image = item.image_data_uri();
        NewsItemView {
            id: item.id,
            date: item.date,
            title: item.title,
            content: item.content,
            image,
            category: item.category,
            uploaded_by: item.uploaded_by,
            status: item.status,
            submitted_at: item.submitted_at,
            reviewed_at: item.reviewed_at,
            reviewed_by: item.reviewed_by,
            rejected_reason: item.rejected_reason,
            is_published: item.is_published,
            published_at: item.published_at,
            priority_order: item.priority_order,
        }
    }
}

#[instrument(skip_all, fields(id = %id))]
async fn get_news_by_id<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
) -> Result<ResponseJson<NewsItemView>, ApiError> {
    debug!("Processing get news by ID request");

    match state.news_repo().find_by_id(id).await? {
        Some(item) => {
            info!(id = item.id, "Retrieved news item");
            Ok(ResponseJson(item.into()))
        }
        None => {
            debug!("News item not found");
            Err(ApiError::NotFound)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReviewRequest {
    status: String,
    reviewed_by: Option<String>,
    rejected_reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

#[instrument(skip_all, fields(id = %id, status = %payload.status))]
async fn review_news<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
    Json(payload): Json<ReviewRequest>,
) -> Result<ResponseJson<MessageResponse>, ApiError> {
    debug!("Processing review request");

    let reviewer = payload
        .reviewed_by
        .filter(|s| !s.trim().is_empty())
        .ok_or(ValidationError::MissingReviewer)?;

    let verdict = match payload.status.parse::<NewsStatus>()? {
        NewsStatus::Approved => ReviewVerdict::Approve,
        NewsStatus::Declined => ReviewVerdict::Decline {
            reason: validation::require_rejection_reason(payload.rejected_reason.as_deref())?,
        },
        NewsStatus::Pending => {
            return Err(ValidationError::InvalidStatus("pending".to_string()).into());
        }
    };

    let now = Utc::now().naive_utc();
    state.news_repo().review(id, &verdict, &reviewer, now).await?;

    let message = match verdict {
        ReviewVerdict::Approve => "News approved successfully".to_string(),
        ReviewVerdict::Decline { .. } => "News declined successfully".to_string(),
    };
    info!(id, "Review applied");

    Ok(ResponseJson(MessageResponse { message }))
}

#[derive(Debug, Deserialize)]
struct RetractRequest {
    reason: Option<String>,
    reviewed_by: Option<String>,
}

#[instrument(skip_all, fields(id = %id))]
async fn retract_news<S: AppState>(
    State(state): State<S>,
    Path(id): Path<i32>,
    Json(payload): Json<RetractRequest>,
) -> Result<ResponseJson<MessageResponse>, ApiError> {
    debug!("Processing retract request");

    let reviewer = payload
        .reviewed_by
        .filter(|s| !s.trim().is_empty())
        .ok_or(ValidationError::MissingReviewer)?;
    let reason = validation::require_rejection_reason(payload.reason.as_deref())?;

    let now = Utc::now().naive_utc();
    state.news_repo().retract(id, &reason, &reviewer, now).await?;

    info!(id, "News item retracted");

    Ok(ResponseJson(MessageResponse {
        message: "News item retracted".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct PriorityRequest {
    user_id: String,
    priority: i32,
}

#[instrument(skip_all, fields(user_id = %payload.user_id, priority = payload.priority))]
async fn set_priority<S: AppState>(
    State(state): State<S>,
    Json(payload): Json<PriorityRequest>,
) -> Result<ResponseJson<MessageResponse>, ApiError> {
    if payload.user_id.trim().is_empty() {
        return Err(ValidationError::MissingUploader.into());
    }

    state
        .news_repo()
        .set_priority(&payload.user_id, payload.priority)
        .await?;

    Ok(ResponseJson(MessageResponse {
        message: "Priority updated".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
struct FeedQuery {
    user_id: String,
    #[serde(default)]
    section: FeedSection,
}

#[derive(Debug, Serialize)]
struct FeedResponse {
    active: Vec<NewsItemView>,
    upcoming: Vec<NewsItemView>,
    published: Vec<NewsItemView>,
    total: usize,
}

#[instrument(skip_all, fields(user_id = %query.user_id, section = ?query.section))]
async fn get_feed<S: AppState>(
    State(state): State<S>,
    Query(query): Query<FeedQuery>,
) -> Result<ResponseJson<FeedResponse>, ApiError> {
    debug!("Processing feed request");

    let viewer = Viewer::resolve(&query.user_id);
    let today = Utc::now().date_naive();

    let feed = state.news_repo().feed(&viewer, query.section, today).await?;

    let active: Vec<NewsItemView> = feed.active.into_iter().map(Into::into).collect();
    let upcoming: Vec<NewsItemView> = feed.upcoming.into_iter().map(Into::into).collect();
    let published: Vec<NewsItemView> = feed.published.into_iter().map(Into::into).collect();
    let total = active.len() + upcoming.len() + published.len();

    info!(
        active = active.len(),
        upcoming = upcoming.len(),
        published = published.len(),
        "Feed computed"
    );

    Ok(ResponseJson(FeedResponse {
        active,
        upcoming,
        published,
        total,
    }))
}

#[derive(Debug, Deserialize)]
struct GenerateMagazineRequest {
    #[serde(default)]
    pages: Vec<PageSpec>,
}

#[derive(Debug, Serialize)]
struct GenerateMagazineResponse {
    message: String,
    filename: String,
    pdf_url: String,
    page_count: usize,
    published_count: usize,
}

#[instrument(skip_all, fields(page_count = payload.pages.len()))]
async fn generate_magazine<S: AppState>(
    State(state): State<S>,
    Json(payload): Json<GenerateMagazineRequest>,
) -> Result<ResponseJson<GenerateMagazineResponse>, ApiError> {
    debug!("Processing magazine generation request");

    if payload.pages.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one page is required".to_string(),
        ));
    }

    let repo = state.news_repo();
    let today = Utc::now().date_naive();

    // The masthead summary comes from the current Active pool. Any failure
    // here degrades to an empty summary; it never fails the run.
    let titles = match repo.feed(&Viewer::Editor, FeedSection::Active, today).await {
        Ok(feed) => feed.active.into_iter().map(|item| item.title).collect(),
        Err(err) => {
            warn!(error = %err, "Could not load active titles for summary");
            Vec::new()
        }
    };
    let issue_summary = match state.summary_provider().issue_summary(&titles).await {
        Ok(summary) => summary,
        Err(err) => {
            warn!(error = %err, "Summary provider failed, continuing with empty summary");
            String::new()
        }
    };

    // One rendering session per request; dropped with the closure on every
    // exit path. Rendering and merging are blocking, so they run off the
    // async runtime.
    let renderer = state.acquire_renderer()?;
    let out_dir = state.output_dir();
    let logo_src = state.logo_src();
    let pages = payload.pages.clone();

    let artifacts = tokio::task::spawn_blocking(move || {
        magazine::compose_magazine(&pages, &issue_summary, &logo_src, &renderer, &out_dir, today)
    })
    .await
    .map_err(|err| {
        warn!(error = %err, "Magazine compose task panicked");
        ApiError::Internal
    })??;

    let placed = magazine::placed_ids(&payload.pages);
    let published_count = if placed.is_empty() {
        0
    } else {
        repo.mark_published(&placed, Utc::now().naive_utc()).await?
    };

    info!(
        filename = %artifacts.filename,
        pages = artifacts.page_count,
        published_count,
        "Magazine generated"
    );

    let pdf_url = match state.public_base_url() {
        Some(base) => format!(
            "{}/generated_pdfs/{}",
            base.trim_end_matches('/'),
            artifacts.filename
        ),
        None => format!("/generated_pdfs/{}", artifacts.filename),
    };

    Ok(ResponseJson(GenerateMagazineResponse {
        message: "Magazine generated successfully".to_string(),
        filename: artifacts.filename,
        pdf_url,
        page_count: artifacts.page_count,
        published_count,
    }))
}

#[derive(Debug, Serialize)]
struct ListMagazinesResponse {
    pdfs: Vec<String>,
}

#[instrument(skip_all)]
async fn list_magazines<S: AppState>(
    State(state): State<S>,
) -> Result<ResponseJson<ListMagazinesResponse>, ApiError> {
    let pdfs = output::list_generated_pdfs(&state.output_dir())?;
    Ok(ResponseJson(ListMagazinesResponse { pdfs }))
}

#[derive(Debug, Deserialize)]
struct FlipbookRequest {
    filename: String,
}

#[instrument(skip_all, fields(filename = %payload.filename))]
async fn convert_flipbook<S: AppState>(
    State(state): State<S>,
    Json(payload): Json<FlipbookRequest>,
) -> Result<ResponseJson<flipbook::FlipbookConversion>, ApiError> {
    debug!("Processing flipbook conversion request");

    validation::validate_pdf_filename(&payload.filename)?;
    let pdf_path = state.output_dir().join(&payload.filename);

    let public_url = flipbook::resolve_public_url(
        &pdf_path,
        &payload.filename,
        state.public_base_url().as_deref(),
    )
    .await?;

    let conversion = state
        .flipbook_converter()
        .convert(&public_url, MAGAZINE_TITLE)
        .await?;

    Ok(ResponseJson(conversion))
}

pub fn create_api_v1_router<S: AppState>() -> Router<S> {
    Router::new()
        .route("/news", post(submit_news::<S>))
        .route("/news/{id}", get(get_news_by_id::<S>))
        .route("/news/{id}/review", post(review_news::<S>))
        .route("/news/{id}/retract", post(retract_news::<S>))
        .route("/priority", put(set_priority::<S>))
        .route("/feed", get(get_feed::<S>))
        .route(
            "/magazine",
            post(generate_magazine::<S>).get(list_magazines::<S>),
        )
        .route("/magazine/flipbook", post(convert_flipbook::<S>))
}
