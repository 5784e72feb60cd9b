use crate::errors::ApiError;
use crate::models::{NewNewsItem, NewsItem};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

/// Who is looking at the feed. The privileged editor sees the global pools;
/// an uploader sees only their own items.
///
/// Role resolution happens in exactly one place so the privileged check is
/// explicit rather than scattered string comparisons. Real identity
/// verification is out of scope; the resolved role is still derived from a
/// client-supplied identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Editor,
    Uploader(String),
}

impl Viewer {
    pub const EDITOR_ID: &'static str = "admin";

    pub fn resolve(user_id: &str) -> Self {
        if user_id == Self::EDITOR_ID {
            Viewer::Editor
        } else {
            Viewer::Uploader(user_id.to_string())
        }
    }

    pub fn is_editor(&self) -> bool {
        matches!(self, Viewer::Editor)
    }
}

/// Which feed partitions a request wants computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedSection {
    All,
    Active,
    Upcoming,
    Published,
}

impl Default for FeedSection {
    fn default() -> Self {
        FeedSection::All
    }
}

impl FeedSection {
    pub fn wants_active(&self) -> bool {
        matches!(self, FeedSection::All | FeedSection::Active)
    }

    pub fn wants_upcoming(&self) -> bool {
        matches!(self, FeedSection::All | FeedSection::Upcoming)
    }

    pub fn wants_published(&self) -> bool {
        matches!(self, FeedSection::All | FeedSection::Published)
    }
}

/// The three disjoint partitions of a viewer's news.
#[derive(Debug, Clone, Default)]
pub struct NewsFeed {
    pub active: Vec<NewsItem>,
    pub upcoming: Vec<NewsItem>,
    pub published: Vec<NewsItem>,
}

/// Outcome of a review. Declining always carries a reason; the type makes a
/// reasonless decline unrepresentable past the validation boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewVerdict {
    Approve,
    Decline { reason: String },
}

#[async_trait]
pub trait NewsRepository: Clone + Send + Sync + 'static {
    async fn insert_batch(&self, items: Vec<NewNewsItem>) -> Result<Vec<NewsItem>, ApiError>;

    async fn find_by_id(&self, id: i32) -> Result<Option<NewsItem>, ApiError>;

    /// Apply a review verdict to a pending item. Items that were already
    /// approved or declined are not re-reviewed.
    async fn review(
        &self,
        id: i32,
        verdict: &ReviewVerdict,
        reviewer: &str,
        now: NaiveDateTime,
    ) -> Result<(), ApiError>;

    /// Decline an item regardless of its current status. Models retraction;
    /// rows are never physically deleted.
    async fn retract(
        &self,
        id: i32,
        reason: &str,
        reviewer: &str,
        now: NaiveDateTime,
    ) -> Result<(), ApiError>;

    /// Compute the Active/Upcoming/Published partitions for a viewer as of
    /// `today`. `today` is always passed in so callers (and tests) pin it.
    async fn feed(
        &self,
        viewer: &Viewer,
        section: FeedSection,
        today: NaiveDate,
    ) -> Result<NewsFeed, ApiError>;

    /// Mark the given ids as published. Returns the number of rows actually
    /// updated; ids that are already published are skipped, so re-invocation
    /// is a no-op that reports 0.
    async fn mark_published(&self, ids: &[i32], now: NaiveDateTime) -> Result<usize, ApiError>;

    /// Upsert an uploader's ranking priority (lower = higher priority).
    async fn set_priority(&self, user_id: &str, priority: i32) -> Result<(), ApiError>;
}
