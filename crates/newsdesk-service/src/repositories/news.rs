use super::traits::{FeedSection, NewsFeed, NewsRepository, ReviewVerdict, Viewer};
use crate::errors::ApiError;
use crate::models::{NewNewsItem, NewsItem, NewsStatus, UserPriority};
use crate::schema::{news, user_priority};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use diesel::dsl::not;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::{Arc, Mutex};

/// Size of the Active pool: the top-priority slice of approved, unpublished,
/// due-dated news offered for immediate magazine inclusion.
pub const ACTIVE_POOL_SIZE: i64 = 25;

#[derive(Clone)]
pub struct SqliteNewsRepository {
    db: Arc<Mutex<SqliteConnection>>,
}

impl SqliteNewsRepository {
    pub fn new(db: Arc<Mutex<SqliteConnection>>) -> Self {
        Self { db }
    }

    /// The priority-ordered Active pool query.
    ///
    /// Inner join to `user_priority` means uploaders without a priority row
    /// are excluded here. That is documented behavior (see DESIGN.md), not
    /// an accident; the regression test in tests/selection.rs guards it.
    fn load_active(
        conn: &mut SqliteConnection,
        viewer: &Viewer,
        today: NaiveDate,
    ) -> Result<Vec<NewsItem>, ApiError> {
        let mut query = news::table
            .inner_join(user_priority::table.on(news::uploaded_by.eq(user_priority::user_id)))
            .filter(news::status.eq(NewsStatus::Approved.as_str()))
            .filter(news::date.le(today))
            .filter(news::is_published.eq(false))
            .order((
                user_priority::priority.asc(),
                news::date.asc(),
                news::priority_order.asc(),
                news::submitted_at.desc(),
            ))
            .limit(ACTIVE_POOL_SIZE)
            .select(NewsItem::as_select())
            .into_boxed();

        if let Viewer::Uploader(user) = viewer {
            query = query.filter(news::uploaded_by.eq(user.clone()));
        }

        Ok(query.load::<NewsItem>(conn)?)
    }

    fn load_upcoming(
        conn: &mut SqliteConnection,
        viewer: &Viewer,
        today: NaiveDate,
        active_ids: &[i32],
    ) -> Result<Vec<NewsItem>, ApiError> {
        let rows = match viewer {
            // Everything approved and unpublished that did not make the
            // Active cutoff, future-dated or not. The priority join applies
            // here too: uploaders without a priority row are absent from
            // both privileged pools.
            Viewer::Editor => news::table
                .inner_join(
                    user_priority::table.on(news::uploaded_by.eq(user_priority::user_id)),
                )
                .filter(news::status.eq(NewsStatus::Approved.as_str()))
                .filter(news::is_published.eq(false))
                .filter(not(news::id.eq_any(active_ids.to_vec())))
                .order(news::date.desc())
                .select(NewsItem::as_select())
                .load::<NewsItem>(conn)?,
            // Uploaders get a plain date filter with no priority join, so a
            // missing priority row never hides their own upcoming items.
            Viewer::Uploader(user) => news::table
                .filter(news::status.eq(NewsStatus::Approved.as_str()))
                .filter(news::is_published.eq(false))
                .filter(news::uploaded_by.eq(user.clone()))
                .filter(news::date.gt(today))
                .order(news::date.asc())
                .select(NewsItem::as_select())
                .load::<NewsItem>(conn)?,
        };
        Ok(rows)
    }

    fn load_published(
        conn: &mut SqliteConnection,
        viewer: &Viewer,
    ) -> Result<Vec<NewsItem>, ApiError> {
        let mut query = news::table
            .filter(news::status.eq(NewsStatus::Approved.as_str()))
            .filter(news::is_published.eq(true))
            .order(news::published_at.desc())
            .select(NewsItem::as_select())
            .into_boxed();

        if let Viewer::Uploader(user) = viewer {
            query = query.filter(news::uploaded_by.eq(user.clone()));
        }

        Ok(query.load::<NewsItem>(conn)?)
    }
}

#[async_trait]
impl NewsRepository for SqliteNewsRepository {
    async fn insert_batch(&self, items: Vec<NewNewsItem>) -> Result<Vec<NewsItem>, ApiError> {
        let mut conn = self.db.lock().unwrap();
        let mut inserted = Vec::with_capacity(items.len());
        for item in &items {
            let row = diesel::insert_into(news::table)
                .values(item)
                .returning(NewsItem::as_returning())
                .get_result::<NewsItem>(&mut *conn)?;
            inserted.push(row);
        }
        Ok(inserted)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<NewsItem>, ApiError> {
        let mut conn = self.db.lock().unwrap();
        let result = news::table
            .find(id)
            .select(NewsItem::as_select())
            .first::<NewsItem>(&mut *conn)
            .optional()?;
        Ok(result)
    }

    async fn review(
        &self,
        id: i32,
        verdict: &ReviewVerdict,
        reviewer: &str,
        now: NaiveDateTime,
    ) -> Result<(), ApiError> {
        let mut conn = self.db.lock().unwrap();

        // Only pending rows are eligible; decided rows stay decided.
        let target = news::table
            .find(id)
            .filter(news::status.eq(NewsStatus::Pending.as_str()));

        let affected = match verdict {
            ReviewVerdict::Approve => diesel::update(target)
                .set((
                    news::status.eq(NewsStatus::Approved.as_str()),
                    news::reviewed_at.eq(now),
                    news::reviewed_by.eq(reviewer),
                    news::rejected_reason.eq(None::<String>),
                ))
                .execute(&mut *conn)?,
            ReviewVerdict::Decline { reason } => diesel::update(target)
                .set((
                    news::status.eq(NewsStatus::Declined.as_str()),
                    news::reviewed_at.eq(now),
                    news::reviewed_by.eq(reviewer),
                    news::rejected_reason.eq(reason),
                ))
                .execute(&mut *conn)?,
        };

        if affected == 0 {
            let exists = news::table
                .find(id)
                .count()
                .get_result::<i64>(&mut *conn)?
                > 0;
            return Err(if exists {
                ApiError::AlreadyReviewed
            } else {
                ApiError::NotFound
            });
        }

        Ok(())
    }

    async fn retract(
        &self,
        id: i32,
        reason: &str,
        reviewer: &str,
        now: NaiveDateTime,
    ) -> Result<(), ApiError> {
        let mut conn = self.db.lock().unwrap();

        let affected = diesel::update(news::table.find(id))
            .set((
                news::status.eq(NewsStatus::Declined.as_str()),
                news::rejected_reason.eq(reason),
                news::reviewed_by.eq(reviewer),
                news::reviewed_at.eq(now),
            ))
            .execute(&mut *conn)?;

        if affected == 0 {
            return Err(ApiError::NotFound);
        }

        Ok(())
    }

    async fn feed(
        &self,
        viewer: &Viewer,
        section: FeedSection,
        today: NaiveDate,
    ) -> Result<NewsFeed, ApiError> {
        let mut conn = self.db.lock().unwrap();
        let conn = &mut *conn;

        // The editor's Upcoming pool is defined by exclusion from Active, so
        // Active has to be computed for that case as well.
        let needs_active = section.wants_active() || (section.wants_upcoming() && viewer.is_editor());

        let active_rows = if needs_active {
            Self::load_active(conn, viewer, today)?
        } else {
            Vec::new()
        };

        let upcoming = if section.wants_upcoming() {
            let active_ids: Vec<i32> = active_rows.iter().map(|n| n.id).collect();
            Self::load_upcoming(conn, viewer, today, &active_ids)?
        } else {
            Vec::new()
        };

        let published = if section.wants_published() {
            Self::load_published(conn, viewer)?
        } else {
            Vec::new()
        };

        let active = if section.wants_active() {
            active_rows
        } else {
            Vec::new()
        };

        Ok(NewsFeed {
            active,
            upcoming,
            published,
        })
    }

    async fn mark_published(&self, ids: &[i32], now: NaiveDateTime) -> Result<usize, ApiError> {
        let mut conn = self.db.lock().unwrap();

        // One batch write, filtered to not-yet-published rows so the count
        // reflects actual transitions and repeat calls are no-ops. Not a
        // transaction: a store error mid-statement leaves prior rows
        // published (accepted at-least-once semantics, see DESIGN.md).
        let affected = diesel::update(
            news::table
                .filter(news::id.eq_any(ids.to_vec()))
                .filter(news::is_published.eq(false)),
        )
        .set((news::is_published.eq(true), news::published_at.eq(now)))
        .execute(&mut *conn)?;

        Ok(affected)
    }

    async fn set_priority(&self, user_id: &str, priority: i32) -> Result<(), ApiError> {
        let mut conn = self.db.lock().unwrap();
        diesel::insert_into(user_priority::table)
            .values(&UserPriority {
                user_id: user_id.to_string(),
                priority,
            })
            .on_conflict(user_priority::user_id)
            .do_update()
            .set(user_priority::priority.eq(priority))
            .execute(&mut *conn)?;
        Ok(())
    }
}
