use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::validation::{self, ValidationError};

/// Review lifecycle of a news item. Stored as lowercase text in the `news`
/// table; converted at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewsStatus {
    Pending,
    Approved,
    Declined,
}

impl NewsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsStatus::Pending => "pending",
            NewsStatus::Approved => "approved",
            NewsStatus::Declined => "declined",
        }
    }
}

impl fmt::Display for NewsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NewsStatus::Pending),
            "approved" => Ok(NewsStatus::Approved),
            "declined" => Ok(NewsStatus::Declined),
            other => Err(ValidationError::InvalidStatus(other.to_string())),
        }
    }
}

/// Submission categories. Unknown strings are rejected at the boundary
/// rather than stored as free text; a missing category defaults to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsCategory {
    Placement,
    Certification,
    Training,
    Outreach,
    Event,
    Other,
}

impl NewsCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Placement => "placement",
            NewsCategory::Certification => "certification",
            NewsCategory::Training => "training",
            NewsCategory::Outreach => "outreach",
            NewsCategory::Event => "event",
            NewsCategory::Other => "other",
        }
    }
}

impl Default for NewsCategory {
    fn default() -> Self {
        NewsCategory::Other
    }
}

impl fmt::Display for NewsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewsCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "placement" => Ok(NewsCategory::Placement),
            "certification" => Ok(NewsCategory::Certification),
            "training" => Ok(NewsCategory::Training),
            "outreach" => Ok(NewsCategory::Outreach),
            "event" => Ok(NewsCategory::Event),
            "other" => Ok(NewsCategory::Other),
            other => Err(ValidationError::UnknownCategory(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = crate::schema::news)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct NewsItem {
    pub id: i32,
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing)]
    pub image: Option<Vec<u8>>,
    pub category: String,
    pub uploaded_by: String,
    pub status: String,
    pub submitted_at: NaiveDateTime,
    pub reviewed_at: Option<NaiveDateTime>,
    pub reviewed_by: Option<String>,
    pub rejected_reason: Option<String>,
    pub is_published: bool,
    pub published_at: Option<NaiveDateTime>,
    pub priority_order: i32,
}

impl NewsItem {
    /// Stored image blob as a `data:` URI for feed responses, if present.
    pub fn image_data_uri(&self) -> Option<String> {
        self.image
            .as_deref()
            .map(validation::encode_image_data_uri)
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::news)]
pub struct NewNewsItem {
    pub date: NaiveDate,
    pub title: String,
    pub content: String,
    pub image: Option<Vec<u8>>,
    pub category: String,
    pub uploaded_by: String,
    pub status: String,
    pub submitted_at: NaiveDateTime,
}

impl NewNewsItem {
    /// Build a validated row for one submitted entry. `index` is the
    /// 1-based position within the submission batch, used so the caller can
    /// see which entry failed.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        index: usize,
        title: String,
        content: Option<String>,
        category: Option<&str>,
        image_data_uri: Option<&str>,
        uploaded_by: String,
        status: NewsStatus,
        date: NaiveDate,
        submitted_at: NaiveDateTime,
    ) -> Result<Self, ValidationError> {
        if title.trim().is_empty() {
            return Err(ValidationError::MissingTitle(index));
        }

        let category = match category {
            Some(raw) if !raw.trim().is_empty() => raw.parse::<NewsCategory>()?,
            _ => NewsCategory::default(),
        };

        let image = image_data_uri
            .filter(|s| !s.is_empty())
            .map(validation::decode_image_data_uri)
            .transpose()?;

        Ok(NewNewsItem {
            date,
            title,
            content: content.unwrap_or_default(),
            image,
            category: category.to_string(),
            uploaded_by,
            status: status.to_string(),
            submitted_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable, Serialize)]
#[diesel(table_name = crate::schema::user_priority)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserPriority {
    pub user_id: String,
    pub priority: i32,
}
