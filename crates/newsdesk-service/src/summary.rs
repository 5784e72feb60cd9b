//! "Inside this issue" summary line for the magazine masthead.
//!
//! The production provider calls a generative-text API with the Active-pool
//! titles and asks for a `Topic | Topic | Topic` line. The response is
//! untrusted free text and goes through [`sanitize_summary`]; any provider
//! failure degrades to a keyword summary derived from the titles, never an
//! error surfaced to the magazine pipeline.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::errors::ApiError;

/// Summary used when there is no active news to summarize.
pub const EMPTY_POOL_SUMMARY: &str = "Latest News | Updates";

/// Summary used when no usable keywords can be extracted from titles.
const FALLBACK_SUMMARY: &str = "Latest News | Updates | Announcements";

const GENERATE_TIMEOUT: Duration = Duration::from_secs(15);

const SYSTEM_PROMPT: &str = "You are a newspaper editor creating a concise issue summary. \
Given the news titles, generate 3-5 main topics in exactly this format: \
<Topic 1> | <Topic 2> | <Topic 3> | <Topic 4>. \
Each topic should be 1-3 words only, covering major news themes. \
Don't include any explanations or additional text, just the topics in the format above. \
The topics will be used as the \"INSIDE THE ISSUE:\" header.";

#[async_trait]
pub trait SummaryProvider: Clone + Send + Sync + 'static {
    /// Produce the masthead summary line for the given Active-pool titles.
    /// Implementations must not block indefinitely and should degrade
    /// internally rather than fail the magazine run.
    async fn issue_summary(&self, titles: &[String]) -> Result<String, ApiError>;
}

/// Gemini-backed provider.
#[derive(Clone)]
pub struct GeminiSummaryClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GeminiSummaryClient {
    pub const DEFAULT_ENDPOINT: &'static str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

    pub fn new(api_key: String) -> Result<Self, ApiError> {
        Self::with_endpoint(api_key, Self::DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(GENERATE_TIMEOUT)
            .build()
            .map_err(|err| ApiError::upstream("summary", err.to_string()))?;

        Ok(Self {
            http,
            api_key,
            endpoint,
        })
    }

    async fn generate(&self, titles: &[String]) -> Result<String, ApiError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": [{ "parts": [{ "text": serde_json::to_string(titles).unwrap_or_default() }] }],
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| ApiError::upstream("summary", err.to_string()))?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ApiError::upstream("summary", err.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::upstream_with_detail(
                "summary",
                format!("generate request returned {status}"),
                payload,
            ));
        }

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                ApiError::upstream_with_detail(
                    "summary",
                    "no completion text in response",
                    payload.clone(),
                )
            })?;

        Ok(text.to_string())
    }
}

#[async_trait]
impl SummaryProvider for GeminiSummaryClient {
    async fn issue_summary(&self, titles: &[String]) -> Result<String, ApiError> {
        if titles.is_empty() {
            return Ok(EMPTY_POOL_SUMMARY.to_string());
        }

        match self.generate(titles).await {
            Ok(raw) => Ok(sanitize_summary(&raw)),
            Err(err) => {
                warn!(error = %err, "Summary generation failed, using keyword fallback");
                Ok(fallback_summary(titles))
            }
        }
    }
}

/// Reduce a free-text completion to a single topic line.
///
/// Takes the first `|`-containing line of a multi-line response and strips
/// any echoed "INSIDE THE ISSUE:" header, case-insensitively.
pub fn sanitize_summary(raw: &str) -> String {
    let mut summary = raw.trim().to_string();

    if summary.contains('\n') {
        for line in summary.split('\n') {
            if line.contains('|') {
                summary = line.trim().to_string();
                break;
            }
        }
    }

    // ASCII-only uppercasing keeps byte offsets aligned with `summary`.
    let upper = summary.to_ascii_uppercase();
    if let Some(pos) = upper.find("INSIDE THE ISSUE:") {
        let after = pos + "INSIDE THE ISSUE:".len();
        summary = summary[after..].trim().to_string();
    }

    summary
}

/// Keyword summary built from titles when the provider is unavailable:
/// up to four distinctive words, joined the same way the provider's output
/// would be.
pub fn fallback_summary(titles: &[String]) -> String {
    const COMMON_WORDS: &[&str] = &[
        "the", "and", "for", "with", "that", "this", "from", "have", "has", "been", "news",
        "today", "latest",
    ];

    let mut topics: Vec<String> = Vec::new();
    'outer: for title in titles {
        for word in title.split_whitespace() {
            let cleaned = word.trim_matches(|c: char| !c.is_alphanumeric());
            if cleaned.len() > 4
                && !COMMON_WORDS.contains(&cleaned.to_lowercase().as_str())
                && !topics.iter().any(|t| t.eq_ignore_ascii_case(cleaned))
            {
                topics.push(cleaned.to_string());
                if topics.len() >= 4 {
                    break 'outer;
                }
            }
        }
    }

    if topics.is_empty() {
        FALLBACK_SUMMARY.to_string()
    } else {
        topics.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_plain_topic_line() {
        assert_eq!(
            sanitize_summary("Robotics | Placements | Sports"),
            "Robotics | Placements | Sports"
        );
    }

    #[test]
    fn test_sanitize_extracts_pipe_line_from_prose() {
        let raw = "Here are the topics you asked for:\nRobotics | Placements | Sports\nHope that helps!";
        assert_eq!(sanitize_summary(raw), "Robotics | Placements | Sports");
    }

    #[test]
    fn test_sanitize_strips_echoed_header() {
        assert_eq!(
            sanitize_summary("INSIDE THE ISSUE: Robotics | Sports"),
            "Robotics | Sports"
        );
        assert_eq!(
            sanitize_summary("Inside the Issue: Robotics | Sports"),
            "Robotics | Sports"
        );
    }

    #[test]
    fn test_fallback_picks_distinctive_words() {
        let titles = vec![
            "Robotics team wins national title".to_string(),
            "Placement drive results announced".to_string(),
        ];
        let summary = fallback_summary(&titles);
        assert!(summary.contains("Robotics"));
        assert!(summary.contains('|'));
        assert!(summary.split(" | ").count() <= 4);
    }

    #[test]
    fn test_fallback_skips_common_words() {
        let titles = vec!["Today the latest news from campus".to_string()];
        let summary = fallback_summary(&titles);
        assert!(!summary.to_lowercase().contains("today"));
        assert!(!summary.to_lowercase().contains("latest"));
    }

    #[test]
    fn test_fallback_default_when_no_keywords() {
        let titles = vec!["the and for".to_string()];
        assert_eq!(fallback_summary(&titles), FALLBACK_SUMMARY);
    }
}
