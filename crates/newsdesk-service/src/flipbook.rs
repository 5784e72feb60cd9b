//! Flipbook conversion boundary.
//!
//! A finished magazine PDF is handed to a third-party page-turn viewer
//! service. The service fetches the PDF itself, so the file must be
//! reachable over the public internet: either under the configured public
//! base URL, or — when no base URL is configured — uploaded to a public
//! temporary-file host first.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ApiError;
use crate::magazine::assemble;

const CONVERT_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Smallest plausible magazine PDF; anything below this is treated as a
/// truncated render.
const MIN_PDF_SIZE: u64 = 100;

const TEMP_HOST_URL: &str = "https://file.io";

#[derive(Debug, Clone, Serialize)]
pub struct FlipbookConversion {
    pub flipbook_url: String,
    pub thumbnail: Option<String>,
    pub source_pdf: String,
}

#[async_trait]
pub trait FlipbookConverter: Clone + Send + Sync + 'static {
    /// Convert a publicly reachable PDF into a flipbook viewer URL.
    async fn convert(&self, pdf_url: &str, title: &str) -> Result<FlipbookConversion, ApiError>;
}

#[derive(Debug, Serialize)]
struct ConversionRequest<'a> {
    pdf: &'a str,
    client_id: &'a str,
    title: &'a str,
    prev_next: bool,
    show_info: bool,
    format: &'a str,
    quality: &'a str,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct ConversionResponse {
    success: Option<bool>,
    code: Option<serde_json::Value>,
    msg: Option<String>,
    url: Option<String>,
    thumbnail: Option<String>,
}

/// Client for the hosted conversion API.
#[derive(Clone)]
pub struct HeyzineClient {
    http: reqwest::Client,
    endpoint: String,
    client_id: String,
    api_key: String,
}

impl HeyzineClient {
    pub const DEFAULT_ENDPOINT: &'static str = "https://heyzine.com/api1/rest";

    pub fn new(client_id: String, api_key: String) -> Result<Self, ApiError> {
        Self::with_endpoint(client_id, api_key, Self::DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_endpoint(
        client_id: String,
        api_key: String,
        endpoint: String,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(CONVERT_TIMEOUT)
            .build()
            .map_err(|err| ApiError::upstream("flipbook", err.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            client_id,
            api_key,
        })
    }
}

#[async_trait]
impl FlipbookConverter for HeyzineClient {
    async fn convert(&self, pdf_url: &str, title: &str) -> Result<FlipbookConversion, ApiError> {
        let request = ConversionRequest {
            pdf: pdf_url,
            client_id: &self.client_id,
            title,
            prev_next: true,
            show_info: true,
            format: "html5",
            quality: "high",
            width: 1000,
            height: 700,
        };

        debug!(pdf_url, "Requesting flipbook conversion");

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|err| ApiError::upstream("flipbook", err.to_string()))?;

        let status = response.status();
        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|err| ApiError::upstream("flipbook", err.to_string()))?;

        if !status.is_success() {
            return Err(ApiError::upstream_with_detail(
                "flipbook",
                format!("conversion request returned {status}"),
                payload,
            ));
        }

        let parsed: ConversionResponse = serde_json::from_value(payload.clone())
            .map_err(|err| ApiError::upstream_with_detail("flipbook", err.to_string(), payload.clone()))?;

        if parsed.success == Some(false) {
            let code = parsed
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let msg = parsed.msg.unwrap_or_else(|| "no message".to_string());
            return Err(ApiError::upstream_with_detail(
                "flipbook",
                format!("conversion rejected ({code}): {msg}"),
                payload,
            ));
        }

        let flipbook_url = parsed.url.ok_or_else(|| {
            ApiError::upstream_with_detail(
                "flipbook",
                "viewer URL missing from conversion response",
                payload.clone(),
            )
        })?;

        info!(flipbook_url, "Flipbook conversion complete");

        Ok(FlipbookConversion {
            flipbook_url,
            thumbnail: parsed.thumbnail,
            source_pdf: pdf_url.to_string(),
        })
    }
}

/// Validate a local magazine PDF before handing it to the converter:
/// it must exist, be at least [`MIN_PDF_SIZE`] bytes, and carry the PDF
/// signature.
pub fn validate_local_pdf(path: &Path) -> Result<(), ApiError> {
    let metadata = std::fs::metadata(path).map_err(|_| ApiError::NotFound)?;
    if metadata.len() < MIN_PDF_SIZE {
        return Err(ApiError::Integrity(format!(
            "{} is suspiciously small ({} bytes)",
            path.display(),
            metadata.len()
        )));
    }

    let bytes = std::fs::read(path)
        .map_err(|err| ApiError::Integrity(format!("{}: {err}", path.display())))?;
    assemble::check_pdf_signature(&bytes, &path.display().to_string())
}

/// Resolve a public URL for a generated PDF.
///
/// When a public base URL is configured the file is addressable directly;
/// otherwise fall back to uploading it to a temporary-file host and use the
/// returned link.
pub async fn resolve_public_url(
    path: &Path,
    filename: &str,
    public_base_url: Option<&str>,
) -> Result<String, ApiError> {
    validate_local_pdf(path)?;

    if let Some(base) = public_base_url {
        let base = url::Url::parse(base)
            .map_err(|err| ApiError::BadRequest(format!("invalid public base URL: {err}")))?;
        let joined = base
            .join(&format!("generated_pdfs/{filename}"))
            .map_err(|err| ApiError::BadRequest(format!("invalid public base URL: {err}")))?;
        return Ok(joined.to_string());
    }

    upload_to_temp_host(path, filename).await
}

#[derive(Debug, Deserialize)]
struct TempHostResponse {
    success: Option<bool>,
    link: Option<String>,
}

async fn upload_to_temp_host(path: &Path, filename: &str) -> Result<String, ApiError> {
    debug!(file = %path.display(), "No public base URL, uploading PDF to temporary host");

    let bytes = std::fs::read(path)
        .map_err(|err| ApiError::upstream("temp-host", format!("read {}: {err}", path.display())))?;

    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str("application/pdf")
        .map_err(|err| ApiError::upstream("temp-host", err.to_string()))?;
    let form = reqwest::multipart::Form::new().part("file", part);

    let client = reqwest::Client::builder()
        .timeout(UPLOAD_TIMEOUT)
        .build()
        .map_err(|err| ApiError::upstream("temp-host", err.to_string()))?;

    let response = client
        .post(TEMP_HOST_URL)
        .multipart(form)
        .send()
        .await
        .map_err(|err| ApiError::upstream("temp-host", err.to_string()))?;

    let status = response.status();
    let payload: serde_json::Value = response
        .json()
        .await
        .map_err(|err| ApiError::upstream("temp-host", err.to_string()))?;

    if !status.is_success() {
        return Err(ApiError::upstream_with_detail(
            "temp-host",
            format!("upload returned {status}"),
            payload,
        ));
    }

    let parsed: TempHostResponse = serde_json::from_value(payload.clone())
        .map_err(|err| ApiError::upstream_with_detail("temp-host", err.to_string(), payload.clone()))?;

    if parsed.success != Some(true) {
        return Err(ApiError::upstream_with_detail(
            "temp-host",
            "temporary upload was not accepted",
            payload,
        ));
    }

    parsed.link.ok_or_else(|| {
        ApiError::upstream_with_detail("temp-host", "upload link missing from response", payload)
    })
}
