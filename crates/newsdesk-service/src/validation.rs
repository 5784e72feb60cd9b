use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing required field 'title' in entry #{0}")]
    MissingTitle(usize),
    #[error("entries list cannot be empty")]
    NoEntries,
    #[error("missing required field 'uploaded_by'")]
    MissingUploader,
    #[error("missing required field 'reviewed_by'")]
    MissingReviewer,
    #[error("invalid status value: {0}")]
    InvalidStatus(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("rejection reason is required when declining")]
    MissingRejectionReason,
    #[error("invalid image data: {0}")]
    InvalidImage(String),
    #[error("invalid filename: {0}")]
    InvalidFilename(String),
}

/// Decode a `data:image/...;base64,` URI into raw bytes.
///
/// Submissions carry images inline as data URIs; anything without the
/// expected prefix or with an undecodable payload is rejected.
pub fn decode_image_data_uri(uri: &str) -> Result<Vec<u8>, ValidationError> {
    if !uri.starts_with("data:image") {
        return Err(ValidationError::InvalidImage(
            "expected a data:image/... URI".to_string(),
        ));
    }

    let payload = uri
        .split_once(',')
        .map(|(_, data)| data)
        .ok_or_else(|| ValidationError::InvalidImage("missing base64 payload".to_string()))?;

    BASE64
        .decode(payload)
        .map_err(|err| ValidationError::InvalidImage(err.to_string()))
}

/// Encode a stored image blob as a `data:` URI for feed responses.
pub fn encode_image_data_uri(bytes: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64.encode(bytes))
}

/// A decline must carry a non-empty reason.
pub fn require_rejection_reason(reason: Option<&str>) -> Result<String, ValidationError> {
    match reason {
        Some(r) if !r.trim().is_empty() => Ok(r.to_string()),
        _ => Err(ValidationError::MissingRejectionReason),
    }
}

/// Generated-PDF filenames arrive from clients; reject anything that could
/// escape the output directory.
pub fn validate_pdf_filename(name: &str) -> Result<(), ValidationError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || !name.ends_with(".pdf")
    {
        return Err(ValidationError::InvalidFilename(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_image_data_uri() {
        let uri = format!("data:image/png;base64,{}", BASE64.encode(b"fake-png"));
        assert_eq!(decode_image_data_uri(&uri).unwrap(), b"fake-png");
    }

    #[test]
    fn test_decode_rejects_non_image_uri() {
        assert!(matches!(
            decode_image_data_uri("data:text/plain;base64,aGk="),
            Err(ValidationError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_decode_rejects_missing_payload() {
        assert!(matches!(
            decode_image_data_uri("data:image/png;base64"),
            Err(ValidationError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        assert!(matches!(
            decode_image_data_uri("data:image/png;base64,!!!"),
            Err(ValidationError::InvalidImage(_))
        ));
    }

    #[test]
    fn test_encode_round_trip() {
        let uri = encode_image_data_uri(b"bytes");
        assert_eq!(decode_image_data_uri(&uri).unwrap(), b"bytes");
    }

    #[test]
    fn test_rejection_reason_required() {
        assert!(require_rejection_reason(None).is_err());
        assert!(require_rejection_reason(Some("  ")).is_err());
        assert_eq!(
            require_rejection_reason(Some("duplicate item")).unwrap(),
            "duplicate item"
        );
    }

    #[test]
    fn test_pdf_filename_rejects_traversal() {
        assert!(validate_pdf_filename("../etc/passwd").is_err());
        assert!(validate_pdf_filename("dir/file.pdf").is_err());
        assert!(validate_pdf_filename("notes.txt").is_err());
        assert!(validate_pdf_filename("").is_err());
        assert!(validate_pdf_filename("DailyDesk_2026-03-14.pdf").is_ok());
    }
}
