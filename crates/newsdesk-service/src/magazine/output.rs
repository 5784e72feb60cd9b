//! Output-directory conventions for generated magazines.

use std::path::Path;

use chrono::NaiveDate;

use crate::errors::ApiError;

/// Deterministic, date-stamped magazine filename. Re-generating on the same
/// day overwrites the same file.
pub fn magazine_filename(date: NaiveDate) -> String {
    format!("DailyDesk_{date}.pdf")
}

/// Filenames of every previously generated magazine, sorted. A missing
/// output directory just means nothing has been generated yet.
pub fn list_generated_pdfs(dir: &Path) -> Result<Vec<String>, ApiError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    let mut pdfs: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".pdf"))
        .collect();
    pdfs.sort();
    Ok(pdfs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_is_date_stamped() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        assert_eq!(magazine_filename(date), "DailyDesk_2026-03-14.pdf");
    }

    #[test]
    fn test_listing_missing_directory_is_empty() {
        let dir = std::env::temp_dir().join("newsdesk-does-not-exist");
        assert!(list_generated_pdfs(&dir).unwrap().is_empty());
    }

    #[test]
    fn test_listing_filters_and_sorts_pdfs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("DailyDesk_2026-03-15.pdf"), b"%PDF-").unwrap();
        std::fs::write(dir.path().join("DailyDesk_2026-03-14.pdf"), b"%PDF-").unwrap();
        std::fs::write(dir.path().join("page_01.html"), b"<html>").unwrap();

        let pdfs = list_generated_pdfs(dir.path()).unwrap();
        assert_eq!(
            pdfs,
            vec!["DailyDesk_2026-03-14.pdf", "DailyDesk_2026-03-15.pdf"]
        );
    }
}
