//! Magazine composition pipeline: curated pages → HTML → per-page PDFs →
//! one merged, date-stamped document.

pub mod assemble;
pub mod output;
pub mod render;
pub mod templates;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::ApiError;
use render::PageRenderer;

/// One news entry placed on a magazine page by the editor. The `id` links
/// back to the stored item so the finalizer can mark it published; entries
/// without an id (ad-hoc content) render but are not finalized.
#[derive(Debug, Clone, Deserialize)]
pub struct PageEntry {
    pub id: Option<i32>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub reference: String,
}

/// An editor-curated logical page. Page 1 carries the issue header fields;
/// later pages carry a page number and an optional section title.
#[derive(Debug, Clone, Deserialize)]
pub struct PageSpec {
    #[serde(default)]
    pub issue_number: String,
    #[serde(default)]
    pub issue_date: String,
    #[serde(default)]
    pub section_title: String,
    #[serde(default)]
    pub page_number: String,
    #[serde(default)]
    pub news: Vec<PageEntry>,
}

#[derive(Debug, Clone)]
pub struct MagazineArtifacts {
    pub filename: String,
    pub pdf_path: PathBuf,
    pub page_count: usize,
}

/// Ids of every stored news item placed anywhere in the magazine.
pub fn placed_ids(pages: &[PageSpec]) -> Vec<i32> {
    pages
        .iter()
        .flat_map(|page| page.news.iter())
        .filter_map(|entry| entry.id)
        .collect()
}

/// Compose, render, check, and merge a magazine.
///
/// Each page becomes one HTML file and one intermediate PDF under
/// `out_dir`. HTML files are kept afterwards for inspection; intermediate
/// PDFs are deleted once the merge succeeds. Blocking work; callers on the
/// async runtime wrap this in `spawn_blocking`.
pub fn compose_magazine(
    pages: &[PageSpec],
    issue_summary: &str,
    logo_src: &str,
    renderer: &dyn PageRenderer,
    out_dir: &Path,
    today: chrono::NaiveDate,
) -> Result<MagazineArtifacts, ApiError> {
    if pages.is_empty() {
        return Err(ApiError::BadRequest(
            "at least one page is required".to_string(),
        ));
    }

    std::fs::create_dir_all(out_dir)?;

    let mut page_pdfs: Vec<Vec<u8>> = Vec::with_capacity(pages.len());
    let mut intermediates: Vec<PathBuf> = Vec::with_capacity(pages.len());

    for (position, page) in pages.iter().enumerate() {
        let number = position + 1;
        let html = templates::render_page(page, position, issue_summary, logo_src);

        let html_path = out_dir.join(format!("page_{number:02}.html"));
        std::fs::write(&html_path, &html)?;

        debug!(page = number, path = %html_path.display(), "Rendering magazine page");
        let pdf = renderer.render_pdf(&html_path)?;
        assemble::check_pdf_signature(&pdf, &format!("page {number} render"))?;

        let pdf_path = out_dir.join(format!("page_{number:02}.pdf"));
        std::fs::write(&pdf_path, &pdf)?;
        intermediates.push(pdf_path);
        page_pdfs.push(pdf);
    }

    let merged = assemble::merge_pdfs(&page_pdfs)?;
    let page_count = assemble::page_count(&merged)?;

    let filename = output::magazine_filename(today);
    let pdf_path = out_dir.join(&filename);
    std::fs::write(&pdf_path, &merged)?;

    // Intermediate PDFs go after a successful merge; the HTML sources stay.
    for path in intermediates {
        let _ = std::fs::remove_file(path);
    }

    info!(
        filename,
        pages = pages.len(),
        page_count,
        "Magazine assembled"
    );

    Ok(MagazineArtifacts {
        filename,
        pdf_path,
        page_count,
    })
}
