//! HTML-to-PDF rendering boundary.
//!
//! The production renderer drives a headless Chrome session. One session is
//! acquired per magazine-generation request and closed when the renderer is
//! dropped, on every exit path, so OS-level browser processes never leak.

use std::path::Path;

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};

use crate::errors::ApiError;

/// Renders a standalone HTML file to PDF bytes.
///
/// Rendering is blocking; callers on the async runtime run the whole
/// compose step under `spawn_blocking`.
pub trait PageRenderer: Send {
    fn render_pdf(&self, html_path: &Path) -> Result<Vec<u8>, ApiError>;
}

/// A4 portrait, backgrounds printed, no margins. Paper size is in inches.
fn a4_options() -> PrintToPdfOptions {
    PrintToPdfOptions {
        print_background: Some(true),
        paper_width: Some(8.27),
        paper_height: Some(11.69),
        margin_top: Some(0.0),
        margin_bottom: Some(0.0),
        margin_left: Some(0.0),
        margin_right: Some(0.0),
        ..Default::default()
    }
}

pub struct ChromeRenderer {
    browser: Browser,
}

impl ChromeRenderer {
    /// Launch a headless browser session. The session lives for one
    /// magazine request; dropping the renderer closes the browser.
    pub fn launch() -> Result<Self, ApiError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .build()
            .map_err(|err| ApiError::upstream("renderer", err.to_string()))?;

        let browser =
            Browser::new(options).map_err(|err| ApiError::upstream("renderer", err.to_string()))?;

        Ok(Self { browser })
    }
}

impl PageRenderer for ChromeRenderer {
    fn render_pdf(&self, html_path: &Path) -> Result<Vec<u8>, ApiError> {
        let absolute = html_path
            .canonicalize()
            .map_err(|err| ApiError::upstream("renderer", format!("{}: {err}", html_path.display())))?;
        let url = format!("file://{}", absolute.display());

        let tab = self
            .browser
            .new_tab()
            .map_err(|err| ApiError::upstream("renderer", err.to_string()))?;

        let pdf = tab
            .navigate_to(&url)
            .and_then(|tab| tab.wait_until_navigated())
            .and_then(|tab| tab.print_to_pdf(Some(a4_options())))
            .map_err(|err| ApiError::upstream("renderer", err.to_string()));

        // Close the tab regardless of the render outcome.
        let _ = tab.close(true);

        pdf
    }
}
