//! Magazine page templates and placeholder substitution.
//!
//! Pages render through fixed HTML templates with `{{TOKEN}}` placeholders
//! filled by plain text replacement. Page 1 always uses the masthead
//! template; later pages use the titled template when a section title is
//! present and the title-less template otherwise. Missing values substitute
//! the empty string.

use super::{PageEntry, PageSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTemplate {
    Masthead,
    Titled,
    Untitled,
}

/// Template selection policy: first page gets the masthead; afterwards the
/// section title alone decides.
pub fn template_for(position: usize, section_title: &str) -> PageTemplate {
    if position == 0 {
        PageTemplate::Masthead
    } else if section_title.trim().is_empty() {
        PageTemplate::Untitled
    } else {
        PageTemplate::Titled
    }
}

/// Render one logical page to a standalone HTML document.
pub fn render_page(
    page: &PageSpec,
    position: usize,
    issue_summary: &str,
    logo_src: &str,
) -> String {
    let template = template_for(position, &page.section_title);

    let mut html = match template {
        PageTemplate::Masthead => MASTHEAD_HTML,
        PageTemplate::Titled => TITLED_PAGE_HTML,
        PageTemplate::Untitled => UNTITLED_PAGE_HTML,
    }
    .replacen("{{PAGE_CSS}}", PAGE_CSS, 1);

    html = match template {
        PageTemplate::Masthead => html
            .replacen("{{ISSUE_NUMBER}}", &page.issue_number, 1)
            .replacen("{{ISSUE_DATE}}", &page.issue_date, 1)
            .replacen("{{LOGO_SRC}}", logo_src, 1)
            .replacen("{{ISSUE_SUMMARY}}", issue_summary, 1),
        PageTemplate::Titled => html
            .replacen("{{PAGE_NUMBER}}", &page.page_number, 1)
            .replacen("{{SECTION_TITLE}}", &page.section_title, 1),
        PageTemplate::Untitled => html.replacen("{{PAGE_NUMBER}}", &page.page_number, 1),
    };

    let entries: String = page
        .news
        .iter()
        .map(|entry| render_entry(template, entry))
        .collect();

    html = html.replacen("{{NEWS_ITEMS}}", &entries, 1);
    html
}

/// Render one news entry through the item template for `template`.
///
/// This is the single substitution point for every page kind; a titled-page
/// entry without a title drops the heading element instead of rendering an
/// empty one.
fn render_entry(template: PageTemplate, entry: &PageEntry) -> String {
    let item = match template {
        PageTemplate::Masthead => MASTHEAD_ITEM_HTML,
        PageTemplate::Titled | PageTemplate::Untitled => PAGE_ITEM_HTML,
    };

    let mut item = item.to_string();
    if template == PageTemplate::Titled && entry.title.trim().is_empty() {
        item = item.replacen("<div class=\"news-title\">{{NEWS_TITLE}}</div>\n", "", 1);
    }

    let image_alt = if entry.title.is_empty() {
        "News image"
    } else {
        &entry.title
    };

    item.replacen("{{NEWS_TITLE}}", &entry.title, 1)
        .replacen("{{NEWS_IMAGE_SRC}}", &entry.image, 1)
        .replacen("{{NEWS_IMAGE_ALT}}", image_alt, 1)
        .replacen("{{NEWS_DESCRIPTION}}", &entry.content, 1)
        .replacen("{{NEWS_REF}}", &entry.reference, 1)
}

const PAGE_CSS: &str = r#"
    body {
      margin: 0;
      padding: 0;
      font-family: "Times New Roman", Times, serif;
      background-color: #f9f9f9;
    }
    .content {
      padding: 22px;
    }
    .news-item {
      margin-bottom: 20px;
    }
    .news-title {
      font-size: 22px;
      font-weight: bold;
      color: #1d4e89;
      margin-bottom: 8px;
    }
    .news-row {
      display: flex;
      gap: 16px;
    }
    .news-text {
      font-size: 15px;
      flex: 2;
      text-align: justify;
      line-height: 1.5;
      color: #333;
    }
    .news-image {
      flex: 1;
      text-align: center;
    }
    .news-image img {
      width: 200px;
      border: 1.5px solid #b6b6b6;
    }
    .news-ref {
      display: block;
      font-size: 12px;
      color: #e96c2c;
      margin-top: 4px;
    }
"#;

const MASTHEAD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>The Daily Desk</title>
  <style>
    {{PAGE_CSS}}
    .header-bg {
      background: linear-gradient(90deg, #d4f3ee 0%, #f7fdfd 100%);
      border-bottom: 2px solid #c9e7e5;
      padding: 6px 0;
    }
    .header-row {
      display: flex;
      justify-content: space-between;
      align-items: flex-end;
      padding: 0 24px;
      font-size: 14px;
      color: #00795b;
      font-style: italic;
    }
    .header-title-row {
      display: flex;
      align-items: center;
      justify-content: center;
    }
    .header-title {
      font-size: 56px;
      font-style: italic;
      font-weight: bold;
      color: #2ca07a;
      letter-spacing: 1.5px;
    }
    .header-logo {
      width: 50px;
      margin: 0 12px;
    }
    .header-issue {
      background: #00795b;
      color: #fff;
      padding: 6px 18px;
      font-size: 15px;
      letter-spacing: 0.5px;
      text-align: center;
    }
  </style>
</head>
<body>
  <div class="header-bg">
    <div class="header-row">
      <span>Issue No: <span class="issue-number">{{ISSUE_NUMBER}}</span></span>
      <span class="issue-date">{{ISSUE_DATE}}</span>
    </div>
    <div class="header-title-row">
      <span class="header-title">The Daily</span>
      <img class="header-logo" src="{{LOGO_SRC}}" alt="Logo" />
      <span class="header-title">Desk</span>
    </div>
  </div>
  <div class="header-issue">INSIDE THE ISSUE: <span class="issue-summary">{{ISSUE_SUMMARY}}</span></div>
  <div class="content">
    {{NEWS_ITEMS}}
  </div>
</body>
</html>
"#;

const TITLED_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>The Daily Desk</title>
  <style>
    {{PAGE_CSS}}
    .page-number-box {
      float: right;
      border: 1.5px solid #2ca07a;
      color: #2ca07a;
      padding: 2px 10px;
      font-size: 14px;
      margin: 12px;
    }
    .section-title {
      font-size: 34px;
      font-weight: bold;
      font-style: italic;
      color: #2ca07a;
      text-align: center;
      border-bottom: 2px solid #c9e7e5;
      padding: 10px 0;
    }
  </style>
</head>
<body>
  <div class="page-number-box">{{PAGE_NUMBER}}</div>
  <div class="section-title">{{SECTION_TITLE}}</div>
  <div class="content">
    {{NEWS_ITEMS}}
  </div>
</body>
</html>
"#;

const UNTITLED_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>The Daily Desk</title>
  <style>
    {{PAGE_CSS}}
    .page-number-box {
      float: right;
      border: 1.5px solid #2ca07a;
      color: #2ca07a;
      padding: 2px 10px;
      font-size: 14px;
      margin: 12px;
    }
  </style>
</head>
<body>
  <div class="page-number-box">{{PAGE_NUMBER}}</div>
  <div class="content">
    {{NEWS_ITEMS}}
  </div>
</body>
</html>
"#;

const MASTHEAD_ITEM_HTML: &str = r#"<div class="news-item">
<div class="news-title">{{NEWS_TITLE}}</div>
<div class="news-row">
  <div class="news-text">{{NEWS_DESCRIPTION}}<span class="news-ref">{{NEWS_REF}}</span></div>
  <div class="news-image"><img src="{{NEWS_IMAGE_SRC}}" alt="News image" /></div>
</div>
</div>
"#;

const PAGE_ITEM_HTML: &str = r#"<div class="news-item">
<div class="news-title">{{NEWS_TITLE}}</div>
<div class="news-row">
  <div class="news-image"><img src="{{NEWS_IMAGE_SRC}}" alt="{{NEWS_IMAGE_ALT}}" /></div>
  <div class="news-text">{{NEWS_DESCRIPTION}}<span class="news-ref">{{NEWS_REF}}</span></div>
</div>
</div>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str) -> PageEntry {
        PageEntry {
            id: Some(1),
            title: title.to_string(),
            image: "https://example.com/a.jpg".to_string(),
            content: "Body text".to_string(),
            reference: "Ref 1".to_string(),
        }
    }

    fn page(section_title: &str, entries: Vec<PageEntry>) -> PageSpec {
        PageSpec {
            issue_number: "42".to_string(),
            issue_date: "2026-03-14".to_string(),
            section_title: section_title.to_string(),
            page_number: "2".to_string(),
            news: entries,
        }
    }

    #[test]
    fn test_first_page_is_always_masthead() {
        assert_eq!(template_for(0, "Sports"), PageTemplate::Masthead);
        assert_eq!(template_for(0, ""), PageTemplate::Masthead);
    }

    #[test]
    fn test_later_pages_select_by_section_title() {
        assert_eq!(template_for(1, "Sports"), PageTemplate::Titled);
        assert_eq!(template_for(1, ""), PageTemplate::Untitled);
        assert_eq!(template_for(3, "   "), PageTemplate::Untitled);
    }

    #[test]
    fn test_masthead_substitutes_header_fields() {
        let html = render_page(&page("", vec![entry("Big win")]), 0, "A | B", "/logo.png");
        assert!(html.contains("42"));
        assert!(html.contains("2026-03-14"));
        assert!(html.contains("A | B"));
        assert!(html.contains("/logo.png"));
        assert!(html.contains("Big win"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_titled_page_substitutes_section_title() {
        let html = render_page(&page("Sports", vec![entry("Final score")]), 1, "", "");
        assert!(html.contains("Sports"));
        assert!(html.contains("Final score"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_untitled_page_has_no_section_title_block() {
        let html = render_page(&page("", vec![entry("Item")]), 2, "", "");
        assert!(!html.contains("section-title"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_missing_values_render_as_empty_strings() {
        let bare = PageEntry {
            id: None,
            title: String::new(),
            image: String::new(),
            content: String::new(),
            reference: String::new(),
        };
        let html = render_page(&page("Sports", vec![bare]), 1, "", "");
        assert!(!html.contains("{{"));
        assert!(!html.contains("null"));
        assert!(!html.contains("undefined"));
    }

    #[test]
    fn test_titled_page_drops_empty_title_heading() {
        let bare = entry("");
        let html = render_page(&page("Sports", vec![bare]), 1, "", "");
        // The section heading stays; the per-item heading is removed.
        assert!(!html.contains("<div class=\"news-title\">"));
    }

    #[test]
    fn test_entries_render_in_order() {
        let html = render_page(
            &page("Sports", vec![entry("First"), entry("Second")]),
            1,
            "",
            "",
        );
        let first = html.find("First").unwrap();
        let second = html.find("Second").unwrap();
        assert!(first < second);
    }
}
