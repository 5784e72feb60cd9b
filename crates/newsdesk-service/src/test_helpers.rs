use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn establish_test_connection() -> SqliteConnection {
    let mut connection =
        SqliteConnection::establish(":memory:").expect("Failed to create in-memory database");

    connection
        .run_pending_migrations(MIGRATIONS)
        .expect("Failed to run migrations");

    connection
}

pub mod test_utils {
    use super::*;
    use crate::models::NewsItem;
    use crate::schema::{news, user_priority};

    /// Row template for seeding the `news` table directly.
    pub struct NewsSeed<'a> {
        pub title: &'a str,
        pub uploaded_by: &'a str,
        pub status: &'a str,
        pub date: NaiveDate,
        pub submitted_at: NaiveDateTime,
        pub priority_order: i32,
        pub is_published: bool,
        pub published_at: Option<NaiveDateTime>,
    }

    impl Default for NewsSeed<'_> {
        fn default() -> Self {
            let date = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
            NewsSeed {
                title: "Seeded item",
                uploaded_by: "alice",
                status: "approved",
                date,
                submitted_at: date.and_hms_opt(9, 0, 0).unwrap(),
                priority_order: 0,
                is_published: false,
                published_at: None,
            }
        }
    }

    pub fn seed_news(conn: &mut SqliteConnection, seed: &NewsSeed) -> i32 {
        diesel::insert_into(news::table)
            .values((
                news::date.eq(seed.date),
                news::title.eq(seed.title),
                news::content.eq(""),
                news::category.eq("other"),
                news::uploaded_by.eq(seed.uploaded_by),
                news::status.eq(seed.status),
                news::submitted_at.eq(seed.submitted_at),
                news::is_published.eq(seed.is_published),
                news::published_at.eq(seed.published_at),
                news::priority_order.eq(seed.priority_order),
            ))
            .returning(news::id)
            .get_result(conn)
            .expect("Failed to seed news item")
    }

    pub fn seed_priority(conn: &mut SqliteConnection, user_id: &str, priority: i32) {
        diesel::insert_into(user_priority::table)
            .values((
                user_priority::user_id.eq(user_id),
                user_priority::priority.eq(priority),
            ))
            .execute(conn)
            .expect("Failed to seed user priority");
    }

    pub fn get_news_by_id(conn: &mut SqliteConnection, id: i32) -> NewsItem {
        news::table
            .find(id)
            .select(NewsItem::as_select())
            .first(conn)
            .expect("Failed to load news item")
    }

    pub fn count_news(conn: &mut SqliteConnection) -> i64 {
        news::table
            .count()
            .get_result(conn)
            .expect("Failed to count news items")
    }
}

pub mod pdf {
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};

    /// A small but structurally complete PDF with the given page count.
    pub fn minimal_pdf(page_count: usize) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::with_capacity(page_count);
        for index in 0..page_count {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::string_literal(format!("Page {}", index + 1))],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("failed to encode test page content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as u32,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .expect("failed to serialize test PDF");
        buffer
    }
}

pub use pdf::minimal_pdf;

pub mod renderers {
    use std::path::Path;

    use crate::errors::ApiError;
    use crate::magazine::render::PageRenderer;

    /// Renderer that emits a valid single-page PDF for every page.
    #[derive(Default)]
    pub struct StubRenderer;

    impl PageRenderer for StubRenderer {
        fn render_pdf(&self, _html_path: &Path) -> Result<Vec<u8>, ApiError> {
            Ok(super::minimal_pdf(1))
        }
    }

    /// Renderer that emits a truncated file, for integrity-failure tests.
    pub struct TruncatingRenderer;

    impl PageRenderer for TruncatingRenderer {
        fn render_pdf(&self, _html_path: &Path) -> Result<Vec<u8>, ApiError> {
            Ok(b"%PD".to_vec())
        }
    }
}

pub use renderers::{StubRenderer, TruncatingRenderer};
