//! Submission and review workflow over the HTTP surface.

mod common;

use common::create_test_server;
use http::StatusCode;
use serde_json::{Value, json};

use newsdesk_service::test_helpers::test_utils::{NewsSeed, count_news, get_news_by_id, seed_news};

#[tokio::test]
async fn editor_submissions_are_approved_immediately() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/v1/news")
        .json(&json!({
            "uploaded_by": "admin",
            "entries": [
                { "title": "Campus expansion announced" },
                { "title": "Robotics team wins", "category": "event" },
            ],
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r["status"] == "approved"));
    assert_eq!(results[1]["category"], "event");

    let mut conn = ctx.db.lock().unwrap();
    assert_eq!(count_news(&mut conn), 2);
}

#[tokio::test]
async fn regular_submissions_start_pending() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/v1/news")
        .json(&json!({
            "uploaded_by": "alice",
            "entries": [{ "title": "Library hours extended", "content": "Details inside." }],
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["results"][0]["status"], "pending");
}

#[tokio::test]
async fn submission_reports_which_entry_is_missing_a_title() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/v1/news")
        .json(&json!({
            "uploaded_by": "alice",
            "entries": [
                { "title": "Fine" },
                { "content": "No title here" },
            ],
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("entry #2"));

    // Per-entry validation rejects the whole batch.
    let mut conn = ctx.db.lock().unwrap();
    assert_eq!(count_news(&mut conn), 0);
}

#[tokio::test]
async fn submission_requires_uploader_and_entries() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/v1/news")
        .json(&json!({ "entries": [{ "title": "No uploader" }] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = ctx
        .server
        .post("/api/v1/news")
        .json(&json!({ "uploaded_by": "alice", "entries": [] }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submission_rejects_unknown_category() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/v1/news")
        .json(&json!({
            "uploaded_by": "alice",
            "entries": [{ "title": "Ok title", "category": "gossip" }],
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("gossip"));
}

#[tokio::test]
async fn submission_stores_inline_image() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/v1/news")
        .json(&json!({
            "uploaded_by": "alice",
            "entries": [{
                "title": "With photo",
                "image": "data:image/jpeg;base64,aGVsbG8=",
            }],
        }))
        .await;

    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    let id = body["results"][0]["id"].as_i64().unwrap() as i32;

    let item = ctx
        .server
        .get(&format!("/api/v1/news/{id}"))
        .await
        .json::<Value>();
    assert!(
        item["image"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,")
    );
}

#[tokio::test]
async fn declining_requires_a_reason() {
    let ctx = create_test_server();
    let id = {
        let mut conn = ctx.db.lock().unwrap();
        seed_news(
            &mut conn,
            &NewsSeed {
                status: "pending",
                ..Default::default()
            },
        )
    };

    let response = ctx
        .server
        .post(&format!("/api/v1/news/{id}/review"))
        .json(&json!({ "status": "declined", "reviewed_by": "admin" }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);

    let mut conn = ctx.db.lock().unwrap();
    assert_eq!(get_news_by_id(&mut conn, id).status, "pending");
}

#[tokio::test]
async fn declining_with_reason_persists_review_fields() {
    let ctx = create_test_server();
    let id = {
        let mut conn = ctx.db.lock().unwrap();
        seed_news(
            &mut conn,
            &NewsSeed {
                status: "pending",
                ..Default::default()
            },
        )
    };

    let response = ctx
        .server
        .post(&format!("/api/v1/news/{id}/review"))
        .json(&json!({
            "status": "declined",
            "reviewed_by": "admin",
            "rejected_reason": "duplicate of an earlier item",
        }))
        .await;

    response.assert_status(StatusCode::OK);

    let mut conn = ctx.db.lock().unwrap();
    let item = get_news_by_id(&mut conn, id);
    assert_eq!(item.status, "declined");
    assert_eq!(
        item.rejected_reason.as_deref(),
        Some("duplicate of an earlier item")
    );
    assert_eq!(item.reviewed_by.as_deref(), Some("admin"));
    assert!(item.reviewed_at.is_some());
}

#[tokio::test]
async fn approving_makes_item_eligible_in_place() {
    let ctx = create_test_server();
    let id = {
        let mut conn = ctx.db.lock().unwrap();
        seed_news(
            &mut conn,
            &NewsSeed {
                status: "pending",
                ..Default::default()
            },
        )
    };

    let response = ctx
        .server
        .post(&format!("/api/v1/news/{id}/review"))
        .json(&json!({ "status": "approved", "reviewed_by": "admin" }))
        .await;
    response.assert_status(StatusCode::OK);

    let mut conn = ctx.db.lock().unwrap();
    let item = get_news_by_id(&mut conn, id);
    assert_eq!(item.status, "approved");
    // Approval mutates in place; no second row appears.
    assert_eq!(count_news(&mut conn), 1);
}

#[tokio::test]
async fn reviewing_a_decided_item_conflicts() {
    let ctx = create_test_server();
    let id = {
        let mut conn = ctx.db.lock().unwrap();
        seed_news(
            &mut conn,
            &NewsSeed {
                status: "pending",
                ..Default::default()
            },
        )
    };

    ctx.server
        .post(&format!("/api/v1/news/{id}/review"))
        .json(&json!({ "status": "approved", "reviewed_by": "admin" }))
        .await
        .assert_status(StatusCode::OK);

    let response = ctx
        .server
        .post(&format!("/api/v1/news/{id}/review"))
        .json(&json!({
            "status": "declined",
            "reviewed_by": "admin",
            "rejected_reason": "changed my mind",
        }))
        .await;

    response.assert_status(StatusCode::CONFLICT);

    let mut conn = ctx.db.lock().unwrap();
    assert_eq!(get_news_by_id(&mut conn, id).status, "approved");
}

#[tokio::test]
async fn reviewing_unknown_id_is_not_found() {
    let ctx = create_test_server();

    let response = ctx
        .server
        .post("/api/v1/news/9999/review")
        .json(&json!({ "status": "approved", "reviewed_by": "admin" }))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn retraction_declines_an_approved_item() {
    let ctx = create_test_server();
    let id = {
        let mut conn = ctx.db.lock().unwrap();
        seed_news(&mut conn, &NewsSeed::default())
    };

    let response = ctx
        .server
        .post(&format!("/api/v1/news/{id}/retract"))
        .json(&json!({ "reason": "source asked for removal", "reviewed_by": "admin" }))
        .await;
    response.assert_status(StatusCode::OK);

    let mut conn = ctx.db.lock().unwrap();
    let item = get_news_by_id(&mut conn, id);
    assert_eq!(item.status, "declined");
    assert_eq!(
        item.rejected_reason.as_deref(),
        Some("source asked for removal")
    );
    // The row survives; retraction is a status write, not a delete.
    assert_eq!(count_news(&mut conn), 1);
}

#[tokio::test]
async fn retraction_requires_reason_and_existing_row() {
    let ctx = create_test_server();
    let id = {
        let mut conn = ctx.db.lock().unwrap();
        seed_news(&mut conn, &NewsSeed::default())
    };

    ctx.server
        .post(&format!("/api/v1/news/{id}/retract"))
        .json(&json!({ "reviewed_by": "admin" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    ctx.server
        .post("/api/v1/news/4242/retract")
        .json(&json!({ "reason": "gone", "reviewed_by": "admin" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn priority_upsert_overwrites_existing_rank() {
    let ctx = create_test_server();

    ctx.server
        .put("/api/v1/priority")
        .json(&json!({ "user_id": "alice", "priority": 2 }))
        .await
        .assert_status(StatusCode::OK);

    ctx.server
        .put("/api/v1/priority")
        .json(&json!({ "user_id": "alice", "priority": 1 }))
        .await
        .assert_status(StatusCode::OK);

    // The new rank takes effect in the feed ordering.
    let mut conn = ctx.db.lock().unwrap();
    seed_news(&mut conn, &NewsSeed::default());
    drop(conn);

    let feed: Value = ctx
        .server
        .get("/api/v1/feed")
        .add_query_param("user_id", "admin")
        .await
        .json();
    assert_eq!(feed["active"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn fetching_unknown_news_is_not_found() {
    let ctx = create_test_server();
    ctx.server
        .get("/api/v1/news/77")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
