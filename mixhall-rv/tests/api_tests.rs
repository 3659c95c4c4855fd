//! HTTP surface tests
//!
//! Drives the router with tower's oneshot to cover request decoding,
//! status mapping, reviewer auth, and the queue endpoints.

mod helpers;

use helpers::{
    draft, get, post_json, post_json_as_reviewer, test_app, test_app_with_secret, test_pool,
};
use serde_json::{json, Value};

fn submit_body(title: &str, kind: &str, target: Option<&str>) -> Value {
    json!({
        "submitter_id": 7,
        "kind": kind,
        "target_display_id": target,
        "draft": serde_json::to_value(draft(title)).unwrap(),
    })
}

#[tokio::test]
async fn health_reports_module_and_version() {
    let app = test_app(test_pool().await);
    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "mixhall-rv");
}

#[tokio::test]
async fn submit_and_fetch_detail() {
    let app = test_app(test_pool().await);

    let (status, body) =
        post_json(&app, "/api/submissions", submit_body("Night Drive", "create", None)).await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "pending");
    let id = body["id"].as_i64().unwrap();
    let target = body["target_display_id"].as_str().unwrap().to_string();

    let (status, body) = get(&app, &format!("/api/submissions/{id}")).await;
    assert_eq!(status, 200);
    assert_eq!(body["target_display_id"], target.as_str());
    assert_eq!(body["payload"]["kind"], "create");
    assert_eq!(body["payload"]["title"], "Night Drive");
}

#[tokio::test]
async fn invalid_draft_is_bad_request() {
    let app = test_app(test_pool().await);

    let mut body = submit_body("", "create", None);
    body["draft"]["title"] = json!("");
    let (status, body) = post_json(&app, "/api/submissions", body).await;
    assert_eq!(status, 400, "{body}");
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn modify_unknown_target_is_not_found() {
    let app = test_app(test_pool().await);

    let (status, _) = post_json(
        &app,
        "/api/submissions",
        submit_body("Retitled", "modify", Some("MX-ZZZZ-999")),
    )
    .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn duplicate_pending_submission_conflicts() {
    let app = test_app(test_pool().await);

    let (status, _) = post_json(
        &app,
        "/api/submissions",
        submit_body("First", "create", Some("MX-ABCD-123")),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _) = post_json(
        &app,
        "/api/submissions",
        submit_body("Second", "create", Some("MX-ABCD-123")),
    )
    .await;
    assert_eq!(status, 409);
}

#[tokio::test]
async fn detail_for_unknown_submission_is_not_found() {
    let app = test_app(test_pool().await);
    let (status, _) = get(&app, "/api/submissions/9999").await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn approve_then_reject_maps_invalid_state() {
    let app = test_app(test_pool().await);

    let (_, body) =
        post_json(&app, "/api/submissions", submit_body("Night Drive", "create", None)).await;
    let id = body["id"].as_i64().unwrap();

    let (status, body) = post_json(
        &app,
        &format!("/api/submissions/{id}/approve"),
        json!({ "comment": "ship it" }),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "approved");
    assert!(body["review_time"].is_string());

    let (status, _) = post_json(
        &app,
        &format!("/api/submissions/{id}/reject"),
        json!({ "comment": "too late" }),
    )
    .await;
    assert_eq!(status, 409);
}

#[tokio::test]
async fn reject_without_comment_is_bad_request() {
    let app = test_app(test_pool().await);

    let (_, body) =
        post_json(&app, "/api/submissions", submit_body("Night Drive", "create", None)).await;
    let id = body["id"].as_i64().unwrap();

    let (status, _) = post_json(
        &app,
        &format!("/api/submissions/{id}/reject"),
        json!({ "comment": "" }),
    )
    .await;
    assert_eq!(status, 400);

    // An absent comment field gets the same answer as a blank one
    let (status, body) = post_json(&app, &format!("/api/submissions/{id}/reject"), json!({})).await;
    assert_eq!(status, 400);
    assert!(body["error"].is_string());

    let (status, body) = post_json(
        &app,
        &format!("/api/submissions/{id}/reject"),
        json!({ "comment": "missing source files" }),
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["review_comment"], "missing source files");
}

#[tokio::test]
async fn reviewer_routes_require_shared_secret() {
    let app = test_app_with_secret(test_pool().await, 424242);

    let (_, body) =
        post_json(&app, "/api/submissions", submit_body("Gated", "create", None)).await;
    let id = body["id"].as_i64().unwrap();

    // No header
    let (status, _) = post_json(&app, &format!("/api/submissions/{id}/approve"), json!({})).await;
    assert_eq!(status, 401);

    // Wrong secret
    let (status, _) = post_json_as_reviewer(
        &app,
        &format!("/api/submissions/{id}/approve"),
        json!({}),
        111,
    )
    .await;
    assert_eq!(status, 401);

    // Pending queue is reviewer-only too
    let (status, _) = get(&app, "/api/queue/pending").await;
    assert_eq!(status, 401);

    // Correct secret
    let (status, body) = post_json_as_reviewer(
        &app,
        &format!("/api/submissions/{id}/approve"),
        json!({}),
        424242,
    )
    .await;
    assert_eq!(status, 200, "{body}");
}

#[tokio::test]
async fn pending_queue_pages_oldest_first() {
    let app = test_app(test_pool().await);

    let mut ids = Vec::new();
    for title in ["One", "Two", "Three"] {
        let (status, body) =
            post_json(&app, "/api/submissions", submit_body(title, "create", None)).await;
        assert_eq!(status, 200);
        ids.push(body["id"].as_i64().unwrap());
    }

    let (status, page) = get(&app, "/api/queue/pending?limit=2").await;
    assert_eq!(status, 200);
    let entries = page["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"].as_i64().unwrap(), ids[0]);
    assert_eq!(entries[0]["title"], "One");
    assert_eq!(entries[1]["id"].as_i64().unwrap(), ids[1]);
    let cursor = page["next_cursor"].as_str().expect("full page carries a cursor");

    let (status, page) = get(
        &app,
        &format!("/api/queue/pending?limit=2&cursor={}", urlencode(cursor)),
    )
    .await;
    assert_eq!(status, 200);
    let entries = page["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"].as_i64().unwrap(), ids[2]);
    assert!(page["next_cursor"].is_null());
}

#[tokio::test]
async fn pending_cursor_is_stable_under_interleaved_inserts() {
    let app = test_app(test_pool().await);

    let mut ids = Vec::new();
    for title in ["One", "Two", "Three"] {
        let (_, body) =
            post_json(&app, "/api/submissions", submit_body(title, "create", None)).await;
        ids.push(body["id"].as_i64().unwrap());
    }

    let (status, page) = get(&app, "/api/queue/pending?limit=2").await;
    assert_eq!(status, 200);
    let cursor = page["next_cursor"].as_str().unwrap().to_string();

    // New submissions arrive between page fetches; they sort after the
    // existing rows and must not shift what the cursor points at
    let (_, body) = post_json(&app, "/api/submissions", submit_body("Four", "create", None)).await;
    ids.push(body["id"].as_i64().unwrap());

    let (status, page) = get(
        &app,
        &format!("/api/queue/pending?limit=2&cursor={}", urlencode(&cursor)),
    )
    .await;
    assert_eq!(status, 200);
    let entries = page["entries"].as_array().unwrap();
    let seen: Vec<i64> = entries.iter().map(|e| e["id"].as_i64().unwrap()).collect();
    // The original remainder first, then the newcomer; nothing skipped,
    // nothing repeated
    assert_eq!(seen, vec![ids[2], ids[3]]);

    let cursor = page["next_cursor"].as_str().unwrap().to_string();
    let (_, page) = get(
        &app,
        &format!("/api/queue/pending?limit=2&cursor={}", urlencode(&cursor)),
    )
    .await;
    assert!(page["entries"].as_array().unwrap().is_empty());
    assert!(page["next_cursor"].is_null());
}

#[tokio::test]
async fn malformed_cursor_is_bad_request() {
    let app = test_app(test_pool().await);
    let (status, _) = get(&app, "/api/queue/pending?cursor=not-a-cursor").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn history_is_scoped_to_the_submitter_newest_first() {
    let app = test_app(test_pool().await);

    let (_, first) =
        post_json(&app, "/api/submissions", submit_body("Mine", "create", None)).await;
    let (_, second) =
        post_json(&app, "/api/submissions", submit_body("Also mine", "create", None)).await;

    let mut other = submit_body("Not mine", "create", None);
    other["submitter_id"] = json!(8);
    post_json(&app, "/api/submissions", other).await;

    // Decide one so history mixes statuses
    let id = first["id"].as_i64().unwrap();
    post_json(
        &app,
        &format!("/api/submissions/{id}/reject"),
        json!({ "comment": "duplicate upload" }),
    )
    .await;

    let (status, page) = get(&app, "/api/queue/history?submitter_id=7").await;
    assert_eq!(status, 200);
    let entries = page["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["id"], second["id"]);
    assert_eq!(entries[0]["status"], "pending");
    assert_eq!(entries[1]["id"], first["id"]);
    assert_eq!(entries[1]["status"], "rejected");
    assert_eq!(entries[1]["review_comment"], "duplicate upload");
}

#[tokio::test]
async fn list_filters_by_status() {
    let app = test_app(test_pool().await);

    let (_, first) =
        post_json(&app, "/api/submissions", submit_body("Keep", "create", None)).await;
    post_json(&app, "/api/submissions", submit_body("Drop", "create", None)).await;

    let id = first["id"].as_i64().unwrap();
    post_json(&app, &format!("/api/submissions/{id}/approve"), json!({})).await;

    let (status, body) = get(&app, "/api/submissions?status=approved").await;
    assert_eq!(status, 200);
    assert_eq!(body["total"].as_i64().unwrap(), 1);
    assert_eq!(body["data"][0]["id"], first["id"]);
}

/// Percent-encode the characters a cursor can contain that are not
/// query-safe (the RFC 3339 timestamp carries `+` and `:`).
fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
