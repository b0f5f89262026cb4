// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /, GET /health
// - POST /analyze/text (ok, too short, X-ML-Used header)
// - GET /report/{id}, POST /report/{id}/flag
// - debug routes only when enabled

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use credibility_scorer::analyze::ml_adapter::MockProvider;
use credibility_scorer::analyze::{CredibilityEngine, MlSignalAdapter};
use credibility_scorer::api::{self, AppState};
use credibility_scorer::domain_trust::DomainTrustTable;
use credibility_scorer::patterns::PatternLibrary;
use credibility_scorer::reports::InMemoryReportStore;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

fn router_with(engine: CredibilityEngine, debug_routes: bool) -> Router {
    let state = AppState::new(engine, Arc::new(InMemoryReportStore::with_capacity(100)), 10);
    api::create_router(state, debug_routes)
}

/// Same routes the binary serves, default tables, ML disabled.
fn test_router() -> Router {
    router_with(CredibilityEngine::with_defaults(), false)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, shuttle_axum::axum::http::HeaderMap, Json) {
    let resp = app.clone().oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Json::Null)
    };
    (status, headers, v)
}

fn post_json(uri: &str, payload: Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

#[tokio::test]
async fn index_lists_endpoints() {
    let app = test_router();
    let (status, _, v) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["service"], "credibility-scorer");
    assert!(v["endpoints"]["analyze"].as_str().unwrap().contains("/analyze/text"));
}

#[tokio::test]
async fn health_reports_provider_and_count() {
    let app = test_router();
    let (status, _, v) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "healthy");
    assert_eq!(v["ml_provider"], "disabled");
    assert_eq!(v["reports"], 0);
}

#[tokio::test]
async fn analyze_returns_result_and_stores_report() {
    let app = test_router();

    let payload = json!({
        "text": "According to data from the central bank, inflation eased in March.",
        "url": "https://www.reuters.com/markets/inflation"
    });
    let (status, headers, v) = send(&app, post_json("/analyze/text", payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-ml-used").unwrap(), "0");

    // Contract checks for UI consumers
    for key in ["score", "label", "confidence", "explanation", "breakdown", "report_id", "timestamp"] {
        assert!(v.get(key).is_some(), "missing '{key}'");
    }
    assert_eq!(v["label"], "trustworthy");
    assert!(v["breakdown"]["ml_score"].is_null());
    assert!(v["breakdown"]["domain_trust"].as_f64().unwrap() > 0.9);
    assert!(chrono::DateTime::parse_from_rfc3339(v["timestamp"].as_str().unwrap()).is_ok());

    let id = v["report_id"].as_str().unwrap().to_string();
    let (status, _, report) = send(&app, get(&format!("/report/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["id"], id.as_str());
    assert_eq!(report["label"], "trustworthy");
    assert_eq!(report["url"], "https://www.reuters.com/markets/inflation");

    let (_, _, health) = send(&app, get("/health")).await;
    assert_eq!(health["reports"], 1);
}

#[tokio::test]
async fn too_short_text_is_rejected() {
    let app = test_router();
    for text in ["", "short", "   123456789   "] {
        let (status, _, v) = send(&app, post_json("/analyze/text", json!({ "text": text }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "text={text:?}");
        assert_eq!(v["error"], "Text too short for analysis");
    }
    let (_, _, health) = send(&app, get("/health")).await;
    assert_eq!(health["reports"], 0);
}

#[tokio::test]
async fn ten_characters_after_trim_is_accepted() {
    let app = test_router();
    let (status, _, v) = send(&app, post_json("/analyze/text", json!({ "text": "  1234567890  " }))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["score"].as_f64().is_some());
}

#[tokio::test]
async fn ml_header_reflects_signal_presence() {
    let engine = CredibilityEngine::new(
        DomainTrustTable::default_seed(),
        PatternLibrary::builtin(),
        MlSignalAdapter::new(Arc::new(MockProvider::fixed(0.6)), Duration::from_secs(1)),
    );
    let app = router_with(engine, false);
    let (status, headers, v) = send(
        &app,
        post_json("/analyze/text", json!({ "text": "A perfectly ordinary sentence about the weather." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers.get("x-ml-used").unwrap(), "1");
    assert!((v["breakdown"]["ml_score"].as_f64().unwrap() - 0.6).abs() < 1e-6);
}

#[tokio::test]
async fn unknown_report_is_404() {
    let app = test_router();
    let (status, _, v) = send(&app, get(&format!("/report/{}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"], "Report not found");

    let (status, _, _) = send(&app, get("/report/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn flagging_a_report() {
    let app = test_router();
    let (_, _, v) = send(
        &app,
        post_json("/analyze/text", json!({ "text": "SHOCKING!!! You won't believe this miracle cure!!!" })),
    )
    .await;
    let id = v["report_id"].as_str().unwrap().to_string();

    let (status, _, flagged) = send(
        &app,
        post_json(
            &format!("/report/{id}/flag"),
            json!({ "flag_type": "misleading", "comment": "clickbait" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(flagged["status"], "flagged");

    let (_, _, report) = send(&app, get(&format!("/report/{id}"))).await;
    assert_eq!(report["flags"][0]["flag_type"], "misleading");
    assert_eq!(report["flags"][0]["comment"], "clickbait");

    let (status, _, _) = send(
        &app,
        post_json(
            &format!("/report/{}/flag", uuid::Uuid::new_v4()),
            json!({ "flag_type": "spam" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn debug_routes_are_opt_in() {
    let app = test_router();
    let (status, _, _) = send(&app, get("/debug/tables")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let app = router_with(CredibilityEngine::with_defaults(), true);
    let (status, _, v) = send(&app, get("/debug/tables")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(v["trusted_domains"].as_u64().unwrap() > 30);
    assert_eq!(v["ml_provider"], "disabled");

    let (status, _, v) = send(
        &app,
        get("/debug/preview?text=wake%20up%20sheeple&url=https%3A%2F%2Fviral.xyz"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["tier"], "neutral");
    assert_eq!(v["hits"]["red_flags"][0], "wake up sheeple");
}
