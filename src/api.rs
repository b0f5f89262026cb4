use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use serde_json::json;
use shuttle_axum::axum::{
    extract::{Path, State},
    http::{HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analyze::{self, text_id, CredibilityEngine, CredibilityResult};
use crate::config::EngineConfig;
use crate::metrics::Metrics;
use crate::reports::{InMemoryReportStore, ReportStore, StoreError, StoredReport, UserFlag};

pub const ML_USED_HEADER: HeaderName = HeaderName::from_static("x-ml-used");

#[derive(Clone)]
pub struct AppState {
    engine: CredibilityEngine,
    reports: Arc<dyn ReportStore>,
    min_text_len: usize,
}

impl AppState {
    pub fn new(engine: CredibilityEngine, reports: Arc<dyn ReportStore>, min_text_len: usize) -> Self {
        Self {
            engine,
            reports,
            min_text_len,
        }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new(
            CredibilityEngine::from_config(cfg),
            Arc::new(InMemoryReportStore::with_capacity(cfg.service.report_capacity)),
            cfg.service.min_text_len,
        )
    }

    pub fn engine(&self) -> &CredibilityEngine {
        &self.engine
    }
}

/// Full application router built from config.
pub fn router(cfg: &EngineConfig) -> Router {
    create_router(AppState::from_config(cfg), cfg.service.debug_routes)
}

pub fn create_router(state: AppState, debug_routes: bool) -> Router {
    let engine = state.engine.clone();

    let mut app = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/analyze/text", post(analyze_text))
        .route("/report/{id}", get(get_report))
        .route("/report/{id}/flag", post(flag_report))
        .with_state(state);

    if debug_routes {
        app = app.merge(analyze::debug::router(engine));
        match Metrics::init() {
            Ok(m) => app = app.merge(m.router()),
            Err(e) => warn!(error = %e, "metrics endpoint disabled"),
        }
    }

    app.layer(CorsLayer::very_permissive())
}

async fn index() -> Json<serde_json::Value> {
    Json(json!({
        "service": "credibility-scorer",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "GET /health",
            "analyze": "POST /analyze/text",
            "report": "GET /report/{id}",
            "flag": "POST /report/{id}/flag",
        }
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "ml_provider": state.engine.ml_provider_name(),
        "reports": state.reports.len().await,
    }))
}

#[derive(serde::Deserialize)]
struct AnalyzeReq {
    text: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(serde::Serialize)]
struct AnalyzeResp {
    #[serde(flatten)]
    result: CredibilityResult,
    report_id: Uuid,
    timestamp: String,
}

fn error_body(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

async fn analyze_text(State(state): State<AppState>, Json(body): Json<AnalyzeReq>) -> Response {
    if body.text.trim().chars().count() < state.min_text_len {
        return error_body(StatusCode::BAD_REQUEST, "Text too short for analysis");
    }
    let url = body
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    let result = state.engine.analyze(&body.text, url).await;

    let now = Utc::now();
    let report_id = Uuid::new_v4();
    let report = StoredReport::new(report_id, &body.text, url, &result, now);
    if let Err(e) = state.reports.save(report).await {
        warn!(text_id = %text_id(&body.text), error = %e, "report save failed");
    }

    let ml_used = if result.breakdown.ml_score.is_some() { "1" } else { "0" };
    let resp = AnalyzeResp {
        result,
        report_id,
        timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
    };
    ([(ML_USED_HEADER, ml_used)], Json(resp)).into_response()
}

async fn get_report(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_body(StatusCode::NOT_FOUND, "Report not found");
    };
    match state.reports.get(id).await {
        Some(report) => Json(report).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "Report not found"),
    }
}

#[derive(serde::Deserialize)]
struct FlagReq {
    flag_type: String,
    #[serde(default)]
    comment: Option<String>,
}

async fn flag_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<FlagReq>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&id) else {
        return error_body(StatusCode::NOT_FOUND, "Report not found");
    };
    let flag_type = body.flag_type.trim();
    if flag_type.is_empty() {
        return error_body(StatusCode::BAD_REQUEST, "flag_type is required");
    }

    let flag = UserFlag {
        flag_type: flag_type.to_string(),
        comment: body.comment.filter(|c| !c.trim().is_empty()),
        created_at: Utc::now(),
    };
    match state.reports.add_flag(id, flag).await {
        Ok(()) => {
            debug!(report_id = %id, "report flagged");
            (
                StatusCode::CREATED,
                Json(json!({ "status": "flagged", "report_id": id })),
            )
                .into_response()
        }
        Err(StoreError::NotFound(_)) => error_body(StatusCode::NOT_FOUND, "Report not found"),
        Err(e) => {
            warn!(report_id = %id, error = %e, "flag save failed");
            error_body(StatusCode::SERVICE_UNAVAILABLE, "Report store unavailable")
        }
    }
}
