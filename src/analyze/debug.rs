//! Debug endpoints: inspect the loaded tables and preview a full scoring run.
//! Mounted by `api::router` only when `DEBUG_ROUTES=1`.

use std::collections::HashMap;

use serde::Serialize;
use shuttle_axum::axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};

use super::{CredibilityEngine, Preview};

#[derive(Debug, Serialize)]
pub struct TablesOut {
    pub trusted_domains: usize,
    pub unreliable_domains: usize,
    pub red_flags: usize,
    pub credibility_signals: usize,
    pub emotional_triggers: usize,
    pub suspicious_tlds: Vec<String>,
    pub ml_provider: &'static str,
}

pub fn router(engine: CredibilityEngine) -> Router {
    Router::new()
        .route("/debug/tables", get(get_tables))
        .route("/debug/preview", get(get_preview))
        .with_state(engine)
}

async fn get_tables(State(engine): State<CredibilityEngine>) -> Json<TablesOut> {
    let (trusted, unreliable) = engine.domain_table().sizes();
    let lib = engine.pattern_library();
    Json(TablesOut {
        trusted_domains: trusted,
        unreliable_domains: unreliable,
        red_flags: lib.red_flags.len(),
        credibility_signals: lib.credibility_signals.len(),
        emotional_triggers: lib.emotional_triggers.len(),
        suspicious_tlds: lib.suspicious_tlds.clone(),
        ml_provider: engine.ml_provider_name(),
    })
}

/// GET /debug/preview?text=...&url=...
async fn get_preview(
    State(engine): State<CredibilityEngine>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<Preview> {
    let text = q.get("text").cloned().unwrap_or_default();
    let url = q.get("url").map(String::as_str).filter(|u| !u.trim().is_empty());
    Json(engine.preview(&text, url).await)
}
