// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod analyze;
pub mod api;
pub mod config;
pub mod domain_trust;
pub mod metrics;
pub mod patterns;
pub mod reports;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{CredibilityEngine, CredibilityResult, Label, SignalSet};
pub use crate::api::router;
pub use crate::config::EngineConfig;

use tracing::{info, warn};

/// One-off smoke test of the configured ML provider. Never fails; only logs.
///
/// Example usage inside the Shuttle entrypoint:
/// ```ignore
/// credibility_scorer::run_ml_quick_probe(&engine).await;
/// ```
pub async fn run_ml_quick_probe(engine: &CredibilityEngine) {
    if engine.ml_provider_name() == "disabled" {
        info!("ML quick probe skipped: provider disabled");
        return;
    }
    let sample = "According to a peer-reviewed study published in Nature, global sea levels rose \
                  faster in the last decade than in the previous one.";
    let preview = engine.preview(sample, None).await;
    match preview.signals.ml_score {
        Some(v) => info!(provider = engine.ml_provider_name(), ml_score = v, "ML quick probe ok"),
        None => warn!(
            provider = engine.ml_provider_name(),
            "ML quick probe returned no signal; scores will use the remaining signals"
        ),
    }
}
