// src/analyze/mod.rs
//! Scoring pipeline entry: gathers the four signals, combines them, estimates
//! confidence and writes the explanation. Any internal fault yields the fallback result.

pub mod combiner;
pub mod confidence;
pub mod debug;
pub mod error;
pub mod explain;
pub mod linguistic;
pub mod metadata;
pub mod ml_adapter;
pub mod result;

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::domain_trust::DomainTrustTable;
use crate::patterns::PatternLibrary;

// Re-export convenient types.
pub use crate::analyze::combiner::{combine, Tier};
pub use crate::analyze::error::ScoringError;
pub use crate::analyze::linguistic::{LinguisticAnalyzer, PatternHits};
pub use crate::analyze::metadata::MetadataAnalyzer;
pub use crate::analyze::ml_adapter::{DynMlProvider, MlSignalAdapter, MlSignalProvider};
pub use crate::analyze::result::{CredibilityResult, Label, SignalSet};

/// Signals that need no I/O.
#[derive(Debug, Clone)]
struct LocalSignals {
    domain_trust: Option<f32>,
    linguistic_score: f32,
    metadata_score: f32,
    hits: PatternHits,
}

/// Everything the engine knows about one input, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub text_id: String,
    pub tier: Tier,
    pub signals: SignalSet,
    pub hits: PatternHits,
    pub result: CredibilityResult,
}

/// Shared, read-only scoring engine. Cheap to clone.
#[derive(Clone)]
pub struct CredibilityEngine {
    domains: Arc<DomainTrustTable>,
    patterns: Arc<PatternLibrary>,
    ml: MlSignalAdapter,
}

impl CredibilityEngine {
    pub fn new(domains: DomainTrustTable, patterns: PatternLibrary, ml: MlSignalAdapter) -> Self {
        Self {
            domains: Arc::new(domains),
            patterns: Arc::new(patterns),
            ml,
        }
    }

    /// Built-in tables, no ML signal.
    pub fn with_defaults() -> Self {
        Self::new(
            DomainTrustTable::default_seed(),
            PatternLibrary::builtin(),
            MlSignalAdapter::disabled(),
        )
    }

    /// Tables and ML provider as described by the config.
    pub fn from_config(cfg: &EngineConfig) -> Self {
        let domains = DomainTrustTable::load_from_file(&cfg.tables.domain_trust_path);
        let provider = ml_adapter::build_provider_from_config(&cfg.ml);
        let (trusted, unreliable) = domains.sizes();
        info!(
            trusted,
            unreliable,
            ml_provider = provider.provider_name(),
            "credibility engine ready"
        );
        let ml = MlSignalAdapter::new(provider, Duration::from_millis(cfg.ml.timeout_ms));
        Self::new(domains, PatternLibrary::builtin(), ml)
    }

    pub fn ml_provider_name(&self) -> &'static str {
        self.ml.provider_name()
    }

    pub fn domain_table(&self) -> &DomainTrustTable {
        &self.domains
    }

    pub fn pattern_library(&self) -> &PatternLibrary {
        &self.patterns
    }

    /// Score one piece of text. Never fails.
    pub async fn analyze(&self, text: &str, url: Option<&str>) -> CredibilityResult {
        let started = Instant::now();
        let id = text_id(text);

        let (signals, _) = self.collect(text, url).await;
        if signals.ml_score.is_none() {
            counter!("credibility_ml_unavailable_total").increment(1);
        }

        let result = match try_score(&signals, url) {
            Ok(r) => r,
            Err(e) => {
                error!(text_id = %id, error = %e, "scoring failed; returning fallback");
                counter!("credibility_fallback_total").increment(1);
                CredibilityResult::fallback()
            }
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!("credibility_analysis_ms").record(elapsed_ms);
        counter!("credibility_analyses_total", "label" => result.label.as_str()).increment(1);
        debug!(
            text_id = %id,
            score = result.score,
            label = result.label.as_str(),
            confidence = result.confidence,
            ml = result.breakdown.ml_score.is_some(),
            elapsed_ms,
            "analysis complete"
        );
        result
    }

    /// Signals plus the matched phrases and the tier; does not touch metrics.
    pub async fn preview(&self, text: &str, url: Option<&str>) -> Preview {
        let (signals, hits) = self.collect(text, url).await;
        let tier = combiner::select_tier(signals.domain_trust).tier;
        let result = try_score(&signals, url).unwrap_or_else(|_| CredibilityResult::fallback());
        Preview {
            text_id: text_id(text),
            tier,
            signals,
            hits,
            result,
        }
    }

    /// The ML query is the only suspending step; local signals are computed while it runs.
    async fn collect(&self, text: &str, url: Option<&str>) -> (SignalSet, PatternHits) {
        let (ml_score, local) = tokio::join!(self.ml.query(text), async {
            self.local_signals(text, url)
        });
        let signals = SignalSet {
            domain_trust: local.domain_trust,
            linguistic_score: local.linguistic_score,
            ml_score,
            metadata_score: local.metadata_score,
        };
        (signals, local.hits)
    }

    fn local_signals(&self, text: &str, url: Option<&str>) -> LocalSignals {
        let (linguistic_score, hits) =
            LinguisticAnalyzer::new(&self.patterns).analyze_with_hits(text);
        LocalSignals {
            domain_trust: self.domains.resolve(url),
            linguistic_score,
            metadata_score: MetadataAnalyzer::new(&self.patterns).analyze(text, url),
            hits,
        }
    }
}

/// Pure scoring step: combine, estimate confidence, explain.
pub fn try_score(signals: &SignalSet, url: Option<&str>) -> Result<CredibilityResult, ScoringError> {
    let (_tier, score) = combiner::try_combine(signals)?;
    let confidence = confidence::estimate(signals);
    if !confidence.is_finite() {
        return Err(ScoringError::NonFiniteScore);
    }
    let label = Label::from_score(score);
    let explanation = explain::explain(score, label, signals, url);
    Ok(CredibilityResult::new(score, confidence, explanation, *signals))
}

/// Short anonymous id for logs; the raw text is never logged.
pub fn text_id(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().take(6).map(|b| format!("{b:02x}")).collect()
}
