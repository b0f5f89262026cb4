//! result.rs: output shapes of the credibility engine: label, signal breakdown and result.
//!
//! Everything here is immutable once built. `CredibilityResult` is the unit returned to
//! the HTTP layer and the unit handed to the report store.

use serde::{Deserialize, Serialize};

/// Score at or above which content is labelled trustworthy.
pub const TRUSTWORTHY_MIN: f32 = 0.70;
/// Score at or above which content is labelled suspicious (below: misinformation).
pub const SUSPICIOUS_MIN: f32 = 0.40;
/// Confidence is never reported as certain.
pub const MAX_CONFIDENCE: f32 = 0.95;

/// Three-band verdict derived from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Trustworthy,
    Suspicious,
    Misinformation,
}

impl Label {
    /// Fixed thresholds, no hysteresis.
    pub fn from_score(score: f32) -> Self {
        if score >= TRUSTWORTHY_MIN {
            Label::Trustworthy
        } else if score >= SUSPICIOUS_MIN {
            Label::Suspicious
        } else {
            Label::Misinformation
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Trustworthy => "trustworthy",
            Label::Suspicious => "suspicious",
            Label::Misinformation => "misinformation",
        }
    }
}

/// The four independent signals that fed one score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSet {
    /// Domain reputation; `None` means the source is unknown (not untrustworthy).
    pub domain_trust: Option<f32>,
    /// Linguistic pattern score in [0,1].
    pub linguistic_score: f32,
    /// External classifier signal; `None` when the provider was unavailable.
    pub ml_score: Option<f32>,
    /// Small signed delta from URL shape and length.
    pub metadata_score: f32,
}

impl SignalSet {
    /// Number of signals that are actually present.
    pub fn present_count(&self) -> usize {
        2 + usize::from(self.domain_trust.is_some()) + usize::from(self.ml_score.is_some())
    }
}

/// Final engine output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibilityResult {
    pub score: f32,
    pub label: Label,
    pub confidence: f32,
    pub explanation: String,
    pub breakdown: SignalSet,
}

impl CredibilityResult {
    /// Assemble a result; clamps `score` and `confidence` and derives the label.
    pub fn new(score: f32, confidence: f32, explanation: String, breakdown: SignalSet) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            score,
            label: Label::from_score(score),
            confidence: confidence.clamp(0.0, MAX_CONFIDENCE),
            explanation,
            breakdown,
        }
    }

    /// Safe neutral result returned when the pipeline cannot complete.
    pub fn fallback() -> Self {
        Self {
            score: 0.50,
            label: Label::Suspicious,
            confidence: 0.40,
            explanation: "Analysis incomplete. Please verify information independently."
                .to_string(),
            breakdown: SignalSet {
                domain_trust: None,
                linguistic_score: 0.50,
                ml_score: None,
                metadata_score: 0.50,
            },
        }
    }
}
