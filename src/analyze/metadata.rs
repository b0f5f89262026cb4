//! Metadata heuristics: URL shape and content length.
//!
//! Returns a small signed delta (typically in [-0.33, +0.05]). It is not clamped here;
//! clamping happens after combination.

use crate::domain_trust::source_host;
use crate::patterns::PatternLibrary;

const SUSPICIOUS_TLD_PENALTY: f32 = -0.15;
const DEEP_HOST_PENALTY: f32 = -0.08;
const MAX_HOST_LABELS: usize = 3;
const SHORT_TEXT_WORDS: usize = 50;
const SHORT_TEXT_PENALTY: f32 = -0.10;
const LONG_TEXT_WORDS: usize = 300;
const LONG_TEXT_BONUS: f32 = 0.05;

#[derive(Debug, Clone, Copy)]
pub struct MetadataAnalyzer<'a> {
    lib: &'a PatternLibrary,
}

impl<'a> MetadataAnalyzer<'a> {
    pub fn new(lib: &'a PatternLibrary) -> Self {
        Self { lib }
    }

    pub fn analyze(&self, text: &str, url: Option<&str>) -> f32 {
        let mut score = 0.0f32;

        if let Some(raw) = url.map(str::trim).filter(|u| !u.is_empty()) {
            // Only the literal end of the URL string counts.
            if self.lib.has_suspicious_tld(&raw.to_ascii_lowercase()) {
                score += SUSPICIOUS_TLD_PENALTY;
            }

            if let Some(h) = source_host(raw) {
                if h.split('.').count() > MAX_HOST_LABELS {
                    score += DEEP_HOST_PENALTY;
                }
            }
        }

        let words = text.split_whitespace().count();
        if words < SHORT_TEXT_WORDS {
            score += SHORT_TEXT_PENALTY;
        } else if words > LONG_TEXT_WORDS {
            score += LONG_TEXT_BONUS;
        }

        score
    }
}
