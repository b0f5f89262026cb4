//! Linguistic pattern analysis: weighted phrase hits plus a structural sub-score.
//!
//! Score = 0.60 baseline
//!       + sum of red-flag weights (once per distinct phrase)
//!       + sum of credibility-signal weights (once per distinct phrase)
//!       + sum of emotional-trigger weight × min(count, 3)
//!       + structure (sentences, capitalization, punctuation, paragraphs)
//! clamped to [0,1].
//!
//! Each table entry is matched independently, so a phrase contained in a longer
//! listed phrase can count twice.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::patterns::PatternLibrary;

const BASELINE: f32 = 0.60;
const EMOTIONAL_CAP: usize = 3;

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence regex"));

/// Phrases that matched, for diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PatternHits {
    pub red_flags: Vec<String>,
    pub credibility_signals: Vec<String>,
    pub emotional_triggers: Vec<(String, usize)>,
    pub structure: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct LinguisticAnalyzer<'a> {
    lib: &'a PatternLibrary,
}

impl<'a> LinguisticAnalyzer<'a> {
    pub fn new(lib: &'a PatternLibrary) -> Self {
        Self { lib }
    }

    /// Linguistic score in [0,1].
    pub fn analyze(&self, text: &str) -> f32 {
        self.analyze_with_hits(text).0
    }

    /// Score plus the list of phrases that contributed to it.
    pub fn analyze_with_hits(&self, text: &str) -> (f32, PatternHits) {
        let lowered = lower_for_matching(text);
        let mut hits = PatternHits::default();

        let mut red_flag_penalty = 0.0f32;
        for (phrase, w) in self.lib.red_flags.present_in(&lowered) {
            red_flag_penalty += w;
            hits.red_flags.push(phrase.to_string());
        }

        let mut credibility_boost = 0.0f32;
        for (phrase, w) in self.lib.credibility_signals.present_in(&lowered) {
            credibility_boost += w;
            hits.credibility_signals.push(phrase.to_string());
        }

        let mut emotional_penalty = 0.0f32;
        for (word, w, n) in self.lib.emotional_triggers.counts_in(&lowered) {
            emotional_penalty += w * n.min(EMOTIONAL_CAP) as f32;
            hits.emotional_triggers.push((word.to_string(), n));
        }

        let structure = structure_score(text);
        hits.structure = structure;

        let score =
            BASELINE + credibility_boost + red_flag_penalty + emotional_penalty + structure;
        (score.clamp(0.0, 1.0), hits)
    }
}

/// Structural quality of the raw (not lower-cased) text.
pub fn structure_score(text: &str) -> f32 {
    let mut score = 0.0f32;

    let valid_sentences = SENTENCE_SPLIT
        .split(text)
        .filter(|s| s.trim().chars().count() > 10)
        .count();
    if valid_sentences >= 3 {
        score += 0.05;
    }

    // Shouting.
    let total = text.chars().count().max(1);
    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    let caps_ratio = upper as f32 / total as f32;
    if caps_ratio > 0.30 {
        score -= 0.10;
    } else if caps_ratio > 0.15 {
        score -= 0.05;
    }

    if text.matches('!').count() > 5 {
        score -= 0.08;
    }
    if text.matches('?').count() > 8 {
        score -= 0.05;
    }

    if text.split("\n\n").count() >= 2 {
        score += 0.05;
    }

    score
}

/// Lower-case and fold typographic apostrophes so "don’t" matches "don't".
fn lower_for_matching(text: &str) -> String {
    text.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'")
}
