//! Tiered signal combination.
//!
//! Domain trust selects one of four tiers, evaluated top to bottom (first match wins):
//!
//! | tier       | domain trust          | weighting                                   |
//! |------------|-----------------------|---------------------------------------------|
//! | high trust | >= 0.92               | 0.70·d + 0.30·c                             |
//! | unreliable | present and < 0.30    | min(0.45, max(d, 0.60·c + 0.40·d))          |
//! | moderate   | [0.75, 0.92)          | 0.55·d + 0.45·c                             |
//! | neutral    | absent or [0.30,0.75) | renormalized weighted sum over all signals  |
//!
//! `c` is the content score: `linguistic + metadata`, averaged with `ml` when present.

use serde::Serialize;

use super::error::ScoringError;
use super::result::SignalSet;

pub const HIGH_TRUST_MIN: f32 = 0.92;
pub const MODERATE_TRUST_MIN: f32 = 0.75;
pub const UNRELIABLE_MAX: f32 = 0.30;
/// Unreliable sources never score above this, whatever the content says.
pub const UNRELIABLE_CAP: f32 = 0.45;

const W_LINGUISTIC: f32 = 0.60;
const W_METADATA: f32 = 0.20;
const W_ML: f32 = 0.20;
const W_DOMAIN: f32 = 0.40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    HighTrust,
    Unreliable,
    ModerateTrust,
    Neutral,
}

/// One row of the tier table: predicate on domain trust + weighting function.
#[derive(Debug, Clone, Copy)]
pub struct TierRule {
    pub tier: Tier,
    pub applies: fn(Option<f32>) -> bool,
    pub weigh: fn(&SignalSet) -> f32,
}

/// Tier precedence, top to bottom.
pub const TIER_TABLE: [TierRule; 4] = [
    TierRule {
        tier: Tier::HighTrust,
        applies: is_high_trust,
        weigh: weigh_high_trust,
    },
    TierRule {
        tier: Tier::Unreliable,
        applies: is_unreliable,
        weigh: weigh_unreliable,
    },
    TierRule {
        tier: Tier::ModerateTrust,
        applies: is_moderate_trust,
        weigh: weigh_moderate_trust,
    },
    TierRule {
        tier: Tier::Neutral,
        applies: is_neutral,
        weigh: weigh_neutral,
    },
];

/// First matching row. The neutral row matches everything the others do not.
pub fn select_tier(domain_trust: Option<f32>) -> &'static TierRule {
    TIER_TABLE
        .iter()
        .find(|rule| (rule.applies)(domain_trust))
        .unwrap_or(&TIER_TABLE[TIER_TABLE.len() - 1])
}

/// Final score in [0,1] plus the tier that produced it.
pub fn combine(signals: &SignalSet) -> (Tier, f32) {
    let rule = select_tier(signals.domain_trust);
    (rule.tier, (rule.weigh)(signals).clamp(0.0, 1.0))
}

/// Same as [`combine`] but refuses non-finite inputs or outputs.
pub fn try_combine(signals: &SignalSet) -> Result<(Tier, f32), ScoringError> {
    check_finite(signals)?;
    let (tier, score) = combine(signals);
    if !score.is_finite() {
        return Err(ScoringError::NonFiniteScore);
    }
    Ok((tier, score))
}

fn check_finite(s: &SignalSet) -> Result<(), ScoringError> {
    let checks = [
        ("domain_trust", s.domain_trust),
        ("linguistic_score", Some(s.linguistic_score)),
        ("ml_score", s.ml_score),
        ("metadata_score", Some(s.metadata_score)),
    ];
    for (signal, v) in checks {
        if v.is_some_and(|x| !x.is_finite()) {
            return Err(ScoringError::NonFiniteSignal { signal });
        }
    }
    Ok(())
}

/// Content score used by the first three tiers.
pub fn content_score(s: &SignalSet) -> f32 {
    let base = s.linguistic_score + s.metadata_score;
    match s.ml_score {
        Some(ml) => (base + ml) / 2.0,
        None => base,
    }
}

// --- predicates ---

fn is_high_trust(d: Option<f32>) -> bool {
    d.is_some_and(|d| d >= HIGH_TRUST_MIN)
}

fn is_unreliable(d: Option<f32>) -> bool {
    d.is_some_and(|d| d < UNRELIABLE_MAX)
}

fn is_moderate_trust(d: Option<f32>) -> bool {
    d.is_some_and(|d| (MODERATE_TRUST_MIN..HIGH_TRUST_MIN).contains(&d))
}

fn is_neutral(_d: Option<f32>) -> bool {
    true
}

// --- weightings ---

fn weigh_high_trust(s: &SignalSet) -> f32 {
    let d = s.domain_trust.unwrap_or_default();
    0.70 * d + 0.30 * content_score(s)
}

fn weigh_unreliable(s: &SignalSet) -> f32 {
    let d = s.domain_trust.unwrap_or_default();
    let blended = 0.60 * content_score(s) + 0.40 * d;
    UNRELIABLE_CAP.min(d.max(blended))
}

fn weigh_moderate_trust(s: &SignalSet) -> f32 {
    let d = s.domain_trust.unwrap_or_default();
    0.55 * d + 0.45 * content_score(s)
}

/// Weighted sum over the available signals in canonical order
/// (linguistic, metadata, ml, domain), weights renormalized to sum to 1.
fn weigh_neutral(s: &SignalSet) -> f32 {
    let mut terms: Vec<(f32, f32)> = vec![
        (s.linguistic_score, W_LINGUISTIC),
        (s.metadata_score, W_METADATA),
    ];
    if let Some(ml) = s.ml_score {
        terms.push((ml, W_ML));
    }
    if let Some(d) = s.domain_trust {
        terms.push((d, W_DOMAIN));
    }

    let total: f32 = terms.iter().map(|(_, w)| w).sum();
    terms
        .iter()
        .map(|(v, w)| v * (w / total))
        .sum::<f32>()
        .clamp(0.0, 1.0)
}
