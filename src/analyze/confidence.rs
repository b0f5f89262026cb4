//! Confidence v1: signal count + agreement + decisive domain bonus, capped at 0.95.

use super::result::{SignalSet, MAX_CONFIDENCE};

const BASE: f32 = 0.50;
const PER_SIGNAL: f32 = 0.08;
const AGREEMENT_CEILING: f32 = 0.25;
const DECISIVE_DOMAIN_BONUS: f32 = 0.15;
const DECISIVE_HIGH: f32 = 0.90;
const DECISIVE_LOW: f32 = 0.30;

/// Confidence in [0, 0.95] for one signal set.
pub fn estimate(signals: &SignalSet) -> f32 {
    let count = signals.present_count();
    let mut confidence = BASE + PER_SIGNAL * count as f32;

    if count >= 2 {
        confidence += agreement_bonus(&present_signals(signals));
    }

    if signals
        .domain_trust
        .is_some_and(|d| d >= DECISIVE_HIGH || d <= DECISIVE_LOW)
    {
        confidence += DECISIVE_DOMAIN_BONUS;
    }

    confidence.clamp(0.0, MAX_CONFIDENCE)
}

/// `max(0, 0.25 - variance)`: tighter agreement, larger bonus.
pub fn agreement_bonus(values: &[f32]) -> f32 {
    (AGREEMENT_CEILING - variance(values)).max(0.0)
}

/// Present signals in canonical order (domain, linguistic, ml, metadata).
fn present_signals(s: &SignalSet) -> Vec<f32> {
    let mut v = Vec::with_capacity(4);
    if let Some(d) = s.domain_trust {
        v.push(d);
    }
    v.push(s.linguistic_score);
    if let Some(ml) = s.ml_score {
        v.push(ml);
    }
    v.push(s.metadata_score);
    v
}

/// Population variance; 0 for fewer than two values.
fn variance(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    values.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(d: Option<f32>, l: f32, ml: Option<f32>, m: f32) -> SignalSet {
        SignalSet {
            domain_trust: d,
            linguistic_score: l,
            ml_score: ml,
            metadata_score: m,
        }
    }

    #[test]
    fn tight_signals_beat_spread_signals() {
        assert!(
            agreement_bonus(&[0.80, 0.82, 0.79, 0.81]) > agreement_bonus(&[0.10, 0.90, 0.30, 0.95])
        );

        let tight = estimate(&sig(Some(0.80), 0.82, Some(0.79), 0.81));
        let spread = estimate(&sig(Some(0.35), 0.0, Some(1.0), -0.30));
        assert!(tight > spread, "tight={tight} spread={spread}");
    }

    #[test]
    fn two_signals_base() {
        // linguistic 0.6, metadata 0.0 → variance 0.09 → bonus 0.16
        let c = estimate(&sig(None, 0.6, None, 0.0));
        assert!((c - (0.50 + 0.16 + 0.16)).abs() < 1e-5);
    }

    #[test]
    fn decisive_domain_adds_bonus() {
        // Spread wide enough that the agreement bonus is zero in both cases.
        let neutral = estimate(&sig(Some(0.31), 1.0, None, -0.3));
        let decisive = estimate(&sig(Some(0.30), 1.0, None, -0.3));
        assert!((neutral - 0.74).abs() < 1e-5, "neutral={neutral}");
        assert!((decisive - 0.89).abs() < 1e-5, "decisive={decisive}");
    }

    #[test]
    fn count_follows_optional_signals() {
        let bare = sig(None, 0.6, None, 0.0);
        let full = sig(Some(0.6), 0.6, Some(0.6), 0.6);
        assert_eq!(bare.present_count(), 2);
        assert_eq!(full.present_count(), 4);
        assert_eq!(present_signals(&full).len(), full.present_count());
        // Two identical values: no variance, full agreement bonus.
        let agreeing = sig(None, 0.6, None, 0.6);
        assert!((estimate(&agreeing) - (0.50 + 0.16 + 0.25)).abs() < 1e-5);
    }

    #[test]
    fn never_exceeds_cap() {
        let c = estimate(&sig(Some(0.99), 0.99, Some(0.99), 0.99));
        assert_eq!(c, MAX_CONFIDENCE);
    }

    #[test]
    fn variance_is_population_variance() {
        assert!((variance(&[0.0, 1.0]) - 0.25).abs() < 1e-6);
        assert_eq!(variance(&[0.4]), 0.0);
    }
}
