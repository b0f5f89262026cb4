//! Explanation synthesis: a short, ordered list of clauses joined into sentences.

use super::result::{Label, SignalSet, SUSPICIOUS_MIN, TRUSTWORTHY_MIN};
use crate::domain_trust::source_host;

const NAMED_SOURCE_MIN: f32 = 0.90;
const GOOD_REPUTATION_MIN: f32 = 0.75;
const BAD_REPUTATION_MAX: f32 = 0.30;
const PROFESSIONAL_LANGUAGE_MIN: f32 = 0.70;
const MANIPULATIVE_LANGUAGE_MAX: f32 = 0.40;

/// Render the rationale for one result. Always returns a non-empty string.
pub fn explain(score: f32, label: Label, signals: &SignalSet, url: Option<&str>) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(4);

    parts.push(match label {
        Label::Trustworthy => format!("[OK] Content appears trustworthy (score: {score:.2})"),
        Label::Suspicious => format!("[!] Content shows mixed signals (score: {score:.2})"),
        Label::Misinformation => {
            format!("[X] Content shows signs of misinformation (score: {score:.2})")
        }
    });

    parts.push(match signals.domain_trust {
        Some(d) if d >= NAMED_SOURCE_MIN => {
            let name = url.and_then(source_host).unwrap_or_else(|| "source".to_string());
            format!("Source ({name}) is highly trusted and verified")
        }
        Some(d) if d >= GOOD_REPUTATION_MIN => "Source has good reputation in journalism".into(),
        Some(d) if d < BAD_REPUTATION_MAX => "[!] Source has history of unreliable content".into(),
        _ => "Source credibility could not be verified".into(),
    });

    if signals.linguistic_score >= PROFESSIONAL_LANGUAGE_MIN {
        parts.push("Language patterns suggest professional journalism".into());
    } else if signals.linguistic_score < MANIPULATIVE_LANGUAGE_MAX {
        parts.push("[!] Language contains clickbait or manipulation patterns".into());
    }

    parts.push(if score >= TRUSTWORTHY_MIN {
        "Content meets credibility standards".into()
    } else if score >= SUSPICIOUS_MIN {
        "Recommend verifying with additional sources".into()
    } else {
        "[!] Strong recommendation to verify with trusted sources".into()
    });

    format!("{}.", parts.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(d: Option<f32>, l: f32) -> SignalSet {
        SignalSet {
            domain_trust: d,
            linguistic_score: l,
            ml_score: None,
            metadata_score: 0.0,
        }
    }

    #[test]
    fn names_highly_trusted_source() {
        let e = explain(
            0.95,
            Label::Trustworthy,
            &sig(Some(0.97), 0.9),
            Some("https://www.nature.com/articles/x"),
        );
        assert!(e.starts_with("[OK] Content appears trustworthy (score: 0.95)"));
        assert!(e.contains("Source (www.nature.com) is highly trusted and verified"));
        assert!(e.contains("professional journalism"));
        assert!(e.ends_with("Content meets credibility standards."));
    }

    #[test]
    fn unknown_source_cannot_be_verified() {
        let e = explain(0.2, Label::Misinformation, &sig(None, 0.1), None);
        assert!(e.contains("Source credibility could not be verified"));
        assert!(e.contains("clickbait or manipulation"));
        assert!(e.contains("Strong recommendation"));
    }

    #[test]
    fn mid_band_domain_is_unverified() {
        let e = explain(0.5, Label::Suspicious, &sig(Some(0.5), 0.5), Some("https://x.org"));
        assert!(e.contains("could not be verified"));
        assert!(!e.contains("Language"));
        assert!(e.contains("Recommend verifying"));
    }

    #[test]
    fn unreliable_and_reputable_clauses() {
        let bad = explain(0.3, Label::Misinformation, &sig(Some(0.15), 0.5), None);
        assert!(bad.contains("history of unreliable content"));
        let good = explain(0.8, Label::Trustworthy, &sig(Some(0.8), 0.5), None);
        assert!(good.contains("good reputation"));
    }

    #[test]
    fn never_empty() {
        for s in [0.0, 0.39, 0.4, 0.69, 0.7, 1.0] {
            let e = explain(s, Label::from_score(s), &sig(None, 0.5), Some("%%%"));
            assert!(!e.is_empty());
            assert!(e.ends_with('.'));
        }
    }
}
