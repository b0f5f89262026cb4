// tests/properties.rs
//
// Randomized range checks over the combiner, confidence estimator and full engine.

use rand::{rngs::StdRng, Rng, SeedableRng};

use credibility_scorer::analyze::{combiner, confidence, result::MAX_CONFIDENCE, try_score};
use credibility_scorer::{CredibilityEngine, Label, SignalSet};

const WORDS: &[&str] = &[
    "according", "to", "SHOCKING", "miracle", "data", "from", "the", "deep", "state", "!!!",
    "peer-reviewed", "you", "won't", "believe", "study", "published", "in", "???", "report",
    "officials", "said", "\n\n", "breakthrough", "wake", "up", "sheeple", "é", "ß",
];

const URLS: &[Option<&str>] = &[
    None,
    Some("https://www.bbc.com/news"),
    Some("https://news.bbc.com/x"),
    Some("https://infowars.com/a"),
    Some("https://viral-news.xyz/"),
    Some("https://a.b.c.example.com/"),
    Some("https://www.cdc.gov/flu"),
    Some("http://[::1]/"),
    Some(""),
    Some("%%%"),
];

fn random_signals(rng: &mut StdRng) -> SignalSet {
    SignalSet {
        domain_trust: rng.random_bool(0.7).then(|| rng.random_range(0.0..=1.0)),
        linguistic_score: rng.random_range(0.0..=1.0),
        ml_score: rng.random_bool(0.5).then(|| rng.random_range(0.0..=1.0)),
        metadata_score: rng.random_range(-0.33..=0.05),
    }
}

fn random_text(rng: &mut StdRng) -> String {
    let n = rng.random_range(0..400);
    (0..n)
        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn combined_score_and_confidence_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    for _ in 0..5_000 {
        let s = random_signals(&mut rng);
        let (_, score) = combiner::combine(&s);
        assert!((0.0..=1.0).contains(&score), "score {score} for {s:?}");

        let c = confidence::estimate(&s);
        assert!((0.0..=MAX_CONFIDENCE).contains(&c), "confidence {c} for {s:?}");

        let r = try_score(&s, None).expect("finite signals score");
        assert_eq!(r.label, Label::from_score(r.score));
        assert!(!r.explanation.is_empty());
    }
}

#[test]
fn unreliable_tier_never_exceeds_cap() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..2_000 {
        let mut s = random_signals(&mut rng);
        s.domain_trust = Some(rng.random_range(0.0..0.30));
        assert!(combiner::combine(&s).1 <= combiner::UNRELIABLE_CAP);
    }
}

#[test]
fn label_boundaries() {
    assert_eq!(Label::from_score(0.399), Label::Misinformation);
    assert_eq!(Label::from_score(0.40), Label::Suspicious);
    assert_eq!(Label::from_score(0.699), Label::Suspicious);
    assert_eq!(Label::from_score(0.70), Label::Trustworthy);
}

#[tokio::test]
async fn engine_output_in_range_for_random_text() {
    let engine = CredibilityEngine::with_defaults();
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..300 {
        let text = random_text(&mut rng);
        let url = URLS[rng.random_range(0..URLS.len())];
        let r = engine.analyze(&text, url).await;
        assert!((0.0..=1.0).contains(&r.score));
        assert!((0.0..=MAX_CONFIDENCE).contains(&r.confidence));
        assert!((0.0..=1.0).contains(&r.breakdown.linguistic_score));
        if let Some(d) = r.breakdown.domain_trust {
            assert!((0.0..=1.0).contains(&d));
        }
        assert!(r.explanation.ends_with('.'));
    }
}
