//! Pattern libraries: weighted phrase tables used by the linguistic and metadata analyzers.
//!
//! The built-in library ships with the binary (`pattern_library.json`) and is parsed once.
//! Keys are lower-cased on load; matching is plain substring search over lower-cased text.

use anyhow::Context;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;

static BUILTIN: Lazy<PatternLibrary> = Lazy::new(|| {
    let raw = include_str!("../pattern_library.json");
    PatternLibrary::from_json_str(raw).expect("valid pattern library")
});

/// `phrase → signed weight`. Ordered so that summation is reproducible.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct PatternTable(BTreeMap<String, f32>);

impl PatternTable {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f32)>,
        S: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()).normalized()
    }

    fn normalized(self) -> Self {
        Self(
            self.0
                .into_iter()
                .filter_map(|(k, v)| {
                    let k = k.trim().to_lowercase();
                    (!k.is_empty() && v.is_finite()).then_some((k, v))
                })
                .collect(),
        )
    }

    /// Entries whose phrase occurs at least once in `lowered`.
    pub fn present_in<'a>(&'a self, lowered: &'a str) -> impl Iterator<Item = (&'a str, f32)> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| lowered.contains(k.as_str()))
            .map(|(k, &v)| (k.as_str(), v))
    }

    /// Entries with their non-overlapping occurrence count (zero counts skipped).
    pub fn counts_in<'a>(
        &'a self,
        lowered: &'a str,
    ) -> impl Iterator<Item = (&'a str, f32, usize)> + 'a {
        self.0.iter().filter_map(move |(k, &v)| {
            let n = lowered.matches(k.as_str()).count();
            (n > 0).then_some((k.as_str(), v, n))
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// All static phrase tables plus the suspicious-TLD list.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternLibrary {
    pub red_flags: PatternTable,
    pub credibility_signals: PatternTable,
    pub emotional_triggers: PatternTable,
    #[serde(default)]
    pub suspicious_tlds: Vec<String>,
}

impl PatternLibrary {
    pub fn from_json_str(raw: &str) -> anyhow::Result<Self> {
        let lib: PatternLibrary =
            serde_json::from_str(raw).context("parsing pattern library JSON")?;
        Ok(lib.normalized())
    }

    /// The library compiled into the binary.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    fn normalized(self) -> Self {
        let mut tlds: Vec<String> = self
            .suspicious_tlds
            .into_iter()
            .map(|t| {
                let t = t.trim().to_ascii_lowercase();
                if t.starts_with('.') {
                    t
                } else {
                    format!(".{t}")
                }
            })
            .filter(|t| t.len() > 1)
            .collect();
        tlds.sort();
        tlds.dedup();

        Self {
            red_flags: self.red_flags.normalized(),
            credibility_signals: self.credibility_signals.normalized(),
            emotional_triggers: self.emotional_triggers.normalized(),
            suspicious_tlds: tlds,
        }
    }

    /// True if `s` (already lower-cased) ends with one of the suspicious TLDs.
    pub fn has_suspicious_tld(&self, s: &str) -> bool {
        self.suspicious_tlds.iter().any(|tld| s.ends_with(tld.as_str()))
    }
}
