//! # Domain Trust
//!
//! Static reputation tables for news and reference domains, plus the resolver
//! that maps an optional source URL to a trust score in `[0.0, 1.0]`.
//!
//! - Loads from a JSON override file or falls back to the built-in seed.
//! - Unreliable domains are checked first and are never upgraded by a trusted match.
//! - Fallback order: unreliable → exact trusted → `.edu`/`.gov` class → trusted parent domain.
//! - Unknown hosts resolve to `None`, which is not the same as a low score.
//!
//! The table is built once at startup and shared read-only between requests.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};
use tracing::{debug, warn};
use url::Url;

/// Subdomains of a trusted domain are trusted slightly less than the apex.
pub const SUBDOMAIN_FACTOR: f32 = 0.95;

/// Keys for the TLD-class scores inside the trusted table.
const EDU_CLASS: &str = "edu";
const GOV_CLASS: &str = "gov";

/// Trusted and unreliable domain tables, loaded from JSON or defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainTrustTable {
    /// Domain (or TLD class `edu` / `gov`) → trust score.
    #[serde(default)]
    pub trusted: HashMap<String, f32>,
    /// Known-unreliable domains → (low) trust score.
    #[serde(default)]
    pub unreliable: HashMap<String, f32>,
}

impl DomainTrustTable {
    /// Load the table from a JSON file.
    /// Falls back to `default_seed()` on error.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => match serde_json::from_str::<Self>(&s) {
                Ok(t) => t.normalized(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "domain trust file invalid; using seed");
                    Self::default_seed()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no domain trust file; using seed");
                Self::default_seed()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "domain trust file unreadable; using seed");
                Self::default_seed()
            }
        }
    }

    /// Lower-case keys, drop empty ones, clamp scores.
    fn normalized(self) -> Self {
        let clean = |m: HashMap<String, f32>| {
            m.into_iter()
                .filter_map(|(k, v)| {
                    let k = k.trim().trim_start_matches('.').to_ascii_lowercase();
                    (!k.is_empty() && v.is_finite()).then(|| (k, clamp01(v)))
                })
                .collect::<HashMap<_, _>>()
        };
        Self {
            trusted: clean(self.trusted),
            unreliable: clean(self.unreliable),
        }
    }

    /// Resolve a trust score for an optional URL.
    ///
    /// Steps:
    /// 1. Unreliable match (exact or subdomain) → its score.
    /// 2. Exact trusted match.
    /// 3. `.edu` / `.gov` class score.
    /// 4. Subdomain of a trusted domain → score × 0.95 (longest parent wins).
    /// 5. Otherwise `None`.
    pub fn resolve(&self, url: Option<&str>) -> Option<f32> {
        let host = source_host(url?)?;
        let domain = host.strip_prefix("www.").unwrap_or(&host);
        self.resolve_host(domain)
    }

    /// Same as [`resolve`](Self::resolve) for an already extracted, `www.`-stripped host.
    pub fn resolve_host(&self, domain: &str) -> Option<f32> {
        if domain.is_empty() {
            return None;
        }

        // 1) Unreliable first, so a bad site is never upgraded.
        if let Some(score) = best_suffix_match(&self.unreliable, domain, true) {
            return Some(score);
        }

        // 2) Exact trusted match.
        if let Some(&score) = self.trusted.get(domain) {
            return Some(score);
        }

        // 3) TLD classes.
        if domain.ends_with(".edu") {
            if let Some(&score) = self.trusted.get(EDU_CLASS) {
                return Some(score);
            }
        }
        if domain.ends_with(".gov") {
            if let Some(&score) = self.trusted.get(GOV_CLASS) {
                return Some(score);
            }
        }

        // 4) Subdomain of a trusted registrable domain.
        best_suffix_match(&self.trusted, domain, false).map(|s| s * SUBDOMAIN_FACTOR)
    }

    /// Number of (trusted, unreliable) entries, for diagnostics.
    pub fn sizes(&self) -> (usize, usize) {
        (self.trusted.len(), self.unreliable.len())
    }

    /// Built-in seed of news, science, fact-check, government and reference domains.
    pub fn default_seed() -> Self {
        let mut trusted = HashMap::new();
        let mut unreliable = HashMap::new();

        for (k, v) in [
            // Wire services & international news
            ("reuters.com", 0.98),
            ("apnews.com", 0.98),
            ("bbc.com", 0.97),
            ("bbc.co.uk", 0.97),
            ("afp.com", 0.97),
            ("dpa.com", 0.96),
            ("tass.com", 0.90),
            // Newspapers of record
            ("nytimes.com", 0.94),
            ("washingtonpost.com", 0.93),
            ("wsj.com", 0.94),
            ("theguardian.com", 0.93),
            ("thetimes.co.uk", 0.92),
            ("ft.com", 0.93),
            ("telegraph.co.uk", 0.91),
            ("economist.com", 0.93),
            ("latimes.com", 0.90),
            // National news
            ("npr.org", 0.90),
            ("pbs.org", 0.90),
            ("cnn.com", 0.87),
            ("nbcnews.com", 0.88),
            ("cbsnews.com", 0.88),
            ("abcnews.go.com", 0.88),
            ("usatoday.com", 0.85),
            // Quality journalism
            ("theatlantic.com", 0.85),
            ("newyorker.com", 0.85),
            ("vox.com", 0.82),
            ("politico.com", 0.83),
            ("axios.com", 0.82),
            ("propublica.org", 0.88),
            // Scientific / academic
            ("nature.com", 0.97),
            ("science.org", 0.97),
            ("cell.com", 0.96),
            ("thelancet.com", 0.96),
            ("nejm.org", 0.96),
            ("plos.org", 0.94),
            ("arxiv.org", 0.88),
            ("scholar.google.com", 0.85),
            // Fact-checkers
            ("factcheck.org", 0.95),
            ("snopes.com", 0.94),
            ("politifact.com", 0.94),
            ("fullfact.org", 0.93),
            ("truthorfiction.com", 0.92),
            ("mediabiasfactcheck.com", 0.90),
            ("checkyourfact.com", 0.91),
            // Government / educational
            (GOV_CLASS, 0.92),
            (EDU_CLASS, 0.88),
            ("un.org", 0.93),
            ("who.int", 0.94),
            ("cdc.gov", 0.95),
            ("nih.gov", 0.95),
            ("nasa.gov", 0.94),
            // Reference
            ("wikipedia.org", 0.82),
            ("britannica.com", 0.88),
            ("dictionary.com", 0.85),
        ] {
            trusted.insert(k.to_string(), v);
        }

        for (k, v) in [
            ("infowars.com", 0.15),
            ("naturalnews.com", 0.20),
            ("beforeitsnews.com", 0.18),
            ("yournewswire.com", 0.15),
            ("newspunch.com", 0.18),
            ("worldtruth.tv", 0.20),
            ("realfarmacy.com", 0.22),
            ("collective-evolution.com", 0.25),
        ] {
            unreliable.insert(k.to_string(), v);
        }

        Self {
            trusted,
            unreliable,
        }
    }
}

/// Lower-cased host of an absolute URL, or `None` if the URL does not parse.
pub fn source_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.').to_ascii_lowercase();
    (!host.is_empty()).then_some(host)
}

/// Find the longest table key that equals `domain` (when `allow_exact`) or is a
/// dotted parent of it. Keys without a dot (TLD classes) never match here.
fn best_suffix_match(table: &HashMap<String, f32>, domain: &str, allow_exact: bool) -> Option<f32> {
    table
        .iter()
        .filter(|(k, _)| k.contains('.'))
        .filter(|(k, _)| {
            (allow_exact && domain == k.as_str())
                || domain
                    .strip_suffix(k.as_str())
                    .is_some_and(|head| head.ends_with('.'))
        })
        .max_by_key(|(k, _)| k.len())
        .map(|(_, &v)| v)
}

/// Clamp to [0.0, 1.0].
fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}
