//! ML signal adapter: classifier provider abstraction + file cache + daily limit + timeout.
//!
//! The engine only ever sees `Option<f32>`. Every failure mode of the external
//! classifier (disabled, limit reached, timeout, HTTP error, malformed or
//! out-of-range output) collapses to `None`.

use std::fs;
use std::future::Future;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::MlConfig;

/// Upper bound on characters sent to a remote classifier.
const MAX_INPUT_CHARS: usize = 2000;
/// Classifier output is a weak signal: map p ∈ [0,1] into [0.35, 0.65].
const DAMPENING: f32 = 0.3;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// Capability interface for the ML signal. Implementations must not fail:
/// absence is `None`.
pub trait MlSignalProvider: Send + Sync {
    /// Probability-like signal in [0,1], or `None` if unavailable.
    fn classify<'a>(&'a self, text: &'a str)
        -> Pin<Box<dyn Future<Output = Option<f32>> + Send + 'a>>;
    /// Provider name for diagnostics/headers.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynMlProvider = Arc<dyn MlSignalProvider>;

/// Factory: build a provider according to config and environment variables.
///
/// * If `ML_TEST_MODE=mock`, returns a deterministic mock provider.
/// * Else if `config.enabled == false`, returns the disabled provider.
/// * Else builds the configured backend wrapped with caching + daily limit.
pub fn build_provider_from_config(config: &MlConfig) -> DynMlProvider {
    if std::env::var("ML_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockProvider::fixed(0.5));
    }

    if !config.enabled {
        return Arc::new(DisabledProvider);
    }

    match config.provider.as_str() {
        "http" => match HttpClassifierProvider::new(config) {
            Ok(backend) => Arc::new(CachingProvider::new(
                backend,
                PathBuf::from(&config.cache_dir),
                config.daily_limit,
            )),
            Err(e) => {
                warn!(error = %e, "ML classifier could not be built; ML signal disabled");
                Arc::new(DisabledProvider)
            }
        },
        "mock" => Arc::new(MockProvider::fixed(0.5)),
        other => {
            if other != "disabled" {
                warn!(provider = other, "unknown ML provider; ML signal disabled");
            }
            Arc::new(DisabledProvider)
        }
    }
}

/// Wraps a provider with a timeout and output validation.
#[derive(Clone)]
pub struct MlSignalAdapter {
    provider: DynMlProvider,
    timeout: Duration,
}

impl MlSignalAdapter {
    pub fn new(provider: DynMlProvider, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Adapter that never produces a signal.
    pub fn disabled() -> Self {
        Self::new(Arc::new(DisabledProvider), Duration::from_millis(1))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Query the provider. Never fails; any problem is `None`.
    pub async fn query(&self, text: &str) -> Option<f32> {
        let raw = match tokio::time::timeout(self.timeout, self.provider.classify(text)).await {
            Ok(v) => v,
            Err(_) => {
                warn!(
                    provider = self.provider.provider_name(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "ML provider timed out"
                );
                return None;
            }
        };
        validate_signal(raw, self.provider.provider_name())
    }
}

fn validate_signal(raw: Option<f32>, provider: &'static str) -> Option<f32> {
    match raw {
        Some(v) if v.is_finite() && (0.0..=1.0).contains(&v) => Some(v),
        Some(v) => {
            warn!(provider, value = %v, "ML provider returned out-of-range value; ignored");
            None
        }
        None => None,
    }
}

// ------------------------------------------------------------
// Backend abstraction + concrete backends
// ------------------------------------------------------------

/// Low-level backend: does a *real* remote call. Separated so we can reuse the same
/// caching wrapper for production and tests.
pub trait ClassifierBackend: Send + Sync + 'static {
    fn fetch<'a>(&'a self, text: &'a str)
        -> Pin<Box<dyn Future<Output = Option<f32>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// Text-classification endpoint speaking the common `{"inputs": ...}` →
/// `[[{"label": .., "score": ..}]]` shape.
pub struct HttpClassifierProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    positive_label: String,
}

impl HttpClassifierProvider {
    pub fn new(config: &MlConfig) -> anyhow::Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .context("ML endpoint is not configured")?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("credibility-scorer/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("building HTTP client for ML classifier")?;
        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone().unwrap_or_default(),
            positive_label: config.positive_label.to_ascii_lowercase(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassifierResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassifierResponse {
    fn positive_probability(self, positive_label: &str) -> Option<f32> {
        let scores = match self {
            ClassifierResponse::Nested(mut v) => {
                if v.is_empty() {
                    return None;
                }
                v.swap_remove(0)
            }
            ClassifierResponse::Flat(v) => v,
        };
        scores
            .into_iter()
            .find(|ls| ls.label.to_ascii_lowercase() == positive_label)
            .map(|ls| ls.score)
    }
}

/// Classifier probabilities are dampened around 0.5.
pub fn dampen(p: f32) -> f32 {
    0.50 + (p.clamp(0.0, 1.0) - 0.5) * DAMPENING
}

impl ClassifierBackend for HttpClassifierProvider {
    fn fetch<'a>(&'a self, text: &'a str)
        -> Pin<Box<dyn Future<Output = Option<f32>> + Send + 'a>> {
        Box::pin(async move {
            #[derive(Serialize)]
            struct Req<'a> {
                inputs: &'a str,
            }

            let input = truncate_chars(text, MAX_INPUT_CHARS);
            let mut req = self.http.post(&self.endpoint).json(&Req { inputs: input });
            if !self.api_key.is_empty() {
                req = req.bearer_auth(&self.api_key);
            }

            let resp = match req.send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "ML classifier request failed");
                    return None;
                }
            };
            if !resp.status().is_success() {
                warn!(status = %resp.status(), "ML classifier returned error status");
                return None;
            }
            let body: ClassifierResponse = match resp.json().await {
                Ok(b) => b,
                Err(e) => {
                    warn!(error = %e, "ML classifier returned malformed body");
                    return None;
                }
            };
            body.positive_probability(&self.positive_label).map(dampen)
        })
    }
    fn name(&self) -> &'static str {
        "http"
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Returns `None` always; used when the ML signal is disabled.
pub struct DisabledProvider;

impl MlSignalProvider for DisabledProvider {
    fn classify<'a>(&'a self, _text: &'a str)
        -> Pin<Box<dyn Future<Output = Option<f32>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic provider for tests/local runs. May return `None` or an
/// invalid value to exercise failure paths.
#[derive(Clone, Debug)]
pub struct MockProvider {
    pub fixed: Option<f32>,
    pub delay: Option<Duration>,
}

impl MockProvider {
    pub fn fixed(v: f32) -> Self {
        Self {
            fixed: Some(v),
            delay: None,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            fixed: None,
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

impl MlSignalProvider for MockProvider {
    fn classify<'a>(&'a self, _text: &'a str)
        -> Pin<Box<dyn Future<Output = Option<f32>> + Send + 'a>> {
        let out = self.fixed;
        let delay = self.delay;
        Box::pin(async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            out
        })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

impl ClassifierBackend for MockProvider {
    fn fetch<'a>(&'a self, text: &'a str)
        -> Pin<Box<dyn Future<Output = Option<f32>> + Send + 'a>> {
        self.classify(text)
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Caching wrapper (file cache + daily limit)
// ------------------------------------------------------------

/// File cache + daily call limit around a backend. The counter lives behind a `Mutex`.
pub struct CachingProvider<B: ClassifierBackend> {
    inner: B,
    cache_dir: PathBuf,
    daily_limit_max: u32,
    counter: Arc<Mutex<DailyCounter>>,
}

impl<B: ClassifierBackend> CachingProvider<B> {
    pub fn new(inner: B, cache_dir: PathBuf, daily_limit_max: u32) -> Self {
        if let Err(e) = fs::create_dir_all(&cache_dir) {
            warn!(dir = %cache_dir.display(), error = %e, "ML cache dir not writable");
        }
        let counter = Arc::new(Mutex::new(
            load_daily_counter(&cache_dir).unwrap_or_default(),
        ));
        info!(
            backend = inner.name(),
            dir = %cache_dir.display(),
            daily_limit = daily_limit_max,
            "ML caching provider ready"
        );
        Self {
            inner,
            cache_dir,
            daily_limit_max,
            counter,
        }
    }

    async fn classify_impl(&self, text: &str) -> Option<f32> {
        let key = cache_key(text);

        // 1) Cache lookup (hits are free).
        if let Some(hit) = read_cache_file(&self.cache_dir, &key) {
            debug!(key = %&key[..12], "ML cache hit");
            return Some(hit.score);
        }

        // 2) Daily limit (only real calls count). The slot is reserved under the lock
        //    so concurrent misses cannot overshoot the limit.
        {
            let mut g = self.lock_counter();
            if g.is_expired() {
                g.reset_to_today();
            }
            if g.count >= self.daily_limit_max {
                debug!(limit = self.daily_limit_max, "ML daily limit reached");
                return None;
            }
            g.count += 1;
            self.persist_counter(&g);
        }

        // 3) Real call; a call that yields nothing gives its slot back.
        let Some(fresh) = self.inner.fetch(text).await else {
            let mut g = self.lock_counter();
            if !g.is_expired() {
                g.count = g.count.saturating_sub(1);
                self.persist_counter(&g);
            }
            return None;
        };
        if let Err(e) = write_cache_file(&self.cache_dir, &key, &CachedSignal { score: fresh }) {
            debug!(error = %e, "ML cache write failed");
        }
        Some(fresh)
    }

    fn lock_counter(&self) -> std::sync::MutexGuard<'_, DailyCounter> {
        match self.counter.lock() {
            Ok(g) => g,
            Err(poison) => poison.into_inner(),
        }
    }

    fn persist_counter(&self, dc: &DailyCounter) {
        if let Err(e) = save_daily_counter(&self.cache_dir, dc) {
            debug!(error = %e, "ML daily counter write failed");
        }
    }
}

impl<B: ClassifierBackend> MlSignalProvider for CachingProvider<B> {
    fn classify<'a>(&'a self, text: &'a str)
        -> Pin<Box<dyn Future<Output = Option<f32>> + Send + 'a>> {
        Box::pin(self.classify_impl(text))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

// ------------------------------------------------------------
// File cache helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CachedSignal {
    score: f32,
}

fn cache_key(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.json"))
}

fn read_cache_file(dir: &Path, key: &str) -> Option<CachedSignal> {
    let path = cache_path(dir, key);
    let mut file = fs::File::open(path).ok()?;
    let mut buf = String::new();
    file.read_to_string(&mut buf).ok()?;
    serde_json::from_str(&buf).ok()
}

fn write_cache_file(dir: &Path, key: &str, value: &CachedSignal) -> io::Result<()> {
    let path = cache_path(dir, key);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(value).map_err(io::Error::other)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(json.as_bytes())?;
    fs::rename(tmp, path)?;
    Ok(())
}

// ------------------------------------------------------------
// Daily counter helpers
// ------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DailyCounter {
    date: String,
    count: u32,
}

impl Default for DailyCounter {
    fn default() -> Self {
        Self {
            date: today(),
            count: 0,
        }
    }
}

impl DailyCounter {
    fn is_expired(&self) -> bool {
        self.date != today()
    }
    fn reset_to_today(&mut self) {
        self.date = today();
        self.count = 0;
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}

fn counter_path(dir: &Path) -> PathBuf {
    dir.join("daily_count.json")
}

fn load_daily_counter(dir: &Path) -> io::Result<DailyCounter> {
    let s = fs::read_to_string(counter_path(dir))?;
    serde_json::from_str(&s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn save_daily_counter(dir: &Path, dc: &DailyCounter) -> io::Result<()> {
    let p = counter_path(dir);
    let tmp = p.with_extension("json.tmp");
    let s = serde_json::to_string(dc).map_err(io::Error::other)?;
    let mut f = fs::File::create(&tmp)?;
    f.write_all(s.as_bytes())?;
    fs::rename(tmp, p)?;
    Ok(())
}
