// src/config/engine.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};
use tracing::{info, warn};

pub const DEFAULT_ENGINE_CONFIG_PATH: &str = "config/engine.toml";
pub const ENV_ENGINE_CONFIG_PATH: &str = "CREDIBILITY_CONFIG_PATH";

pub const ENV_ML_ENABLED: &str = "ML_ENABLED";
pub const ENV_ML_PROVIDER: &str = "ML_PROVIDER";
pub const ENV_ML_ENDPOINT: &str = "ML_ENDPOINT";
pub const ENV_ML_API_KEY: &str = "ML_API_KEY";
pub const ENV_ML_TIMEOUT_MS: &str = "ML_TIMEOUT_MS";
pub const ENV_DOMAIN_TRUST_PATH: &str = "DOMAIN_TRUST_PATH";
pub const ENV_DEBUG_ROUTES: &str = "DEBUG_ROUTES";

fn default_min_text_len() -> usize {
    10
}
fn default_report_capacity() -> usize {
    10_000
}
fn default_provider() -> String {
    "disabled".to_string()
}
fn default_positive_label() -> String {
    "LABEL_1".to_string()
}
fn default_timeout_ms() -> u64 {
    3_000
}
fn default_daily_limit() -> u32 {
    500
}
fn default_cache_dir() -> String {
    ".ml_cache".to_string()
}
fn default_domain_trust_path() -> String {
    "config/domain_trust.json".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Minimum trimmed text length accepted by `/analyze/text`.
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,
    #[serde(default = "default_report_capacity")]
    pub report_capacity: usize,
    /// Mount `/metrics` and `/debug/*`.
    #[serde(default)]
    pub debug_routes: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_text_len: default_min_text_len(),
            report_capacity: default_report_capacity(),
            debug_routes: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlConfig {
    #[serde(default)]
    pub enabled: bool,
    /// "http" | "mock" | "disabled" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Classifier label counted as "credible".
    #[serde(default = "default_positive_label")]
    pub positive_label: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            endpoint: None,
            api_key: None,
            positive_label: default_positive_label(),
            timeout_ms: default_timeout_ms(),
            daily_limit: default_daily_limit(),
            cache_dir: default_cache_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesConfig {
    #[serde(default = "default_domain_trust_path")]
    pub domain_trust_path: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            domain_trust_path: default_domain_trust_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub ml: MlConfig,
    #[serde(default)]
    pub tables: TablesConfig,
}

impl EngineConfig {
    /// Load from `CREDIBILITY_CONFIG_PATH` or `config/engine.toml`, then apply env overrides.
    /// A missing file means defaults; a malformed one is an error.
    pub fn load() -> anyhow::Result<Self> {
        let path = env::var(ENV_ENGINE_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_ENGINE_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::load_from_file(&path)?
        } else {
            info!(path = %path.display(), "engine config not found; using defaults");
            Self::default()
        };
        cfg.apply_env();
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        let mut cfg = Self::from_toml_str(&data)
            .with_context(|| format!("parsing engine config {}", path.display()))?;
        cfg.sanitize();
        Ok(cfg)
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let mut cfg: EngineConfig = toml::from_str(s)?;
        cfg.sanitize();
        Ok(cfg)
    }

    /// Env variables win over the file.
    pub fn apply_env(&mut self) {
        if let Some(b) = parse_bool_env(env::var(ENV_ML_ENABLED).ok()) {
            self.ml.enabled = b;
        }
        if let Ok(p) = env::var(ENV_ML_PROVIDER) {
            self.ml.provider = p;
        }
        if let Ok(e) = env::var(ENV_ML_ENDPOINT) {
            self.ml.endpoint = Some(e);
        }
        if let Ok(k) = env::var(ENV_ML_API_KEY) {
            self.ml.api_key = Some(k);
        }
        if let Some(ms) = env::var(ENV_ML_TIMEOUT_MS)
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
        {
            self.ml.timeout_ms = ms;
        }
        if let Ok(p) = env::var(ENV_DOMAIN_TRUST_PATH) {
            self.tables.domain_trust_path = p;
        }
        if let Some(b) = parse_bool_env(env::var(ENV_DEBUG_ROUTES).ok()) {
            self.service.debug_routes = b;
        }
    }

    fn sanitize(&mut self) {
        self.ml.provider = self.ml.provider.trim().to_lowercase();
        if !matches!(self.ml.provider.as_str(), "http" | "mock" | "disabled") {
            warn!(provider = %self.ml.provider, "unknown ML provider in config; using `disabled`");
            self.ml.provider = default_provider();
        }
        if self.ml.timeout_ms == 0 || self.ml.timeout_ms > 60_000 {
            self.ml.timeout_ms = default_timeout_ms();
        }
        if self.ml.positive_label.trim().is_empty() {
            self.ml.positive_label = default_positive_label();
        }
        if self.service.min_text_len == 0 {
            self.service.min_text_len = default_min_text_len();
        }
        if self.service.report_capacity == 0 {
            self.service.report_capacity = default_report_capacity();
        }
    }
}

fn parse_bool_env(v: Option<String>) -> Option<bool> {
    match v?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
