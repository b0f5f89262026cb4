//! reports.rs: persistence of analysis reports and user flags.
//!
//! The HTTP layer only talks to the `ReportStore` trait. The bundled implementation
//! keeps a bounded in-memory map; oldest reports are evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analyze::{CredibilityResult, Label, SignalSet};

/// Stored content is cut to this many characters.
pub const MAX_STORED_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFlag {
    pub flag_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReport {
    pub id: Uuid,
    pub content: String,
    pub url: Option<String>,
    pub score: f32,
    pub label: Label,
    pub confidence: f32,
    pub explanation: String,
    pub breakdown: SignalSet,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub flags: Vec<UserFlag>,
}

impl StoredReport {
    pub fn new(
        id: Uuid,
        text: &str,
        url: Option<&str>,
        result: &CredibilityResult,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            content: truncate_chars(text, MAX_STORED_CONTENT_CHARS).to_string(),
            url: url.map(str::to_string),
            score: result.score,
            label: result.label,
            confidence: result.confidence,
            explanation: result.explanation.clone(),
            breakdown: result.breakdown,
            created_at,
            flags: Vec::new(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StoreError {
    #[error("report {0} not found")]
    NotFound(Uuid),
    #[error("report store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait ReportStore: Send + Sync {
    async fn save(&self, report: StoredReport) -> Result<(), StoreError>;
    async fn get(&self, id: Uuid) -> Option<StoredReport>;
    async fn add_flag(&self, id: Uuid, flag: UserFlag) -> Result<(), StoreError>;
    async fn len(&self) -> usize;
}

#[derive(Debug, Default)]
struct Inner {
    by_id: HashMap<Uuid, StoredReport>,
    order: VecDeque<Uuid>,
}

#[derive(Debug)]
pub struct InMemoryReportStore {
    inner: Mutex<Inner>,
    cap: usize,
}

impl InMemoryReportStore {
    pub fn with_capacity(cap: usize) -> Self {
        let cap = cap.max(1);
        Self {
            inner: Mutex::new(Inner {
                by_id: HashMap::with_capacity(cap.min(10_000)),
                order: VecDeque::with_capacity(cap.min(10_000)),
            }),
            cap,
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("report store mutex poisoned".into()))
    }
}

#[async_trait::async_trait]
impl ReportStore for InMemoryReportStore {
    async fn save(&self, report: StoredReport) -> Result<(), StoreError> {
        let mut g = self.lock()?;
        let id = report.id;
        if g.by_id.insert(id, report).is_none() {
            g.order.push_back(id);
        }
        while g.order.len() > self.cap {
            if let Some(old) = g.order.pop_front() {
                g.by_id.remove(&old);
            }
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Option<StoredReport> {
        self.lock().ok()?.by_id.get(&id).cloned()
    }

    async fn add_flag(&self, id: Uuid, flag: UserFlag) -> Result<(), StoreError> {
        let mut g = self.lock()?;
        let report = g.by_id.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        report.flags.push(flag);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.lock().map(|g| g.by_id.len()).unwrap_or(0)
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(text: &str) -> StoredReport {
        StoredReport::new(
            Uuid::new_v4(),
            text,
            None,
            &CredibilityResult::fallback(),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn save_get_and_flag() {
        let store = InMemoryReportStore::with_capacity(10);
        let r = report("hello world");
        let id = r.id;
        store.save(r).await.unwrap();

        let got = store.get(id).await.unwrap();
        assert_eq!(got.content, "hello world");
        assert!(got.flags.is_empty());

        let flag = UserFlag {
            flag_type: "misleading".into(),
            comment: Some("headline".into()),
            created_at: Utc::now(),
        };
        store.add_flag(id, flag).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().flags.len(), 1);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let store = InMemoryReportStore::with_capacity(10);
        let id = Uuid::new_v4();
        assert!(store.get(id).await.is_none());
        let flag = UserFlag {
            flag_type: "spam".into(),
            comment: None,
            created_at: Utc::now(),
        };
        assert_eq!(store.add_flag(id, flag).await, Err(StoreError::NotFound(id)));
    }

    #[tokio::test]
    async fn oldest_reports_are_evicted() {
        let store = InMemoryReportStore::with_capacity(2);
        let a = report("a");
        let a_id = a.id;
        store.save(a).await.unwrap();
        store.save(report("b")).await.unwrap();
        store.save(report("c")).await.unwrap();
        assert_eq!(store.len().await, 2);
        assert!(store.get(a_id).await.is_none());
    }

    #[test]
    fn content_is_truncated() {
        let long = "é".repeat(800);
        let r = report(&long);
        assert_eq!(r.content.chars().count(), MAX_STORED_CONTENT_CHARS);
    }
}
