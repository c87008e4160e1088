//! Test doubles for the network and persistence boundaries

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use tabpost::error::{NetworkError, PersistenceError};
use tabpost::history::{HistoryBackend, HistoryPayload, HistoryRecord};
use tabpost::ids::HistoryId;
use tabpost::network::client::{HttpExecutor, OutboundRequest, RawResponse};

/// Executor that records requests and replays a canned outcome
pub struct FakeExecutor {
    outcome: Result<RawResponse, NetworkError>,
    pub seen: Mutex<Vec<OutboundRequest>>,
}

impl FakeExecutor {
    pub fn replying(status: u16, content_type: &str, body: &str) -> Self {
        FakeExecutor {
            outcome: Ok(RawResponse {
                status,
                status_text: "OK".to_string(),
                headers: vec![("Content-Type".to_string(), content_type.to_string())],
                body: body.as_bytes().to_vec(),
                content_type: Some(content_type.to_string()),
            }),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        FakeExecutor {
            outcome: Err(NetworkError::Connect(message.to_string())),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last(&self) -> OutboundRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl HttpExecutor for FakeExecutor {
    async fn execute(&self, request: OutboundRequest) -> Result<RawResponse, NetworkError> {
        self.seen.lock().unwrap().push(request);
        self.outcome.clone()
    }
}

/// In-memory history backend with switchable failures
#[derive(Default)]
pub struct FakeBackend {
    pub records: Mutex<Vec<HistoryRecord>>,
    pub save_attempts: AtomicUsize,
    pub fetches: AtomicUsize,
    pub fail_saves: bool,
    pub fail_fetches: Mutex<bool>,
}

impl FakeBackend {
    pub fn failing_saves() -> Self {
        FakeBackend {
            fail_saves: true,
            ..FakeBackend::default()
        }
    }

    pub fn with_records(records: Vec<HistoryRecord>) -> Self {
        FakeBackend {
            records: Mutex::new(records),
            ..FakeBackend::default()
        }
    }

    pub fn save_attempts(&self) -> usize {
        self.save_attempts.load(Ordering::SeqCst)
    }

    pub fn set_fetch_failure(&self, fail: bool) {
        *self.fail_fetches.lock().unwrap() = fail;
    }
}

#[async_trait]
impl HistoryBackend for FakeBackend {
    async fn save(&self, payload: &HistoryPayload) -> Result<(), PersistenceError> {
        let n = self.save_attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail_saves {
            return Err(PersistenceError::Rejected("disk full".to_string()));
        }
        self.records.lock().unwrap().push(record(
            &format!("saved-{n}"),
            &payload.method,
            &payload.url,
            Utc::now(),
        ));
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, PersistenceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if *self.fail_fetches.lock().unwrap() {
            return Err(PersistenceError::Transport("connection refused".to_string()));
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn delete(&self, id: &HistoryId) -> Result<(), PersistenceError> {
        self.records.lock().unwrap().retain(|r| &r.id != id);
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), PersistenceError> {
        self.records.lock().unwrap().clear();
        Ok(())
    }
}

pub fn record(id: &str, method: &str, url: &str, created_at: chrono::DateTime<Utc>) -> HistoryRecord {
    HistoryRecord {
        id: HistoryId::from(id),
        method: method.to_string(),
        url: url.to_string(),
        month: 1,
        day: 1,
        year: 2026,
        time: "00:00:00".to_string(),
        created_at,
    }
}

pub fn at(hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap()
}
