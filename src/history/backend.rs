//! History persistence boundary and its adapters
//!
//! Wire contract of the REST flavour:
//! - `POST {endpoint}` with a `HistoryPayload` answers `{ "success": bool, "error"?: string }`
//! - `GET {endpoint}` answers `{ "items": [HistoryRecord] }`
//! - `DELETE {endpoint}/{id}` removes one record, `DELETE {endpoint}` removes all

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::PersistenceError;
use crate::ids::HistoryId;

/// Maximum records kept by the file backend
const MAX_HISTORY: usize = 500;

/// One dispatch as sent to the backend; calendar fields are computed client-side
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryPayload {
    pub method: String,
    pub url: String,
    pub month: u32,
    pub day: u32,
    pub year: i32,
    pub time: String,
}

impl HistoryPayload {
    pub fn new(method: &str, url: &str, timestamp: DateTime<Utc>) -> Self {
        HistoryPayload {
            method: method.to_string(),
            url: url.to_string(),
            month: timestamp.month(),
            day: timestamp.day(),
            year: timestamp.year(),
            time: timestamp.format("%H:%M:%S").to_string(),
        }
    }
}

/// A stored history record
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: HistoryId,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub month: u32,
    #[serde(default)]
    pub day: u32,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub time: String,
    pub created_at: DateTime<Utc>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<HistoryId, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(HistoryId(s)),
        serde_json::Value::Number(n) => Ok(HistoryId(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Save/fetch/delete contract of the history log
#[async_trait]
pub trait HistoryBackend: Send + Sync {
    async fn save(&self, payload: &HistoryPayload) -> Result<(), PersistenceError>;
    async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, PersistenceError>;
    async fn delete(&self, id: &HistoryId) -> Result<(), PersistenceError>;
    async fn delete_all(&self) -> Result<(), PersistenceError>;
}

#[derive(Debug, Deserialize)]
struct SaveReply {
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListReply {
    #[serde(default)]
    items: Vec<HistoryRecord>,
}

/// History service reached over HTTP
#[derive(Clone, Debug)]
pub struct HttpHistoryBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpHistoryBackend {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        HttpHistoryBackend {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn item_url(&self, id: &HistoryId) -> String {
        format!("{}/{}", self.endpoint, id)
    }
}

#[async_trait]
impl HistoryBackend for HttpHistoryBackend {
    async fn save(&self, payload: &HistoryPayload) -> Result<(), PersistenceError> {
        let reply: SaveReply = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if reply.success {
            Ok(())
        } else {
            Err(PersistenceError::Rejected(
                reply.error.unwrap_or_else(|| "unknown error".to_string()),
            ))
        }
    }

    async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, PersistenceError> {
        let reply: ListReply = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply.items)
    }

    async fn delete(&self, id: &HistoryId) -> Result<(), PersistenceError> {
        self.client
            .delete(self.item_url(id))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), PersistenceError> {
        self.client
            .delete(&self.endpoint)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// History kept in a JSON file, assigning ids and timestamps like a server would
pub struct FileHistoryBackend {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Mutex<()>,
}

impl FileHistoryBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileHistoryBackend {
            path: path.into(),
            clock: Arc::new(SystemClock),
            lock: Mutex::new(()),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn load(&self) -> Result<Vec<HistoryRecord>, PersistenceError> {
        if !fs::try_exists(&self.path).await? {
            return Ok(Vec::new());
        }
        let content = fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&content)?)
    }

    async fn store(&self, records: &[HistoryRecord]) -> Result<(), PersistenceError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).await?;
            }
        }
        let content = serde_json::to_vec_pretty(records)?;
        fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryBackend for FileHistoryBackend {
    async fn save(&self, payload: &HistoryPayload) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.push(HistoryRecord {
            id: HistoryId(Uuid::now_v7().to_string()),
            method: payload.method.clone(),
            url: payload.url.clone(),
            month: payload.month,
            day: payload.day,
            year: payload.year,
            time: payload.time.clone(),
            created_at: self.clock.now(),
        });
        if records.len() > MAX_HISTORY {
            let excess = records.len() - MAX_HISTORY;
            records.drain(..excess);
        }
        self.store(&records).await
    }

    async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, PersistenceError> {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    async fn delete(&self, id: &HistoryId) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        records.retain(|r| &r.id != id);
        self.store(&records).await
    }

    async fn delete_all(&self) -> Result<(), PersistenceError> {
        let _guard = self.lock.lock().await;
        self.store(&[]).await
    }
}
