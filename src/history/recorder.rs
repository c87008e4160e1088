//! History recorder - cache of the backend log plus client-local favorites
//!
//! The cache is only ever replaced by a successful fetch; writes go to the
//! backend first and are followed by a re-fetch. Favorites live in the local
//! key/value store and are merged in at read time.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::backend::{HistoryBackend, HistoryPayload, HistoryRecord};
use crate::dispatch::DispatchCompleted;
use crate::error::PersistenceError;
use crate::ids::HistoryId;
use crate::store::KeyValueStore;

const FAVORITES_KEY: &str = "history.favorites";

/// A history record as shown to the user
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryItem {
    pub id: HistoryId,
    pub method: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub favorite: bool,
}

/// What the history view renders from
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HistorySnapshot {
    pub items: Vec<HistoryItem>,
    /// Last fetch failure, cleared by the next successful fetch
    pub error: Option<String>,
    /// Whether any fetch has succeeded yet
    pub loaded: bool,
}

#[derive(Default)]
struct Cache {
    records: Vec<HistoryRecord>,
    error: Option<String>,
    loaded: bool,
    /// Sequence number of the newest fetch applied so far
    applied: u64,
}

pub struct HistoryRecorder {
    backend: Arc<dyn HistoryBackend>,
    store: Arc<dyn KeyValueStore>,
    cache: Mutex<Cache>,
    favorites: Mutex<BTreeMap<HistoryId, bool>>,
    updates: watch::Sender<HistorySnapshot>,
    fetch_seq: AtomicU64,
}

impl HistoryRecorder {
    pub fn new(backend: Arc<dyn HistoryBackend>, store: Arc<dyn KeyValueStore>) -> Self {
        let favorites = store
            .get(FAVORITES_KEY)
            .and_then(|raw| serde_json::from_str::<BTreeMap<HistoryId, bool>>(&raw).ok())
            .map(|map| map.into_iter().filter(|(_, starred)| *starred).collect())
            .unwrap_or_default();
        let (updates, _) = watch::channel(HistorySnapshot::default());

        HistoryRecorder {
            backend,
            store,
            cache: Mutex::new(Cache::default()),
            favorites: Mutex::new(favorites),
            updates,
            fetch_seq: AtomicU64::new(0),
        }
    }

    /// Receives a fresh snapshot after every cache or favorites change
    pub fn subscribe(&self) -> watch::Receiver<HistorySnapshot> {
        self.updates.subscribe()
    }

    /// Current cache merged with favorites
    pub fn snapshot(&self) -> HistorySnapshot {
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        let favorites = self.favorites.lock().unwrap_or_else(|e| e.into_inner());
        HistorySnapshot {
            items: cache
                .records
                .iter()
                .map(|r| HistoryItem {
                    id: r.id.clone(),
                    method: r.method.clone(),
                    url: r.url.clone(),
                    created_at: r.created_at,
                    favorite: favorites.get(&r.id).copied().unwrap_or(false),
                })
                .collect(),
            error: cache.error.clone(),
            loaded: cache.loaded,
        }
    }

    /// Replaces the cache with the backend's log, newest first.
    /// On failure the previous cache is kept and the error is flagged.
    ///
    /// Fetches are numbered when they start. A result that lands after a
    /// later-started fetch was applied is discarded, so a slow poll cannot
    /// roll back the resync that follows a write.
    pub async fn fetch_all(&self) -> Result<Vec<HistoryItem>, PersistenceError> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let fetched = self.backend.fetch_all().await;
        {
            let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
            if seq < cache.applied {
                tracing::debug!(seq, applied = cache.applied, "Discarding stale history fetch");
                drop(cache);
                return fetched.map(|_| self.snapshot().items);
            }
            cache.applied = seq;
            match &fetched {
                Ok(records) => {
                    let mut records = records.clone();
                    records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                    cache.records = records;
                    cache.error = None;
                    cache.loaded = true;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "History fetch failed");
                    cache.error = Some(err.to_string());
                }
            }
        }
        self.publish();
        fetched.map(|_| self.snapshot().items)
    }

    /// Persists one entry, then resynchronizes the cache
    pub async fn save(&self, payload: &HistoryPayload) -> Result<(), PersistenceError> {
        self.backend.save(payload).await?;
        self.fetch_all().await?;
        Ok(())
    }

    pub async fn remove(&self, id: &HistoryId) -> Result<(), PersistenceError> {
        self.backend.delete(id).await?;
        self.fetch_all().await?;
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), PersistenceError> {
        self.backend.delete_all().await?;
        self.fetch_all().await?;
        Ok(())
    }

    /// Flips the local favorite mark and returns the new state
    pub fn toggle_favorite(&self, id: &HistoryId) -> bool {
        let (starred, encoded) = {
            let mut favorites = self.favorites.lock().unwrap_or_else(|e| e.into_inner());
            let starred = if favorites.remove(id).is_some() {
                false
            } else {
                favorites.insert(id.clone(), true);
                true
            };
            (starred, serde_json::to_string(&*favorites))
        };

        match encoded {
            Ok(json) => {
                if let Err(err) = self.store.set(FAVORITES_KEY, &json) {
                    tracing::warn!(error = %err, "Could not persist favorites");
                }
            }
            Err(err) => tracing::warn!(error = %err, "Could not encode favorites"),
        }
        self.publish();
        starred
    }

    pub fn is_favorite(&self, id: &HistoryId) -> bool {
        let favorites = self.favorites.lock().unwrap_or_else(|e| e.into_inner());
        favorites.contains_key(id)
    }

    /// Records a completed dispatch. Failures are logged, never returned.
    pub async fn record(&self, event: &DispatchCompleted) {
        let payload = HistoryPayload::new(event.method.as_str(), &event.url, event.timestamp);
        if let Err(err) = self.save(&payload).await {
            tracing::warn!(url = %event.url, error = %err, "Could not record history entry");
        }
    }

    /// Records every completion published by the dispatcher until the channel closes
    pub async fn run_subscriber(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<DispatchCompleted>) {
        while let Some(event) = events.recv().await {
            self.record(&event).await;
        }
        tracing::debug!("Dispatch event channel closed");
    }

    /// Re-fetches on a fixed interval until the returned handle is aborted.
    /// The first fetch happens immediately.
    pub fn spawn_poller(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                // Errors are already flagged on the snapshot
                let _ = recorder.fetch_all().await;
            }
        })
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}
