//! History of past dispatches
//!
//! Independent of tab lifecycle: written by the dispatch subscriber, read by
//! the history view through snapshots.

pub mod backend;
pub mod grouping;
pub mod recorder;

pub use backend::{FileHistoryBackend, HistoryBackend, HistoryPayload, HistoryRecord, HttpHistoryBackend};
pub use grouping::{group, HistoryFilter, HistoryGroup};
pub use recorder::{HistoryItem, HistoryRecorder, HistorySnapshot};
