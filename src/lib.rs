//! # tabpost
//!
//! A terminal HTTP request workbench with multiple tabs and persisted history.
//!
//! ## Features
//! - Tabs, each holding an independent request draft and its last response
//! - Self-growing parameter, header and variable lists with pinned rows
//! - `{{variable}}` substitution, Bearer and Basic auth
//! - Request history with favorites, grouped by relative age
//! - File or REST history backends
//!
//! ## Architecture
//! Actor-based with channels:
//! - UI Layer (Ratatui) - synchronous
//! - App Layer (State machine over the tab workspace)
//! - Network Layer (Tokio runtime) - dispatch and history commands
//!
//! Completed dispatches are published on a channel; the history recorder
//! subscribes to it, so persistence failures never reach a send.

pub mod app;
pub mod clock;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod entries;
pub mod error;
pub mod history;
pub mod ids;
pub mod messages;
pub mod models;
pub mod network;
pub mod preferences;
pub mod store;
pub mod suggest;
pub mod ui;
pub mod workspace;

// Re-export commonly used types
pub use app::{AppActor, AppServices, AppState};
pub use dispatch::{DispatchCompleted, RequestDispatcher};
pub use entries::{Entry, EntryField, EntryList, EntryListKind};
pub use error::{DispatchError, NetworkError, PersistenceError, StoreError};
pub use history::{HistoryBackend, HistoryRecorder};
pub use messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
pub use models::{AuthType, DispatchResult, HttpMethod, ResponseBody};
pub use network::NetworkActor;
pub use workspace::{Tab, TabWorkspace};
