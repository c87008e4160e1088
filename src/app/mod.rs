//! App layer - central state management and command processing
//!
//! The App actor receives UI events, network responses and history
//! snapshots, updates state, and emits network commands and render state.

pub mod state;
pub mod actor;
pub mod commands;

pub use state::{AppServices, AppState};
pub use actor::AppActor;
