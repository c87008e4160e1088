//! Network layer - HTTP execution behind the `HttpExecutor` port
//!
//! The Network actor receives commands from the app and sends back responses.

pub mod actor;
pub mod client;

pub use actor::NetworkActor;
pub use client::{ClientOptions, HttpExecutor, OutboundRequest, RawResponse, ReqwestExecutor};
