//! Network messages - communication between App and Network layers

use crate::error::DispatchError;
use crate::ids::{HistoryId, TabId};
use crate::models::DispatchResult;
use crate::network::client::OutboundRequest;

/// Commands sent from App layer to Network layer
#[derive(Debug, Clone)]
pub enum NetworkCommand {
    /// Execute a request that already passed validation
    Dispatch {
        tab_id: TabId,
        request: OutboundRequest,
    },
    /// Re-fetch the history log outside the polling schedule
    RefreshHistory,
    DeleteHistory(HistoryId),
    ClearHistory,
    /// Shutdown the network actor
    Shutdown,
}

/// Responses sent from Network layer to App layer
#[derive(Debug, Clone)]
pub enum NetworkResponse {
    /// A send resolved, successfully or not
    Dispatched {
        tab_id: TabId,
        result: Result<DispatchResult, DispatchError>,
    },
    /// A user-initiated history operation failed
    HistoryFailed { message: String },
}

impl NetworkResponse {
    /// Tab the response belongs to, if any
    pub fn tab_id(&self) -> Option<TabId> {
        match self {
            NetworkResponse::Dispatched { tab_id, .. } => Some(*tab_id),
            NetworkResponse::HistoryFailed { .. } => None,
        }
    }
}
