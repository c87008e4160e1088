//! Network actor - runs sends and history operations in the Tokio runtime

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::dispatch::RequestDispatcher;
use crate::history::HistoryRecorder;
use crate::messages::{NetworkCommand, NetworkResponse};

/// Network actor that executes dispatches and history commands concurrently
pub struct NetworkActor {
    dispatcher: Arc<RequestDispatcher>,
    recorder: Arc<HistoryRecorder>,
    response_tx: mpsc::UnboundedSender<NetworkResponse>,
    active_requests: JoinSet<()>,
}

impl NetworkActor {
    pub fn new(
        dispatcher: Arc<RequestDispatcher>,
        recorder: Arc<HistoryRecorder>,
        response_tx: mpsc::UnboundedSender<NetworkResponse>,
    ) -> Self {
        NetworkActor {
            dispatcher,
            recorder,
            response_tx,
            active_requests: JoinSet::new(),
        }
    }

    /// Run the network actor message loop
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<NetworkCommand>) {
        loop {
            tokio::select! {
                biased;

                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(NetworkCommand::Shutdown) | None => {
                            self.active_requests.abort_all();
                            break;
                        }
                        Some(cmd) => self.handle(cmd),
                    }
                }

                // Clean up completed tasks
                Some(_result) = self.active_requests.join_next() => {}
            }
        }
    }

    fn handle(&mut self, cmd: NetworkCommand) {
        let response_tx = self.response_tx.clone();

        match cmd {
            NetworkCommand::Dispatch { tab_id, request } => {
                let dispatcher = Arc::clone(&self.dispatcher);
                // No cancellation: every send resolves and is delivered
                self.active_requests.spawn(async move {
                    let result = dispatcher.execute(tab_id, request).await;
                    let _ = response_tx.send(NetworkResponse::Dispatched { tab_id, result });
                });
            }

            NetworkCommand::RefreshHistory => {
                let recorder = Arc::clone(&self.recorder);
                self.active_requests.spawn(async move {
                    // Failures surface on the snapshot
                    let _ = recorder.fetch_all().await;
                });
            }

            NetworkCommand::DeleteHistory(id) => {
                let recorder = Arc::clone(&self.recorder);
                self.active_requests.spawn(async move {
                    if let Err(err) = recorder.remove(&id).await {
                        tracing::warn!(id = %id, error = %err, "Could not delete history entry");
                        let _ = response_tx.send(NetworkResponse::HistoryFailed {
                            message: format!("Could not delete history entry: {}", err),
                        });
                    }
                });
            }

            NetworkCommand::ClearHistory => {
                let recorder = Arc::clone(&self.recorder);
                self.active_requests.spawn(async move {
                    if let Err(err) = recorder.clear().await {
                        tracing::warn!(error = %err, "Could not clear history");
                        let _ = response_tx.send(NetworkResponse::HistoryFailed {
                            message: format!("Could not clear history: {}", err),
                        });
                    }
                });
            }

            NetworkCommand::Shutdown => {}
        }
    }
}
