//! App actor - message loop processing UI events, network responses and history updates

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};

use crate::app::state::AppState;
use crate::history::HistorySnapshot;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
}

impl AppActor {
    pub fn new(
        state: AppState,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        AppActor {
            state,
            network_tx,
            render_tx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
        mut history_rx: watch::Receiver<HistorySnapshot>,
    ) {
        if self.state.show_history {
            self.state.mount_history();
        }
        let mut notice_tick = tokio::time::interval(Duration::from_millis(500));

        // Send initial render state
        self.render();

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        self.state.unmount_history();
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    self.render();
                }
                Some(response) = net_rx.recv() => {
                    self.state.handle_response(response);
                    self.render();
                }
                Ok(()) = history_rx.changed() => {
                    let snapshot = history_rx.borrow_and_update().clone();
                    self.state.set_history(snapshot);
                    self.render();
                }
                _ = notice_tick.tick() => {
                    if self.state.expire_notice(Instant::now()) {
                        self.render();
                    }
                }
                else => break,
            }
        }
    }

    fn render(&self) {
        let _ = self.render_tx.send(self.state.to_render_state());
    }

    fn send(&self, cmd: Option<NetworkCommand>) {
        if let Some(cmd) = cmd {
            let _ = self.network_tx.send(cmd);
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Tabs
            UiEvent::NewTab => self.state.new_tab(),
            UiEvent::CloseTab => self.state.close_tab(),
            UiEvent::NextTab => self.state.next_tab(),
            UiEvent::PrevTab => self.state.prev_tab(),

            // Panel navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Request actions
            UiEvent::CycleMethod => self.state.cycle_method(),
            UiEvent::SendRequest => {
                let cmd = self.state.prepare_send();
                self.send(cmd);
            }

            // Entry lists
            UiEvent::NextRow => self.state.next_row(),
            UiEvent::PrevRow => self.state.prev_row(),
            UiEvent::ToggleRow => self.state.toggle_row(),
            UiEvent::DeleteRow => self.state.delete_row(),
            UiEvent::ClearRows => self.state.clear_rows(),
            UiEvent::MoveRowUp => self.state.move_row_up(),
            UiEvent::MoveRowDown => self.state.move_row_down(),
            UiEvent::SwitchColumn => self.state.switch_column(),
            UiEvent::AcceptSuggestion => self.state.accept_suggestion(),

            // Auth
            UiEvent::CycleAuth => self.state.cycle_auth(),
            UiEvent::NextAuthField => self.state.next_auth_field(),

            // History
            UiEvent::ToggleHistory => self.state.toggle_history(),
            UiEvent::HistoryNext => self.state.history_next(),
            UiEvent::HistoryPrev => self.state.history_prev(),
            UiEvent::OpenHistoryItem => self.state.open_history_item(),
            UiEvent::ToggleFavorite => self.state.toggle_favorite(),
            UiEvent::ToggleFavoritesFilter => self.state.toggle_favorites_filter(),
            UiEvent::DeleteHistoryItem => {
                let cmd = self.state.delete_history_item();
                self.send(cmd);
            }
            UiEvent::ClearHistory => self.send(Some(NetworkCommand::ClearHistory)),
            UiEvent::RefreshHistory => self.send(Some(NetworkCommand::RefreshHistory)),

            // Appearance
            UiEvent::ToggleTheme => self.state.toggle_theme(),
            UiEvent::NextAccent => self.state.next_accent(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}
