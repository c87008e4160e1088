//! Command handlers - business logic for processing UI events

use crate::app::AppState;
use crate::history::HistoryItem;
use crate::messages::ui_events::{AuthField, Column, InputMode, Panel};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{AuthType, HttpMethod};
use crate::workspace::{TabDraft, TabPatch};

impl AppState {
    // ========================
    // Tabs
    // ========================

    pub fn new_tab(&mut self) {
        self.workspace.add_tab(TabDraft::default());
        self.reset_tab_view();
    }

    pub fn close_tab(&mut self) {
        if let Some(id) = self.workspace.active_tab_id() {
            self.workspace.close_tab(id);
        }
        // The editor always shows some tab
        if self.workspace.is_empty() {
            self.workspace.add_tab(TabDraft::default());
        }
        self.reset_tab_view();
    }

    pub fn next_tab(&mut self) {
        self.workspace.next_tab();
        self.reset_tab_view();
    }

    pub fn prev_tab(&mut self) {
        self.workspace.prev_tab();
        self.reset_tab_view();
    }

    fn reset_tab_view(&mut self) {
        self.input_mode = InputMode::Normal;
        self.selected_row = 0;
        self.column = Column::Key;
        self.response_scroll = 0;
        self.cursor_position = 0;
    }

    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.active_panel = self.active_panel.next();
        if self.active_panel == Panel::History && !self.show_history {
            self.active_panel = self.active_panel.next();
        }
        self.selected_row = 0;
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = self.active_panel.prev();
        if self.active_panel == Panel::History && !self.show_history {
            self.active_panel = self.active_panel.prev();
        }
        self.selected_row = 0;
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        if self.active_panel == Panel::Auth && self.auth_field == AuthField::Token {
            if let Some(AuthType::Basic { .. }) = self.workspace.active_tab().map(|t| &t.auth) {
                self.auth_field = AuthField::Username;
            }
        }
        if self.active_panel == Panel::Auth
            && matches!(self.workspace.active_tab().map(|t| &t.auth), Some(AuthType::None))
        {
            return;
        }
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.current_input().len();
    }

    pub fn stop_editing(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        let pos = self.cursor_position.min(input.len());
        self.cursor_position = input[..pos]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        if self.cursor_position < input.len() {
            self.cursor_position = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let mut input = self.current_input();
        let pos = self.cursor_position.min(input.len());
        input.insert(pos, c);
        if self.set_current_input(input) {
            self.cursor_position = pos + c.len_utf8();
        }
    }

    pub fn delete_char(&mut self) {
        let mut input = self.current_input();
        let pos = self.cursor_position.min(input.len());
        if pos == 0 {
            return;
        }
        let prev = input[..pos]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        input.remove(prev);
        if self.set_current_input(input) {
            self.cursor_position = prev;
        }
    }

    // ========================
    // Request
    // ========================

    pub fn cycle_method(&mut self) {
        if let Some(tab) = self.workspace.active_tab() {
            let (id, method) = (tab.id, tab.method.next());
            self.workspace.update_tab(
                id,
                TabPatch {
                    method: Some(method),
                    ..Default::default()
                },
                None,
            );
        }
    }

    /// Validates the active tab and builds the command that sends it.
    /// An invalid URL is reported inline and nothing is sent.
    pub fn prepare_send(&mut self) -> Option<NetworkCommand> {
        if self.input_mode == InputMode::Editing {
            self.stop_editing();
        }
        let tab = self.workspace.active_tab()?;
        match self.dispatcher.prepare(tab) {
            Ok((tab_id, request)) => {
                self.workspace.begin_dispatch();
                self.response_scroll = 0;
                Some(NetworkCommand::Dispatch { tab_id, request })
            }
            Err(err) => {
                tracing::debug!(error = %err, "Send blocked");
                self.show_notice(format!("Please enter a valid URL ({})", err));
                None
            }
        }
    }

    pub fn handle_response(&mut self, response: NetworkResponse) {
        match response {
            NetworkResponse::Dispatched { tab_id, result } => {
                self.workspace.commit_dispatch(tab_id, &result);
            }
            NetworkResponse::HistoryFailed { message } => self.show_notice(message),
        }
    }

    // ========================
    // Response scrolling
    // ========================

    pub fn scroll_up(&mut self) {
        self.response_scroll = self.response_scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.response_scroll = self.response_scroll.saturating_add(1);
    }

    // ========================
    // Entry lists
    // ========================

    fn entry_count(&self) -> usize {
        match (self.active_panel.entry_kind(), self.workspace.active_tab()) {
            (Some(kind), Some(tab)) => tab.entries(kind).len(),
            _ => 0,
        }
    }

    pub fn next_row(&mut self) {
        let len = self.entry_count();
        if len > 0 {
            self.selected_row = (self.selected_row + 1) % len;
        }
    }

    pub fn prev_row(&mut self) {
        let len = self.entry_count();
        if len > 0 {
            self.selected_row = self.selected_row.checked_sub(1).unwrap_or(len - 1);
        }
    }

    pub fn switch_column(&mut self) {
        self.column = self.column.toggle();
        self.cursor_position = self.current_input().len();
    }

    pub fn toggle_row(&mut self) {
        let (Some(kind), Some(tab_id)) = (self.active_panel.entry_kind(), self.workspace.active_tab_id()) else {
            return;
        };
        let Some((entry_id, enabled)) = self.selected_entry().map(|e| (e.id, e.enabled)) else {
            return;
        };
        self.workspace.edit_entries(tab_id, kind, |list| {
            (list.set_enabled(entry_id, !enabled), ())
        });
    }

    pub fn delete_row(&mut self) {
        let (Some(kind), Some(tab_id)) = (self.active_panel.entry_kind(), self.workspace.active_tab_id()) else {
            return;
        };
        let Some(entry) = self.selected_entry() else {
            return;
        };
        let (entry_id, locked) = (entry.id, entry.locked);
        if locked {
            self.show_notice("Pinned rows cannot be removed");
            return;
        }
        self.workspace.edit_entries(tab_id, kind, |list| {
            let removed = list.remove(entry_id);
            (removed, ())
        });
        let len = self.entry_count();
        self.selected_row = self.selected_row.min(len.saturating_sub(1));
    }

    pub fn clear_rows(&mut self) {
        let (Some(kind), Some(tab_id)) = (self.active_panel.entry_kind(), self.workspace.active_tab_id()) else {
            return;
        };
        self.workspace.edit_entries(tab_id, kind, |list| {
            list.clear();
            (true, ())
        });
        self.selected_row = 0;
    }

    pub fn move_row_up(&mut self) {
        self.move_row(-1);
    }

    pub fn move_row_down(&mut self) {
        self.move_row(1);
    }

    fn move_row(&mut self, delta: isize) {
        let (Some(kind), Some(tab)) = (self.active_panel.entry_kind(), self.workspace.active_tab()) else {
            return;
        };
        let tab_id = tab.id;
        let list = tab.entries(kind);
        let Some(entry_id) = list.entries().get(self.selected_row).map(|e| e.id) else {
            return;
        };

        // Locked rows and the scratch row stay put
        let Some(from) = list.movable_index(entry_id) else {
            return;
        };
        let to = from as isize + delta;
        if to < 0 || to as usize >= list.movable_len() {
            return;
        }

        let moved = self
            .workspace
            .edit_entries(tab_id, kind, |list| {
                let moved = list.reorder(from, to as usize);
                (moved, list.position(entry_id))
            })
            .flatten();
        if let Some(pos) = moved {
            self.selected_row = pos;
        }
    }

    /// Replaces the key being typed with the first suggestion
    pub fn accept_suggestion(&mut self) {
        if self.active_panel != Panel::Headers || self.column != Column::Key {
            return;
        }
        let Some(first) = self.suggestions.suggest(&self.current_input()).into_iter().next() else {
            return;
        };
        let len = first.len();
        if self.set_current_input(first) {
            self.cursor_position = len;
        }
    }

    // ========================
    // Auth
    // ========================

    pub fn cycle_auth(&mut self) {
        if let Some(tab) = self.workspace.active_tab() {
            let (id, auth) = (tab.id, tab.auth.cycle());
            self.workspace.update_tab(
                id,
                TabPatch {
                    auth: Some(auth),
                    ..Default::default()
                },
                None,
            );
        }
        self.auth_field = AuthField::Token;
    }

    pub fn next_auth_field(&mut self) {
        if let Some(AuthType::Basic { .. }) = self.workspace.active_tab().map(|t| &t.auth) {
            self.auth_field = match self.auth_field {
                AuthField::Username => AuthField::Password,
                _ => AuthField::Username,
            };
            self.cursor_position = self.current_input().len();
        }
    }

    // ========================
    // History
    // ========================

    /// Starts the refresh loop; it runs until the view is hidden
    pub fn mount_history(&mut self) {
        if self.poller.is_none() {
            self.poller = Some(self.recorder.spawn_poller(self.poll_interval));
        }
    }

    pub fn unmount_history(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }

    pub fn toggle_history(&mut self) {
        self.show_history = !self.show_history;
        if self.show_history {
            self.mount_history();
        } else {
            self.unmount_history();
            if self.active_panel == Panel::History {
                self.active_panel = Panel::Url;
                self.input_mode = InputMode::Normal;
            }
        }
    }

    pub fn set_history(&mut self, snapshot: crate::history::HistorySnapshot) {
        self.history = snapshot;
        let len = self.visible_history().len();
        self.history_selected = self.history_selected.min(len.saturating_sub(1));
    }

    fn selected_history(&self) -> Option<HistoryItem> {
        self.visible_history().into_iter().nth(self.history_selected)
    }

    pub fn history_next(&mut self) {
        let len = self.visible_history().len();
        if len > 0 {
            self.history_selected = (self.history_selected + 1).min(len - 1);
        }
    }

    pub fn history_prev(&mut self) {
        self.history_selected = self.history_selected.saturating_sub(1);
    }

    /// Opens the selected history entry in a new tab
    pub fn open_history_item(&mut self) {
        let Some(item) = self.selected_history() else {
            return;
        };
        self.workspace.add_tab(TabDraft {
            method: HttpMethod::parse(&item.method),
            url: Some(item.url),
            ..Default::default()
        });
        self.reset_tab_view();
        self.active_panel = Panel::Url;
    }

    pub fn toggle_favorite(&mut self) {
        if let Some(item) = self.selected_history() {
            self.recorder.toggle_favorite(&item.id);
            self.set_history(self.recorder.snapshot());
        }
    }

    pub fn toggle_favorites_filter(&mut self) {
        self.history_filter.favorites_only = !self.history_filter.favorites_only;
        self.history_selected = 0;
    }

    pub fn delete_history_item(&mut self) -> Option<NetworkCommand> {
        self.selected_history()
            .map(|item| NetworkCommand::DeleteHistory(item.id))
    }

    // ========================
    // Appearance
    // ========================

    pub fn toggle_theme(&mut self) {
        self.preferences.theme = self.preferences.theme.toggle();
        self.save_preferences();
    }

    pub fn next_accent(&mut self) {
        self.preferences.next_accent();
        self.save_preferences();
    }

    fn save_preferences(&mut self) {
        if let Err(err) = self.preferences.save(self.store.as_ref()) {
            tracing::warn!(error = %err, "Could not save preferences");
            self.show_notice("Could not save preferences");
        }
    }

    // ========================
    // Help popup
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use async_trait::async_trait;

    use crate::app::state::{AppServices, AppState};
    use crate::dispatch::RequestDispatcher;
    use crate::entries::EntryListKind;
    use crate::error::{NetworkError, PersistenceError};
    use crate::history::{HistoryBackend, HistoryPayload, HistoryRecord, HistoryRecorder};
    use crate::ids::HistoryId;
    use crate::messages::ui_events::{Column, InputMode, Panel};
    use crate::messages::NetworkCommand;
    use crate::network::client::{HttpExecutor, OutboundRequest, RawResponse};
    use crate::preferences::Theme;
    use crate::store::{KeyValueStore, MemoryStore};
    use crate::suggest::CommonHeaders;
    use crate::workspace::TabWorkspace;

    struct NoNetwork;

    #[async_trait]
    impl HttpExecutor for NoNetwork {
        async fn execute(&self, _request: OutboundRequest) -> Result<RawResponse, NetworkError> {
            Err(NetworkError::Connect("offline".into()))
        }
    }

    #[derive(Default)]
    struct EmptyHistory {
        saved: Mutex<Vec<HistoryPayload>>,
    }

    #[async_trait]
    impl HistoryBackend for EmptyHistory {
        async fn save(&self, payload: &HistoryPayload) -> Result<(), PersistenceError> {
            self.saved.lock().unwrap().push(payload.clone());
            Ok(())
        }
        async fn fetch_all(&self) -> Result<Vec<HistoryRecord>, PersistenceError> {
            Ok(Vec::new())
        }
        async fn delete(&self, _id: &HistoryId) -> Result<(), PersistenceError> {
            Ok(())
        }
        async fn delete_all(&self) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    fn state_with_store(store: Arc<dyn KeyValueStore>) -> AppState {
        let recorder = Arc::new(HistoryRecorder::new(
            Arc::new(EmptyHistory::default()),
            Arc::clone(&store),
        ));
        AppState::new(
            TabWorkspace::default(),
            AppServices {
                dispatcher: Arc::new(RequestDispatcher::new(Arc::new(NoNetwork))),
                recorder,
                store,
                suggestions: Box::new(CommonHeaders::default()),
                poll_interval: Duration::from_secs(30),
            },
        )
    }

    fn state() -> AppState {
        state_with_store(Arc::new(MemoryStore::new()))
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            state.enter_char(c);
        }
    }

    #[test]
    fn test_starts_with_one_tab() {
        let state = state();
        assert_eq!(state.workspace.len(), 1);
        assert_eq!(state.to_render_state().active_tab, Some(0));
    }

    #[test]
    fn test_closing_last_tab_opens_a_fresh_one() {
        let mut state = state();
        let before = state.workspace.active_tab_id();
        state.close_tab();
        assert_eq!(state.workspace.len(), 1);
        assert_ne!(state.workspace.active_tab_id(), before);
    }

    #[test]
    fn test_editing_url_marks_tab_dirty() {
        let mut state = state();
        state.start_editing();
        for _ in 0..3 {
            state.delete_char();
        }
        type_text(&mut state, "ip");
        let tab = state.workspace.active_tab().unwrap();
        assert_eq!(tab.url, "https://httpbin.org/ip");
        assert!(tab.is_dirty);
    }

    #[test]
    fn test_invalid_url_shows_notice_and_sends_nothing() {
        let mut state = state();
        state.start_editing();
        let len = state.current_input().len();
        for _ in 0..len {
            state.delete_char();
        }
        type_text(&mut state, "not a url");

        assert!(state.prepare_send().is_none());
        assert!(state.notice.is_some());
        assert!(!state.workspace.is_loading());
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_valid_send_marks_loading() {
        let mut state = state();
        let cmd = state.prepare_send();
        assert!(matches!(cmd, Some(NetworkCommand::Dispatch { .. })));
        assert!(state.workspace.is_loading());
    }

    #[test]
    fn test_notice_expires() {
        let mut state = state();
        state.show_notice("hello");
        assert!(!state.expire_notice(Instant::now()));
        assert!(state.expire_notice(Instant::now() + Duration::from_secs(60)));
        assert!(state.notice.is_none());
    }

    #[test]
    fn test_typing_into_scratch_row_grows_list() {
        let mut state = state();
        state.active_panel = Panel::Params;
        state.start_editing();
        type_text(&mut state, "page");
        state.switch_column();
        type_text(&mut state, "2");

        let tab = state.workspace.active_tab().unwrap();
        let params = tab.entries(EntryListKind::Parameters);
        assert_eq!(params.len(), 2);
        assert_eq!(params.entries()[0].key, "page");
        assert_eq!(params.entries()[0].value, "2");
        assert!(params.entries()[1].is_blank());
    }

    #[test]
    fn test_pinned_header_key_is_read_only() {
        let mut state = state();
        state.active_panel = Panel::Headers;
        let pinned = state
            .workspace
            .active_tab()
            .unwrap()
            .headers
            .entries()
            .iter()
            .position(|e| e.locked)
            .unwrap();
        state.selected_row = pinned;
        state.start_editing();
        state.enter_char('x');
        state.stop_editing();
        state.delete_row();

        let headers = &state.workspace.active_tab().unwrap().headers;
        assert_eq!(headers.entries()[pinned].key, "User-Agent");
        assert!(state.notice.is_some());
    }

    #[test]
    fn test_move_row_keeps_selection_on_moved_row() {
        let mut state = state();
        state.active_panel = Panel::Params;
        state.start_editing();
        type_text(&mut state, "a");
        state.stop_editing();
        state.next_row();
        state.start_editing();
        type_text(&mut state, "b");
        state.stop_editing();

        state.move_row_up();
        assert_eq!(state.selected_row, 0);
        let keys: Vec<String> = state
            .workspace
            .active_tab()
            .unwrap()
            .parameters
            .entries()
            .iter()
            .map(|e| e.key.clone())
            .collect();
        assert_eq!(keys, vec!["b", "a", ""]);
    }

    #[test]
    fn test_scratch_row_does_not_move() {
        let mut state = state();
        state.active_panel = Panel::Params;
        state.start_editing();
        type_text(&mut state, "a");
        state.stop_editing();
        state.next_row();

        state.move_row_up();
        assert_eq!(state.selected_row, 1);
        let params = &state.workspace.active_tab().unwrap().parameters;
        let keys: Vec<&str> = params.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["a", ""]);
    }

    #[test]
    fn test_header_suggestions_while_typing_key() {
        let mut state = state();
        state.active_panel = Panel::Headers;
        state.selected_row = 0;
        state.column = Column::Key;
        state.start_editing();
        type_text(&mut state, "content-");

        let render = state.to_render_state();
        assert!(render.suggestions.contains(&"Content-Type".to_string()));

        state.accept_suggestion();
        assert_eq!(state.current_input(), "Content-Length");
    }

    #[test]
    fn test_theme_toggle_is_persisted() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut state = state_with_store(Arc::clone(&store));
        state.toggle_theme();
        assert_eq!(state.preferences.theme, Theme::Light);

        let reloaded = state_with_store(store);
        assert_eq!(reloaded.preferences.theme, Theme::Light);
    }

    #[tokio::test]
    async fn test_history_poller_follows_visibility() {
        let mut state = state();
        state.mount_history();
        assert!(state.poller.is_some());
        state.active_panel = Panel::History;

        state.toggle_history();
        assert!(state.poller.is_none());
        assert_eq!(state.active_panel, Panel::Url);

        state.toggle_history();
        assert!(state.poller.is_some());
    }
}
