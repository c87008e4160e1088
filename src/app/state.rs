//! App state - the tab workspace plus view state, no terminal I/O

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::task::JoinHandle;

use crate::constants::NOTICE_TTL_SECS;
use crate::dispatch::RequestDispatcher;
use crate::entries::{Entry, EntryField};
use crate::history::{group, HistoryFilter, HistoryItem, HistoryRecorder, HistorySnapshot};
use crate::messages::ui_events::{AuthField, Column, InputMode, Panel};
use crate::messages::{RenderState, TabLabel};
use crate::models::AuthType;
use crate::preferences::Preferences;
use crate::store::KeyValueStore;
use crate::suggest::SuggestionSource;
use crate::workspace::{TabDraft, TabPatch, TabWorkspace};

/// Inline message that dismisses itself
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub expires_at: Instant,
}

/// Services the app state talks to
pub struct AppServices {
    pub dispatcher: Arc<RequestDispatcher>,
    pub recorder: Arc<HistoryRecorder>,
    pub store: Arc<dyn KeyValueStore>,
    pub suggestions: Box<dyn SuggestionSource>,
    pub poll_interval: Duration,
}

/// Main application state
pub struct AppState {
    pub workspace: TabWorkspace,
    pub(crate) dispatcher: Arc<RequestDispatcher>,
    pub(crate) recorder: Arc<HistoryRecorder>,
    pub(crate) store: Arc<dyn KeyValueStore>,
    pub(crate) suggestions: Box<dyn SuggestionSource>,
    pub preferences: Preferences,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub selected_row: usize,
    pub column: Column,
    pub auth_field: AuthField,
    pub response_scroll: u16,

    // History view
    pub history: HistorySnapshot,
    pub history_filter: HistoryFilter,
    pub history_selected: usize,
    pub show_history: bool,
    pub(crate) poll_interval: Duration,
    pub(crate) poller: Option<JoinHandle<()>>,

    // Popups and notices
    pub notice: Option<Notice>,
    pub show_help: bool,
}

impl AppState {
    pub fn new(workspace: TabWorkspace, services: AppServices) -> Self {
        let preferences = Preferences::load(services.store.as_ref());
        let history = services.recorder.snapshot();
        let mut state = AppState {
            workspace,
            dispatcher: services.dispatcher,
            recorder: services.recorder,
            store: services.store,
            suggestions: services.suggestions,
            preferences,
            active_panel: Panel::Url,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            selected_row: 0,
            column: Column::Key,
            auth_field: AuthField::Token,
            response_scroll: 0,
            history,
            history_filter: HistoryFilter::default(),
            history_selected: 0,
            show_history: true,
            poll_interval: services.poll_interval,
            poller: None,
            notice: None,
            show_help: false,
        };
        if state.workspace.is_empty() {
            state.workspace.add_tab(TabDraft::default());
        }
        state
    }

    /// History items left after the filter, newest first
    pub fn visible_history(&self) -> Vec<HistoryItem> {
        self.history_filter.apply(&self.history.items)
    }

    pub fn show_notice(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            expires_at: Instant::now() + Duration::from_secs(NOTICE_TTL_SECS),
        });
    }

    /// Drops an expired notice; returns true if one was dropped
    pub fn expire_notice(&mut self, now: Instant) -> bool {
        match &self.notice {
            Some(notice) if notice.expires_at <= now => {
                self.notice = None;
                true
            }
            _ => false,
        }
    }

    /// Selected row of the entry list behind the active panel
    pub(crate) fn selected_entry(&self) -> Option<&Entry> {
        let kind = self.active_panel.entry_kind()?;
        let tab = self.workspace.active_tab()?;
        tab.entries(kind).entries().get(self.selected_row)
    }

    /// Get the current input field content
    pub fn current_input(&self) -> String {
        if self.active_panel == Panel::History {
            return self.history_filter.query.clone();
        }
        if self.active_panel.entry_kind().is_some() {
            return self
                .selected_entry()
                .map(|e| match self.column {
                    Column::Key => e.key.clone(),
                    Column::Value => e.value.clone(),
                })
                .unwrap_or_default();
        }

        let Some(tab) = self.workspace.active_tab() else {
            return String::new();
        };
        match self.active_panel {
            Panel::Url => tab.url.clone(),
            Panel::Body => tab.body.clone(),
            Panel::Auth => match (&tab.auth, self.auth_field) {
                (AuthType::Bearer(token), _) => token.clone(),
                (AuthType::Basic { username, .. }, AuthField::Username) => username.clone(),
                (AuthType::Basic { password, .. }, AuthField::Password) => password.clone(),
                _ => String::new(),
            },
            _ => String::new(),
        }
    }

    /// Writes the current input field. Returns false if the edit was refused.
    pub fn set_current_input(&mut self, text: String) -> bool {
        if self.active_panel == Panel::History {
            self.history_filter.query = text;
            self.history_selected = 0;
            return true;
        }
        let Some(tab_id) = self.workspace.active_tab_id() else {
            return false;
        };

        if let Some(kind) = self.active_panel.entry_kind() {
            let Some(entry_id) = self.selected_entry().map(|e| e.id) else {
                return false;
            };
            let field = match self.column {
                Column::Key => EntryField::Key(text),
                Column::Value => EntryField::Value(text),
            };
            return self
                .workspace
                .edit_entries(tab_id, kind, |list| {
                    let changed = list.update(entry_id, field);
                    (changed, changed)
                })
                .unwrap_or(false);
        }

        let patch = match self.active_panel {
            Panel::Url => TabPatch {
                url: Some(text),
                ..Default::default()
            },
            Panel::Body => TabPatch {
                body: Some(text),
                ..Default::default()
            },
            Panel::Auth => {
                let auth = match self.workspace.active_tab().map(|t| t.auth.clone()) {
                    Some(AuthType::Bearer(_)) => AuthType::Bearer(text),
                    Some(AuthType::Basic { username, password }) => match self.auth_field {
                        AuthField::Password => AuthType::Basic { username, password: text },
                        _ => AuthType::Basic { username: text, password },
                    },
                    _ => return false,
                };
                TabPatch {
                    auth: Some(auth),
                    ..Default::default()
                }
            }
            _ => return false,
        };
        self.workspace.update_tab(tab_id, patch, None)
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let tab = self.workspace.active_tab();
        let visible = self.visible_history();
        let suggestions = if self.active_panel == Panel::Headers
            && self.input_mode == InputMode::Editing
            && self.column == Column::Key
        {
            self.suggestions.suggest(&self.current_input())
        } else {
            Vec::new()
        };

        RenderState {
            tabs: self
                .workspace
                .tabs()
                .iter()
                .map(|t| TabLabel {
                    name: t.name.clone(),
                    method: t.method,
                    is_dirty: t.is_dirty,
                })
                .collect(),
            active_tab: self.workspace.active_index(),
            method: tab.map(|t| t.method).unwrap_or_default(),
            url: tab.map(|t| t.url.clone()).unwrap_or_default(),
            parameters: tab.map(|t| t.parameters.entries().to_vec()).unwrap_or_default(),
            headers: tab.map(|t| t.headers.entries().to_vec()).unwrap_or_default(),
            variables: tab.map(|t| t.variables.entries().to_vec()).unwrap_or_default(),
            body: tab.map(|t| t.body.clone()).unwrap_or_default(),
            auth: tab.map(|t| t.auth.clone()).unwrap_or_default(),
            active_panel: self.active_panel,
            input_mode: self.input_mode,
            cursor_position: self.cursor_position,
            selected_row: self.selected_row,
            column: self.column,
            auth_field: self.auth_field,
            suggestions,
            response: tab.and_then(|t| t.response.clone()),
            error: tab.and_then(|t| t.error.clone()),
            response_scroll: self.response_scroll,
            is_loading: self.workspace.is_loading(),
            show_history: self.show_history,
            history_groups: group(&visible, Utc::now()),
            history_selected: self.history_selected,
            history_filter: self.history_filter.clone(),
            history_error: self.history.error.clone(),
            history_loaded: self.history.loaded,
            theme: self.preferences.theme,
            accent: self.preferences.accent.clone(),
            notice: self.notice.as_ref().map(|n| n.text.clone()),
            show_help: self.show_help,
        }
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}
