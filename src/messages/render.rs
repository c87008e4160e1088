//! Render state - data structure sent from App layer to UI for rendering

use crate::constants::DEFAULT_HTTP_URL;
use crate::entries::Entry;
use crate::history::{HistoryFilter, HistoryGroup};
use crate::messages::ui_events::{AuthField, Column, InputMode, Panel};
use crate::models::{AuthType, DispatchResult, HttpMethod};
use crate::preferences::Theme;

/// One entry of the tab bar
#[derive(Debug, Clone, PartialEq)]
pub struct TabLabel {
    pub name: String,
    pub method: HttpMethod,
    pub is_dirty: bool,
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone)]
pub struct RenderState {
    // Tabs
    pub tabs: Vec<TabLabel>,
    pub active_tab: Option<usize>,

    // Active request draft
    pub method: HttpMethod,
    pub url: String,
    pub parameters: Vec<Entry>,
    pub headers: Vec<Entry>,
    pub variables: Vec<Entry>,
    pub body: String,
    pub auth: AuthType,

    // UI state
    pub active_panel: Panel,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub selected_row: usize,
    pub column: Column,
    pub auth_field: AuthField,
    pub suggestions: Vec<String>,

    // Response
    pub response: Option<DispatchResult>,
    pub error: Option<String>,
    pub response_scroll: u16,
    pub is_loading: bool,

    // History
    pub show_history: bool,
    pub history_groups: Vec<HistoryGroup>,
    /// Index into the flattened groups
    pub history_selected: usize,
    pub history_filter: HistoryFilter,
    pub history_error: Option<String>,
    pub history_loaded: bool,

    // Appearance
    pub theme: Theme,
    pub accent: String,

    // Popups and notices
    pub notice: Option<String>,
    pub show_help: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            tabs: Vec::new(),
            active_tab: None,
            method: HttpMethod::GET,
            url: String::from(DEFAULT_HTTP_URL),
            parameters: Vec::new(),
            headers: Vec::new(),
            variables: Vec::new(),
            body: String::new(),
            auth: AuthType::None,
            active_panel: Panel::Url,
            input_mode: InputMode::Normal,
            cursor_position: 0,
            selected_row: 0,
            column: Column::Key,
            auth_field: AuthField::Token,
            suggestions: Vec::new(),
            response: None,
            error: None,
            response_scroll: 0,
            is_loading: false,
            show_history: true,
            history_groups: Vec::new(),
            history_selected: 0,
            history_filter: HistoryFilter::default(),
            history_error: None,
            history_loaded: false,
            theme: Theme::Dark,
            accent: String::from("cyan"),
            notice: None,
            show_help: false,
        }
    }
}
