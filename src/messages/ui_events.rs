//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::entries::EntryListKind;

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Tabs
    NewTab,
    CloseTab,
    NextTab,
    PrevTab,

    // Panel navigation
    NextPanel,
    PrevPanel,
    ScrollUp,
    ScrollDown,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,

    // Request actions
    SendRequest,
    CycleMethod,

    // Entry lists (params, headers, variables)
    NextRow,
    PrevRow,
    ToggleRow,
    DeleteRow,
    ClearRows,
    MoveRowUp,
    MoveRowDown,
    SwitchColumn,
    AcceptSuggestion,

    // Auth
    CycleAuth,
    NextAuthField,

    // History
    ToggleHistory,
    HistoryNext,
    HistoryPrev,
    OpenHistoryItem,
    ToggleFavorite,
    DeleteHistoryItem,
    ClearHistory,
    RefreshHistory,
    ToggleFavoritesFilter,

    // Appearance
    ToggleTheme,
    NextAccent,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Active panel in the UI (needed for context-aware event mapping)
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Panel {
    #[default]
    Url,
    Params,
    Headers,
    Variables,
    Body,
    Auth,
    Response,
    History,
}

impl Panel {
    pub fn next(&self) -> Panel {
        match self {
            Panel::Url => Panel::Params,
            Panel::Params => Panel::Headers,
            Panel::Headers => Panel::Variables,
            Panel::Variables => Panel::Body,
            Panel::Body => Panel::Auth,
            Panel::Auth => Panel::Response,
            Panel::Response => Panel::History,
            Panel::History => Panel::Url,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Url => Panel::History,
            Panel::Params => Panel::Url,
            Panel::Headers => Panel::Params,
            Panel::Variables => Panel::Headers,
            Panel::Body => Panel::Variables,
            Panel::Auth => Panel::Body,
            Panel::Response => Panel::Auth,
            Panel::History => Panel::Response,
        }
    }

    /// The entry list edited from this panel
    pub fn entry_kind(&self) -> Option<EntryListKind> {
        match self {
            Panel::Params => Some(EntryListKind::Parameters),
            Panel::Headers => Some(EntryListKind::Headers),
            Panel::Variables => Some(EntryListKind::Variables),
            _ => None,
        }
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Column of an entry row being edited
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Column {
    #[default]
    Key,
    Value,
}

impl Column {
    pub fn toggle(&self) -> Column {
        match self {
            Column::Key => Column::Value,
            Column::Value => Column::Key,
        }
    }
}

/// Auth editing field
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum AuthField {
    #[default]
    Token,
    Username,
    Password,
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_panel: Panel,
    input_mode: InputMode,
    show_help: bool,
) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    // Global Ctrl shortcuts
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => return Some(UiEvent::Quit),
            KeyCode::Char('t') => return Some(UiEvent::NewTab),
            KeyCode::Char('w') => return Some(UiEvent::CloseTab),
            KeyCode::Right => return Some(UiEvent::NextTab),
            KeyCode::Left => return Some(UiEvent::PrevTab),
            _ => {}
        }
    }

    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    match input_mode {
        InputMode::Normal => normal_keys(key, active_panel),
        InputMode::Editing => editing_keys(key, active_panel),
    }
}

fn normal_keys(key: KeyEvent, active_panel: Panel) -> Option<UiEvent> {
    // Keys valid on every panel
    match key.code {
        KeyCode::Char('q') => return Some(UiEvent::Quit),
        KeyCode::Char('?') => return Some(UiEvent::ToggleHelp),
        KeyCode::Tab => return Some(UiEvent::NextPanel),
        KeyCode::BackTab => return Some(UiEvent::PrevPanel),
        KeyCode::Char(']') => return Some(UiEvent::NextTab),
        KeyCode::Char('[') => return Some(UiEvent::PrevTab),
        KeyCode::Char('m') => return Some(UiEvent::CycleMethod),
        KeyCode::Char('s') => return Some(UiEvent::SendRequest),
        KeyCode::Char('h') => return Some(UiEvent::ToggleHistory),
        KeyCode::Char('T') => return Some(UiEvent::ToggleTheme),
        KeyCode::Char('A') => return Some(UiEvent::NextAccent),
        _ => {}
    }

    if active_panel.entry_kind().is_some() {
        return match key.code {
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            KeyCode::Up => Some(UiEvent::PrevRow),
            KeyCode::Down => Some(UiEvent::NextRow),
            KeyCode::Char(' ') => Some(UiEvent::ToggleRow),
            KeyCode::Char('d') => Some(UiEvent::DeleteRow),
            KeyCode::Char('x') => Some(UiEvent::ClearRows),
            KeyCode::Char('K') => Some(UiEvent::MoveRowUp),
            KeyCode::Char('J') => Some(UiEvent::MoveRowDown),
            _ => None,
        };
    }

    match active_panel {
        Panel::Url | Panel::Body => match key.code {
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            _ => None,
        },
        Panel::Auth => match key.code {
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            KeyCode::Char('t') => Some(UiEvent::CycleAuth),
            _ => None,
        },
        Panel::Response => match key.code {
            KeyCode::Up => Some(UiEvent::ScrollUp),
            KeyCode::Down => Some(UiEvent::ScrollDown),
            _ => None,
        },
        Panel::History => match key.code {
            KeyCode::Up => Some(UiEvent::HistoryPrev),
            KeyCode::Down => Some(UiEvent::HistoryNext),
            KeyCode::Enter => Some(UiEvent::OpenHistoryItem),
            KeyCode::Char('/') => Some(UiEvent::StartEditing),
            KeyCode::Char('f') => Some(UiEvent::ToggleFavorite),
            KeyCode::Char('F') => Some(UiEvent::ToggleFavoritesFilter),
            KeyCode::Char('d') => Some(UiEvent::DeleteHistoryItem),
            KeyCode::Char('X') => Some(UiEvent::ClearHistory),
            KeyCode::Char('r') => Some(UiEvent::RefreshHistory),
            _ => None,
        },
        Panel::Params | Panel::Headers | Panel::Variables => None,
    }
}

fn editing_keys(key: KeyEvent, active_panel: Panel) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        KeyCode::Tab if active_panel.entry_kind().is_some() => Some(UiEvent::SwitchColumn),
        KeyCode::Tab if active_panel == Panel::Auth => Some(UiEvent::NextAuthField),
        KeyCode::Down if active_panel == Panel::Headers => Some(UiEvent::AcceptSuggestion),
        KeyCode::Enter => {
            if active_panel == Panel::Url {
                Some(UiEvent::SendRequest)
            } else {
                Some(UiEvent::StopEditing)
            }
        }
        _ => None,
    }
}
