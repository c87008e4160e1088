//! tabpost - Actor-based multi-tab HTTP workbench
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - central state machine processing events
//! - Network Layer (Tokio) - async HTTP execution and history commands

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;

use tabpost::app::{AppActor, AppServices, AppState};
use tabpost::config::{self, Config, HistoryBackendKind};
use tabpost::dispatch::RequestDispatcher;
use tabpost::entries::Entry;
use tabpost::history::{FileHistoryBackend, HistoryBackend, HistoryRecorder, HttpHistoryBackend};
use tabpost::messages::ui_events::{key_to_ui_event, AuthField, Column, InputMode, Panel};
use tabpost::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use tabpost::models::AuthType;
use tabpost::network::client::{create_client, ReqwestExecutor};
use tabpost::network::NetworkActor;
use tabpost::store::{FileKeyValueStore, KeyValueStore};
use tabpost::suggest::CommonHeaders;
use tabpost::ui::{self, accent_color, highlight_json, method_color, palette, status_color, Palette};
use tabpost::workspace::TabWorkspace;

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let data_dir = config::data_dir();
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating {}", data_dir.display()))?;

    // Initialize logging to file
    let file_appender = tracing_appender::rolling::never(&data_dir, &config.log.file);
    let (non_blocking, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(config.log_level())
        .init();
    tracing::info!(backend = ?config.history.backend, "Starting tabpost");

    // Services
    let options = config.client_options();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let dispatcher = Arc::new(
        RequestDispatcher::new(Arc::new(ReqwestExecutor::new(&options))).with_events(events_tx),
    );
    let backend: Arc<dyn HistoryBackend> = match config.history.backend {
        HistoryBackendKind::File => Arc::new(FileHistoryBackend::new(data_dir.join("history.json"))),
        HistoryBackendKind::Http => {
            let endpoint = config
                .history
                .endpoint
                .clone()
                .context("history.endpoint is not set")?;
            Arc::new(HttpHistoryBackend::new(create_client(&options), endpoint))
        }
    };
    let store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::open(data_dir.join("state.json")));
    let recorder = Arc::new(HistoryRecorder::new(backend, Arc::clone(&store)));
    tokio::spawn(Arc::clone(&recorder).run_subscriber(events_rx));
    let history_rx = recorder.subscribe();

    let state = AppState::new(
        TabWorkspace::default().with_default_url(config.defaults.url.clone()),
        AppServices {
            dispatcher: Arc::clone(&dispatcher),
            recorder: Arc::clone(&recorder),
            store,
            suggestions: Box::new(CommonHeaders::default()),
            poll_interval: config.poll_interval(),
        },
    );

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(dispatcher, recorder, net_resp_tx);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(state, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx, history_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    tracing::info!("Shutting down");
    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.active_panel,
                    current_state.input_mode,
                    current_state.show_help,
                ) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

/// Colors resolved once per frame
#[derive(Clone, Copy)]
struct Look {
    accent: Color,
    palette: Palette,
}

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();
    let look = Look {
        accent: accent_color(&state.accent),
        palette: palette(state.theme),
    };
    f.render_widget(Block::default().style(Style::default().bg(look.palette.bg)), area);

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_tab_bar(f, state, look, main_chunks[0]);

    let content = if state.show_history {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(main_chunks[1]);
        draw_history(f, state, look, columns[1]);
        columns[0]
    } else {
        main_chunks[1]
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Method + URL
            Constraint::Length(10), // Params/Headers/Variables/Body/Auth
            Constraint::Min(5),     // Response
        ])
        .split(content);

    draw_url_bar(f, state, look, chunks[0]);
    draw_middle_panels(f, state, look, chunks[1]);
    draw_response(f, state, look, chunks[2]);
    draw_status_bar(f, state, look, main_chunks[2]);

    if state.show_help {
        draw_help_popup(f, look, area);
    }
}

fn focus_style(state: &RenderState, panel: Panel, look: Look) -> Style {
    let focused = state.active_panel == panel;
    if focused && state.input_mode == InputMode::Editing {
        Style::default().fg(Color::Yellow)
    } else if focused {
        Style::default().fg(look.accent)
    } else {
        Style::default().fg(look.palette.muted)
    }
}

fn place_cursor(f: &mut Frame, area: Rect, offset: usize) {
    let max_x = area.x + area.width.saturating_sub(2);
    let cursor_x = (area.x + offset as u16 + 1).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, area.y + 1));
}

fn draw_tab_bar(f: &mut Frame, state: &RenderState, look: Look, area: Rect) {
    let titles: Vec<Line> = state
        .tabs
        .iter()
        .map(|t| {
            let marker = if t.is_dirty { " *" } else { "" };
            Line::from(vec![
                Span::styled(
                    format!(" {} ", t.method.as_str()),
                    Style::default().fg(method_color(t.method.as_str())),
                ),
                Span::raw(format!("{}{} ", t.name, marker)),
            ])
        })
        .collect();

    f.render_widget(ui::render_tabs(titles, state.active_tab, look.accent), area);
}

fn draw_url_bar(f: &mut Frame, state: &RenderState, look: Look, area: Rect) {
    let loading = if state.is_loading { " [...]" } else { "" };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(state, Panel::Url, look))
        .title(format!(" {}{} ", state.method.as_str(), loading))
        .title_style(Style::default().fg(method_color(state.method.as_str())).bold());

    let input = Paragraph::new(state.url.as_str())
        .style(Style::default().fg(look.palette.fg))
        .block(block);
    f.render_widget(input, area);

    if state.active_panel == Panel::Url && state.input_mode == InputMode::Editing {
        place_cursor(f, area, state.cursor_position);
    }
}

fn draw_middle_panels(f: &mut Frame, state: &RenderState, look: Look, area: Rect) {
    let tabs_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let titles = ["Params", "Headers", "Variables", "Body", "Auth"];
    let selected = match state.active_panel {
        Panel::Params => 0,
        Panel::Headers => 1,
        Panel::Variables => 2,
        Panel::Body => 3,
        Panel::Auth => 4,
        _ => 0,
    };
    let tab_titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();
    f.render_widget(ui::render_tabs(tab_titles, Some(selected), look.accent), tabs_area[0]);

    let content_area = tabs_area[1];
    match state.active_panel {
        Panel::Headers => draw_entries(f, state, look, content_area, &state.headers, Panel::Headers),
        Panel::Variables => {
            draw_entries(f, state, look, content_area, &state.variables, Panel::Variables)
        }
        Panel::Body => draw_body_panel(f, state, look, content_area),
        Panel::Auth => draw_auth_panel(f, state, look, content_area),
        _ => draw_entries(f, state, look, content_area, &state.parameters, Panel::Params),
    }
}

fn draw_entries(
    f: &mut Frame,
    state: &RenderState,
    look: Look,
    area: Rect,
    entries: &[Entry],
    panel: Panel,
) {
    let focused = state.active_panel == panel;
    let selected = focused.then_some((state.selected_row, state.column));
    let title = format!(
        " {} (Enter:edit Tab:column Space:toggle d:del x:clear J/K:move) ",
        match panel {
            Panel::Headers => "Headers",
            Panel::Variables => "Variables {{name}}",
            _ => "Query Params",
        }
    );
    f.render_widget(
        ui::render_entry_list(entries, title, selected, look.accent, look.palette),
        area,
    );

    if focused && state.input_mode == InputMode::Editing {
        // Key column starts after the "[x]* " marker, value after the padded key
        let offset = match state.column {
            Column::Key => 5 + state.cursor_position,
            Column::Value => 5 + 24 + state.cursor_position,
        };
        let row_area = Rect {
            y: area.y + state.selected_row as u16,
            ..area
        };
        place_cursor(f, row_area, offset);

        if !state.suggestions.is_empty() {
            draw_suggestions(f, state, look, row_area);
        }
    }
}

fn draw_suggestions(f: &mut Frame, state: &RenderState, look: Look, row_area: Rect) {
    let height = state.suggestions.len() as u16 + 2;
    let popup = Rect {
        x: row_area.x + 6,
        y: row_area.y + 2,
        width: 30.min(row_area.width.saturating_sub(6)),
        height,
    }
    .intersection(f.area());

    let items: Vec<ListItem> = state
        .suggestions
        .iter()
        .map(|s| ListItem::new(s.as_str()))
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(look.accent))
            .title(" Down:accept ")
            .style(Style::default().bg(look.palette.bg)),
    );
    f.render_widget(Clear, popup);
    f.render_widget(list, popup);
}

fn draw_body_panel(f: &mut Frame, state: &RenderState, look: Look, area: Rect) {
    let title = if state.method.has_body() {
        " Body (JSON) "
    } else {
        " Body (not sent for GET/HEAD) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(state, Panel::Body, look))
        .title(title);

    let body = Paragraph::new(state.body.as_str())
        .style(Style::default().fg(look.palette.fg))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(body, area);

    if state.active_panel == Panel::Body && state.input_mode == InputMode::Editing {
        place_cursor(f, area, state.cursor_position);
    }
}

fn draw_auth_panel(f: &mut Frame, state: &RenderState, look: Look, area: Rect) {
    let empty = |s: &str| if s.is_empty() { "<empty>".to_string() } else { s.to_string() };
    let content = match &state.auth {
        AuthType::None => String::from("Press 't' to cycle auth type"),
        AuthType::Bearer(token) => format!("Token: {}", empty(token.as_str())),
        AuthType::Basic { username, password } => {
            let pass = if password.is_empty() {
                "<empty>".to_string()
            } else {
                "*".repeat(password.chars().count())
            };
            let active = match state.auth_field {
                AuthField::Password => "password",
                _ => "username",
            };
            format!("User: {}  Pass: {}  (editing {})", empty(username.as_str()), pass, active)
        }
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(state, Panel::Auth, look))
        .title(format!(" Auth: {} (t:cycle) ", state.auth.label()));

    f.render_widget(
        Paragraph::new(content)
            .style(Style::default().fg(look.palette.fg))
            .block(block),
        area,
    );
}

fn draw_response(f: &mut Frame, state: &RenderState, look: Look, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(state, Panel::Response, look));

    let (block, lines) = match (&state.response, &state.error) {
        (_, Some(error)) => (
            block.title(Span::styled(" Error ", Style::default().fg(Color::Red).bold())),
            vec![Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red)))],
        ),
        (Some(response), None) => {
            let status = Span::styled(
                format!(" {} {} ", response.status, response.status_text),
                Style::default().fg(status_color(response.status)).bold(),
            );
            let meta = format!(" {}ms  {} bytes ", response.elapsed_ms, response.size_bytes);
            (
                block
                    .title(status)
                    .title_bottom(Line::from(meta).right_aligned()),
                highlight_json(&response.body.render()),
            )
        }
        (None, None) => (
            block.title(" Response "),
            vec![Line::from(Span::styled(
                "Press 's' to send the request",
                Style::default().fg(look.palette.muted),
            ))],
        ),
    };

    let response = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.response_scroll, 0));
    f.render_widget(response, area);
}

fn draw_history(f: &mut Frame, state: &RenderState, look: Look, area: Rect) {
    let focused = state.active_panel == Panel::History;
    let mut items: Vec<ListItem> = Vec::new();
    let mut selected_line = None;
    let mut index = 0;

    for group in &state.history_groups {
        items.push(ListItem::new(Span::styled(
            group.label.clone(),
            Style::default().fg(look.palette.muted).italic(),
        )));
        for item in &group.items {
            if index == state.history_selected {
                selected_line = Some(items.len());
            }
            let star = if item.favorite { "★ " } else { "  " };
            items.push(ListItem::new(Line::from(vec![
                Span::styled(star, Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("{:<7}", item.method),
                    Style::default().fg(method_color(&item.method)),
                ),
                Span::styled(item.url.clone(), Style::default().fg(look.palette.fg)),
            ])));
            index += 1;
        }
    }

    if items.is_empty() {
        let text = if let Some(err) = &state.history_error {
            format!("History unavailable: {}", err)
        } else if !state.history_loaded {
            "Loading...".to_string()
        } else {
            "No requests yet".to_string()
        };
        items.push(ListItem::new(Span::styled(text, Style::default().fg(look.palette.muted))));
    }

    let mut title = String::from(" History");
    if state.history_filter.favorites_only {
        title.push_str(" ★");
    }
    if !state.history_filter.query.is_empty() {
        title.push_str(&format!(" /{}", state.history_filter.query));
    }
    if state.history_error.is_some() && state.history_loaded {
        title.push_str(" (stale)");
    }
    title.push(' ');

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(focus_style(state, Panel::History, look))
                .title(title),
        )
        .highlight_style(if focused {
            Style::default().fg(look.accent).bold()
        } else {
            Style::default()
        });

    let mut list_state = ListState::default();
    list_state.select(selected_line);
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, look: Look, area: Rect) {
    let (text, style) = if let Some(notice) = &state.notice {
        (format!(" {} ", notice), Style::default().fg(Color::Red))
    } else if state.is_loading {
        (" Loading... ".to_string(), Style::default().fg(look.palette.muted))
    } else if state.input_mode == InputMode::Editing {
        (
            " ESC:stop editing | arrows:move | Tab:next field ".to_string(),
            Style::default().fg(look.palette.muted),
        )
    } else {
        (
            " Tab:panel | e:edit | m:method | s:send | ^T/^W:tab | h:history | ?:help | q:quit "
                .to_string(),
            Style::default().fg(look.palette.muted),
        )
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}

fn draw_help_popup(f: &mut Frame, look: Look, area: Rect) {
    let popup_area = centered_rect(60, 80, area);

    let help_text = r#"
 TABPOST - Keyboard Shortcuts

 TABS
   Ctrl+T / Ctrl+W    New / close tab
   [ / ]  Ctrl+←/→    Previous / next tab

 NAVIGATION
   Tab / Shift+Tab    Switch panels
   ↑ / ↓              Rows, history, response scroll

 REQUEST
   m                  Cycle HTTP method
   s / Enter (URL)    Send request
   e / Enter          Edit current field

 PARAMS / HEADERS / VARIABLES
   Space              Toggle row
   d / x              Delete row / clear list
   K / J              Move row up / down
   Tab (editing)      Switch key/value column
   ↓ (editing key)    Accept header suggestion

 AUTH
   t                  Cycle auth type (None/Bearer/Basic)

 HISTORY
   h                  Show / hide history
   Enter              Open in new tab
   f / F              Favorite / favorites only
   /                  Filter
   d / X / r          Delete / clear / refresh

 GENERAL
   T / A              Toggle theme / next accent
   ?                  Toggle this help
   q / Ctrl+C         Quit
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(look.accent))
        .title(" Help ")
        .style(Style::default().bg(look.palette.bg).fg(look.palette.fg));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
