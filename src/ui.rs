//! Rendering helpers shared by the draw functions in `main.rs`

use ratatui::{prelude::*, widgets::*};

use crate::entries::Entry;
use crate::messages::ui_events::Column;
use crate::preferences::Theme;

/// Foreground, muted and background colors of a theme
#[derive(Clone, Copy, Debug)]
pub struct Palette {
    pub fg: Color,
    pub muted: Color,
    pub bg: Color,
}

pub fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Dark => Palette {
            fg: Color::White,
            muted: Color::DarkGray,
            bg: Color::Black,
        },
        Theme::Light => Palette {
            fg: Color::Black,
            muted: Color::Gray,
            bg: Color::White,
        },
    }
}

/// Terminal color for a stored accent name
pub fn accent_color(name: &str) -> Color {
    match name {
        "magenta" => Color::Magenta,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        _ => Color::Cyan,
    }
}

/// Renders an entry list as a two-column table with enable and pin markers
pub fn render_entry_list<'a>(
    entries: &'a [Entry],
    title: String,
    selected: Option<(usize, Column)>,
    accent: Color,
    palette: Palette,
) -> List<'a> {
    let items: Vec<ListItem> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let base = if entry.enabled {
                Style::default().fg(palette.fg)
            } else {
                Style::default().fg(palette.muted)
            };
            let (key_style, value_style) = match selected {
                Some((row, Column::Key)) if row == i => (base.fg(accent).bold(), base),
                Some((row, Column::Value)) if row == i => (base, base.fg(accent).bold()),
                _ => (base, base),
            };

            let check = if entry.enabled { "[x]" } else { "[ ]" };
            let pin = if entry.locked { "*" } else { " " };
            let key = if entry.is_blank() { "<new>" } else { entry.key.as_str() };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{}{} ", check, pin), base),
                Span::styled(format!("{:<24}", key), key_style),
                Span::styled(entry.value.clone(), value_style),
            ]))
        })
        .collect();

    let border_style = if selected.is_some() {
        Style::default().fg(accent)
    } else {
        Style::default().fg(palette.muted)
    };

    List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title),
    )
}

/// Renders tabs
pub fn render_tabs<'a>(titles: Vec<Line<'a>>, selected: Option<usize>, accent: Color) -> Tabs<'a> {
    Tabs::new(titles)
        .select(selected.unwrap_or(0))
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(accent).bold())
        .divider("|")
}

/// Simple JSON syntax highlighting
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    for line in text.lines() {
        let mut spans = Vec::new();
        let chars = line.chars();
        let mut current = String::new();
        let mut in_string = false;
        let mut is_key = false;

        for c in chars {
            match c {
                '"' => {
                    if !current.is_empty() {
                        spans.push(Span::raw(current.clone()));
                        current.clear();
                    }

                    if in_string {
                        // End of string
                        current.push(c);
                        let color = if is_key { Color::Cyan } else { Color::Green };
                        spans.push(Span::styled(current.clone(), Style::default().fg(color)));
                        current.clear();
                        in_string = false;
                        is_key = false;
                    } else {
                        // Start of string
                        in_string = true;
                        current.push(c);
                        // Check if this is a key (followed by :)
                        is_key = line[line.find('"').unwrap_or(0)..].contains("\":");
                    }
                }
                ':' if !in_string => {
                    if !current.is_empty() {
                        spans.push(Span::raw(current.clone()));
                        current.clear();
                    }
                    spans.push(Span::styled(":", Style::default().fg(Color::White)));
                }
                '{' | '}' | '[' | ']' if !in_string => {
                    if !current.is_empty() {
                        spans.push(Span::raw(current.clone()));
                        current.clear();
                    }
                    spans.push(Span::styled(
                        c.to_string(),
                        Style::default().fg(Color::Yellow),
                    ));
                }
                '0'..='9' | '-' | '.' if !in_string => {
                    if !current.is_empty()
                        && !current
                            .chars()
                            .all(|x| x.is_ascii_digit() || x == '-' || x == '.')
                    {
                        spans.push(Span::raw(current.clone()));
                        current.clear();
                    }
                    current.push(c);
                }
                't' | 'r' | 'u' | 'e' | 'f' | 'a' | 'l' | 's' | 'n' if !in_string => {
                    current.push(c);
                    // Check for true, false, null
                    if current == "true" || current == "false" || current == "null" {
                        spans.push(Span::styled(
                            current.clone(),
                            Style::default().fg(Color::Magenta),
                        ));
                        current.clear();
                    }
                }
                _ => {
                    current.push(c);
                }
            }
        }

        if !current.is_empty() {
            // Color numbers
            if current
                .chars()
                .all(|c| c.is_ascii_digit() || c == '-' || c == '.')
            {
                spans.push(Span::styled(current, Style::default().fg(Color::Yellow)));
            } else {
                spans.push(Span::raw(current));
            }
        }

        lines.push(Line::from(spans));
    }

    lines
}

/// Status code color
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Red,
        500..=599 => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Method color
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Green,
        "POST" => Color::Yellow,
        "PUT" => Color::Blue,
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        "HEAD" | "OPTIONS" => Color::Magenta,
        _ => Color::White,
    }
}
