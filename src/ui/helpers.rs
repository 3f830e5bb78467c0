use std::borrow::Cow;

use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use textwrap::{Options, WrapAlgorithm};
use unicode_width::UnicodeWidthStr;

/// Render `label: value` for a form row. Empty values show the placeholder
/// dimmed; masked values show one bullet per character.
pub(crate) fn field_line(
    label: &str,
    value: &str,
    placeholder: &str,
    is_active: bool,
    masked: bool,
) -> Line<'static> {
    let display = if value.is_empty() {
        placeholder.to_string()
    } else if masked {
        "•".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{label}: ")),
        Span::styled(display, style),
    ])
}

/// Footer line of `[key] Description` pairs.
pub(crate) fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (index, (key, description)) in hints.iter().enumerate() {
        spans.push(Span::styled(format!("[{key}]"), key_style));
        let separator = if index + 1 == hints.len() { "" } else { "   " };
        spans.push(Span::raw(format!(" {description}{separator}")));
    }
    Line::from(spans)
}

/// Wrap `text` to `width` terminal columns, breaking at spaces and only
/// splitting words wider than a whole row. Each source line yields at least
/// one row, so blank lines survive.
pub(crate) fn wrap_text(text: &str, width: u16) -> Vec<String> {
    let width = usize::from(width.max(1));
    let mut rows = Vec::new();
    for line in text.lines() {
        let line = line.trim_end();
        if line.width() <= width {
            rows.push(line.to_string());
            continue;
        }
        let options = Options::new(width)
            .wrap_algorithm(WrapAlgorithm::FirstFit)
            .break_words(true);
        rows.extend(textwrap::wrap(line, options).into_iter().map(Cow::into_owned));
    }
    rows
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Clamp a list selection after the list changed length.
pub(crate) fn clamp_selection(selected: usize, len: usize) -> usize {
    if len == 0 {
        0
    } else {
        selected.min(len - 1)
    }
}
