//! Rendering for live performance mode.
//!
//! The chord text is wrapped here, not by ratatui, so the row count used to
//! size the scroll range is exactly what ends up on screen.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::live::{ContentMetrics, LiveSession};
use crate::models::Song;

use super::helpers::wrap_text;

const HEADER_HEIGHT: u16 = 4;
const CONTROLS_HEIGHT: u16 = 3;

pub(crate) struct LiveLayout {
    pub(crate) header: Rect,
    pub(crate) body: Rect,
    pub(crate) controls: Rect,
}

impl LiveLayout {
    pub(crate) fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(1),
                Constraint::Length(CONTROLS_HEIGHT),
            ])
            .split(area);
        Self {
            header: chunks[0],
            body: chunks[1],
            controls: chunks[2],
        }
    }

    fn body_block() -> Block<'static> {
        Block::default().borders(Borders::ALL)
    }

    /// Area available to the scrolling text.
    pub(crate) fn viewport(&self) -> Rect {
        Self::body_block().inner(self.body)
    }
}

/// Notes first, then the chord chart, wrapped to `width`.
pub(crate) fn body_rows(song: &Song, width: u16) -> Vec<Line<'static>> {
    let mut rows = Vec::new();
    if let Some(notes) = song.notes.as_deref() {
        let style = Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC);
        rows.extend(
            wrap_text(notes, width)
                .into_iter()
                .map(|row| Line::from(Span::styled(row, style))),
        );
        rows.push(Line::from(""));
    }
    match song.chord_text.as_deref() {
        Some(chords) => rows.extend(wrap_text(chords, width).into_iter().map(Line::from)),
        None => rows.push(Line::from(Span::styled(
            "No chords for this song.",
            Style::default().fg(Color::DarkGray),
        ))),
    }
    rows
}

/// Measure the current song for `area`, in scroll units.
pub(crate) fn measure(
    session: &LiveSession,
    area: Rect,
    units_per_line: u32,
) -> Option<ContentMetrics> {
    let song = session.current_song()?;
    let viewport = LiveLayout::new(area).viewport();
    let rows = body_rows(song, viewport.width).len() as u32;
    Some(ContentMetrics::new(
        rows.saturating_mul(units_per_line),
        u32::from(viewport.height).saturating_mul(units_per_line),
    ))
}

pub(crate) fn draw(frame: &mut Frame, area: Rect, session: &LiveSession, units_per_line: u32) {
    let Some(song) = session.current_song() else {
        draw_empty(frame, area, session);
        return;
    };
    let layout = LiveLayout::new(area);

    let (position, total) = session.position().unwrap_or((0, 0));
    let mut details = vec![Span::styled(
        song.title.clone(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(artist) = &song.artist {
        details.push(Span::raw(format!("  •  {artist}")));
    }
    if let Some(key) = song.key {
        details.push(Span::styled(
            format!("  •  Key: {key}"),
            Style::default().fg(Color::Cyan),
        ));
    }
    let header = Paragraph::new(vec![
        Line::from(Span::styled(
            format!("Song {position} of {total}"),
            Style::default().fg(Color::Gray),
        )),
        Line::from(details),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Live: {}", session.repertoire().name)),
    );
    frame.render_widget(header, layout.header);

    let viewport = layout.viewport();
    let rows = body_rows(song, viewport.width);
    let first_row = session.scroll_offset() / units_per_line.max(1);
    let body = Paragraph::new(rows)
        .block(LiveLayout::body_block())
        .scroll((u16::try_from(first_row).unwrap_or(u16::MAX), 0));
    frame.render_widget(body, layout.body);

    frame.render_widget(controls(session), layout.controls);
}

fn controls(session: &LiveSession) -> Paragraph<'static> {
    let enabled = Style::default().fg(Color::White);
    let disabled = Style::default().fg(Color::DarkGray);
    let (scroll_label, scroll_style) = if session.is_auto_scrolling() {
        ("■ Auto-scroll on", Style::default().fg(Color::Green))
    } else {
        ("▶ Auto-scroll off", Style::default().fg(Color::Yellow))
    };
    let line = Line::from(vec![
        Span::styled(
            "◀ Previous",
            if session.can_go_previous() {
                enabled
            } else {
                disabled
            },
        ),
        Span::raw("    "),
        Span::styled(scroll_label, scroll_style),
        Span::raw(format!("    Speed {}%", session.speed().percent())),
        Span::raw("    "),
        Span::styled(
            "Next ▶",
            if session.can_go_next() {
                enabled
            } else {
                disabled
            },
        ),
    ]);
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
}

fn draw_empty(frame: &mut Frame, area: Rect, session: &LiveSession) {
    let message = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No songs found in this repertoire.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from("Add songs before going live. Press Esc to go back."),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Live: {}", session.repertoire().name)),
    );
    frame.render_widget(message, area);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::live::SessionController;
    use crate::models::Repertoire;

    fn repertoire() -> Repertoire {
        Repertoire {
            id: 1,
            name: "Gig".into(),
            description: None,
            owner_id: 1,
            created_at: Utc::now(),
        }
    }

    fn song(chords: Option<&str>, notes: Option<&str>) -> Song {
        Song {
            id: 1,
            repertoire_id: 1,
            title: "Song".into(),
            artist: None,
            key: None,
            chord_text: chords.map(str::to_string),
            notes: notes.map(str::to_string),
            position: 0,
        }
    }

    #[test]
    fn body_rows_place_notes_before_chords() {
        let rows = body_rows(&song(Some("C G\nAm F"), Some("capo 2")), 40);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].spans[0].content, "capo 2");
        assert_eq!(rows[3].spans[0].content, "Am F");
    }

    #[test]
    fn missing_chords_render_a_placeholder_row() {
        let rows = body_rows(&song(None, None), 40);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn huge_unit_scale_saturates_instead_of_overflowing() {
        let mut live = SessionController::default();
        live.start_session(repertoire(), vec![song(Some("C G\nAm F\nDm G"), None)]);
        let session = live.session().unwrap();

        let metrics = measure(session, Rect::new(0, 0, 80, 30), u32::MAX / 2).unwrap();
        assert_eq!(metrics.content_height, u32::MAX);
        assert_eq!(metrics.viewport_height, u32::MAX);
        assert_eq!(metrics.max_scroll(), 0);
    }

    #[test]
    fn measure_counts_rows_in_scroll_units() {
        let mut live = SessionController::default();
        let songs = vec![song(Some("C G\nAm F"), Some("capo 2"))];
        live.start_session(repertoire(), songs);
        let session = live.session().unwrap();

        let metrics = measure(session, Rect::new(0, 0, 80, 30), 20).unwrap();
        assert_eq!(metrics.content_height, 4 * 20);
        let viewport_rows = u32::from(30 - HEADER_HEIGHT - CONTROLS_HEIGHT - 2);
        assert_eq!(metrics.viewport_height, viewport_rows * 20);
    }

    #[test]
    fn viewport_excludes_header_controls_and_borders() {
        let layout = LiveLayout::new(Rect::new(0, 0, 80, 30));
        let viewport = layout.viewport();
        assert_eq!(viewport.height, 30 - HEADER_HEIGHT - CONTROLS_HEIGHT - 2);
        assert_eq!(viewport.width, 78);
    }
}
