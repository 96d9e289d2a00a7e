//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Sparkline, Wrap},
};
use std::sync::Arc;

use crate::app::App;
use crate::config::UiSettings;
use crate::library::{MediaRecord, MetaValue, format_duration};
use crate::waveform::{PeakSet, PeakStatus};

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("gg/G", "top/bottom"),
    ("enter", "audition"),
    ("s", "stop"),
    ("/", "filter"),
    ("K", "metadata"),
    ("r", "rescan"),
    ("R", "rebuild waveform"),
    ("q", "quit"),
];

/// Sparkline bars are integers; magnitudes are scaled onto this range.
const BAR_SCALE: f32 = 100.0;

/// What the preview pane shows for the selected record.
pub enum Preview {
    Nothing,
    /// Remote records have no local audio to draw.
    Unavailable,
    Pending,
    Ready(Arc<PeakSet>),
    Failed(String),
}

impl From<PeakStatus> for Preview {
    fn from(status: PeakStatus) -> Self {
        match status {
            PeakStatus::Ready(peaks) => Preview::Ready(peaks),
            PeakStatus::Pending => Preview::Pending,
            PeakStatus::Failed(e) => Preview::Failed(e.to_string()),
        }
    }
}

/// Session facts shown in the status box.
pub struct StatusView<'a> {
    pub cache_available: bool,
    pub pending: usize,
    pub auditioning: Option<&'a str>,
    pub selected: Option<&'a MediaRecord>,
}

fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(k, v)| format!("[{k}] {v}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width.saturating_sub(2)).max(10);
    height = height.min(r.height.saturating_sub(2)).max(5);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

fn meta_value_text(value: &MetaValue) -> String {
    match value {
        MetaValue::Text(s) => s.clone(),
        MetaValue::Number(n) => format!("{n}"),
        MetaValue::Duration(d) => format_duration(*d),
        MetaValue::Tags(tags) => tags.join(", "),
    }
}

fn metadata_text(record: &MediaRecord) -> String {
    let mut lines = vec![format!("Id: {}", record.id)];
    for (key, value) in &record.metadata {
        lines.push(format!("{key}: {}", meta_value_text(value)));
    }
    if !record.probed {
        lines.push("(tags not read yet)".to_string());
    }
    lines.join("\n")
}

/// Upper-case the characters of `title` at `positions`, which must be sorted.
fn highlight(title: &str, positions: &[usize]) -> String {
    let mut rendered = String::with_capacity(title.len());
    let mut pos_iter = positions.iter().copied();
    let mut next_pos = pos_iter.next();

    for (ci, ch) in title.chars().enumerate() {
        if next_pos == Some(ci) {
            rendered.extend(ch.to_uppercase());
            next_pos = pos_iter.next();
        } else {
            rendered.push(ch);
        }
    }
    rendered
}

/// Map an envelope onto sparkline bars.
fn bars(envelope: &[f32]) -> Vec<u64> {
    envelope
        .iter()
        .map(|m| (m.clamp(0.0, 1.0) * BAR_SCALE).round() as u64)
        .collect()
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App, status: &StatusView<'_>) {
    let mut parts: Vec<String> = Vec::new();

    parts.push(format!(" SAMPLES: {}", app.len()));

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        let mut filter_part = String::from("FILTER:");
        if !q.is_empty() {
            filter_part.push(' ');
            filter_part.push_str(q);
        }
        parts.push(filter_part);
    }

    if status.cache_available {
        parts.push("CACHE: on".to_string());
    } else {
        parts.push("CACHE: off".to_string());
    }
    if status.pending > 0 {
        parts.push(format!("Generating: {}", status.pending));
    }
    if let Some(name) = status.auditioning {
        parts.push(format!("Playing: {name}"));
    }
    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {dir}"));
    }
    if let Some(msg) = &app.status {
        parts.push(msg.clone());
    }

    let status_par = Paragraph::new(parts.join(" • "))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status_par, area);
}

fn draw_list(frame: &mut Frame, area: Rect, app: &App, display: &[usize]) {
    let q = app.filter_query.trim();

    // Only build ListItems for the visible window, centered on the selection.
    let total = display.len();
    let list_height = area.height.saturating_sub(2) as usize;
    let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
    let (start, end, selected_pos_in_visible) = if total <= list_height || list_height == 0 {
        (0, total, sel_pos)
    } else {
        let half = list_height / 2;
        let mut start = sel_pos.saturating_sub(half);
        if start + list_height > total {
            start = total - list_height;
        }
        (start, start + list_height, sel_pos - start)
    };

    let visible_items: Vec<ListItem> = display[start..end]
        .iter()
        .map(|&i| {
            let title = app.label(i).unwrap_or_default();
            if q.is_empty() {
                return ListItem::new(title.to_string());
            }
            match app.match_positions(i, q) {
                Some(positions) => ListItem::new(highlight(title, &positions)),
                None => ListItem::new(title.to_string()),
            }
        })
        .collect();

    let list = List::new(visible_items)
        .block(Block::default().borders(Borders::ALL).title(" samples "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");
    let mut state = ratatui::widgets::ListState::default();
    if total > 0 {
        state.select(Some(selected_pos_in_visible));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_preview(frame: &mut Frame, area: Rect, preview: &Preview) {
    let block = Block::default().borders(Borders::ALL).title(" waveform ");
    let message = match preview {
        Preview::Ready(peaks) => {
            let width = area.width.saturating_sub(2) as usize;
            let data = bars(&peaks.envelope(width));
            let spark = Sparkline::default()
                .block(block)
                .data(data)
                .max(BAR_SCALE as u64);
            frame.render_widget(spark, area);
            return;
        }
        Preview::Nothing => "",
        Preview::Unavailable => "no local audio",
        Preview::Pending => "generating…",
        Preview::Failed(msg) => msg.as_str(),
    };
    let par = Paragraph::new(message)
        .alignment(Alignment::Center)
        .italic()
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(par, area);
}

/// Render the entire UI into the provided `frame`.
pub fn draw(
    frame: &mut Frame,
    app: &App,
    display: &[usize],
    preview: &Preview,
    status: &StatusView<'_>,
    ui_settings: &UiSettings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(3),
            Constraint::Length(8),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" sampleshelf ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    draw_status(frame, chunks[1], app, status);
    draw_list(frame, chunks[2], app, display);
    draw_preview(frame, chunks[3], preview);

    // Overlay metadata popup inside the list area.
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 10, chunks[2]);
        frame.render_widget(Clear, popup_area);

        let meta = match status.selected {
            Some(record) => metadata_text(record),
            None => "No sample selected".to_string(),
        };
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(Padding {
                        left: 1,
                        right: 0,
                        top: 0,
                        bottom: 0,
                    })
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let footer = Paragraph::new(controls_text())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(footer, chunks[4]);
}
