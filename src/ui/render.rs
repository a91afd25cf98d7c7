use crate::state::{AvatarImage, EntryKind, LogLevel, SystemLog, TranscriptEntry};
use crate::types::SessionUsage;
use crate::ui::input_metrics::{
    char_display_width, cursor_row_col, display_width, truncate_to_display_width,
    wrap_to_width,
};
use crate::ui::sprites::sprite;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

const USAGE_BAR_CELLS: usize = 10;

pub fn input_visual_rows(input: &str, width: usize) -> usize {
    wrap_to_width(input, width).len().max(1)
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width <= 2 {
        return;
    }

    let input_width = area.width.saturating_sub(2).max(1) as usize;
    let lines = wrap_to_width(input, input_width);
    let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, input_width);
    let visible_rows = area.height as usize;
    let window_start = cursor_row.saturating_add(1).saturating_sub(visible_rows);

    let mut rendered = Vec::with_capacity(visible_rows);
    for offset in 0..visible_rows {
        let row_index = window_start + offset;
        let prefix = if row_index == 0 { "> " } else { "  " };
        let line = lines.get(row_index).cloned().unwrap_or_default();
        rendered.push(Line::from(format!("{prefix}{line}")));
    }

    frame.render_widget(
        Paragraph::new(rendered)
            .style(Style::default().fg(Color::LightGreen).bg(Color::Rgb(12, 12, 12)))
            .wrap(Wrap { trim: false }),
        area,
    );

    let cursor_y = area
        .y
        .saturating_add(cursor_row.saturating_sub(window_start) as u16);
    let cursor_x = area
        .x
        .saturating_add(2 + cursor_col as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, cursor_y));
}

/// Status label on the left, token meter right-aligned.
pub fn render_header(
    frame: &mut Frame<'_>,
    area: Rect,
    status: &str,
    color: Color,
    usage: Option<SessionUsage>,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let meter = usage.map(usage_bar).unwrap_or_default();
    let meter_width = display_width(&meter);
    let status_width = (area.width as usize).saturating_sub(meter_width + 1);
    let status = truncate_line(status, status_width);
    let gap = (area.width as usize).saturating_sub(display_width(&status) + meter_width);

    let line = Line::from(vec![
        Span::styled(
            status,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" ".repeat(gap)),
        Span::styled(meter, Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// `[###-------] 300/1000 30%`
pub fn usage_bar(usage: SessionUsage) -> String {
    let ratio = usage.ratio();
    let filled = ((ratio * USAGE_BAR_CELLS as f64).round() as usize).min(USAGE_BAR_CELLS);
    format!(
        "[{}{}] {}/{} {}%",
        "#".repeat(filled),
        "-".repeat(USAGE_BAR_CELLS - filled),
        usage.total_tokens,
        usage.max_tokens,
        (ratio * 100.0).round() as u64
    )
}

fn entry_style(kind: EntryKind) -> Style {
    match kind {
        EntryKind::User => Style::default().fg(Color::Cyan),
        EntryKind::Agent => Style::default().fg(Color::LightGreen),
        EntryKind::System => Style::default().fg(Color::Yellow),
        EntryKind::Error => Style::default()
            .fg(Color::LightRed)
            .add_modifier(Modifier::BOLD),
    }
}

/// Wrap transcript entries to `width`, one blank row between entries.
pub fn transcript_lines(entries: &[TranscriptEntry], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }
        let style = entry_style(entry.kind);
        for row in wrap_to_width(&entry.text, width) {
            lines.push(Line::styled(row, style));
        }
    }
    lines
}

/// First visible row for `total` rows in a `height`-row view scrolled
/// `scroll_back` rows up from the bottom.
pub fn window_start(total: usize, height: usize, scroll_back: usize) -> usize {
    let bottom = total.saturating_sub(height);
    bottom.saturating_sub(scroll_back)
}

pub fn render_transcript(
    frame: &mut Frame<'_>,
    area: Rect,
    entries: &[TranscriptEntry],
    scroll_back: usize,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" TRANSCRIPT ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let lines = transcript_lines(entries, inner.width as usize);
    let start = window_start(lines.len(), inner.height as usize, scroll_back);
    let visible: Vec<Line<'static>> = lines
        .into_iter()
        .skip(start)
        .take(inner.height as usize)
        .collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

pub fn render_avatar(
    frame: &mut Frame<'_>,
    area: Rect,
    image: AvatarImage,
    color: Color,
    label: &str,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {label} "))
        .border_style(Style::default().fg(color));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows: Vec<Line> = sprite(image)
        .iter()
        .map(|row| Line::styled(*row, Style::default().fg(color)))
        .collect();
    frame.render_widget(Paragraph::new(rows).alignment(Alignment::Center), inner);
}

/// Newest log lines that fit, oldest at the top.
pub fn render_system_log(frame: &mut Frame<'_>, area: Rect, log: &SystemLog) {
    if area.height == 0 || area.width == 0 {
        return;
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" SYSTEM LOG ")
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = inner.width as usize;
    let mut rows = Vec::new();
    for line in log.lines().rev() {
        if rows.len() >= inner.height as usize {
            break;
        }
        let style = match line.level {
            LogLevel::Info => Style::default().fg(Color::Green),
            LogLevel::Error => Style::default().fg(Color::LightRed),
        };
        let mut wrapped = wrap_to_width(&line.formatted(), width);
        while let Some(row) = wrapped.pop() {
            rows.push(Line::styled(row, style));
        }
    }
    rows.truncate(inner.height as usize);
    rows.reverse();
    frame.render_widget(Paragraph::new(rows), inner);
}

fn truncate_line(input: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0usize;
    let mut truncated = false;

    for ch in input.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > width {
            truncated = true;
            break;
        }
        out.push(ch);
        used += ch_width;
    }

    if truncated && width >= 4 {
        out = truncate_to_display_width(&out, width - 3);
        out.push_str("...");
    }
    out
}
