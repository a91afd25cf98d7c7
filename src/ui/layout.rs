use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Width of the avatar and system-log column.
pub const SIDE_COLUMN_WIDTH: u16 = 36;
/// Sprite rows plus the panel border.
pub const AVATAR_PANEL_HEIGHT: u16 = crate::ui::sprites::SPRITE_HEIGHT as u16 + 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalLayout {
    pub header: Rect,
    pub transcript: Rect,
    pub avatar: Rect,
    pub system_log: Rect,
    pub input: Rect,
}

pub fn split_terminal_layout(area: Rect, input_rows: u16) -> TerminalLayout {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(input_rows.max(1)),
        ])
        .split(area);

    // Narrow terminals drop the side column and keep the transcript readable.
    let side_width = if rows[1].width >= SIDE_COLUMN_WIDTH * 2 {
        SIDE_COLUMN_WIDTH
    } else {
        0
    };
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(side_width)])
        .split(rows[1]);

    let side = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(AVATAR_PANEL_HEIGHT.min(body[1].height)),
            Constraint::Min(0),
        ])
        .split(body[1]);

    TerminalLayout {
        header: rows[0],
        transcript: body[0],
        avatar: side[0],
        system_log: side[1],
        input: rows[2],
    }
}
