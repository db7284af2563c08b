//! Status bar widget.
//!
//! Renders the status message on the left and key hints on the right.

use ratatui::{
    buffer::Buffer as RatatuiBuffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};
use unicode_width::UnicodeWidthChar;

/// Key hints shown when there is room.
const KEY_HINTS: &str = "↑↓ move  → expand  ← collapse  r refresh  q quit";

/// Status bar widget.
pub struct StatusBar<'a> {
    message: &'a str,
    is_warning: bool,
    show_hints: bool,
}

impl<'a> StatusBar<'a> {
    /// Creates a new status bar.
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: "",
            is_warning: false,
            show_hints: true,
        }
    }

    /// Sets the status message.
    #[must_use]
    pub fn message(mut self, message: &'a str) -> Self {
        self.message = message;
        self
    }

    /// Draws the message as a warning.
    #[must_use]
    pub fn warning(mut self, is_warning: bool) -> Self {
        self.is_warning = is_warning;
        self
    }

    /// Shows or hides the key hints.
    #[must_use]
    pub fn hints(mut self, show: bool) -> Self {
        self.show_hints = show;
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes `text` from `x`, stopping at `end`. Returns the next column.
fn put_str(buf: &mut RatatuiBuffer, mut x: u16, y: u16, end: u16, text: &str, style: Style) -> u16 {
    for c in text.chars() {
        let w = c.width().unwrap_or(0) as u16;
        if w == 0 {
            continue;
        }
        if x + w > end {
            break;
        }
        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_char(c);
            cell.set_style(style);
        }
        x += w;
    }
    x
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut RatatuiBuffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let bg_color = Color::Rgb(30, 30, 40);
        let bg_style = Style::default().bg(bg_color).fg(Color::White);
        let end = area.x + area.width;

        for x in area.x..end {
            if let Some(cell) = buf.cell_mut((x, area.y)) {
                cell.set_char(' ');
                cell.set_style(bg_style);
            }
        }

        let message_style = if self.is_warning {
            Style::default().bg(bg_color).fg(Color::Yellow)
        } else {
            bg_style
        };

        let hints_width = KEY_HINTS.chars().count() as u16 + 2;
        let message_width: u16 = self
            .message
            .chars()
            .map(|c| c.width().unwrap_or(0) as u16)
            .sum::<u16>()
            + 1;
        let show_hints = self.show_hints && message_width + hints_width <= area.width;

        let message_end = if show_hints { end - hints_width } else { end };
        put_str(buf, area.x + 1, area.y, message_end, self.message, message_style);

        if show_hints {
            let hint_style = Style::default().bg(bg_color).fg(Color::DarkGray);
            put_str(buf, end - hints_width + 1, area.y, end, KEY_HINTS, hint_style);
        }
    }
}
