//! Explorer tree widget.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::app::tree::TreeRow;

/// Columns of indentation per depth level.
const INDENT: usize = 2;

/// Tree widget.
pub struct TreeWidget<'a> {
    rows: &'a [TreeRow],
    selected: usize,
    title: &'a str,
}

impl<'a> TreeWidget<'a> {
    #[must_use]
    pub fn new(rows: &'a [TreeRow], selected: usize) -> Self {
        Self {
            rows,
            selected,
            title: " Docker Explorer ",
        }
    }

    #[must_use]
    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }
}

/// Returns the first visible row so that `selected` stays on screen.
#[must_use]
pub fn scroll_offset(selected: usize, height: usize) -> usize {
    if height == 0 {
        return 0;
    }
    selected.saturating_sub(height - 1)
}

fn marker(row: &TreeRow) -> &'static str {
    match (row.expandable, row.expanded) {
        (false, _) => "  ",
        (true, false) => "▸ ",
        (true, true) => "▾ ",
    }
}

fn row_line(row: &TreeRow, is_selected: bool, width: usize) -> Line<'static> {
    let base = if is_selected {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::White)
    };
    let icon_style = if is_selected {
        base
    } else {
        match row.icon {
            Some(crate::explorer::Icon::RunningContainer) => Style::default().fg(Color::Green),
            Some(crate::explorer::Icon::StoppedContainer) => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::Cyan),
        }
    };

    let mut spans = vec![
        Span::styled(" ".repeat(row.depth * INDENT), base),
        Span::styled(marker(row), base),
    ];
    if let Some(icon) = row.icon {
        spans.push(Span::styled(format!("{} ", icon.glyph()), icon_style));
    }
    spans.push(Span::styled(row.label.clone(), base));

    if row.loading {
        spans.push(Span::styled(
            "  loading…",
            Style::default().fg(Color::DarkGray),
        ));
    } else if let Some(description) = &row.description {
        let used: usize = spans.iter().map(|s| s.content.width()).sum();
        if used + 2 < width {
            spans.push(Span::styled(
                format!("  {}", description),
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    Line::from(spans)
}

impl Widget for TreeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        if self.rows.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "Loading…",
                Style::default().fg(Color::DarkGray),
            )))
            .render(inner, buf);
            return;
        }

        let height = inner.height as usize;
        let offset = scroll_offset(self.selected, height);
        let lines: Vec<Line<'static>> = self
            .rows
            .iter()
            .enumerate()
            .skip(offset)
            .take(height)
            .map(|(i, row)| row_line(row, i == self.selected, inner.width as usize))
            .collect();

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(0, 10), 0);
        assert_eq!(scroll_offset(9, 10), 0);
        assert_eq!(scroll_offset(12, 10), 3);
        assert_eq!(scroll_offset(5, 0), 0);
    }
}
