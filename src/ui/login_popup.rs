//! Docker Hub login popup.
//!
//! Username and masked password fields. Tab switches field, Enter submits,
//! Esc cancels.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::hub::HubCredentials;

/// Maximum input length per field.
const MAX_FIELD_LEN: usize = 256;

/// Popup width in columns.
const POPUP_WIDTH: u16 = 50;

/// Popup height in rows.
const POPUP_HEIGHT: u16 = 10;

/// Focused form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

impl LoginField {
    /// Returns the other field.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Username => Self::Password,
            Self::Password => Self::Username,
        }
    }
}

/// Login form state.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    username: String,
    password: String,
    focus: LoginField,
}

impl LoginForm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn focus(&self) -> LoginField {
        self.focus
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Switches to the other field.
    pub fn toggle_field(&mut self) {
        self.focus = self.focus.next();
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
        }
    }

    /// Appends a character to the focused field.
    pub fn insert_char(&mut self, c: char) {
        let field = self.field_mut();
        if field.chars().count() < MAX_FIELD_LEN {
            field.push(c);
        }
    }

    /// Deletes the last character of the focused field.
    pub fn backspace(&mut self) {
        self.field_mut().pop();
    }

    /// Returns the entered credentials.
    #[must_use]
    pub fn credentials(&self) -> HubCredentials {
        HubCredentials::new(self.username.trim(), self.password.clone())
    }
}

/// Returns a rectangle of at most `width` x `height` centered in `area`.
#[must_use]
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Login popup widget.
pub struct LoginPopupWidget<'a> {
    form: &'a LoginForm,
}

impl<'a> LoginPopupWidget<'a> {
    #[must_use]
    pub fn new(form: &'a LoginForm) -> Self {
        Self { form }
    }
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let label_style = if focused {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let cursor = if focused { "_" } else { "" };

    Line::from(vec![
        Span::styled(format!("{:<10}", label), label_style),
        Span::styled(
            format!("{}{}", value, cursor),
            Style::default().fg(Color::White),
        ),
    ])
}

impl Widget for LoginPopupWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(POPUP_WIDTH, POPUP_HEIGHT, area);
        if popup.height < 6 || popup.width < 20 {
            return;
        }

        Clear.render(popup, buf);
        let block = Block::default()
            .title(" Docker Hub Login ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        let inner = block.inner(popup);
        block.render(popup, buf);

        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

        let masked = "*".repeat(self.form.password.chars().count());
        Paragraph::new(field_line(
            "Username:",
            &self.form.username,
            self.form.focus == LoginField::Username,
        ))
        .render(chunks[0], buf);
        Paragraph::new(field_line(
            "Password:",
            &masked,
            self.form.focus == LoginField::Password,
        ))
        .render(chunks[2], buf);

        Paragraph::new(Line::from(Span::styled(
            "Tab: switch  Enter: sign in  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )))
        .render(chunks[4], buf);
    }
}
