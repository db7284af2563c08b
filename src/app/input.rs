//! Key handling.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::App;

impl App {
    /// Handles a key press.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            if self.login.is_some() {
                self.finish_login(false);
            }
            self.quit();
            return;
        }

        if self.login.is_some() {
            self.handle_login_key(key);
        } else {
            self.handle_tree_key(key);
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.finish_login(false),
            KeyCode::Enter => self.finish_login(true),
            KeyCode::Tab | KeyCode::BackTab => {
                if let Some(pending) = &mut self.login {
                    pending.form.toggle_field();
                }
            }
            KeyCode::Backspace => {
                if let Some(pending) = &mut self.login {
                    pending.form.backspace();
                }
            }
            KeyCode::Char(c) => {
                if let Some(pending) = &mut self.login {
                    pending.form.insert_char(c);
                }
            }
            _ => {}
        }
    }

    fn handle_tree_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit(),
            KeyCode::Up | KeyCode::Char('k') => self.tree.move_up(),
            KeyCode::Down | KeyCode::Char('j') => self.tree.move_down(),
            KeyCode::Right | KeyCode::Char('l') => self.expand_selected(),
            KeyCode::Left | KeyCode::Char('h') => self.tree.collapse_selected(),
            KeyCode::Enter => {
                let is_leaf = self
                    .tree
                    .selected_node()
                    .is_some_and(|node| !node.is_expandable());
                if is_leaf {
                    self.show_selected_command();
                } else {
                    self.expand_selected();
                }
            }
            KeyCode::Char('r') => self.refresh_all(),
            _ => {}
        }
    }

    fn expand_selected(&mut self) {
        if let Some(node) = self.tree.expand_selected() {
            self.spawn_fetch(Some(node));
        }
    }

    fn show_selected_command(&mut self) {
        let command = self
            .tree
            .selected_node()
            .and_then(|node| node.command().map(str::to_string));
        match command {
            Some(command) => self.set_status(command),
            None => self.set_status(""),
        }
    }
}
