//! User interface module.
//!
//! Provides widgets for the explorer TUI.

pub mod login_popup;
pub mod statusbar;
pub mod tree_widget;

pub use login_popup::{LoginField, LoginForm, LoginPopupWidget};
pub use statusbar::StatusBar;
pub use tree_widget::TreeWidget;
