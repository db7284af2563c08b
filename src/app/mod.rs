//! Main application state and event handling.
//!
//! Drives the explorer tree: asks the provider for children on background
//! tasks, folds results and tree events back into [`ExplorerTree`], and
//! hosts the Docker Hub login popup.

mod input;
pub mod prompt;
pub mod tree;

use std::sync::Arc;

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::explorer::{AutoRefresh, ExplorerProvider, Node, TreeEvent};
use crate::hub::HubCredentials;
use crate::ui::login_popup::{LoginForm, LoginPopupWidget};
use crate::ui::statusbar::StatusBar;
use crate::ui::tree_widget::TreeWidget;

pub use prompt::ChannelLoginPrompt;
pub use tree::{ExplorerTree, TreeEntry, TreeRow};

/// Messages posted to the app loop by background tasks.
#[derive(Debug)]
pub enum AppMessage {
    /// Children fetched for `parent` (`None` for the roots).
    Children {
        parent: Option<Uuid>,
        children: Vec<Node>,
    },
    /// The provider needs Docker Hub credentials.
    LoginRequested(oneshot::Sender<Option<HubCredentials>>),
}

/// Open login popup and the request waiting on it.
struct PendingLogin {
    form: LoginForm,
    respond: oneshot::Sender<Option<HubCredentials>>,
}

/// Application state.
pub struct App {
    provider: Arc<ExplorerProvider>,
    tree: ExplorerTree,
    tx: mpsc::UnboundedSender<AppMessage>,
    auto_refresh: Option<AutoRefresh>,
    login: Option<PendingLogin>,
    status: String,
    status_is_warning: bool,
    running: bool,
}

impl App {
    /// Creates the app. `tx` must feed the loop that calls
    /// [`handle_message`](Self::handle_message).
    #[must_use]
    pub fn new(
        provider: Arc<ExplorerProvider>,
        tx: mpsc::UnboundedSender<AppMessage>,
        auto_refresh: Option<AutoRefresh>,
    ) -> Self {
        Self {
            provider,
            tree: ExplorerTree::new(),
            tx,
            auto_refresh,
            login: None,
            status: String::new(),
            status_is_warning: false,
            running: true,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn quit(&mut self) {
        self.running = false;
        if let Some(refresh) = &self.auto_refresh {
            refresh.stop();
        }
    }

    #[must_use]
    pub fn tree(&self) -> &ExplorerTree {
        &self.tree
    }

    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    #[must_use]
    pub fn is_login_open(&self) -> bool {
        self.login.is_some()
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.status_is_warning = false;
    }

    fn set_warning(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.status_is_warning = true;
    }

    /// Requests the root nodes.
    pub fn load_roots(&self) {
        self.spawn_fetch(None);
    }

    fn spawn_fetch(&self, node: Option<Node>) {
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let children = provider.children(node.as_ref()).await;
            let message = AppMessage::Children {
                parent: node.map(|n| n.id()),
                children,
            };
            if tx.send(message).is_err() {
                tracing::debug!("App loop closed before children arrived");
            }
        });
    }

    fn spawn_fetches(&self, nodes: Vec<Node>) {
        for node in nodes {
            self.spawn_fetch(Some(node));
        }
    }

    /// Applies a message from a background task.
    pub fn handle_message(&mut self, message: AppMessage) {
        match message {
            AppMessage::Children { parent, children } => {
                let reload = match parent {
                    None => self.tree.set_roots(children),
                    Some(parent) => self.tree.set_children(parent, children),
                };
                self.spawn_fetches(reload);
            }
            AppMessage::LoginRequested(respond) => {
                if self.login.is_some() {
                    // One popup at a time; the later request is cancelled.
                    let _ = respond.send(None);
                    return;
                }
                self.login = Some(PendingLogin {
                    form: LoginForm::new(),
                    respond,
                });
            }
        }
    }

    /// Applies a provider notification.
    pub fn handle_tree_event(&mut self, event: TreeEvent) {
        match event {
            TreeEvent::Changed(None) => self.load_roots(),
            TreeEvent::Changed(Some(node)) => {
                if let Some(node) = self.tree.reload(node.id()) {
                    self.spawn_fetch(Some(node));
                }
            }
            TreeEvent::Warning(message) => {
                tracing::warn!("{}", message);
                self.set_warning(message);
            }
        }
    }

    /// Signals every category and restarts the auto-refresh delay.
    pub fn refresh_all(&mut self) {
        if let Some(refresh) = &self.auto_refresh {
            refresh.poke();
        }
        self.provider.refresh_images();
        self.provider.refresh_containers();
        self.provider.refresh_registries();
        self.set_status("Refreshing…");
    }

    fn finish_login(&mut self, submit: bool) {
        if let Some(pending) = self.login.take() {
            let answer = submit.then(|| pending.form.credentials());
            if pending.respond.send(answer).is_err() {
                tracing::debug!("Login request abandoned");
            }
            self.set_status(if submit {
                "Signing in to Docker Hub…"
            } else {
                "Login cancelled"
            });
        }
    }

    /// Renders the app.
    pub fn render(&self, frame: &mut Frame) {
        let [tree_area, status_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).areas(frame.area());

        let rows = self.tree.rows();
        frame.render_widget(TreeWidget::new(&rows, self.tree.selected()), tree_area);
        frame.render_widget(
            StatusBar::new()
                .message(&self.status)
                .warning(self.status_is_warning),
            status_area,
        );

        if let Some(pending) = &self.login {
            frame.render_widget(LoginPopupWidget::new(&pending.form), frame.area());
        }
    }
}
