//! Login prompt answered by the host's popup.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::AppMessage;
use crate::explorer::LoginPrompt;
use crate::hub::HubCredentials;

/// Forwards login requests to the app loop and waits for the popup.
#[derive(Debug, Clone)]
pub struct ChannelLoginPrompt {
    tx: mpsc::UnboundedSender<AppMessage>,
}

impl ChannelLoginPrompt {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<AppMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl LoginPrompt for ChannelLoginPrompt {
    async fn prompt(&self) -> Option<HubCredentials> {
        let (respond, answer) = oneshot::channel();
        if self.tx.send(AppMessage::LoginRequested(respond)).is_err() {
            tracing::debug!("Login prompt unavailable, app loop closed");
            return None;
        }
        // A dropped sender counts as cancelled.
        answer.await.ok().flatten()
    }
}
