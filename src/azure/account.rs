//! Azure sessions and token acquisition.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::AzureError;

/// Access token plus optional refresh token issued for a session.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Bearer token for the requested resource.
    pub access_token: String,
    /// Refresh token, when the identity provider issues one.
    pub refresh_token: Option<String>,
}

impl TokenPair {
    /// Creates a token pair.
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Cloud endpoints a session authenticates against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureEnvironment {
    /// Environment name (e.g. "AzureCloud").
    pub name: String,
    /// Resource manager base URL.
    pub resource_manager_url: String,
    /// Resource identifier tokens are requested for.
    pub token_resource: String,
}

impl AzureEnvironment {
    /// The public Azure cloud.
    #[must_use]
    pub fn public_cloud() -> Self {
        Self {
            name: "AzureCloud".to_string(),
            resource_manager_url: "https://management.azure.com".to_string(),
            token_resource: "https://management.core.windows.net/".to_string(),
        }
    }

    /// Overrides the resource manager URL.
    #[must_use]
    pub fn with_resource_manager_url(mut self, url: impl Into<String>) -> Self {
        self.resource_manager_url = url.into();
        self
    }
}

impl Default for AzureEnvironment {
    fn default() -> Self {
        Self::public_cloud()
    }
}

/// Source of tokens for one signed-in tenant.
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Acquires a token pair for `resource`.
    async fn get_token(&self, resource: &str) -> Result<TokenPair, AzureError>;
}

/// A signed-in tenant.
#[derive(Clone)]
pub struct AzureSession {
    /// Cloud endpoints.
    pub environment: AzureEnvironment,
    /// Tenant (directory) ID.
    pub tenant_id: String,
    /// Signed-in user.
    pub user_id: String,
    /// Token source for this tenant.
    pub credentials: Arc<dyn TokenCredential>,
}

impl fmt::Debug for AzureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureSession")
            .field("environment", &self.environment.name)
            .field("tenant_id", &self.tenant_id)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

/// The signed-in Azure account.
#[async_trait]
pub trait AzureAccount: Send + Sync {
    /// Returns true if a user is signed in.
    async fn is_logged_in(&self) -> bool;

    /// Returns one session per signed-in tenant.
    async fn sessions(&self) -> Result<Vec<AzureSession>, AzureError>;
}

/// Acquires the session's token pair for its environment's resource.
///
/// # Errors
/// Propagates the credential's error, or [`AzureError::EmptyToken`] if the
/// credential returned an empty access token.
pub async fn acquire_tokens(session: &AzureSession) -> Result<TokenPair, AzureError> {
    let tokens = session
        .credentials
        .get_token(&session.environment.token_resource)
        .await?;

    if tokens.access_token.is_empty() {
        return Err(AzureError::EmptyToken);
    }

    tracing::debug!(
        "acquired token for tenant {} (refresh token: {})",
        session.tenant_id,
        tokens.refresh_token.is_some()
    );
    Ok(tokens)
}
