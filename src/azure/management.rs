//! Azure resource manager client.
//!
//! Lists subscriptions visible to a session and the container registries
//! inside a subscription. Both listings are paged through `nextLink`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use super::AzureError;
use super::account::{AzureSession, acquire_tokens};
use crate::pagination::{Page, list_all};

/// API version for subscription listing.
const SUBSCRIPTIONS_API_VERSION: &str = "2016-06-01";

/// API version for registry listing.
const REGISTRIES_API_VERSION: &str = "2019-05-01";

/// An Azure subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    /// Fully qualified ID (`/subscriptions/<guid>`).
    #[serde(default)]
    pub id: String,
    /// Subscription GUID.
    pub subscription_id: String,
    /// Display name.
    #[serde(default)]
    pub display_name: String,
    /// Owning tenant.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// Subscription state (e.g. "Enabled").
    #[serde(default)]
    pub state: Option<String>,
}

/// Registry SKU.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySku {
    /// SKU name (Basic, Standard, Premium, Classic).
    pub name: String,
    /// SKU tier.
    #[serde(default)]
    pub tier: Option<String>,
}

impl RegistrySku {
    /// Returns true for the retired Classic SKU.
    #[must_use]
    pub fn is_classic(&self) -> bool {
        self.name.contains("Classic") || self.tier.as_deref().is_some_and(|t| t.contains("Classic"))
    }
}

/// Registry properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryProperties {
    /// Login server host name (e.g. `myreg.azurecr.io`).
    #[serde(default)]
    pub login_server: String,
    /// Provisioning state.
    #[serde(default)]
    pub provisioning_state: Option<String>,
}

/// An Azure container registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Fully qualified resource ID.
    #[serde(default)]
    pub id: String,
    /// Registry name.
    pub name: String,
    /// Azure region.
    #[serde(default)]
    pub location: String,
    /// SKU.
    #[serde(default)]
    pub sku: RegistrySku,
    /// Properties.
    #[serde(default)]
    pub properties: RegistryProperties,
}

impl Registry {
    /// Returns the login server.
    #[must_use]
    pub fn login_server(&self) -> &str {
        &self.properties.login_server
    }
}

/// Resource manager list response.
#[derive(Debug, Deserialize)]
struct ArmPage<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
    #[serde(rename = "nextLink", default)]
    next_link: Option<String>,
}

impl<T> From<ArmPage<T>> for Page<T> {
    fn from(page: ArmPage<T>) -> Self {
        Page::new(page.value, page.next_link)
    }
}

/// Resource manager operations the explorer needs.
#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Fetches one page of subscriptions. `next_link` of `None` means the
    /// first page.
    async fn subscriptions_page(
        &self,
        session: &AzureSession,
        next_link: Option<&str>,
    ) -> Result<Page<Subscription>, AzureError>;

    /// Fetches one page of registries in a subscription.
    async fn registries_page(
        &self,
        session: &AzureSession,
        subscription_id: &str,
        next_link: Option<&str>,
    ) -> Result<Page<Registry>, AzureError>;
}

/// Lists every subscription visible to `session`.
///
/// # Errors
/// Returns the first page error.
pub async fn list_subscriptions(
    api: &dyn ManagementApi,
    session: &AzureSession,
) -> Result<Vec<Subscription>, AzureError> {
    let first = api.subscriptions_page(session, None).await?;
    list_all(first, move |next| async move {
        api.subscriptions_page(session, Some(&next)).await
    })
    .await
}

/// Lists every registry in `subscription_id`.
///
/// # Errors
/// Returns the first page error.
pub async fn list_registries(
    api: &dyn ManagementApi,
    session: &AzureSession,
    subscription_id: &str,
) -> Result<Vec<Registry>, AzureError> {
    let first = api.registries_page(session, subscription_id, None).await?;
    list_all(first, move |next| async move {
        api.registries_page(session, subscription_id, Some(&next)).await
    })
    .await
}

/// Resource manager client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ArmClient {
    client: reqwest::Client,
}

impl ArmClient {
    /// Creates a client with a per-request timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dockview/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        session: &AzureSession,
        url: &str,
    ) -> Result<Page<T>, AzureError> {
        let tokens = acquire_tokens(session).await?;

        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(&tokens.access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AzureError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let page: ArmPage<T> = response.json().await?;
        Ok(page.into())
    }
}

impl Default for ArmClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

fn base_url(session: &AzureSession) -> &str {
    session
        .environment
        .resource_manager_url
        .trim_end_matches('/')
}

#[async_trait]
impl ManagementApi for ArmClient {
    async fn subscriptions_page(
        &self,
        session: &AzureSession,
        next_link: Option<&str>,
    ) -> Result<Page<Subscription>, AzureError> {
        let url = match next_link {
            Some(link) => link.to_string(),
            None => format!(
                "{}/subscriptions?api-version={}",
                base_url(session),
                SUBSCRIPTIONS_API_VERSION
            ),
        };
        self.get_page(session, &url).await
    }

    async fn registries_page(
        &self,
        session: &AzureSession,
        subscription_id: &str,
        next_link: Option<&str>,
    ) -> Result<Page<Registry>, AzureError> {
        let url = match next_link {
            Some(link) => link.to_string(),
            None => format!(
                "{}/subscriptions/{}/providers/Microsoft.ContainerRegistry/registries?api-version={}",
                base_url(session),
                subscription_id,
                REGISTRIES_API_VERSION
            ),
        };
        self.get_page(session, &url).await
    }
}
