//! Docker Hub HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

use super::types::{
    HubCredentials, HubPage, HubRepository, HubTag, HubUser, LoginRequest, LoginResponse,
    RepositoryInfo,
};
use crate::pagination::{Page, list_all};

/// Default Docker Hub API endpoint.
pub const DEFAULT_HUB_URL: &str = "https://hub.docker.com";

/// Page size requested from listing endpoints.
const PAGE_SIZE: u32 = 100;

/// Docker Hub errors.
#[derive(Debug, Error)]
pub enum HubError {
    /// Transport or decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Credentials or token rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Any other non-success status.
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// Login succeeded but no token was returned.
    #[error("Login response did not contain a token")]
    MissingToken,
}

/// Operations the explorer needs from Docker Hub.
///
/// Every call after login is authenticated with the session token.
#[async_trait]
pub trait DockerHubApi: Send + Sync {
    /// Exchanges credentials for a session token.
    async fn login(&self, credentials: &HubCredentials) -> Result<String, HubError>;

    /// Returns the user the token belongs to.
    async fn user(&self, token: &str) -> Result<HubUser, HubError>;

    /// Lists every repository in `namespace`.
    async fn repositories(&self, token: &str, namespace: &str)
    -> Result<Vec<HubRepository>, HubError>;

    /// Returns details for one repository.
    async fn repository(
        &self,
        token: &str,
        namespace: &str,
        name: &str,
    ) -> Result<RepositoryInfo, HubError>;

    /// Lists every tag of one repository.
    async fn tags(&self, token: &str, namespace: &str, name: &str)
    -> Result<Vec<HubTag>, HubError>;
}

/// Docker Hub client backed by reqwest.
#[derive(Debug, Clone)]
pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
}

impl HubClient {
    /// Creates a client for `base_url` with a per-request timeout.
    /// A blank URL falls back to [`DEFAULT_HUB_URL`].
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let base_url = match base_url.trim().trim_end_matches('/') {
            "" => DEFAULT_HUB_URL,
            trimmed => trimmed,
        };

        let client = reqwest::Client::builder()
            .user_agent(concat!("dockview/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Returns the API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, token: &str) -> Result<T, HubError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("JWT {}", token))
            .send()
            .await?;

        Ok(check_status(response)?.json::<T>().await?)
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<Page<T>, HubError> {
        let page: HubPage<T> = self.get_json(url, token).await?;
        Ok(Page::new(page.results, page.next))
    }
}

impl Default for HubClient {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_URL, Duration::from_secs(30))
    }
}

/// Maps non-success statuses to [`HubError`].
fn check_status(response: Response) -> Result<Response, HubError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(HubError::Unauthorized);
    }
    if !status.is_success() {
        return Err(HubError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

#[async_trait]
impl DockerHubApi for HubClient {
    async fn login(&self, credentials: &HubCredentials) -> Result<String, HubError> {
        let url = self.url("/v2/users/login/");
        info!("Logging in to Docker Hub as {}", credentials.username);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await?;

        let body: LoginResponse = check_status(response)?.json().await?;
        if body.token.is_empty() {
            return Err(HubError::MissingToken);
        }
        Ok(body.token)
    }

    async fn user(&self, token: &str) -> Result<HubUser, HubError> {
        self.get_json(&self.url("/v2/user/"), token).await
    }

    async fn repositories(
        &self,
        token: &str,
        namespace: &str,
    ) -> Result<Vec<HubRepository>, HubError> {
        let first_url = self.url(&format!(
            "/v2/repositories/{}/?page_size={}",
            namespace, PAGE_SIZE
        ));
        let first = self.get_page(&first_url, token).await?;

        list_all(first, move |next| async move { self.get_page(&next, token).await }).await
    }

    async fn repository(
        &self,
        token: &str,
        namespace: &str,
        name: &str,
    ) -> Result<RepositoryInfo, HubError> {
        let url = self.url(&format!("/v2/repositories/{}/{}/", namespace, name));
        self.get_json(&url, token).await
    }

    async fn tags(&self, token: &str, namespace: &str, name: &str) -> Result<Vec<HubTag>, HubError> {
        let first_url = self.url(&format!(
            "/v2/repositories/{}/{}/tags/?page_size={}",
            namespace, name, PAGE_SIZE
        ));
        let first = self.get_page(&first_url, token).await?;

        list_all(first, move |next| async move { self.get_page(&next, token).await }).await
    }
}
