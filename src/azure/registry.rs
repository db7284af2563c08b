//! Registry OAuth token exchange and catalog listing.
//!
//! Reading a registry takes three requests:
//!
//! 1. `POST /oauth2/exchange`: trade the session's tokens for a registry
//!    refresh token.
//! 2. `POST /oauth2/token`: trade the registry refresh token for an access
//!    token limited to one scope.
//! 3. `GET /v2/_catalog` or `GET /v2/<repo>/tags/list` with that access
//!    token.
//!
//! Steps 1 and 2 resolve to `None` when the server answers without a
//! token; callers stop there.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Response;
use serde::Deserialize;

use super::AzureError;
use super::account::TokenPair;

/// Scope for listing the registry catalog.
pub const CATALOG_SCOPE: &str = "registry:catalog:*";

/// Returns the pull scope for one repository.
#[must_use]
pub fn repository_scope(repository: &str) -> String {
    format!("repository:{}:pull", repository)
}

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    repositories: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TagListResponse {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

/// Registry endpoints the explorer needs.
#[async_trait]
pub trait RegistryAuthApi: Send + Sync {
    /// Exchanges the session tokens for a registry refresh token.
    async fn exchange_refresh_token(
        &self,
        login_server: &str,
        tenant_id: &str,
        tokens: &TokenPair,
    ) -> Result<Option<String>, AzureError>;

    /// Exchanges a registry refresh token for a scoped access token.
    async fn exchange_access_token(
        &self,
        login_server: &str,
        refresh_token: &str,
        scope: &str,
    ) -> Result<Option<String>, AzureError>;

    /// Lists repositories in the registry.
    async fn catalog(&self, login_server: &str, access_token: &str)
    -> Result<Vec<String>, AzureError>;

    /// Lists tags of one repository.
    async fn tags(
        &self,
        login_server: &str,
        access_token: &str,
        repository: &str,
    ) -> Result<Vec<String>, AzureError>;
}

/// Runs steps 1 and 2 of the exchange for `scope`.
///
/// Returns `Ok(None)` as soon as a step yields no token.
///
/// # Errors
/// Propagates the first failed request.
pub async fn registry_access_token(
    api: &dyn RegistryAuthApi,
    login_server: &str,
    tenant_id: &str,
    tokens: &TokenPair,
    scope: &str,
) -> Result<Option<String>, AzureError> {
    let Some(refresh_token) = api
        .exchange_refresh_token(login_server, tenant_id, tokens)
        .await?
    else {
        tracing::warn!("{} returned no refresh token", login_server);
        return Ok(None);
    };

    let access_token = api
        .exchange_access_token(login_server, &refresh_token, scope)
        .await?;
    if access_token.is_none() {
        tracing::warn!("{} returned no access token for {}", login_server, scope);
    }
    Ok(access_token)
}

/// Registry client backed by reqwest.
#[derive(Debug, Clone)]
pub struct AcrClient {
    client: reqwest::Client,
}

impl AcrClient {
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

    /// Returns the base URL for a login server.
    ///
    /// Bare host names get `https://`; URLs with a scheme are kept.
    #[must_use]
    pub fn base_url(login_server: &str) -> String {
        let trimmed = login_server.trim_end_matches('/');
        if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        }
    }

    /// Returns the `service` parameter (the login server's host).
    #[must_use]
    pub fn service(login_server: &str) -> &str {
        let host = login_server
            .split_once("://")
            .map_or(login_server, |(_, rest)| rest);
        host.trim_end_matches('/')
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<String, AzureError> {
        tracing::debug!("POST {}", url);
        let response = self.client.post(url).form(form).send().await?;
        Ok(check_status(response)?.text().await?)
    }

    async fn get_authorized(&self, url: &str, access_token: &str) -> Result<String, AzureError> {
        tracing::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await?;
        Ok(check_status(response)?.text().await?)
    }
}

impl Default for AcrClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

fn check_status(response: Response) -> Result<Response, AzureError> {
    let status = response.status();
    if !status.is_success() {
        return Err(AzureError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

/// Parses a JSON body, treating an empty body as absent.
fn parse_optional<T: serde::de::DeserializeOwned>(body: &str) -> Result<Option<T>, AzureError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(body)?))
}

#[async_trait]
impl RegistryAuthApi for AcrClient {
    async fn exchange_refresh_token(
        &self,
        login_server: &str,
        tenant_id: &str,
        tokens: &TokenPair,
    ) -> Result<Option<String>, AzureError> {
        let url = format!("{}/oauth2/exchange", Self::base_url(login_server));
        let service = Self::service(login_server);

        let body = match tokens.refresh_token.as_deref() {
            Some(refresh_token) => {
                self.post_form(
                    &url,
                    &[
                        ("grant_type", "access_token_refresh_token"),
                        ("service", service),
                        ("tenant", tenant_id),
                        ("refresh_token", refresh_token),
                        ("access_token", &tokens.access_token),
                    ],
                )
                .await?
            }
            None => {
                self.post_form(
                    &url,
                    &[
                        ("grant_type", "access_token"),
                        ("service", service),
                        ("tenant", tenant_id),
                        ("access_token", &tokens.access_token),
                    ],
                )
                .await?
            }
        };

        Ok(parse_optional::<ExchangeResponse>(&body)?
            .and_then(|r| r.refresh_token)
            .filter(|t| !t.is_empty()))
    }

    async fn exchange_access_token(
        &self,
        login_server: &str,
        refresh_token: &str,
        scope: &str,
    ) -> Result<Option<String>, AzureError> {
        let url = format!("{}/oauth2/token", Self::base_url(login_server));
        let body = self
            .post_form(
                &url,
                &[
                    ("grant_type", "refresh_token"),
                    ("service", Self::service(login_server)),
                    ("scope", scope),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        Ok(parse_optional::<AccessTokenResponse>(&body)?
            .and_then(|r| r.access_token)
            .filter(|t| !t.is_empty()))
    }

    async fn catalog(
        &self,
        login_server: &str,
        access_token: &str,
    ) -> Result<Vec<String>, AzureError> {
        let url = format!("{}/v2/_catalog", Self::base_url(login_server));
        let body = self.get_authorized(&url, access_token).await?;

        Ok(parse_optional::<CatalogResponse>(&body)?
            .and_then(|r| r.repositories)
            .unwrap_or_default())
    }

    async fn tags(
        &self,
        login_server: &str,
        access_token: &str,
        repository: &str,
    ) -> Result<Vec<String>, AzureError> {
        let url = format!(
            "{}/v2/{}/tags/list",
            Self::base_url(login_server),
            repository
        );
        let body = self.get_authorized(&url, access_token).await?;

        Ok(parse_optional::<TagListResponse>(&body)?
            .and_then(|r| r.tags)
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url() {
        assert_eq!(
            AcrClient::base_url("myreg.azurecr.io"),
            "https://myreg.azurecr.io"
        );
        assert_eq!(
            AcrClient::base_url("http://127.0.0.1:5000/"),
            "http://127.0.0.1:5000"
        );
    }

    #[test]
    fn test_service_strips_scheme() {
        assert_eq!(AcrClient::service("myreg.azurecr.io"), "myreg.azurecr.io");
        assert_eq!(AcrClient::service("http://127.0.0.1:5000"), "127.0.0.1:5000");
    }

    #[test]
    fn test_repository_scope() {
        assert_eq!(repository_scope("web/api"), "repository:web/api:pull");
    }

    #[test]
    fn test_parse_optional_empty_body() {
        let parsed = parse_optional::<AccessTokenResponse>("  ").unwrap();
        assert!(parsed.is_none());

        let parsed = parse_optional::<AccessTokenResponse>(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(parsed.unwrap().access_token.as_deref(), Some("abc"));
    }
}
