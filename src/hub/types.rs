//! Docker Hub API records.

use serde::{Deserialize, Serialize};

/// Username and password entered during interactive login.
#[derive(Clone, PartialEq, Eq)]
pub struct HubCredentials {
    /// Docker ID.
    pub username: String,
    /// Password or personal access token.
    pub password: String,
}

impl HubCredentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns true if both fields are filled in.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl std::fmt::Debug for HubCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login request body.
#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Login response body.
#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    #[serde(default)]
    pub token: String,
}

/// The authenticated Docker Hub user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubUser {
    /// User ID.
    #[serde(default)]
    pub id: String,
    /// Docker ID.
    pub username: String,
    /// Full name.
    #[serde(default)]
    pub full_name: String,
    /// Company.
    #[serde(default)]
    pub company: String,
}

/// A repository entry from a repository listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubRepository {
    /// Namespace (user or organization).
    pub namespace: String,
    /// Repository name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the repository is private.
    #[serde(default)]
    pub is_private: bool,
    /// Star count.
    #[serde(default)]
    pub star_count: u64,
    /// Pull count.
    #[serde(default)]
    pub pull_count: u64,
}

impl HubRepository {
    /// Creates a repository reference.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    /// Returns `namespace/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// Detailed repository information.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// Namespace (user or organization).
    pub namespace: String,
    /// Repository name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the repository is private.
    #[serde(default)]
    pub is_private: bool,
    /// Star count.
    #[serde(default)]
    pub star_count: u64,
    /// Pull count.
    #[serde(default)]
    pub pull_count: u64,
    /// Last update time (RFC 3339).
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// A repository tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubTag {
    /// Tag name.
    pub name: String,
    /// Compressed size in bytes.
    #[serde(default)]
    pub full_size: Option<u64>,
    /// Last update time (RFC 3339).
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// A paged Docker Hub listing.
#[derive(Debug, Deserialize)]
pub(crate) struct HubPage<T> {
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = HubCredentials::new("alice", "hunter2");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_credentials_complete() {
        assert!(HubCredentials::new("alice", "pw").is_complete());
        assert!(!HubCredentials::new("  ", "pw").is_complete());
        assert!(!HubCredentials::new("alice", "").is_complete());
    }

    #[test]
    fn test_parse_repository_page() {
        let body = r#"{
            "count": 2,
            "next": "https://hub.docker.com/v2/repositories/alice/?page=2",
            "results": [
                {"namespace": "alice", "name": "web", "description": "site", "star_count": 3},
                {"namespace": "alice", "name": "db", "description": null}
            ]
        }"#;

        let page: HubPage<HubRepository> = serde_json::from_str(body).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[0].full_name(), "alice/web");
        assert_eq!(page.results[1].description, None);
        assert!(page.next.is_some());
    }

    #[test]
    fn test_parse_tag_page_without_next() {
        let body = r#"{"count": 1, "next": null, "results": [{"name": "latest", "full_size": 1024}]}"#;
        let page: HubPage<HubTag> = serde_json::from_str(body).unwrap();
        assert_eq!(page.results[0].name, "latest");
        assert!(page.next.is_none());
    }
}
