//! Docker Hub access.
//!
//! Token-based session against the Docker Hub v2 API: login, the
//! authenticated user, the user's repositories, and repository tags.

mod client;
mod types;

pub use client::{DEFAULT_HUB_URL, DockerHubApi, HubClient, HubError};
pub use types::{HubCredentials, HubRepository, HubTag, HubUser, RepositoryInfo};
