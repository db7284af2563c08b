//! Azure Container Registry browsing.
//!
//! # Architecture
//!
//! - **account**: Sessions, credentials, and the token acquisition helper
//! - **cli**: Account implementation backed by the Azure CLI
//! - **management**: Resource manager client for subscriptions and registries
//! - **registry**: Registry OAuth token exchange and catalog/tag listing

pub mod account;
pub mod cli;
pub mod management;
pub mod registry;

use std::io;
use std::time::Duration;

use thiserror::Error;

pub use account::{
    AzureAccount, AzureEnvironment, AzureSession, TokenCredential, TokenPair, acquire_tokens,
};
pub use cli::{AzureCliAccount, AzureCliCredential};
pub use management::{
    ArmClient, ManagementApi, Registry, RegistryProperties, RegistrySku, Subscription,
    list_registries, list_subscriptions,
};
pub use registry::{
    AcrClient, CATALOG_SCOPE, RegistryAuthApi, registry_access_token, repository_scope,
};

/// Azure errors.
#[derive(Debug, Error)]
pub enum AzureError {
    /// Transport or decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status.
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The Azure CLI reported an error.
    #[error("Azure CLI error: {0}")]
    Cli(String),

    /// The Azure CLI did not finish in time.
    #[error("Azure CLI timed out after {0:?}")]
    Timeout(Duration),

    /// Process or file I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The credential produced an empty access token.
    #[error("Token acquisition returned an empty access token")]
    EmptyToken,
}
