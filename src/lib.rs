//! dockview
//!
//! A lazy tree explorer for Docker images, containers, and container
//! registries (Docker Hub and Azure Container Registry).
//!
//! # Architecture
//!
//! - **Explorer Module**: Nodes and the lazy tree provider
//! - **Docker Module**: Local daemon access through bollard
//! - **Hub Module**: Docker Hub HTTP client
//! - **Azure Module**: Sessions, resource manager, and registry token exchange
//! - **App/UI Modules**: Terminal host built on ratatui
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use dockview::explorer::ExplorerProvider;
//!
//! # async fn run(deps: dockview::explorer::Collaborators) {
//! let (provider, _events) = ExplorerProvider::new(deps);
//! let roots = provider.children(None).await;
//! let images = provider.children(Some(&roots[0])).await;
//! # let _ = (Arc::new(provider), images);
//! # }
//! ```

// Clippy configuration - allow common patterns
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod app;
pub mod azure;
pub mod config;
pub mod credentials;
pub mod docker;
pub mod explorer;
pub mod hub;
pub mod logging;
pub mod pagination;
pub mod ui;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export main types
pub use app::App;
pub use config::Config;
pub use explorer::{Collaborators, ExplorerProvider, Node, NodeKind, TreeEvent};
