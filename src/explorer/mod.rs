//! Lazy explorer tree.
//!
//! # Architecture
//!
//! - **node**: Nodes, discriminators, and per-kind payloads
//! - **provider**: On-demand expansion and change notifications
//! - **refresh**: Debounced auto-refresh of the local branches

pub mod node;
pub mod provider;
pub mod refresh;

pub use node::{
    Category, CollapsibleState, Icon, Node, NodeKind, RegistryItem, RepositoryItem,
    SubscriptionItem, locale_compare,
};
pub use provider::{
    CREDENTIAL_SERVICE, CategoryNodes, Collaborators, DOCKER_HUB_LABEL, ExplorerError,
    ExplorerProvider, HUB_TOKEN_ACCOUNT, LoginPrompt, TreeEvent,
};
pub use refresh::{AutoRefresh, DEFAULT_REFRESH_INTERVAL_MS, DebounceState};
