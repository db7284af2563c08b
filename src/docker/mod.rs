//! Local Docker daemon access.
//!
//! Provides functionality for:
//! - Listing local images and containers through the daemon API
//! - Classifying container lifecycle states for display

pub mod client;
pub mod types;

pub use client::{BollardDaemon, DaemonClient, DaemonError};
pub use types::{ContainerDescriptor, ContainerState, ImageDescriptor, UNTAGGED_LABEL};
