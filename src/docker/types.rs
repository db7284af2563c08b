//! Docker image and container descriptors.
//!
//! These are the payloads attached to local image and container nodes.
//! They are decoupled from the daemon client's wire models so fakes can
//! build them directly.

use serde::{Deserialize, Serialize};

/// Label used for images without any repository tag.
pub const UNTAGGED_LABEL: &str = "<none>:<none>";

/// Number of characters in a short container or image ID.
const SHORT_ID_LEN: usize = 12;

/// Container lifecycle state as reported by the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// State unknown or not reported.
    #[default]
    Unknown,
    /// Container was created but never started.
    Created,
    /// Container is restarting.
    Restarting,
    /// Container is running.
    Running,
    /// Container is being removed.
    Removing,
    /// Container is paused.
    Paused,
    /// Container has exited.
    Exited,
    /// Container is dead (abnormal state).
    Dead,
}

impl ContainerState {
    /// States requested when listing containers for the explorer.
    pub const LISTED: [Self; 6] = [
        Self::Created,
        Self::Restarting,
        Self::Running,
        Self::Paused,
        Self::Exited,
        Self::Dead,
    ];

    /// Parses the daemon's `State` field.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "created" => Self::Created,
            "restarting" => Self::Restarting,
            "running" => Self::Running,
            "removing" => Self::Removing,
            "paused" => Self::Paused,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }

    /// Returns the daemon's name for this state.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Created => "created",
            Self::Restarting => "restarting",
            Self::Running => "running",
            Self::Removing => "removing",
            Self::Paused => "paused",
            Self::Exited => "exited",
            Self::Dead => "dead",
        }
    }

    /// Returns true for the states shown as stopped (exited, dead).
    ///
    /// Every other state, including unknown, is shown as running.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Exited | Self::Dead)
    }
}

/// A local image as listed by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    /// Image ID (`sha256:...`).
    pub id: String,
    /// Repository tags (`repo:tag`), possibly empty.
    pub repo_tags: Vec<String>,
    /// Creation time (Unix seconds).
    pub created: i64,
    /// Image size in bytes.
    pub size: i64,
}

impl ImageDescriptor {
    /// Creates a descriptor with the given ID and tags.
    #[must_use]
    pub fn new(id: impl Into<String>, repo_tags: Vec<String>) -> Self {
        Self {
            id: id.into(),
            repo_tags,
            created: 0,
            size: 0,
        }
    }

    /// Returns one display label per repository tag.
    ///
    /// Untagged images yield exactly one `<none>:<none>` label.
    #[must_use]
    pub fn display_tags(&self) -> Vec<String> {
        if self.repo_tags.is_empty() {
            vec![UNTAGGED_LABEL.to_string()]
        } else {
            self.repo_tags.clone()
        }
    }

    /// Returns the short image ID without the digest algorithm prefix.
    #[must_use]
    pub fn short_id(&self) -> &str {
        let id = self.id.strip_prefix("sha256:").unwrap_or(&self.id);
        id.get(..SHORT_ID_LEN).unwrap_or(id)
    }
}

/// A container as listed by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerDescriptor {
    /// Container ID.
    pub id: String,
    /// Container names, each with a leading slash.
    pub names: Vec<String>,
    /// Image the container was created from.
    pub image: String,
    /// Lifecycle state.
    pub state: ContainerState,
    /// Human-readable status (e.g. "Up 5 minutes").
    pub status: String,
    /// Creation time (Unix seconds).
    pub created: i64,
}

impl ContainerDescriptor {
    /// Returns the first container name without its leading slash.
    ///
    /// Falls back to the short ID when the daemon reports no name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.names.first() {
            Some(name) => name.strip_prefix('/').unwrap_or(name),
            None => self.short_id(),
        }
    }

    /// Returns the short container ID.
    #[must_use]
    pub fn short_id(&self) -> &str {
        self.id.get(..SHORT_ID_LEN).unwrap_or(&self.id)
    }

    /// Returns the tree label: `image (name) (status)`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ({}) ({})", self.image, self.name(), self.status)
    }

    /// Returns true if the container is shown as stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.is_stopped()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_container_state_parse() {
        assert_eq!(ContainerState::parse("running"), ContainerState::Running);
        assert_eq!(ContainerState::parse("Exited"), ContainerState::Exited);
        assert_eq!(ContainerState::parse(" dead "), ContainerState::Dead);
        assert_eq!(ContainerState::parse("paused"), ContainerState::Paused);
        assert_eq!(ContainerState::parse("bogus"), ContainerState::Unknown);
    }

    #[test]
    fn test_stopped_boundary() {
        assert!(ContainerState::Exited.is_stopped());
        assert!(ContainerState::Dead.is_stopped());
        assert!(!ContainerState::Running.is_stopped());
        assert!(!ContainerState::Paused.is_stopped());
        assert!(!ContainerState::Created.is_stopped());
        assert!(!ContainerState::Restarting.is_stopped());
        assert!(!ContainerState::Unknown.is_stopped());
    }

    #[test]
    fn test_untagged_image_has_single_label() {
        let image = ImageDescriptor::new("sha256:abc", Vec::new());
        assert_eq!(image.display_tags(), vec![UNTAGGED_LABEL.to_string()]);
    }

    #[test]
    fn test_image_short_id() {
        let image = ImageDescriptor::new("sha256:0123456789abcdef0123", Vec::new());
        assert_eq!(image.short_id(), "0123456789ab");

        let short = ImageDescriptor::new("abc", Vec::new());
        assert_eq!(short.short_id(), "abc");
    }

    #[test]
    fn test_container_label() {
        let container = ContainerDescriptor {
            id: "abc123def4567890".to_string(),
            names: vec!["/my-nginx".to_string()],
            image: "nginx:latest".to_string(),
            state: ContainerState::Running,
            status: "Up 5 minutes".to_string(),
            created: 0,
        };

        assert_eq!(container.name(), "my-nginx");
        assert_eq!(container.label(), "nginx:latest (my-nginx) (Up 5 minutes)");
        assert!(!container.is_stopped());
    }

    #[test]
    fn test_container_without_name_uses_short_id() {
        let container = ContainerDescriptor {
            id: "abc123def4567890".to_string(),
            ..Default::default()
        };
        assert_eq!(container.name(), "abc123def456");
    }

    proptest! {
        #[test]
        fn prop_display_tags_count(tags in proptest::collection::vec("[a-z]{1,8}:[a-z0-9]{1,6}", 0..10)) {
            let image = ImageDescriptor::new("sha256:x", tags.clone());
            let labels = image.display_tags();
            if tags.is_empty() {
                prop_assert_eq!(labels.len(), 1);
            } else {
                prop_assert_eq!(labels, tags);
            }
        }

        #[test]
        fn prop_state_round_trips_through_name(index in 0usize..6) {
            let state = ContainerState::LISTED[index];
            prop_assert_eq!(ContainerState::parse(state.as_str()), state);
        }
    }
}
