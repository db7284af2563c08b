//! Tree nodes and their discriminators.
//!
//! A [`Node`] is created fresh on every expansion. Its [`NodeKind`]
//! carries both the discriminator tag and the payload the next expansion
//! needs, so the two can never disagree.

use std::cmp::Ordering;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use uuid::Uuid;

use crate::azure::{AzureSession, Registry, Subscription, TokenPair};
use crate::docker::{ContainerDescriptor, ImageDescriptor, UNTAGGED_LABEL};
use crate::hub::{HubRepository, HubTag};

/// Expansion state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollapsibleState {
    /// Leaf node.
    #[default]
    None,
    /// Expandable, currently collapsed.
    Collapsed,
    /// Expandable, currently expanded.
    Expanded,
}

/// Node icons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Images,
    Containers,
    Registries,
    Image,
    RunningContainer,
    StoppedContainer,
    DockerHub,
    Subscription,
    Registry,
    Repository,
    Tag,
}

impl Icon {
    /// Returns the glyph drawn before the label.
    #[must_use]
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Images | Self::Image => "◆",
            Self::Containers => "▣",
            Self::Registries | Self::Registry => "⌂",
            Self::RunningContainer => "●",
            Self::StoppedContainer => "○",
            Self::DockerHub => "◎",
            Self::Subscription => "☁",
            Self::Repository => "▤",
            Self::Tag => "#",
        }
    }
}

/// The three root categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Images,
    Containers,
    Registries,
}

impl Category {
    /// All categories in display order.
    pub const ALL: [Self; 3] = [Self::Images, Self::Containers, Self::Registries];

    /// Returns the display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Images => "Images",
            Self::Containers => "Containers",
            Self::Registries => "Registries",
        }
    }

    fn icon(self) -> Icon {
        match self {
            Self::Images => Icon::Images,
            Self::Containers => Icon::Containers,
            Self::Registries => Icon::Registries,
        }
    }
}

/// An Azure subscription reached through a signed-in session.
#[derive(Debug, Clone)]
pub struct SubscriptionItem {
    /// Display label (subscription display name).
    pub label: String,
    /// Description (subscription ID).
    pub description: String,
    /// Session the subscription was listed with.
    pub session: AzureSession,
    /// Raw subscription record.
    pub subscription: Subscription,
}

impl SubscriptionItem {
    /// Builds the item for `subscription` seen through `session`.
    #[must_use]
    pub fn new(session: AzureSession, subscription: Subscription) -> Self {
        let label = if subscription.display_name.is_empty() {
            subscription.subscription_id.clone()
        } else {
            subscription.display_name.clone()
        };

        Self {
            label,
            description: subscription.subscription_id.clone(),
            session,
            subscription,
        }
    }
}

/// A container registry inside a subscription.
#[derive(Debug, Clone)]
pub struct RegistryItem {
    pub session: AzureSession,
    pub subscription_id: String,
    pub registry: Registry,
}

/// A repository inside a registry, with the session tokens used to reach it.
#[derive(Debug, Clone)]
pub struct RepositoryItem {
    /// Repository name (e.g. `web/api`).
    pub repository: String,
    /// Registry login server.
    pub login_server: String,
    /// Tenant the registry belongs to.
    pub tenant_id: String,
    /// Session tokens acquired when the registry was expanded.
    pub tokens: TokenPair,
}

/// Discriminator plus payload.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Category(Category),
    LocalImage(ImageDescriptor),
    RunningContainer(ContainerDescriptor),
    StoppedContainer(ContainerDescriptor),
    DockerHub,
    HubRepository(HubRepository),
    HubTag {
        repository: HubRepository,
        tag: HubTag,
    },
    AzureSubscription(SubscriptionItem),
    AzureRegistry(RegistryItem),
    AzureRepository(RepositoryItem),
    AzureTag {
        login_server: String,
        repository: String,
        tag: String,
    },
}

impl NodeKind {
    /// Returns the discriminator tag.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Category(Category::Images) => "imagesLabel",
            Self::Category(Category::Containers) => "containersLabel",
            Self::Category(Category::Registries) => "registriesLabel",
            Self::LocalImage(_) => "localImageNode",
            Self::RunningContainer(_) => "runningLocalContainerNode",
            Self::StoppedContainer(_) => "stoppedLocalContainerNode",
            Self::DockerHub => "dockerHubRegistry",
            Self::HubRepository(_) => "dockerHubRegistryImage",
            Self::HubTag { .. } => "dockerHubImageTag",
            Self::AzureSubscription(_) => "azureSubscription",
            Self::AzureRegistry(_) => "azureRegistry",
            Self::AzureRepository(_) => "azureRepository",
            Self::AzureTag { .. } => "azureImageTag",
        }
    }

    /// Returns true if expanding this kind fetches children.
    #[must_use]
    pub fn is_expandable(&self) -> bool {
        matches!(
            self,
            Self::Category(_)
                | Self::DockerHub
                | Self::HubRepository(_)
                | Self::AzureSubscription(_)
                | Self::AzureRegistry(_)
                | Self::AzureRepository(_)
        )
    }

    fn icon(&self) -> Icon {
        match self {
            Self::Category(category) => category.icon(),
            Self::LocalImage(_) => Icon::Image,
            Self::RunningContainer(_) => Icon::RunningContainer,
            Self::StoppedContainer(_) => Icon::StoppedContainer,
            Self::DockerHub => Icon::DockerHub,
            Self::AzureSubscription(_) => Icon::Subscription,
            Self::AzureRegistry(_) => Icon::Registry,
            Self::HubRepository(_) | Self::AzureRepository(_) => Icon::Repository,
            Self::HubTag { .. } | Self::AzureTag { .. } => Icon::Tag,
        }
    }

    /// Returns the command the host runs (or shows) for a leaf.
    fn command(&self, label: &str) -> Option<String> {
        match self {
            Self::LocalImage(image) => {
                let target = if label == UNTAGGED_LABEL {
                    image.short_id()
                } else {
                    label
                };
                Some(format!("docker run -it --rm {}", target))
            }
            Self::RunningContainer(container) => {
                Some(format!("docker exec -it {} /bin/sh", container.name()))
            }
            Self::StoppedContainer(container) => {
                Some(format!("docker start {}", container.name()))
            }
            Self::HubTag { repository, tag } => Some(format!(
                "docker pull {}:{}",
                repository.full_name(),
                tag.name
            )),
            Self::AzureTag {
                login_server,
                repository,
                tag,
            } => Some(format!("docker pull {}/{}:{}", login_server, repository, tag)),
            _ => None,
        }
    }
}

/// A node in the explorer tree.
#[derive(Debug, Clone)]
pub struct Node {
    id: Uuid,
    label: String,
    description: Option<String>,
    state: CollapsibleState,
    icon: Option<Icon>,
    command: Option<String>,
    kind: NodeKind,
}

impl Node {
    /// Creates a node; state, icon, and command follow from `kind`.
    #[must_use]
    pub fn new(label: impl Into<String>, kind: NodeKind) -> Self {
        let label = label.into();
        let state = if kind.is_expandable() {
            CollapsibleState::Collapsed
        } else {
            CollapsibleState::None
        };

        Self {
            id: Uuid::new_v4(),
            icon: Some(kind.icon()),
            command: kind.command(&label),
            label,
            description: None,
            state,
            kind,
        }
    }

    /// Creates a category node.
    #[must_use]
    pub fn category(category: Category) -> Self {
        Self::new(category.label(), NodeKind::Category(category))
    }

    /// Sets the description. Empty strings clear it.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.is_empty());
        self
    }

    /// Marks the node expanded or collapsed. Leaves stay leaves.
    pub fn set_expanded(&mut self, expanded: bool) {
        if self.state == CollapsibleState::None {
            return;
        }
        self.state = if expanded {
            CollapsibleState::Expanded
        } else {
            CollapsibleState::Collapsed
        };
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> CollapsibleState {
        self.state
    }

    #[must_use]
    pub fn icon(&self) -> Option<Icon> {
        self.icon
    }

    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Shorthand for `kind().tag()`.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    /// Returns true if the node can have children.
    #[must_use]
    pub fn is_expandable(&self) -> bool {
        self.state != CollapsibleState::None
    }
}

/// Compares labels the way a locale-aware collator does.
///
/// Base letters decide first (`é` sorts with `e`), then accents, then
/// case with lowercase before uppercase.
#[must_use]
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let base = |s: &str| -> Vec<char> {
        s.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect()
    };
    let primary = base(a).cmp(&base(b));
    if primary != Ordering::Equal {
        return primary;
    }

    let (da, db): (Vec<char>, Vec<char>) = (a.nfd().collect(), b.nfd().collect());
    let accents = da
        .iter()
        .flat_map(|c| c.to_lowercase())
        .cmp(db.iter().flat_map(|c| c.to_lowercase()));
    if accents != Ordering::Equal {
        return accents;
    }

    for (ca, cb) in da.iter().zip(&db) {
        if ca == cb {
            continue;
        }
        return match (ca.is_lowercase(), cb.is_lowercase()) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => ca.cmp(cb),
        };
    }
    da.len().cmp(&db.len()).then_with(|| a.cmp(b))
}
