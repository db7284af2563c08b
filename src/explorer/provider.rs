//! Lazy tree provider.
//!
//! [`ExplorerProvider::children`] is the single entry point a host calls.
//! Without a node it returns the three category nodes; with a node it
//! dispatches on the node's kind and fetches that branch on demand.
//!
//! The provider is the error boundary: collaborator failures are logged
//! and surface as a branch with no children.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::node::{
    Category, Node, NodeKind, RegistryItem, RepositoryItem, SubscriptionItem, locale_compare,
};
use crate::azure::{
    AzureAccount, AzureError, CATALOG_SCOPE, ManagementApi, RegistryAuthApi, acquire_tokens,
    list_registries, list_subscriptions, registry_access_token, repository_scope,
};
use crate::credentials::CredentialStore;
use crate::docker::{ContainerState, DaemonClient, DaemonError};
use crate::hub::{DockerHubApi, HubCredentials, HubError, HubRepository, HubUser};

/// Credential store service name.
pub const CREDENTIAL_SERVICE: &str = "dockview";

/// Credential store account holding the Docker Hub session token.
pub const HUB_TOKEN_ACCOUNT: &str = "dockerhub.token";

/// Label of the Docker Hub registry node.
pub const DOCKER_HUB_LABEL: &str = "Docker Hub";

/// Asks the user for Docker Hub credentials.
#[async_trait]
pub trait LoginPrompt: Send + Sync {
    /// Returns `None` if the user cancelled.
    async fn prompt(&self) -> Option<HubCredentials>;
}

/// Backends the provider reads from.
#[derive(Clone)]
pub struct Collaborators {
    pub daemon: Arc<dyn DaemonClient>,
    pub hub: Arc<dyn DockerHubApi>,
    /// Where the Hub token is persisted. `None` keeps it in memory only.
    pub credentials: Option<Arc<dyn CredentialStore>>,
    pub prompt: Arc<dyn LoginPrompt>,
    /// Signed-in Azure account. `None` hides Azure subscriptions.
    pub azure: Option<Arc<dyn AzureAccount>>,
    pub management: Arc<dyn ManagementApi>,
    pub registry: Arc<dyn RegistryAuthApi>,
}

/// The retained category nodes.
#[derive(Debug, Clone)]
pub struct CategoryNodes {
    pub images: Node,
    pub containers: Node,
    pub registries: Node,
}

impl CategoryNodes {
    fn new() -> Self {
        Self {
            images: Node::category(Category::Images),
            containers: Node::category(Category::Containers),
            registries: Node::category(Category::Registries),
        }
    }

    /// Returns the node for `category`.
    #[must_use]
    pub fn get(&self, category: Category) -> &Node {
        match category {
            Category::Images => &self.images,
            Category::Containers => &self.containers,
            Category::Registries => &self.registries,
        }
    }

    fn to_vec(&self) -> Vec<Node> {
        vec![
            self.images.clone(),
            self.containers.clone(),
            self.registries.clone(),
        ]
    }
}

/// Notifications sent to the host.
#[derive(Debug, Clone)]
pub enum TreeEvent {
    /// The children of a node changed. `None` means the whole tree.
    Changed(Option<Node>),
    /// A message the user should see.
    Warning(String),
}

/// Errors raised while expanding a node.
#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("Docker daemon: {0}")]
    Daemon(#[from] DaemonError),

    #[error("Docker Hub: {0}")]
    Hub(#[from] HubError),

    #[error("Azure: {0}")]
    Azure(#[from] AzureError),
}

/// Lazy tree provider over the local daemon, Docker Hub, and Azure.
pub struct ExplorerProvider {
    deps: Collaborators,
    roots: Mutex<Option<CategoryNodes>>,
    hub_token: Mutex<Option<String>>,
    events: mpsc::UnboundedSender<TreeEvent>,
}

impl ExplorerProvider {
    /// Creates a provider and the receiver for its [`TreeEvent`]s.
    #[must_use]
    pub fn new(deps: Collaborators) -> (Self, mpsc::UnboundedReceiver<TreeEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let provider = Self {
            deps,
            roots: Mutex::new(None),
            hub_token: Mutex::new(None),
            events,
        };
        (provider, rx)
    }

    /// Returns the children of `node`, or the category nodes for `None`.
    ///
    /// Never fails: errors are logged and yield no children.
    pub async fn children(&self, node: Option<&Node>) -> Vec<Node> {
        let Some(node) = node else {
            return self.root_nodes();
        };

        match self.expand(node).await {
            Ok(children) => {
                debug!("{} ({}) -> {} children", node.label(), node.tag(), children.len());
                children
            }
            Err(e) => {
                warn!("Failed to expand {} ({}): {}", node.label(), node.tag(), e);
                Vec::new()
            }
        }
    }

    /// Returns a copy of the retained category nodes, if created yet.
    #[must_use]
    pub fn category_nodes(&self) -> Option<CategoryNodes> {
        self.roots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Signals that the Images branch changed.
    pub fn refresh_images(&self) {
        self.refresh(Category::Images);
    }

    /// Signals that the Containers branch changed.
    pub fn refresh_containers(&self) {
        self.refresh(Category::Containers);
    }

    /// Signals that the Registries branch changed.
    pub fn refresh_registries(&self) {
        self.refresh(Category::Registries);
    }

    fn refresh(&self, category: Category) {
        let node = self.category_nodes().map(|roots| roots.get(category).clone());
        self.emit(TreeEvent::Changed(node));
    }

    fn emit(&self, event: TreeEvent) {
        if self.events.send(event).is_err() {
            debug!("Tree event dropped, no receiver");
        }
    }

    fn root_nodes(&self) -> Vec<Node> {
        let roots = CategoryNodes::new();
        let nodes = roots.to_vec();
        *self.roots.lock().unwrap_or_else(PoisonError::into_inner) = Some(roots);
        nodes
    }

    async fn expand(&self, node: &Node) -> Result<Vec<Node>, ExplorerError> {
        match node.kind() {
            NodeKind::Category(Category::Images) => self.images().await,
            NodeKind::Category(Category::Containers) => self.containers().await,
            NodeKind::Category(Category::Registries) => Ok(self.registries().await),
            NodeKind::DockerHub => self.hub_repositories().await,
            NodeKind::HubRepository(repository) => self.hub_tags(repository).await,
            NodeKind::AzureSubscription(item) => self.azure_registries(item).await,
            NodeKind::AzureRegistry(item) => self.azure_repositories(item).await,
            NodeKind::AzureRepository(item) => self.azure_tags(item).await,
            NodeKind::LocalImage(_)
            | NodeKind::RunningContainer(_)
            | NodeKind::StoppedContainer(_)
            | NodeKind::HubTag { .. }
            | NodeKind::AzureTag { .. } => Ok(Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Local daemon
    // ------------------------------------------------------------------

    async fn images(&self) -> Result<Vec<Node>, ExplorerError> {
        let images = self.deps.daemon.list_images().await?;

        let nodes = images
            .into_iter()
            .flat_map(|image| {
                image
                    .display_tags()
                    .into_iter()
                    .map(|label| {
                        let short_id = image.short_id().to_string();
                        Node::new(label, NodeKind::LocalImage(image.clone()))
                            .with_description(Some(short_id))
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Ok(nodes)
    }

    async fn containers(&self) -> Result<Vec<Node>, ExplorerError> {
        let containers = self
            .deps
            .daemon
            .list_containers(&ContainerState::LISTED)
            .await?;

        let nodes = containers
            .into_iter()
            .map(|container| {
                let label = container.label();
                if container.is_stopped() {
                    Node::new(label, NodeKind::StoppedContainer(container))
                } else {
                    Node::new(label, NodeKind::RunningContainer(container))
                }
            })
            .collect();
        Ok(nodes)
    }

    // ------------------------------------------------------------------
    // Registries
    // ------------------------------------------------------------------

    async fn registries(&self) -> Vec<Node> {
        let mut nodes = vec![Node::new(DOCKER_HUB_LABEL, NodeKind::DockerHub)];

        match self.subscriptions().await {
            Ok(subscriptions) => nodes.extend(subscriptions.into_iter().map(|item| {
                let description = Some(item.description.clone());
                Node::new(item.label.clone(), NodeKind::AzureSubscription(item))
                    .with_description(description)
            })),
            Err(e) => warn!("Failed to list Azure subscriptions: {}", e),
        }

        nodes
    }

    async fn subscriptions(&self) -> Result<Vec<SubscriptionItem>, ExplorerError> {
        let Some(azure) = &self.deps.azure else {
            return Ok(Vec::new());
        };
        if !azure.is_logged_in().await {
            debug!("Azure account not signed in");
            return Ok(Vec::new());
        }

        let mut items = Vec::new();
        for session in azure.sessions().await? {
            let subscriptions = list_subscriptions(self.deps.management.as_ref(), &session).await?;
            items.extend(
                subscriptions
                    .into_iter()
                    .map(|subscription| SubscriptionItem::new(session.clone(), subscription)),
            );
        }

        items.sort_by(|a, b| locale_compare(&a.label, &b.label));
        Ok(items)
    }

    // ------------------------------------------------------------------
    // Docker Hub
    // ------------------------------------------------------------------

    async fn hub_repositories(&self) -> Result<Vec<Node>, ExplorerError> {
        let Some((token, user)) = self.hub_session().await? else {
            return Ok(Vec::new());
        };

        let repositories = self
            .deps
            .hub
            .repositories(&token, &user.username)
            .await?;

        let mut nodes = Vec::with_capacity(repositories.len());
        for repository in repositories {
            let info = self
                .deps
                .hub
                .repository(&token, &repository.namespace, &repository.name)
                .await?;
            nodes.push(
                Node::new(repository.full_name(), NodeKind::HubRepository(repository))
                    .with_description(info.description),
            );
        }
        Ok(nodes)
    }

    async fn hub_tags(&self, repository: &HubRepository) -> Result<Vec<Node>, ExplorerError> {
        let tags = match self.cached_hub_token() {
            Some(token) => {
                match self
                    .deps
                    .hub
                    .tags(&token, &repository.namespace, &repository.name)
                    .await
                {
                    Err(HubError::Unauthorized) => {
                        info!("Docker Hub token rejected, signing in again");
                        self.forget_hub_token();
                        None
                    }
                    other => Some(other?),
                }
            }
            None => None,
        };

        let tags = match tags {
            Some(tags) => tags,
            None => {
                let Some(token) = self.hub_login().await? else {
                    return Ok(Vec::new());
                };
                self.deps
                    .hub
                    .tags(&token, &repository.namespace, &repository.name)
                    .await?
            }
        };

        Ok(tags
            .into_iter()
            .map(|tag| {
                let label = format!("{}:{}", repository.name, tag.name);
                Node::new(
                    label,
                    NodeKind::HubTag {
                        repository: repository.clone(),
                        tag,
                    },
                )
            })
            .collect())
    }

    /// Resolves a token and the user it belongs to.
    ///
    /// A cached token that is rejected is forgotten and the user is asked
    /// to sign in once.
    async fn hub_session(&self) -> Result<Option<(String, HubUser)>, ExplorerError> {
        if let Some(token) = self.cached_hub_token() {
            match self.deps.hub.user(&token).await {
                Ok(user) => return Ok(Some((token, user))),
                Err(HubError::Unauthorized) => {
                    info!("Stored Docker Hub token rejected, signing in again");
                    self.forget_hub_token();
                }
                Err(e) => return Err(e.into()),
            }
        }

        let Some(token) = self.hub_login().await? else {
            return Ok(None);
        };
        let user = self.deps.hub.user(&token).await?;
        Ok(Some((token, user)))
    }

    /// Returns the in-memory token, falling back to the credential store.
    fn cached_hub_token(&self) -> Option<String> {
        let mut cached = self.hub_token.lock().unwrap_or_else(PoisonError::into_inner);
        if cached.is_some() {
            return cached.clone();
        }

        let store = self.deps.credentials.as_ref()?;
        match store.get(CREDENTIAL_SERVICE, HUB_TOKEN_ACCOUNT) {
            Ok(token) => {
                let token = token.filter(|t| !t.is_empty());
                *cached = token.clone();
                token
            }
            Err(e) => {
                warn!("Failed to read Docker Hub token: {}", e);
                None
            }
        }
    }

    fn remember_hub_token(&self, token: &str) {
        *self.hub_token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());

        if let Some(store) = &self.deps.credentials {
            if let Err(e) = store.set(CREDENTIAL_SERVICE, HUB_TOKEN_ACCOUNT, token) {
                warn!("Failed to store Docker Hub token: {}", e);
            }
        }
    }

    fn forget_hub_token(&self) {
        *self.hub_token.lock().unwrap_or_else(PoisonError::into_inner) = None;

        if let Some(store) = &self.deps.credentials {
            if let Err(e) = store.delete(CREDENTIAL_SERVICE, HUB_TOKEN_ACCOUNT) {
                warn!("Failed to delete Docker Hub token: {}", e);
            }
        }
    }

    /// Prompts for credentials and logs in. `None` if cancelled.
    async fn hub_login(&self) -> Result<Option<String>, ExplorerError> {
        let Some(credentials) = self.deps.prompt.prompt().await else {
            info!("Docker Hub login cancelled");
            return Ok(None);
        };
        if !credentials.is_complete() {
            info!("Docker Hub login skipped, username or password empty");
            return Ok(None);
        }

        match self.deps.hub.login(&credentials).await {
            Ok(token) => {
                info!("Signed in to Docker Hub as {}", credentials.username);
                self.remember_hub_token(&token);
                Ok(Some(token))
            }
            Err(e) => {
                self.emit(TreeEvent::Warning(format!("Docker Hub login failed: {}", e)));
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Azure
    // ------------------------------------------------------------------

    async fn azure_registries(&self, item: &SubscriptionItem) -> Result<Vec<Node>, ExplorerError> {
        let subscription_id = &item.subscription.subscription_id;
        let registries =
            list_registries(self.deps.management.as_ref(), &item.session, subscription_id).await?;

        Ok(registries
            .into_iter()
            .filter(|registry| {
                let classic = registry.sku.is_classic();
                if classic {
                    debug!("Skipping Classic registry {}", registry.name);
                }
                !classic
            })
            .map(|registry| {
                let description = Some(registry.login_server().to_string());
                Node::new(
                    registry.name.clone(),
                    NodeKind::AzureRegistry(RegistryItem {
                        session: item.session.clone(),
                        subscription_id: subscription_id.clone(),
                        registry,
                    }),
                )
                .with_description(description)
            })
            .collect())
    }

    async fn azure_repositories(&self, item: &RegistryItem) -> Result<Vec<Node>, ExplorerError> {
        let login_server = item.registry.login_server();
        let tenant_id = &item.session.tenant_id;
        let tokens = acquire_tokens(&item.session).await?;

        let Some(access_token) = registry_access_token(
            self.deps.registry.as_ref(),
            login_server,
            tenant_id,
            &tokens,
            CATALOG_SCOPE,
        )
        .await?
        else {
            return Ok(Vec::new());
        };

        let repositories = self.deps.registry.catalog(login_server, &access_token).await?;
        if repositories.is_empty() {
            self.emit(TreeEvent::Warning(format!(
                "No repositories found in registry {}",
                item.registry.name
            )));
        }

        Ok(repositories
            .into_iter()
            .map(|repository| {
                Node::new(
                    repository.clone(),
                    NodeKind::AzureRepository(RepositoryItem {
                        repository,
                        login_server: login_server.to_string(),
                        tenant_id: tenant_id.clone(),
                        tokens: tokens.clone(),
                    }),
                )
            })
            .collect())
    }

    async fn azure_tags(&self, item: &RepositoryItem) -> Result<Vec<Node>, ExplorerError> {
        let Some(access_token) = registry_access_token(
            self.deps.registry.as_ref(),
            &item.login_server,
            &item.tenant_id,
            &item.tokens,
            &repository_scope(&item.repository),
        )
        .await?
        else {
            return Ok(Vec::new());
        };

        let tags = self
            .deps
            .registry
            .tags(&item.login_server, &access_token, &item.repository)
            .await?;

        Ok(tags
            .into_iter()
            .map(|tag| {
                Node::new(
                    format!("{}:{}", item.repository, tag),
                    NodeKind::AzureTag {
                        login_server: item.login_server.clone(),
                        repository: item.repository.clone(),
                        tag,
                    },
                )
            })
            .collect())
    }
}
