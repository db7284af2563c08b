//! Integration tests for the lazy tree provider.
//!
//! Every backend is replaced with an in-memory fake so each branch of the
//! dispatch can be checked in isolation:
//! - Category roots and their replacement
//! - Local images and containers
//! - Docker Hub token reuse, login, and stale token recovery
//! - Azure subscriptions, registries, and the registry token exchange
//! - Refresh notifications and auto-refresh

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;

use dockview::azure::{
    AzureAccount, AzureEnvironment, AzureError, AzureSession, ManagementApi, Registry,
    RegistryAuthApi, RegistryProperties, RegistrySku, Subscription, TokenCredential, TokenPair,
};
use dockview::credentials::{CredentialError, CredentialStore};
use dockview::docker::{
    ContainerDescriptor, ContainerState, DaemonClient, DaemonError, ImageDescriptor,
};
use dockview::explorer::{
    AutoRefresh, CREDENTIAL_SERVICE, Category, CollapsibleState, Collaborators,
    ExplorerProvider, HUB_TOKEN_ACCOUNT, LoginPrompt, Node, NodeKind, TreeEvent,
};
use dockview::hub::{
    DockerHubApi, HubCredentials, HubError, HubRepository, HubTag, HubUser, RepositoryInfo,
};
use dockview::pagination::Page;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeDaemon {
    images: Vec<ImageDescriptor>,
    containers: Vec<ContainerDescriptor>,
    fail: bool,
    requested_states: Mutex<Vec<ContainerState>>,
}

#[async_trait]
impl DaemonClient for FakeDaemon {
    async fn list_images(&self) -> Result<Vec<ImageDescriptor>, DaemonError> {
        if self.fail {
            return Err(DaemonError::ConnectionFailed("daemon down".to_string()));
        }
        Ok(self.images.clone())
    }

    async fn list_containers(
        &self,
        states: &[ContainerState],
    ) -> Result<Vec<ContainerDescriptor>, DaemonError> {
        if self.fail {
            return Err(DaemonError::ConnectionFailed("daemon down".to_string()));
        }
        *self.requested_states.lock().unwrap() = states.to_vec();
        Ok(self.containers.clone())
    }
}

struct FakeHub {
    valid_token: Mutex<String>,
    login_token: String,
    login_calls: AtomicUsize,
    repositories: Vec<HubRepository>,
    tags: Vec<HubTag>,
}

impl Default for FakeHub {
    fn default() -> Self {
        Self {
            valid_token: Mutex::new("good-token".to_string()),
            login_token: "good-token".to_string(),
            login_calls: AtomicUsize::new(0),
            repositories: vec![
                HubRepository::new("alice", "web"),
                HubRepository::new("alice", "api"),
            ],
            tags: vec![tag("1.0"), tag("latest")],
        }
    }
}

impl FakeHub {
    fn check(&self, token: &str) -> Result<(), HubError> {
        if *self.valid_token.lock().unwrap() == token {
            Ok(())
        } else {
            Err(HubError::Unauthorized)
        }
    }
}

#[async_trait]
impl DockerHubApi for FakeHub {
    async fn login(&self, credentials: &HubCredentials) -> Result<String, HubError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        if credentials.password == "wrong" {
            return Err(HubError::Unauthorized);
        }
        Ok(self.login_token.clone())
    }

    async fn user(&self, token: &str) -> Result<HubUser, HubError> {
        self.check(token)?;
        Ok(HubUser {
            username: "alice".to_string(),
            ..Default::default()
        })
    }

    async fn repositories(
        &self,
        token: &str,
        namespace: &str,
    ) -> Result<Vec<HubRepository>, HubError> {
        self.check(token)?;
        assert_eq!(namespace, "alice");
        Ok(self.repositories.clone())
    }

    async fn repository(
        &self,
        token: &str,
        namespace: &str,
        name: &str,
    ) -> Result<RepositoryInfo, HubError> {
        self.check(token)?;
        Ok(RepositoryInfo {
            namespace: namespace.to_string(),
            name: name.to_string(),
            description: Some(format!("{} service", name)),
            ..Default::default()
        })
    }

    async fn tags(&self, token: &str, _namespace: &str, _name: &str) -> Result<Vec<HubTag>, HubError> {
        self.check(token)?;
        Ok(self.tags.clone())
    }
}

#[derive(Default)]
struct MemoryStore {
    secrets: Mutex<HashMap<(String, String), String>>,
}

impl MemoryStore {
    fn hub_token(&self) -> Option<String> {
        self.get(CREDENTIAL_SERVICE, HUB_TOKEN_ACCOUNT).unwrap()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>, CredentialError> {
        let secrets = self.secrets.lock().unwrap();
        Ok(secrets
            .get(&(service.to_string(), account.to_string()))
            .cloned())
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), CredentialError> {
        self.secrets.lock().unwrap().insert(
            (service.to_string(), account.to_string()),
            secret.to_string(),
        );
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> Result<bool, CredentialError> {
        Ok(self
            .secrets
            .lock()
            .unwrap()
            .remove(&(service.to_string(), account.to_string()))
            .is_some())
    }
}

struct FakePrompt {
    answer: Option<HubCredentials>,
    calls: AtomicUsize,
}

impl Default for FakePrompt {
    fn default() -> Self {
        Self {
            answer: Some(HubCredentials::new("alice", "secret")),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LoginPrompt for FakePrompt {
    async fn prompt(&self) -> Option<HubCredentials> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer.clone()
    }
}

struct FixedCredential(TokenPair);

#[async_trait]
impl TokenCredential for FixedCredential {
    async fn get_token(&self, _resource: &str) -> Result<TokenPair, AzureError> {
        Ok(self.0.clone())
    }
}

fn session(tenant: &str) -> AzureSession {
    AzureSession {
        environment: AzureEnvironment::public_cloud(),
        tenant_id: tenant.to_string(),
        user_id: "alice@example.com".to_string(),
        credentials: Arc::new(FixedCredential(TokenPair::new(
            "arm-access",
            Some("arm-refresh".to_string()),
        ))),
    }
}

struct FakeAccount {
    logged_in: bool,
    sessions: Vec<AzureSession>,
}

#[async_trait]
impl AzureAccount for FakeAccount {
    async fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    async fn sessions(&self) -> Result<Vec<AzureSession>, AzureError> {
        Ok(self.sessions.clone())
    }
}

/// Subscriptions per tenant, split into pages linked as `page-<n>`.
#[derive(Default)]
struct FakeManagement {
    subscription_pages: HashMap<String, Vec<Vec<Subscription>>>,
    registries: Vec<Registry>,
}

fn page_of<T: Clone>(pages: &[Vec<T>], next_link: Option<&str>) -> Page<T> {
    let index = next_link
        .and_then(|l| l.strip_prefix("page-"))
        .map_or(0, |n| n.parse::<usize>().unwrap());
    let next = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
    Page::new(pages.get(index).cloned().unwrap_or_default(), next)
}

#[async_trait]
impl ManagementApi for FakeManagement {
    async fn subscriptions_page(
        &self,
        session: &AzureSession,
        next_link: Option<&str>,
    ) -> Result<Page<Subscription>, AzureError> {
        let pages = self
            .subscription_pages
            .get(&session.tenant_id)
            .cloned()
            .unwrap_or_default();
        Ok(page_of(&pages, next_link))
    }

    async fn registries_page(
        &self,
        _session: &AzureSession,
        _subscription_id: &str,
        next_link: Option<&str>,
    ) -> Result<Page<Registry>, AzureError> {
        Ok(page_of(&[self.registries.clone()], next_link))
    }
}

struct FakeRegistry {
    refresh_token: Option<String>,
    access_token: Option<String>,
    repositories: Vec<String>,
    tags: Vec<String>,
    scopes: Mutex<Vec<String>>,
    exchange_grants: Mutex<Vec<bool>>,
    catalog_calls: AtomicUsize,
    tags_calls: AtomicUsize,
}

impl Default for FakeRegistry {
    fn default() -> Self {
        Self {
            refresh_token: Some("acr-refresh".to_string()),
            access_token: Some("acr-access".to_string()),
            repositories: vec!["api".to_string(), "web/frontend".to_string()],
            tags: vec!["v1".to_string(), "v2".to_string()],
            scopes: Mutex::new(Vec::new()),
            exchange_grants: Mutex::new(Vec::new()),
            catalog_calls: AtomicUsize::new(0),
            tags_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RegistryAuthApi for FakeRegistry {
    async fn exchange_refresh_token(
        &self,
        _login_server: &str,
        tenant_id: &str,
        tokens: &TokenPair,
    ) -> Result<Option<String>, AzureError> {
        assert_eq!(tenant_id, "tenant-a");
        self.exchange_grants
            .lock()
            .unwrap()
            .push(tokens.refresh_token.is_some());
        Ok(self.refresh_token.clone())
    }

    async fn exchange_access_token(
        &self,
        _login_server: &str,
        refresh_token: &str,
        scope: &str,
    ) -> Result<Option<String>, AzureError> {
        assert_eq!(refresh_token, "acr-refresh");
        self.scopes.lock().unwrap().push(scope.to_string());
        Ok(self.access_token.clone())
    }

    async fn catalog(
        &self,
        _login_server: &str,
        access_token: &str,
    ) -> Result<Vec<String>, AzureError> {
        assert_eq!(access_token, "acr-access");
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.repositories.clone())
    }

    async fn tags(
        &self,
        _login_server: &str,
        access_token: &str,
        _repository: &str,
    ) -> Result<Vec<String>, AzureError> {
        assert_eq!(access_token, "acr-access");
        self.tags_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tags.clone())
    }
}

// ============================================================================
// Harness
// ============================================================================

fn tag(name: &str) -> HubTag {
    HubTag {
        name: name.to_string(),
        ..Default::default()
    }
}

fn subscription(id: &str, name: &str) -> Subscription {
    Subscription {
        id: format!("/subscriptions/{}", id),
        subscription_id: id.to_string(),
        display_name: name.to_string(),
        ..Default::default()
    }
}

fn registry(name: &str, sku: &str) -> Registry {
    Registry {
        name: name.to_string(),
        sku: RegistrySku {
            name: sku.to_string(),
            tier: Some(sku.to_string()),
        },
        properties: RegistryProperties {
            login_server: format!("{}.azurecr.io", name),
            provisioning_state: None,
        },
        ..Default::default()
    }
}

fn container(id: &str, name: &str, state: ContainerState, status: &str) -> ContainerDescriptor {
    ContainerDescriptor {
        id: id.to_string(),
        names: vec![format!("/{}", name)],
        image: "nginx:latest".to_string(),
        state,
        status: status.to_string(),
        created: 0,
    }
}

#[derive(Default)]
struct Harness {
    daemon: Arc<FakeDaemon>,
    hub: Arc<FakeHub>,
    store: Arc<MemoryStore>,
    prompt: Arc<FakePrompt>,
    azure: Option<Arc<FakeAccount>>,
    management: Arc<FakeManagement>,
    registry: Arc<FakeRegistry>,
}

impl Harness {
    fn with_azure(mut self, management: FakeManagement) -> Self {
        self.azure = Some(Arc::new(FakeAccount {
            logged_in: true,
            sessions: vec![session("tenant-a")],
        }));
        self.management = Arc::new(management);
        self
    }

    fn provider(&self) -> (ExplorerProvider, UnboundedReceiver<TreeEvent>) {
        let azure = self
            .azure
            .clone()
            .map(|account| account as Arc<dyn AzureAccount>);

        ExplorerProvider::new(Collaborators {
            daemon: self.daemon.clone(),
            hub: self.hub.clone(),
            credentials: Some(self.store.clone()),
            prompt: self.prompt.clone(),
            azure,
            management: self.management.clone(),
            registry: self.registry.clone(),
        })
    }
}

fn labels(nodes: &[Node]) -> Vec<&str> {
    nodes.iter().map(Node::label).collect()
}

async fn expand_category(provider: &ExplorerProvider, category: Category) -> Vec<Node> {
    let roots = provider.children(None).await;
    let node = roots
        .iter()
        .find(|n| matches!(n.kind(), NodeKind::Category(c) if *c == category))
        .unwrap();
    provider.children(Some(node)).await
}

async fn hub_node(provider: &ExplorerProvider) -> Node {
    expand_category(provider, Category::Registries)
        .await
        .into_iter()
        .find(|n| n.tag() == "dockerHubRegistry")
        .unwrap()
}

// ============================================================================
// Roots
// ============================================================================

mod root_tests {
    use super::*;

    #[tokio::test]
    async fn test_roots_are_three_categories() {
        let (provider, _rx) = Harness::default().provider();
        let roots = provider.children(None).await;

        assert_eq!(labels(&roots), vec!["Images", "Containers", "Registries"]);
        let tags: Vec<_> = roots.iter().map(Node::tag).collect();
        assert_eq!(tags, vec!["imagesLabel", "containersLabel", "registriesLabel"]);
        assert!(roots.iter().all(|n| n.state() == CollapsibleState::Collapsed));
    }

    #[tokio::test]
    async fn test_roots_replaced_on_each_call() {
        let (provider, _rx) = Harness::default().provider();
        assert!(provider.category_nodes().is_none());

        let first = provider.children(None).await;
        let second = provider.children(None).await;
        assert_ne!(first[0].id(), second[0].id());

        let retained = provider.category_nodes().unwrap();
        assert_eq!(retained.images.id(), second[0].id());
        assert_eq!(retained.containers.id(), second[1].id());
        assert_eq!(retained.registries.id(), second[2].id());
    }

    #[tokio::test]
    async fn test_leaf_has_no_children() {
        let harness = Harness {
            daemon: Arc::new(FakeDaemon {
                images: vec![ImageDescriptor::new("sha256:1", vec!["a:1".to_string()])],
                ..Default::default()
            }),
            ..Default::default()
        };
        let (provider, _rx) = harness.provider();

        let images = expand_category(&provider, Category::Images).await;
        assert!(provider.children(Some(&images[0])).await.is_empty());
    }
}

// ============================================================================
// Local daemon
// ============================================================================

mod daemon_tests {
    use super::*;

    #[tokio::test]
    async fn test_one_node_per_repo_tag() {
        let harness = Harness {
            daemon: Arc::new(FakeDaemon {
                images: vec![
                    ImageDescriptor::new(
                        "sha256:aaaaaaaaaaaaaaaa",
                        vec!["web:1".to_string(), "web:latest".to_string()],
                    ),
                    ImageDescriptor::new("sha256:bbbbbbbbbbbbbbbb", vec![]),
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        let (provider, _rx) = harness.provider();

        let nodes = expand_category(&provider, Category::Images).await;
        assert_eq!(labels(&nodes), vec!["web:1", "web:latest", "<none>:<none>"]);
        assert!(nodes.iter().all(|n| n.tag() == "localImageNode"));
        assert!(nodes.iter().all(|n| !n.is_expandable()));
        assert_eq!(nodes[0].description(), Some("aaaaaaaaaaaa"));
        assert_eq!(nodes[1].command(), Some("docker run -it --rm web:latest"));
    }

    #[tokio::test]
    async fn test_containers_split_running_and_stopped() {
        let harness = Harness {
            daemon: Arc::new(FakeDaemon {
                containers: vec![
                    container("c1", "web", ContainerState::Running, "Up 5 minutes"),
                    container("c2", "old", ContainerState::Exited, "Exited (0) 1 hour ago"),
                    container("c3", "zombie", ContainerState::Dead, "Dead"),
                    container("c4", "held", ContainerState::Paused, "Up 1 hour (Paused)"),
                ],
                ..Default::default()
            }),
            ..Default::default()
        };
        let (provider, _rx) = harness.provider();

        let nodes = expand_category(&provider, Category::Containers).await;
        let tags: Vec<_> = nodes.iter().map(Node::tag).collect();
        assert_eq!(
            tags,
            vec![
                "runningLocalContainerNode",
                "stoppedLocalContainerNode",
                "stoppedLocalContainerNode",
                "runningLocalContainerNode",
            ]
        );
        assert_eq!(nodes[0].label(), "nginx:latest (web) (Up 5 minutes)");

        let requested = harness.daemon.requested_states.lock().unwrap().clone();
        assert_eq!(requested, ContainerState::LISTED.to_vec());
    }

    #[tokio::test]
    async fn test_daemon_failure_yields_no_children() {
        let harness = Harness {
            daemon: Arc::new(FakeDaemon {
                fail: true,
                ..Default::default()
            }),
            ..Default::default()
        };
        let (provider, _rx) = harness.provider();

        assert!(expand_category(&provider, Category::Images).await.is_empty());
        assert!(expand_category(&provider, Category::Containers).await.is_empty());
    }
}

// ============================================================================
// Docker Hub
// ============================================================================

mod hub_tests {
    use super::*;

    #[tokio::test]
    async fn test_registries_without_azure_is_docker_hub_only() {
        let (provider, _rx) = Harness::default().provider();
        let nodes = expand_category(&provider, Category::Registries).await;

        assert_eq!(labels(&nodes), vec!["Docker Hub"]);
        assert_eq!(nodes[0].state(), CollapsibleState::Collapsed);
    }

    #[tokio::test]
    async fn test_registries_with_signed_out_azure_is_docker_hub_only() {
        let harness = Harness {
            azure: Some(Arc::new(FakeAccount {
                logged_in: false,
                sessions: vec![session("tenant-a")],
            })),
            ..Default::default()
        };
        let (provider, _rx) = harness.provider();

        let nodes = expand_category(&provider, Category::Registries).await;
        assert_eq!(labels(&nodes), vec!["Docker Hub"]);
    }

    #[tokio::test]
    async fn test_stored_token_skips_login() {
        let harness = Harness::default();
        harness
            .store
            .set(CREDENTIAL_SERVICE, HUB_TOKEN_ACCOUNT, "good-token")
            .unwrap();
        let (provider, _rx) = harness.provider();

        let hub = hub_node(&provider).await;
        let repos = provider.children(Some(&hub)).await;

        assert_eq!(labels(&repos), vec!["alice/web", "alice/api"]);
        assert_eq!(repos[0].description(), Some("web service"));
        assert_eq!(repos[0].tag(), "dockerHubRegistryImage");
        assert_eq!(harness.prompt.calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.hub.login_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let harness = Harness::default();
        let (provider, _rx) = harness.provider();

        let hub = hub_node(&provider).await;
        let repos = provider.children(Some(&hub)).await;

        assert_eq!(repos.len(), 2);
        assert_eq!(harness.prompt.calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.store.hub_token().as_deref(), Some("good-token"));

        // Second expansion reuses the token.
        provider.children(Some(&hub)).await;
        assert_eq!(harness.prompt.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_token_is_replaced() {
        let harness = Harness::default();
        harness
            .store
            .set(CREDENTIAL_SERVICE, HUB_TOKEN_ACCOUNT, "expired-token")
            .unwrap();
        let (provider, _rx) = harness.provider();

        let hub = hub_node(&provider).await;
        let repos = provider.children(Some(&hub)).await;

        assert_eq!(repos.len(), 2);
        assert_eq!(harness.prompt.calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.store.hub_token().as_deref(), Some("good-token"));
    }

    #[tokio::test]
    async fn test_cancelled_login_yields_no_children() {
        let harness = Harness {
            prompt: Arc::new(FakePrompt {
                answer: None,
                calls: AtomicUsize::new(0),
            }),
            ..Default::default()
        };
        let (provider, _rx) = harness.provider();

        let hub = hub_node(&provider).await;
        assert!(provider.children(Some(&hub)).await.is_empty());
        assert_eq!(harness.hub.login_calls.load(Ordering::SeqCst), 0);
        assert!(harness.store.hub_token().is_none());
    }

    #[tokio::test]
    async fn test_failed_login_warns() {
        let harness = Harness {
            prompt: Arc::new(FakePrompt {
                answer: Some(HubCredentials::new("alice", "wrong")),
                calls: AtomicUsize::new(0),
            }),
            ..Default::default()
        };
        let (provider, mut rx) = harness.provider();

        let hub = hub_node(&provider).await;
        assert!(provider.children(Some(&hub)).await.is_empty());
        assert!(matches!(rx.try_recv(), Ok(TreeEvent::Warning(msg)) if msg.contains("login failed")));
    }

    #[tokio::test]
    async fn test_repository_tags() {
        let harness = Harness::default();
        harness
            .store
            .set(CREDENTIAL_SERVICE, HUB_TOKEN_ACCOUNT, "good-token")
            .unwrap();
        let (provider, _rx) = harness.provider();

        let hub = hub_node(&provider).await;
        let repos = provider.children(Some(&hub)).await;
        let tags = provider.children(Some(&repos[0])).await;

        assert_eq!(labels(&tags), vec!["web:1.0", "web:latest"]);
        assert!(tags.iter().all(|t| t.tag() == "dockerHubImageTag"));
        assert_eq!(tags[0].command(), Some("docker pull alice/web:1.0"));
    }

    #[tokio::test]
    async fn test_tags_after_token_rotation() {
        let harness = Harness::default();
        harness
            .store
            .set(CREDENTIAL_SERVICE, HUB_TOKEN_ACCOUNT, "good-token")
            .unwrap();
        let (provider, _rx) = harness.provider();

        let hub = hub_node(&provider).await;
        let repos = provider.children(Some(&hub)).await;

        *harness.hub.valid_token.lock().unwrap() = "rotated".to_string();
        // Login hands back the old token, so the retry is rejected too.
        assert!(provider.children(Some(&repos[0])).await.is_empty());
        assert_eq!(harness.prompt.calls.load(Ordering::SeqCst), 1);
    }
}

// ============================================================================
// Azure
// ============================================================================

mod azure_tests {
    use super::*;

    fn management() -> FakeManagement {
        let mut pages = HashMap::new();
        pages.insert(
            "tenant-a".to_string(),
            vec![
                vec![subscription("s1", "beta"), subscription("s2", "Alpha")],
                vec![subscription("s3", "alpha"), subscription("s4", "Gamma")],
            ],
        );
        FakeManagement {
            subscription_pages: pages,
            registries: vec![registry("prodreg", "Premium"), registry("oldreg", "Classic")],
        }
    }

    async fn first_registry(provider: &ExplorerProvider) -> Node {
        let subscriptions = expand_category(provider, Category::Registries).await;
        let registries = provider.children(Some(&subscriptions[1])).await;
        registries.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn test_subscriptions_sorted_after_docker_hub() {
        let (provider, _rx) = Harness::default().with_azure(management()).provider();
        let nodes = expand_category(&provider, Category::Registries).await;

        assert_eq!(
            labels(&nodes),
            vec!["Docker Hub", "alpha", "Alpha", "beta", "Gamma"]
        );
        assert_eq!(nodes[1].description(), Some("s3"));
        assert!(nodes[1..].iter().all(|n| n.tag() == "azureSubscription"));
    }

    #[tokio::test]
    async fn test_classic_registries_skipped() {
        let (provider, _rx) = Harness::default().with_azure(management()).provider();
        let subscriptions = expand_category(&provider, Category::Registries).await;
        let registries = provider.children(Some(&subscriptions[1])).await;

        assert_eq!(labels(&registries), vec!["prodreg"]);
        assert_eq!(registries[0].tag(), "azureRegistry");
        assert_eq!(registries[0].description(), Some("prodreg.azurecr.io"));
    }

    #[tokio::test]
    async fn test_registry_repositories() {
        let harness = Harness::default().with_azure(management());
        let (provider, _rx) = harness.provider();

        let registry = first_registry(&provider).await;
        let repos = provider.children(Some(&registry)).await;

        assert_eq!(labels(&repos), vec!["api", "web/frontend"]);
        assert!(repos.iter().all(|r| r.tag() == "azureRepository"));
        assert_eq!(
            harness.registry.scopes.lock().unwrap().as_slice(),
            ["registry:catalog:*"]
        );
        assert_eq!(harness.registry.exchange_grants.lock().unwrap().as_slice(), [true]);
        match repos[0].kind() {
            NodeKind::AzureRepository(item) => {
                assert_eq!(item.tokens.access_token, "arm-access");
                assert_eq!(item.login_server, "prodreg.azurecr.io");
            }
            other => panic!("unexpected kind {:?}", other.tag()),
        }
    }

    #[tokio::test]
    async fn test_repository_tags() {
        let harness = Harness::default().with_azure(management());
        let (provider, _rx) = harness.provider();

        let registry = first_registry(&provider).await;
        let repos = provider.children(Some(&registry)).await;
        let tags = provider.children(Some(&repos[0])).await;

        assert_eq!(labels(&tags), vec!["api:v1", "api:v2"]);
        assert!(tags.iter().all(|t| t.tag() == "azureImageTag"));
        assert_eq!(tags[1].command(), Some("docker pull prodreg.azurecr.io/api:v2"));
        assert_eq!(
            harness.registry.scopes.lock().unwrap().last().map(String::as_str),
            Some("repository:api:pull")
        );
    }

    #[tokio::test]
    async fn test_missing_access_token_stops_before_catalog() {
        let harness = Harness {
            registry: Arc::new(FakeRegistry {
                access_token: None,
                ..Default::default()
            }),
            ..Default::default()
        }
        .with_azure(management());
        let (provider, _rx) = harness.provider();

        let registry = first_registry(&provider).await;
        assert!(provider.children(Some(&registry)).await.is_empty());
        assert_eq!(harness.registry.catalog_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_refresh_token_stops_exchange() {
        let harness = Harness {
            registry: Arc::new(FakeRegistry {
                refresh_token: None,
                ..Default::default()
            }),
            ..Default::default()
        }
        .with_azure(management());
        let (provider, _rx) = harness.provider();

        let registry = first_registry(&provider).await;
        assert!(provider.children(Some(&registry)).await.is_empty());
        assert!(harness.registry.scopes.lock().unwrap().is_empty());
        assert_eq!(harness.registry.catalog_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_catalog_warns() {
        let harness = Harness {
            registry: Arc::new(FakeRegistry {
                repositories: Vec::new(),
                ..Default::default()
            }),
            ..Default::default()
        }
        .with_azure(management());
        let (provider, mut rx) = harness.provider();

        let registry = first_registry(&provider).await;
        assert!(provider.children(Some(&registry)).await.is_empty());
        match rx.try_recv() {
            Ok(TreeEvent::Warning(message)) => assert!(message.contains("prodreg")),
            other => panic!("expected warning, got {:?}", other),
        }
    }
}

// ============================================================================
// Refresh
// ============================================================================

mod refresh_tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_before_roots_means_whole_tree() {
        let (provider, mut rx) = Harness::default().provider();
        provider.refresh_images();
        assert!(matches!(rx.try_recv(), Ok(TreeEvent::Changed(None))));
    }

    #[tokio::test]
    async fn test_refresh_targets_category_node() {
        let (provider, mut rx) = Harness::default().provider();
        let roots = provider.children(None).await;

        provider.refresh_containers();
        provider.refresh_registries();

        match rx.try_recv() {
            Ok(TreeEvent::Changed(Some(node))) => assert_eq!(node.id(), roots[1].id()),
            other => panic!("unexpected event {:?}", other),
        }
        match rx.try_recv() {
            Ok(TreeEvent::Changed(Some(node))) => assert_eq!(node.id(), roots[2].id()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_auto_refresh_disabled_for_non_positive_interval() {
        let (provider, _rx) = Harness::default().provider();
        let provider = Arc::new(provider);

        assert!(AutoRefresh::start(Arc::clone(&provider), 0).is_none());
        assert!(AutoRefresh::start(provider, -100).is_none());
    }

    #[tokio::test]
    async fn test_auto_refresh_fires_images_and_containers() {
        let (provider, mut rx) = Harness::default().provider();
        let provider = Arc::new(provider);
        let roots = provider.children(None).await;

        let refresh = AutoRefresh::start(Arc::clone(&provider), 20).unwrap();
        assert_eq!(refresh.interval(), Duration::from_millis(20));

        let mut seen = Vec::new();
        for _ in 0..2 {
            let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("auto refresh did not fire")
                .unwrap();
            if let TreeEvent::Changed(Some(node)) = event {
                seen.push(node.id());
            }
        }
        assert_eq!(seen, vec![roots[0].id(), roots[1].id()]);

        refresh.stop();
    }

    #[tokio::test]
    async fn test_poke_postpones_tick() {
        let (provider, mut rx) = Harness::default().provider();
        let provider = Arc::new(provider);

        let refresh = AutoRefresh::start(Arc::clone(&provider), 150).unwrap();
        for _ in 0..4 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            refresh.poke();
        }
        // 200 ms elapsed with pokes every 50 ms: nothing fired yet.
        assert!(rx.try_recv().is_err());

        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await;
        assert!(event.is_ok());
    }
}
