//! Azure account backed by the Azure CLI.
//!
//! Sessions come from `az account list`; tokens from
//! `az account get-access-token`. The CLI owns the identity protocol and
//! its token cache.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::AzureError;
use super::account::{AzureAccount, AzureEnvironment, AzureSession, TokenCredential, TokenPair};

/// Timeout for `az account` queries.
const ACCOUNT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for token requests (may refresh through the network).
const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

/// Returns the Azure CLI command name for the current platform.
fn az_cmd() -> &'static str {
    if cfg!(target_os = "windows") {
        "az.cmd"
    } else {
        "az"
    }
}

/// Runs the CLI with `args` and returns stdout.
async fn run_az(program: &str, args: &[&str], timeout: Duration) -> Result<Vec<u8>, AzureError> {
    tracing::debug!("running {} {}", program, args.join(" "));

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| AzureError::Timeout(timeout))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(AzureError::Cli(stderr));
    }

    Ok(output.stdout)
}

/// One entry of `az account list`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliSubscription {
    tenant_id: String,
    #[serde(default)]
    user: Option<CliUser>,
}

#[derive(Debug, Deserialize)]
struct CliUser {
    name: String,
}

/// Output of `az account get-access-token`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliAccessToken {
    access_token: String,
}

/// Groups CLI subscriptions into one `(tenant, user)` entry per tenant.
fn tenants_from_account_list(output: &[u8]) -> Result<BTreeMap<String, String>, AzureError> {
    let subscriptions: Vec<CliSubscription> = serde_json::from_slice(output)?;

    let mut tenants = BTreeMap::new();
    for sub in subscriptions {
        let user = sub.user.map(|u| u.name).unwrap_or_default();
        tenants.entry(sub.tenant_id).or_insert(user);
    }
    Ok(tenants)
}

/// Token credential for one tenant, served by the Azure CLI.
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    program: String,
    tenant_id: String,
}

impl AzureCliCredential {
    /// Creates a credential for `tenant_id` using the default CLI command.
    #[must_use]
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            program: az_cmd().to_string(),
            tenant_id: tenant_id.into(),
        }
    }
}

#[async_trait]
impl TokenCredential for AzureCliCredential {
    async fn get_token(&self, resource: &str) -> Result<TokenPair, AzureError> {
        let output = run_az(
            &self.program,
            &[
                "account",
                "get-access-token",
                "--tenant",
                &self.tenant_id,
                "--resource",
                resource,
                "--output",
                "json",
            ],
            TOKEN_TIMEOUT,
        )
        .await?;

        let token: CliAccessToken = serde_json::from_slice(&output)?;
        // The CLI keeps refresh tokens in its own cache and never returns them.
        Ok(TokenPair::new(token.access_token, None))
    }
}

/// Azure account backed by the Azure CLI's signed-in state.
#[derive(Debug, Clone)]
pub struct AzureCliAccount {
    program: String,
    environment: AzureEnvironment,
}

impl AzureCliAccount {
    /// Creates an account using the default CLI command.
    #[must_use]
    pub fn new(environment: AzureEnvironment) -> Self {
        Self {
            program: az_cmd().to_string(),
            environment,
        }
    }

    /// Overrides the CLI program (path or name).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

#[async_trait]
impl AzureAccount for AzureCliAccount {
    async fn is_logged_in(&self) -> bool {
        match run_az(
            &self.program,
            &["account", "show", "--output", "json"],
            ACCOUNT_TIMEOUT,
        )
        .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Azure CLI not signed in: {}", e);
                false
            }
        }
    }

    async fn sessions(&self) -> Result<Vec<AzureSession>, AzureError> {
        let output = run_az(
            &self.program,
            &["account", "list", "--output", "json"],
            ACCOUNT_TIMEOUT,
        )
        .await?;

        let sessions: Vec<AzureSession> = tenants_from_account_list(&output)?
            .into_iter()
            .map(|(tenant_id, user_id)| {
                let credential = AzureCliCredential {
                    program: self.program.clone(),
                    tenant_id: tenant_id.clone(),
                };
                AzureSession {
                    environment: self.environment.clone(),
                    tenant_id,
                    user_id,
                    credentials: Arc::new(credential),
                }
            })
            .collect();

        tracing::info!("Azure CLI reports {} tenant session(s)", sessions.len());
        Ok(sessions)
    }
}
