//! Secure credential storage.
//!
//! Persists registry secrets keyed by service and account to
//! `~/.dockview/credentials.toml`. The file is written atomically and
//! restricted to the owner on Unix.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum file size for the credentials file (256KB).
const MAX_FILE_SIZE: u64 = 256 * 1024;

/// Storage errors.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error.
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("Serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// File too large.
    #[error("File too large (max {MAX_FILE_SIZE} bytes)")]
    FileTooLarge,

    /// The store lock was poisoned by a panicking writer.
    #[error("Credential store lock poisoned")]
    Poisoned,
}

/// A keyed secret store.
pub trait CredentialStore: Send + Sync {
    /// Returns the secret for `service`/`account`, if stored.
    fn get(&self, service: &str, account: &str) -> Result<Option<String>, CredentialError>;

    /// Stores `secret` for `service`/`account`, replacing any previous one.
    fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), CredentialError>;

    /// Removes the secret for `service`/`account`.
    ///
    /// Returns true if a secret was removed.
    fn delete(&self, service: &str, account: &str) -> Result<bool, CredentialError>;
}

/// On-disk layout: `[services.<service>] <account> = "<secret>"`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CredentialFile {
    #[serde(default)]
    services: BTreeMap<String, BTreeMap<String, String>>,
}

/// File-backed credential store.
#[derive(Debug)]
pub struct FileCredentialStore {
    /// Path to the storage file.
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Creates a store at the default path.
    ///
    /// Default path: `~/.dockview/credentials.toml`
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(Self::default_path())
    }

    /// Creates a store at a custom path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        assert!(!path.as_os_str().is_empty(), "path must not be empty");

        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Returns the default storage path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dockview")
            .join("credentials.toml")
    }

    /// Returns the storage file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<CredentialFile, CredentialError> {
        if !self.path.exists() {
            return Ok(CredentialFile::default());
        }

        let metadata = fs::metadata(&self.path)?;
        if metadata.len() > MAX_FILE_SIZE {
            return Err(CredentialError::FileTooLarge);
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn save(&self, file: &CredentialFile) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(file)?;

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("tmp");
        {
            let mut out = fs::File::create(&temp_path)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                out.set_permissions(fs::Permissions::from_mode(0o600))?;
            }
            out.write_all(content.as_bytes())?;
            out.flush()?;
        }

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl Default for FileCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, service: &str, account: &str) -> Result<Option<String>, CredentialError> {
        let _guard = self.lock.lock().map_err(|_| CredentialError::Poisoned)?;
        let file = self.load()?;

        Ok(file
            .services
            .get(service)
            .and_then(|accounts| accounts.get(account))
            .cloned())
    }

    fn set(&self, service: &str, account: &str, secret: &str) -> Result<(), CredentialError> {
        assert!(!service.is_empty(), "service must not be empty");
        assert!(!account.is_empty(), "account must not be empty");

        let _guard = self.lock.lock().map_err(|_| CredentialError::Poisoned)?;
        let mut file = self.load()?;
        file.services
            .entry(service.to_string())
            .or_default()
            .insert(account.to_string(), secret.to_string());

        self.save(&file)?;
        tracing::debug!("stored credential {}/{}", service, account);
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> Result<bool, CredentialError> {
        let _guard = self.lock.lock().map_err(|_| CredentialError::Poisoned)?;
        let mut file = self.load()?;

        let removed = match file.services.get_mut(service) {
            Some(accounts) => {
                let removed = accounts.remove(account).is_some();
                if accounts.is_empty() {
                    file.services.remove(service);
                }
                removed
            }
            None => false,
        };

        if removed {
            self.save(&file)?;
            tracing::debug!("deleted credential {}/{}", service, account);
        }
        Ok(removed)
    }
}
