//! Credential storage: the only state this client persists.
//!
//! # Design
//! Two slots hold the bearer token. The durable slot survives restarts and
//! also carries the `rememberMe` flag; the ephemeral slot lives as long as
//! the process. Both are reached through the `CredentialStore` trait so the
//! adapter and the session manager share one injected capability instead of
//! ambient global storage.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::StoreError;

pub const TOKEN_KEY: &str = "token";
pub const REMEMBER_KEY: &str = "rememberMe";

/// A string key/value store. Writes are synchronous.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object on disk. The whole map is rewritten
/// on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let entries: HashMap<String, String> = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => HashMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), keys = entries.len(), "opened credential file");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(&self, apply: impl FnOnce(&mut HashMap<String, String>)) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut entries);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&*entries)?)?;
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

/// The durable and ephemeral slots, shared by the adapter and the session
/// manager. Cloning shares the underlying stores.
#[derive(Clone)]
pub struct Credentials {
    durable: Arc<dyn CredentialStore>,
    ephemeral: Arc<dyn CredentialStore>,
}

impl Credentials {
    pub fn new(durable: Arc<dyn CredentialStore>, ephemeral: Arc<dyn CredentialStore>) -> Self {
        Self { durable, ephemeral }
    }

    /// Both slots in memory; nothing outlives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn durable(&self) -> &dyn CredentialStore {
        self.durable.as_ref()
    }

    pub fn ephemeral(&self) -> &dyn CredentialStore {
        self.ephemeral.as_ref()
    }

    /// The current token, durable slot first.
    pub fn token(&self) -> Option<String> {
        self.durable
            .get(TOKEN_KEY)
            .or_else(|| self.ephemeral.get(TOKEN_KEY))
    }

    pub fn remembered(&self) -> bool {
        self.durable.get(REMEMBER_KEY).as_deref() == Some("true")
    }

    /// Store `token` in the slot chosen by `remember` and empty the other.
    /// If any write fails, the slots are put back the way they were.
    pub fn persist(&self, token: &str, remember: bool) -> Result<(), StoreError> {
        let before = self.snapshot();
        let result = self.write(token, remember);
        if let Err(e) = &result {
            warn!(error = %e, "credential write failed, restoring previous slots");
            if let Err(e) = self.restore(&before) {
                warn!(error = %e, "failed to restore credentials");
            }
        }
        result
    }

    fn write(&self, token: &str, remember: bool) -> Result<(), StoreError> {
        if remember {
            self.durable.set(TOKEN_KEY, token)?;
            self.durable.set(REMEMBER_KEY, "true")?;
            self.ephemeral.remove(TOKEN_KEY)?;
        } else {
            self.ephemeral.set(TOKEN_KEY, token)?;
            self.durable.remove(REMEMBER_KEY)?;
            self.durable.remove(TOKEN_KEY)?;
        }
        Ok(())
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            durable_token: self.durable.get(TOKEN_KEY),
            remember: self.durable.get(REMEMBER_KEY),
            ephemeral_token: self.ephemeral.get(TOKEN_KEY),
        }
    }

    fn restore(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        put(self.durable(), TOKEN_KEY, snapshot.durable_token.as_deref())?;
        put(self.durable(), REMEMBER_KEY, snapshot.remember.as_deref())?;
        put(self.ephemeral(), TOKEN_KEY, snapshot.ephemeral_token.as_deref())
    }

    /// Remove the token from both slots and drop the remember flag.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.durable.remove(TOKEN_KEY)?;
        self.durable.remove(REMEMBER_KEY)?;
        self.ephemeral.remove(TOKEN_KEY)?;
        Ok(())
    }
}

struct Snapshot {
    durable_token: Option<String>,
    remember: Option<String>,
    ephemeral_token: Option<String>,
}

fn put(store: &dyn CredentialStore, key: &str, value: Option<&str>) -> Result<(), StoreError> {
    match value {
        Some(value) => store.set(key, value),
        None => store.remove(key),
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("has_token", &self.token().is_some())
            .field("remembered", &self.remembered())
            .finish()
    }
}
