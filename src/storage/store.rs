//! Persistent state store.
//!
//! One flat JSON file holds everything the system persists: credentials
//! (plaintext or encrypted, mutually exclusive), the exported encryption key,
//! display settings, and the latest aggregated snapshot.
//!
//! All read-modify-write sequences run under a single async mutex so the
//! encryption-key check-and-set cannot race, and writes go through a temp
//! file + rename so a reader never observes a half-written state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::alerts::DEFAULT_WARN_PCT;
use crate::core::currency::DEFAULT_CURRENCY;
use crate::core::models::AggregatedSnapshot;
use crate::error::{CloudSightError, Result};
use crate::providers::CredentialSet;

/// Default budget ceiling in USD.
pub const DEFAULT_BUDGET_LIMIT: f64 = 1000.0;

// =============================================================================
// Persisted State
// =============================================================================

/// Everything stored at rest, as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersistedState {
    /// Plaintext credential record. Mutually exclusive with
    /// `credential_encrypted`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_plaintext: Option<CredentialSet>,

    /// Encrypted credential blob (`b64(iv):b64(ciphertext)`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_encrypted: Option<String>,

    /// Exported AES-256 key, base64. Created lazily on first encrypt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,

    /// Display currency code.
    pub currency: String,

    /// Budget ceiling in USD.
    pub budget_limit: f64,

    /// Budget warning threshold (percent used).
    pub budget_warn_pct: f64,

    /// Latest aggregated snapshot, overwritten each cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<AggregatedSnapshot>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            credential_plaintext: None,
            credential_encrypted: None,
            encryption_key: None,
            currency: DEFAULT_CURRENCY.to_string(),
            budget_limit: DEFAULT_BUDGET_LIMIT,
            budget_warn_pct: DEFAULT_WARN_PCT,
            snapshot: None,
        }
    }
}

// =============================================================================
// State Store
// =============================================================================

/// File-backed store for [`PersistedState`].
pub struct StateStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl StateStore {
    /// Open a store at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Read the current state. Missing file yields the default state.
    pub async fn load(&self) -> Result<PersistedState> {
        let _guard = self.lock.lock().await;
        self.read_unlocked()
    }

    /// Apply `mutate` to the state and persist the result atomically.
    pub async fn update<F>(&self, mutate: F) -> Result<PersistedState>
    where
        F: FnOnce(&mut PersistedState),
    {
        let _guard = self.lock.lock().await;
        let mut state = self.read_unlocked()?;
        mutate(&mut state);
        self.write_unlocked(&state)?;
        Ok(state)
    }

    /// Get the stored encryption key, or initialize it with `generate`.
    ///
    /// The read-check-generate-persist sequence runs as one critical section:
    /// concurrent first callers converge on a single stored key, and storage
    /// is mutated at most once per key lifetime.
    pub async fn get_or_init_key<F>(&self, generate: F) -> Result<String>
    where
        F: FnOnce() -> String,
    {
        let _guard = self.lock.lock().await;
        let mut state = self.read_unlocked()?;
        if let Some(key) = state.encryption_key {
            return Ok(key);
        }
        let key = generate();
        state.encryption_key = Some(key.clone());
        self.write_unlocked(&state)?;
        Ok(key)
    }

    /// Store plaintext credentials, clearing any encrypted representation.
    pub async fn save_plaintext_credentials(&self, creds: CredentialSet) -> Result<()> {
        self.update(|state| {
            state.credential_plaintext = Some(creds);
            state.credential_encrypted = None;
        })
        .await
        .map(|_| ())
    }

    /// Store an encrypted blob, clearing any plaintext representation.
    pub async fn save_encrypted_credentials(&self, blob: String) -> Result<()> {
        self.update(|state| {
            state.credential_encrypted = Some(blob);
            state.credential_plaintext = None;
        })
        .await
        .map(|_| ())
    }

    /// Remove both credential representations.
    pub async fn clear_credentials(&self) -> Result<()> {
        self.update(|state| {
            state.credential_plaintext = None;
            state.credential_encrypted = None;
        })
        .await
        .map(|_| ())
    }

    /// Overwrite the snapshot slot. Last writer wins.
    pub async fn save_snapshot(&self, snapshot: AggregatedSnapshot) -> Result<()> {
        self.update(|state| state.snapshot = Some(snapshot))
            .await
            .map(|_| ())
    }

    fn read_unlocked(&self) -> Result<PersistedState> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
            Err(e) => Err(CloudSightError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_unlocked(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, content.as_bytes())
    }
}

/// Write bytes atomically using temp file + rename.
fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    // Temp file must live in the same directory for the rename to be atomic
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("state.json");
    let temp_path = path.with_file_name(format!(".{file_name}.tmp.{}", std::process::id()));

    std::fs::write(&temp_path, content)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> StateStore {
        StateStore::new(dir.path().join("state.json"))
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let state = store_in(&dir).load().await.unwrap();
        assert_eq!(state.currency, "USD");
        assert!((state.budget_limit - 1000.0).abs() < f64::EPSILON);
        assert!(state.credential_plaintext.is_none());
    }

    #[tokio::test]
    async fn update_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .update(|s| {
                s.currency = "EUR".to_string();
                s.budget_limit = 250.0;
            })
            .await
            .unwrap();

        let state = store.load().await.unwrap();
        assert_eq!(state.currency, "EUR");
        assert!((state.budget_limit - 250.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn credential_representations_are_mutually_exclusive() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store
            .save_plaintext_credentials(CredentialSet::default())
            .await
            .unwrap();
        let state = store.load().await.unwrap();
        assert!(state.credential_plaintext.is_some());
        assert!(state.credential_encrypted.is_none());

        store
            .save_encrypted_credentials("aXY=:Y3Q=".to_string())
            .await
            .unwrap();
        let state = store.load().await.unwrap();
        assert!(state.credential_plaintext.is_none());
        assert!(state.credential_encrypted.is_some());
    }

    #[tokio::test]
    async fn key_init_is_stable() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let first = store
            .get_or_init_key(|| "key-one".to_string())
            .await
            .unwrap();
        let second = store
            .get_or_init_key(|| "key-two".to_string())
            .await
            .unwrap();
        assert_eq!(first, "key-one");
        assert_eq!(second, "key-one");

        // A fresh store over the same file sees the persisted key
        let reopened = StateStore::new(dir.path().join("state.json"));
        let third = reopened
            .get_or_init_key(|| "key-three".to_string())
            .await
            .unwrap();
        assert_eq!(third, "key-one");
    }

    #[tokio::test]
    async fn concurrent_key_init_converges() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(store_in(&dir));

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.get_or_init_key(|| format!("key-{i}")).await })
            })
            .collect();

        let mut keys = Vec::new();
        for task in tasks {
            keys.push(task.await.unwrap().unwrap());
        }
        keys.dedup();
        assert_eq!(keys.len(), 1);
    }
}
