//! Encrypted-at-rest credential vault.
//!
//! Credentials are serialized to canonical JSON and sealed with AES-256-GCM
//! under a locally generated key. The blob format at rest is two base64
//! segments joined by `:` — the 12-byte nonce, then the ciphertext (which
//! carries the GCM tag). Decryption with the wrong key or over tampered data
//! fails closed; it never yields garbage.
//!
//! The key is generated once, on first use, and persisted in exported form
//! through the state store's check-and-set so concurrent first callers
//! converge on a single key.

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit, OsRng},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use std::sync::Arc;
use zeroize::Zeroizing;

use crate::error::{CloudSightError, Result};
use crate::providers::CredentialSet;
use crate::storage::StateStore;

/// Size of the AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Separator between the nonce and ciphertext segments at rest.
pub const BLOB_DELIMITER: char = ':';

/// Generate a random 256-bit key.
#[must_use]
pub fn generate_key() -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    OsRng.fill_bytes(key.as_mut());
    key
}

/// Encrypt a credential record with an explicit key.
///
/// Draws a fresh random nonce per call; the same (key, nonce) pair is never
/// reused.
pub fn encrypt_with_key(key: &[u8; KEY_SIZE], record: &CredentialSet) -> Result<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let plaintext = serde_json::to_vec(record)?;
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_slice())
        .map_err(|e| CloudSightError::Crypto(format!("encryption failed: {e}")))?;

    Ok(format!(
        "{}{BLOB_DELIMITER}{}",
        BASE64.encode(nonce_bytes),
        BASE64.encode(&ciphertext)
    ))
}

/// Decrypt a credential blob with an explicit key.
pub fn decrypt_with_key(key: &[u8; KEY_SIZE], blob: &str) -> Result<CredentialSet> {
    let (iv_part, ct_part) = blob
        .split_once(BLOB_DELIMITER)
        .ok_or_else(|| CloudSightError::BlobFormat("missing delimiter".to_string()))?;

    let nonce_bytes = BASE64
        .decode(iv_part)
        .map_err(|e| CloudSightError::BlobFormat(format!("bad nonce encoding: {e}")))?;
    if nonce_bytes.len() != NONCE_SIZE {
        return Err(CloudSightError::BlobFormat(format!(
            "nonce must be {NONCE_SIZE} bytes, got {}",
            nonce_bytes.len()
        )));
    }

    let ciphertext = BASE64
        .decode(ct_part)
        .map_err(|e| CloudSightError::BlobFormat(format!("bad ciphertext encoding: {e}")))?;

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext: Zeroizing<Vec<u8>> = Zeroizing::new(
        cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|_| CloudSightError::Decryption)?,
    );

    Ok(serde_json::from_slice(&plaintext)?)
}

/// Vault bound to the persistent key slot.
pub struct CredentialVault {
    store: Arc<StateStore>,
}

impl CredentialVault {
    /// Create a vault over the given store.
    #[must_use]
    pub fn new(store: Arc<StateStore>) -> Self {
        Self { store }
    }

    /// Return the persisted key, generating and persisting one on first use.
    pub async fn get_or_create_key(&self) -> Result<Zeroizing<[u8; KEY_SIZE]>> {
        let exported = self
            .store
            .get_or_init_key(|| BASE64.encode(generate_key().as_slice()))
            .await?;

        let bytes = BASE64
            .decode(&exported)
            .map_err(|e| CloudSightError::BlobFormat(format!("bad stored key encoding: {e}")))?;
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        if bytes.len() != KEY_SIZE {
            return Err(CloudSightError::BlobFormat(format!(
                "stored key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        key.copy_from_slice(&bytes);
        Ok(key)
    }

    /// Encrypt a credential record under the vault key.
    pub async fn encrypt(&self, record: &CredentialSet) -> Result<String> {
        let key = self.get_or_create_key().await?;
        encrypt_with_key(&key, record)
    }

    /// Decrypt a stored credential blob.
    ///
    /// # Errors
    ///
    /// `BlobFormat` when the blob is not the two-segment structure;
    /// `Decryption` when the authentication tag check fails.
    pub async fn decrypt(&self, blob: &str) -> Result<CredentialSet> {
        let key = self.get_or_create_key().await?;
        decrypt_with_key(&key, blob)
    }
}
