//! Secret Encryption
//!
//! AES-256-GCM encryption for secrets stored in the local database. The key
//! is 32 random bytes kept in its own file beside the database, so no OS
//! keychain prompt is ever needed.
//!
//! Ciphertext layout: base64(`nonce[12] || ciphertext_with_tag`).

use std::fs;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::utils::error::{AppError, AppResult};

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// Symmetric cipher for secrets at rest
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl SecretCipher {
    /// Create a cipher from raw key bytes
    pub fn from_key(key: [u8; KEY_SIZE]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(&key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Create a cipher with a fresh random key that is never persisted
    pub fn ephemeral() -> Self {
        Self::from_key(Self::generate_key())
    }

    /// Load the key file, creating it with a random key on first use
    pub fn load_or_create(path: &Path) -> AppResult<Self> {
        if path.exists() {
            let bytes = fs::read(path)?;
            let key: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
                AppError::secret(format!(
                    "Key file {} has {} bytes, expected {}",
                    path.display(),
                    bytes.len(),
                    KEY_SIZE
                ))
            })?;
            return Ok(Self::from_key(key));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let key = Self::generate_key();
        write_private(path, &key)?;
        tracing::info!("Created new secret key at {}", path.display());
        Ok(Self::from_key(key))
    }

    fn generate_key() -> [u8; KEY_SIZE] {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Encrypt a secret for storage
    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AppError::secret(format!("Encryption failed: {}", e)))?;

        let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// Decrypt a stored secret
    pub fn decrypt(&self, encrypted: &str) -> AppResult<String> {
        let data = BASE64
            .decode(encrypted)
            .map_err(|e| AppError::secret(format!("Base64 decode failed: {}", e)))?;

        if data.len() <= NONCE_SIZE {
            return Err(AppError::secret("Invalid encrypted data: too short"));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| AppError::secret("Decryption failed: wrong key or corrupted data"))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::secret(format!("Decrypted data is not valid UTF-8: {}", e)))
    }
}

impl std::fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretCipher(..)")
    }
}

#[cfg(unix)]
fn write_private(path: &Path, bytes: &[u8]) -> AppResult<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn write_private(path: &Path, bytes: &[u8]) -> AppResult<()> {
    fs::write(path, bytes)?;
    Ok(())
}
