//! Symmetric vault for OAuth tokens at rest.
//!
//! Envelope format: `base64(nonce || ciphertext || tag)`. Every encryption
//! draws a fresh nonce, so encrypting the same token twice yields different
//! ciphertexts and ciphertext equality never leaks plaintext equality.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;

/// Nonce size for ChaCha20-Poly1305 (96 bits).
const NONCE_SIZE: usize = 12;

/// HKDF info label binding derived keys to this vault.
const KEY_CONTEXT: &[u8] = b"ledgerdesk.token-vault.v1";

/// Errors from vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("vault key material is unusable")]
    InvalidKey,

    #[error("encryption failed")]
    Encryption,

    /// Authentication tag did not verify: tampered or corrupted ciphertext.
    #[error("ciphertext failed integrity verification")]
    Integrity,

    #[error("ciphertext envelope is malformed")]
    Malformed,
}

/// Authenticated encryption for token storage.
///
/// The vault has no knowledge of which token it is protecting; callers
/// decide what goes in and what comes out.
pub struct TokenVault {
    cipher: ChaCha20Poly1305,
}

impl TokenVault {
    /// Build a vault from configured key material.
    ///
    /// The cipher key is derived with HKDF-SHA256 so the configured secret
    /// can be any non-empty string rather than exactly 32 raw bytes.
    pub fn new(key_material: &str) -> Result<Self, VaultError> {
        if key_material.trim().is_empty() {
            return Err(VaultError::InvalidKey);
        }

        let hk = Hkdf::<Sha256>::new(None, key_material.as_bytes());
        let mut key = [0u8; 32];
        hk.expand(KEY_CONTEXT, &mut key)
            .map_err(|_| VaultError::InvalidKey)?;

        let cipher =
            ChaCha20Poly1305::new_from_slice(&key).map_err(|_| VaultError::InvalidKey)?;
        Ok(Self { cipher })
    }

    /// Encrypt a token for storage.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::Encryption)?;

        let mut envelope = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        envelope.extend_from_slice(&nonce_bytes);
        envelope.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(&envelope))
    }

    /// Decrypt a stored token.
    ///
    /// A failed tag check is fatal for the operation in progress; callers
    /// must never fall back to treating the ciphertext as garbage-but-usable.
    pub fn decrypt(&self, encoded: &str) -> Result<String, VaultError> {
        let envelope = BASE64
            .decode(encoded)
            .map_err(|_| VaultError::Malformed)?;
        if envelope.len() <= NONCE_SIZE {
            return Err(VaultError::Malformed);
        }

        let nonce = Nonce::from_slice(&envelope[..NONCE_SIZE]);
        let plaintext = self
            .cipher
            .decrypt(nonce, &envelope[NONCE_SIZE..])
            .map_err(|_| VaultError::Integrity)?;

        String::from_utf8(plaintext).map_err(|_| VaultError::Malformed)
    }
}
