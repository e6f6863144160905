//! AES-256-GCM envelope.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::trace;

use super::{Cipher, InstallationKey};
use crate::core::constants;
use crate::error::{CipherError, Result};

/// GCM nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

const TAG_SIZE: usize = 16;

/// An encrypted payload ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sealed {
    /// Cipher identifier.
    pub cipher: &'static str,
    /// Base64url (unpadded) of `nonce || ciphertext`.
    pub blob: String,
    /// Length of `nonce || ciphertext` in bytes.
    pub size: usize,
}

/// AES-256-GCM under an installation key, no associated data.
pub struct Envelope<'k> {
    key: &'k InstallationKey,
}

impl<'k> Envelope<'k> {
    pub fn new(key: &'k InstallationKey) -> Self {
        Self { key }
    }

    fn aead(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(self.key.as_bytes()).map_err(|_| {
            CipherError::InvalidKeyLength {
                expected: super::KEY_SIZE,
                actual: self.key.as_bytes().len(),
            }
            .into()
        })
    }
}

impl Cipher for Envelope<'_> {
    fn name(&self) -> &'static str {
        constants::CIPHER_NAME
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<Sealed> {
        let aead = self.aead()?;

        let mut nonce = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut nonce)
            .map_err(|e| CipherError::Rng(e.to_string()))?;

        let ciphertext = aead
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|e| CipherError::EncryptionFailed(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);

        trace!(plaintext_len = plaintext.len(), sealed_len = out.len(), "sealed payload");

        Ok(Sealed {
            cipher: self.name(),
            blob: URL_SAFE_NO_PAD.encode(&out),
            size: out.len(),
        })
    }

    fn decrypt(&self, blob: &str) -> Result<Vec<u8>> {
        let data = URL_SAFE_NO_PAD
            .decode(blob.trim())
            .map_err(|e| CipherError::DecryptionFailed(format!("invalid encoding: {}", e)))?;
        if data.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::DecryptionFailed("ciphertext too short".to_string()).into());
        }

        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        self.aead()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                CipherError::DecryptionFailed(
                    "authentication failed (wrong key or tampered data)".to_string(),
                )
                .into()
            })
    }
}
