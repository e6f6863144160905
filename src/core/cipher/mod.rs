//! Envelope encryption of secret file contents.
//!
//! Payloads are sealed on the client under a per-installation key that never
//! leaves the machine. The server stores opaque blobs and cannot decrypt
//! them.
//!
//! ## Blob format
//!
//! ```text
//! base64url_nopad( [12-byte nonce][ciphertext + 16-byte GCM tag] )
//! ```

mod envelope;
mod key;

pub use envelope::{Envelope, Sealed, NONCE_SIZE};
pub use key::{InstallationKey, KeyContext, KEY_SIZE};

use crate::error::Result;

/// Authenticated cipher used for secret payloads.
///
/// Failures are always errors; implementations must never hand back
/// plaintext in place of ciphertext.
pub trait Cipher {
    /// Identifier sent alongside every blob.
    fn name(&self) -> &'static str;

    /// Seal `plaintext` into a transport-safe blob.
    fn encrypt(&self, plaintext: &[u8]) -> Result<Sealed>;

    /// Open a blob produced by [`Cipher::encrypt`].
    fn decrypt(&self, blob: &str) -> Result<Vec<u8>>;
}

/// Encrypt `plaintext` under `key`.
pub fn encrypt(key: &InstallationKey, plaintext: &[u8]) -> Result<Sealed> {
    Envelope::new(key).encrypt(plaintext)
}

/// Decrypt a blob sealed under `key`.
pub fn decrypt(key: &InstallationKey, blob: &str) -> Result<Vec<u8>> {
    Envelope::new(key).decrypt(blob)
}
