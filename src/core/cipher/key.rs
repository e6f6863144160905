//! Per-installation symmetric key.
//!
//! The key is created lazily the first time anything needs to encrypt, then
//! reused for the lifetime of the installation. It is never rotated
//! implicitly.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::error::{CipherError, Result};

/// Key length in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// 256-bit installation key. Wiped from memory on drop.
pub struct InstallationKey(Zeroizing<[u8; KEY_SIZE]>);

impl InstallationKey {
    /// Generate a fresh key from the OS randomness source.
    pub fn generate() -> Result<Self> {
        let mut bytes = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng
            .try_fill_bytes(&mut bytes[..])
            .map_err(|e| CipherError::Rng(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Wrap existing key bytes.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::InvalidKeyLength` unless exactly 32 bytes are given.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CipherError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            }
            .into());
        }
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }

    /// Load a key file, returning `None` if it does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => Zeroizing::new(contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CipherError::KeyFile {
                    path: path.to_path_buf(),
                    source,
                }
                .into())
            }
        };

        #[cfg(unix)]
        warn_if_exposed(path);

        let bytes = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(contents.trim())
                .map_err(|e| CipherError::CorruptKey(e.to_string()))?,
        );
        Self::from_bytes(&bytes).map(Some)
    }

    /// Persist the key with owner-only permissions.
    ///
    /// Refuses to overwrite an existing file; the caller decides what to do
    /// with `AlreadyExists`.
    fn create(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(path)?;
        let encoded = Zeroizing::new(URL_SAFE_NO_PAD.encode(self.as_bytes()));
        file.write_all(encoded.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_all()
    }
}

impl std::fmt::Debug for InstallationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("InstallationKey(..)")
    }
}

#[cfg(unix)]
fn warn_if_exposed(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mode = metadata.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(
                path = %path.display(),
                mode = %format!("{:o}", mode),
                "insecure key file permissions"
            );
        }
    }
}

/// Owner of the installation key.
///
/// Holds the key file location and caches the key after first use, so every
/// encryption on this machine goes through one explicitly passed context.
#[derive(Debug)]
pub struct KeyContext {
    path: PathBuf,
    key: OnceLock<InstallationKey>,
}

impl KeyContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            key: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the installation key, creating it on first use.
    ///
    /// # Errors
    ///
    /// Fails if the key file is unreadable or corrupt, or if a new key cannot
    /// be generated or written.
    pub fn key(&self) -> Result<&InstallationKey> {
        if let Some(key) = self.key.get() {
            return Ok(key);
        }
        let key = self.get_or_create()?;
        Ok(self.key.get_or_init(|| key))
    }

    fn get_or_create(&self) -> Result<InstallationKey> {
        if let Some(key) = InstallationKey::load(&self.path)? {
            debug!(path = %self.path.display(), "installation key loaded");
            return Ok(key);
        }

        let key = InstallationKey::generate()?;
        match key.create(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "installation key created");
                Ok(key)
            }
            // Another process won the race; use its key.
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                InstallationKey::load(&self.path)?.ok_or_else(|| {
                    CipherError::CorruptKey("key file vanished during creation".to_string())
                        .into()
                })
            }
            Err(source) => Err(CipherError::KeyFile {
                path: self.path.clone(),
                source,
            }
            .into()),
        }
    }
}
