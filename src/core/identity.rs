//! Device identity.
//!
//! Every installation owns an ed25519 keypair and a machine ID. The public
//! half is registered with the server out of band; the seed never leaves the
//! state directory.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use tracing::debug;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::core::constants;
use crate::error::{IdentityError, Result};

/// Machine ID plus signing key for this installation.
pub struct DeviceIdentity {
    machine_id: String,
    signing_key: SigningKey,
}

impl DeviceIdentity {
    /// Fresh identity with a random machine ID. Not persisted.
    pub fn generate() -> Self {
        Self {
            machine_id: Uuid::new_v4().to_string(),
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_parts(machine_id: impl Into<String>, seed: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            machine_id: machine_id.into(),
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Load the identity from `state_dir`, creating one on first use.
    pub fn load_or_create(state_dir: &Path) -> Result<Self> {
        let key_path = state_dir.join(constants::DEVICE_KEY_FILE);
        let id_path = state_dir.join(constants::MACHINE_ID_FILE);

        if key_path.exists() {
            let identity = Self::load(state_dir)?;
            debug!(machine_id = %identity.machine_id, "device identity loaded");
            return Ok(identity);
        }

        let identity = Self::generate();
        let seed = Zeroizing::new(URL_SAFE_NO_PAD.encode(identity.signing_key.to_bytes()));
        write_file(&key_path, seed.as_bytes(), true)?;
        write_file(&id_path, identity.machine_id.as_bytes(), false)?;
        write_file(
            &state_dir.join(constants::DEVICE_PUBKEY_FILE),
            identity.public_key_b64().as_bytes(),
            false,
        )?;
        debug!(machine_id = %identity.machine_id, "device identity created");
        Ok(identity)
    }

    fn load(state_dir: &Path) -> Result<Self> {
        let key_path = state_dir.join(constants::DEVICE_KEY_FILE);
        let id_path = state_dir.join(constants::MACHINE_ID_FILE);

        let encoded = Zeroizing::new(read_file(&key_path)?);
        let bytes = Zeroizing::new(
            URL_SAFE_NO_PAD
                .decode(encoded.trim())
                .map_err(|e| IdentityError::CorruptKey(e.to_string()))?,
        );
        let seed: &[u8; SECRET_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
            IdentityError::CorruptKey(format!(
                "expected {} bytes, got {}",
                SECRET_KEY_LENGTH,
                bytes.len()
            ))
        })?;

        let machine_id = read_file(&id_path)?.trim().to_string();
        if machine_id.is_empty() {
            return Err(IdentityError::CorruptKey("empty machine id".to_string()).into());
        }

        Ok(Self::from_parts(machine_id, seed))
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Public key as unpadded base64url, the form registered with the server.
    pub fn public_key_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.verifying_key().as_bytes())
    }

    /// Sign `message`, returning the signature as unpadded base64url.
    pub fn sign(&self, message: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceIdentity")
            .field("machine_id", &self.machine_id)
            .field("public_key", &self.public_key_b64())
            .finish()
    }
}

/// Decode a registered public key.
///
/// Accepts unpadded base64url, and standard base64 for keys registered by
/// older tooling.
pub fn parse_public_key(encoded: &str) -> std::result::Result<VerifyingKey, IdentityError> {
    let trimmed = encoded.trim().trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))?;
    let bytes: [u8; PUBLIC_KEY_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        IdentityError::InvalidPublicKey(format!(
            "expected {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            bytes.len()
        ))
    })?;
    VerifyingKey::from_bytes(&bytes).map_err(|e| IdentityError::InvalidPublicKey(e.to_string()))
}

fn read_file(path: &Path) -> std::result::Result<String, IdentityError> {
    fs::read_to_string(path).map_err(|source| IdentityError::File {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(
    path: &Path,
    contents: &[u8],
    private: bool,
) -> std::result::Result<(), IdentityError> {
    let file_err = |source| IdentityError::File {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(file_err)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    if private {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    #[cfg(not(unix))]
    let _ = private;

    let mut file = options.open(path).map_err(file_err)?;
    file.write_all(contents).map_err(file_err)?;
    file.write_all(b"\n").map_err(file_err)?;
    file.sync_all().map_err(file_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[test]
    fn test_identity_persists() {
        let tmp = TempDir::new().unwrap();
        let first = DeviceIdentity::load_or_create(tmp.path()).unwrap();
        let second = DeviceIdentity::load_or_create(tmp.path()).unwrap();

        assert_eq!(first.machine_id(), second.machine_id());
        assert_eq!(first.public_key_b64(), second.public_key_b64());
        assert!(Uuid::parse_str(first.machine_id()).is_ok());

        let stored = fs::read_to_string(tmp.path().join(constants::DEVICE_PUBKEY_FILE)).unwrap();
        assert_eq!(stored.trim(), first.public_key_b64());
    }

    #[cfg(unix)]
    #[test]
    fn test_seed_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        DeviceIdentity::load_or_create(tmp.path()).unwrap();
        let mode = fs::metadata(tmp.path().join(constants::DEVICE_KEY_FILE))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[test]
    fn test_public_key_roundtrip() {
        let identity = DeviceIdentity::generate();
        let encoded = identity.public_key_b64();
        assert!(!encoded.contains('='));
        assert_eq!(parse_public_key(&encoded).unwrap(), identity.verifying_key());
    }

    #[test]
    fn test_public_key_accepts_standard_base64() {
        let identity = DeviceIdentity::generate();
        let padded =
            base64::engine::general_purpose::STANDARD.encode(identity.verifying_key().as_bytes());
        assert_eq!(parse_public_key(&padded).unwrap(), identity.verifying_key());
    }

    #[test]
    fn test_bad_public_key() {
        assert!(parse_public_key("").is_err());
        assert!(parse_public_key("short").is_err());
    }

    #[test]
    fn test_corrupt_seed_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(constants::DEVICE_KEY_FILE), "AAAA").unwrap();
        fs::write(tmp.path().join(constants::MACHINE_ID_FILE), "m1").unwrap();

        let err = DeviceIdentity::load_or_create(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Identity(IdentityError::CorruptKey(_))));
    }
}
