//! Device request signing.
//!
//! State-changing requests carry a signature over a canonical string:
//!
//! ```text
//! sentra-sig-v1
//! {machine_id}
//! {timestamp}
//! {METHOD}
//! {path}
//! {sha256-hex(body)}
//! ```
//!
//! The server rebuilds the same string from what it received and checks it
//! against the machine's registered public key. Timestamps are not checked
//! for skew; a captured request can be replayed.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use ed25519_dalek::{Signature, Verifier};

use crate::core::hash::sha256_hex;
use crate::core::identity::{parse_public_key, DeviceIdentity};
use crate::error::IdentityError;

const VERSION_TAG: &str = "sentra-sig-v1";

/// Header values for one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub machine_id: String,
    pub timestamp: String,
    pub signature: String,
}

/// Build the canonical string covered by a signature.
pub fn canonical_string(
    machine_id: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &[u8],
) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        VERSION_TAG,
        machine_id.trim(),
        timestamp.trim(),
        method.trim().to_ascii_uppercase(),
        path,
        sha256_hex(body)
    )
}

/// Sign a request as of now.
pub fn sign_request(
    identity: &DeviceIdentity,
    method: &str,
    path: &str,
    body: &[u8],
) -> SignedHeaders {
    sign_request_at(identity, Utc::now().timestamp(), method, path, body)
}

/// Sign a request with an explicit Unix timestamp.
pub fn sign_request_at(
    identity: &DeviceIdentity,
    timestamp: i64,
    method: &str,
    path: &str,
    body: &[u8],
) -> SignedHeaders {
    let timestamp = timestamp.to_string();
    let message = canonical_string(identity.machine_id(), &timestamp, method, path, body);
    SignedHeaders {
        machine_id: identity.machine_id().to_string(),
        timestamp,
        signature: identity.sign(message.as_bytes()),
    }
}

/// Verify a request signature against a registered public key.
///
/// # Errors
///
/// `InvalidPublicKey` if the registered key is malformed,
/// `InvalidSignatureEncoding` if the signature is not 64 base64url bytes,
/// and `BadSignature` if it does not cover this exact request.
pub fn verify_signature(
    public_key: &str,
    machine_id: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &[u8],
    signature: &str,
) -> Result<(), IdentityError> {
    let key = parse_public_key(public_key)?;

    let bytes = URL_SAFE_NO_PAD
        .decode(signature.trim().trim_end_matches('='))
        .map_err(|_| IdentityError::InvalidSignatureEncoding)?;
    let signature =
        Signature::from_slice(&bytes).map_err(|_| IdentityError::InvalidSignatureEncoding)?;

    let message = canonical_string(machine_id, timestamp, method, path, body);
    key.verify(message.as_bytes(), &signature)
        .map_err(|_| IdentityError::BadSignature)
}
