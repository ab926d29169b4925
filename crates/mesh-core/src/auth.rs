//! Shared-secret signatures for admitting peers.
//!
//! A signature is the hex SHA-256 of `id ‖ name ‖ address ‖ secret`. It proves
//! the sender knows the group secret, nothing more: there is no nonce or
//! timestamp in the signed payload, so a captured signature can be replayed.

use crate::PeerRecord;
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Missing signature")]
    MissingSignature,
}

/// Hex-encoded signature, as carried in the `X-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Signature {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Signature {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signs and verifies peer records with the group secret.
#[derive(Clone)]
pub struct Authenticator {
    secret: String,
}

impl Authenticator {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn sign(&self, record: &PeerRecord) -> Signature {
        let mut hasher = Sha256::new();
        hasher.update(record.id.as_str().as_bytes());
        hasher.update(record.name.as_bytes());
        hasher.update(record.address.as_bytes());
        hasher.update(self.secret.as_bytes());
        Signature(hex::encode(hasher.finalize()))
    }

    pub fn verify(&self, signature: &Signature, record: &PeerRecord) -> Result<(), AuthError> {
        if signature.as_str().is_empty() {
            return Err(AuthError::MissingSignature);
        }
        if self.sign(record) == *signature {
            Ok(())
        } else {
            Err(AuthError::InvalidSignature)
        }
    }
}

// Never print the secret
impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator").finish_non_exhaustive()
    }
}
