//! Signature Verification Adapters
//!
//! Implements the `SignatureVerifier` port.

use crate::domain::errors::VerificationError;
use crate::ports::outbound::SignatureVerifier;
use ed25519_dalek::{Signature, VerifyingKey};
use shared_types::Hash48;
use tracing::debug;

/// Development verifier: a signature is valid when it equals the block hash.
///
/// Lets a producer "sign" a block without keys. Never use it to protect a
/// real network.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashEchoSignatureVerifier;

impl SignatureVerifier for HashEchoSignatureVerifier {
    fn verify(&self, block_hash: &Hash48, signature: &[u8]) -> bool {
        signature == block_hash.as_slice()
    }
}

/// Ed25519 signature over the 48-byte block hash.
#[derive(Debug, Clone)]
pub struct Ed25519SignatureVerifier {
    key: VerifyingKey,
}

impl Ed25519SignatureVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }

    /// Build from a compressed 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, VerificationError> {
        let key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| VerificationError::InvalidInput(format!("invalid ed25519 public key: {e}")))?;
        Ok(Self::new(key))
    }

    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.key
    }
}

impl SignatureVerifier for Ed25519SignatureVerifier {
    fn verify(&self, block_hash: &Hash48, signature: &[u8]) -> bool {
        let signature = match Signature::from_slice(signature) {
            Ok(signature) => signature,
            Err(_) => {
                debug!(len = signature.len(), "[bs-02] Rejecting malformed ed25519 signature");
                return false;
            }
        };
        self.key.verify_strict(block_hash, &signature).is_ok()
    }
}
