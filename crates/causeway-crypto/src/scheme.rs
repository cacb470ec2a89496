// ATTESTATION SIGNING CAPABILITY
// Deterministic signing keyed by node identifier
//
// SAFETY INVARIANTS:
// 1. Signing is deterministic: identical inputs yield identical signatures,
//    so independent verifiers can recompute and compare (a MAC/hash-style
//    construction, not asymmetric cryptography)
// 2. Verification recomputes from the CLAIMED origin's material; any
//    tampering with origin id or timestamp fails verification
// 3. The scheme is injectable: a real asymmetric implementation can be
//    substituted without touching node or propagation logic

use sha2::{Digest, Sha256};

/// Opaque attestation signature.
pub type Signature = String;

/// Signing and verification capability keyed by node identifier.
///
/// Nodes hold this behind a shared handle; a Byzantine node simply
/// declines to use it honestly rather than holding a different scheme.
pub trait SignatureScheme: Send + Sync {
    /// Produce the deterministic signature over `(origin_id, timestamp)`.
    fn sign(&self, origin_id: &str, timestamp: u64) -> Signature;

    /// Recompute the expected signature from the claimed origin's public
    /// verification material and compare. Returns false on any mismatch.
    fn verify(&self, origin_id: &str, timestamp: u64, signature: &str) -> bool;
}

/// Default scheme: SHA-256 over a per-node key derived from the node id.
///
/// The derived key is a stand-in for real key material; deriving it from
/// the identifier keeps every verifier able to recompute the signature.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyedSignatureScheme;

impl KeyedSignatureScheme {
    pub fn new() -> Self {
        KeyedSignatureScheme
    }

    fn node_key(origin_id: &str) -> String {
        format!("key_{}", origin_id)
    }
}

impl SignatureScheme for KeyedSignatureScheme {
    fn sign(&self, origin_id: &str, timestamp: u64) -> Signature {
        let mut hasher = Sha256::new();
        hasher.update(Self::node_key(origin_id).as_bytes());
        hasher.update(b":");
        hasher.update(origin_id.as_bytes());
        hasher.update(b":");
        hasher.update(timestamp.to_le_bytes());
        let digest = hasher.finalize();
        hex::encode(&digest[..16])
    }

    fn verify(&self, origin_id: &str, timestamp: u64, signature: &str) -> bool {
        self.sign(origin_id, timestamp) == signature
    }
}
