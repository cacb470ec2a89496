// CLOCK-UPDATE ATTESTATIONS
// Immutable, serializable units of causal information plus an origin claim

use causeway_clock::NodeId;
use causeway_crypto::Signature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A clock update emitted by one node, carrying a verifiable origin claim.
///
/// Created once by the origin at emission time and never mutated; every
/// receiving node consumes it read-only. A missing signature marks an
/// unsigned emission, e.g. from a Byzantine origin.
///
/// Serialization preserves all three fields exactly, so an attestation can
/// cross a transport or log boundary without loss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Node that emitted this update
    pub origin_id: NodeId,

    /// The origin's own counter value at emission
    pub timestamp: u64,

    /// Deterministic signature over `(origin_id, timestamp)`, if signed
    pub signature: Option<Signature>,
}

impl Attestation {
    pub fn new(origin_id: NodeId, timestamp: u64, signature: Option<Signature>) -> Self {
        Attestation {
            origin_id,
            timestamp,
            signature,
        }
    }

    /// Whether the origin attached any signature at all.
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }
}

impl fmt::Display for Attestation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Attestation {{ origin: {}, timestamp: {}, signature: {} }}",
            self.origin_id,
            self.timestamp,
            self.signature.as_deref().unwrap_or("<none>"),
        )
    }
}
