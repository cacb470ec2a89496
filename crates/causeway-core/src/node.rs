// PROTOCOL NODES
// One participant: identity, honesty strategy, neighbor set, vector clock
//
// SAFETY INVARIANTS:
// 1. emit_update and receive both mutate the same clock and are serialized
//    through one per-node lock
// 2. No other node reads or writes this node's clock directly; remote
//    updates arrive as attestations and are merged
// 3. Byzantine behavior is a construction-time strategy value, not a
//    subclass: a Byzantine node emits unsigned updates and rejects all
//    incoming ones

use crate::attestation::Attestation;
use causeway_clock::{NodeId, VectorClock};
use causeway_crypto::SignatureScheme;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Honesty strategy attached to a node at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeBehavior {
    /// Signs its own emissions and verifies incoming ones
    Honest,

    /// Emits unsigned updates and refuses to apply incoming ones
    Byzantine,
}

/// Outcome of delivering an attestation to a node.
///
/// Rejections are recovered locally by discarding the update; they are
/// never fatal and never propagated further.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// Signature verified; timestamp merged into the local clock
    Accepted,

    /// Signature missing or failed verification; update discarded
    RejectedBadSignature,

    /// The receiving node is Byzantine and does not honestly participate
    RejectedByzantineSelf,
}

impl fmt::Display for ReceiveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReceiveOutcome::Accepted => write!(f, "ACCEPTED"),
            ReceiveOutcome::RejectedBadSignature => write!(f, "REJECTED_BAD_SIGNATURE"),
            ReceiveOutcome::RejectedByzantineSelf => write!(f, "REJECTED_BYZANTINE_SELF"),
        }
    }
}

/// A system node: owns one vector clock, a signing capability, an honesty
/// strategy, and a declared set of neighbor ids (static topology edges).
///
/// Partition state does NOT live here; it is topology-global so scenarios
/// can toggle network conditions without touching node internals.
pub struct Node {
    id: NodeId,
    behavior: NodeBehavior,
    neighbors: Vec<NodeId>,
    clock: Mutex<VectorClock>,
    scheme: Arc<dyn SignatureScheme>,
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("behavior", &self.behavior)
            .field("neighbors", &self.neighbors)
            .finish_non_exhaustive()
    }
}

impl Node {
    pub fn new(
        id: NodeId,
        behavior: NodeBehavior,
        neighbors: Vec<NodeId>,
        scheme: Arc<dyn SignatureScheme>,
    ) -> Self {
        Node {
            id,
            behavior,
            neighbors,
            clock: Mutex::new(VectorClock::new()),
            scheme,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn behavior(&self) -> NodeBehavior {
        self.behavior
    }

    pub fn is_honest(&self) -> bool {
        self.behavior == NodeBehavior::Honest
    }

    /// Declared outbound topology edges for this node.
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    /// Advance the local clock by one event and emit an attestation for
    /// the new counter value.
    ///
    /// Honest nodes sign the emission; Byzantine nodes emit it unsigned,
    /// which honest receivers detect through verification rather than
    /// through an error path.
    pub fn emit_update(&self) -> Attestation {
        let timestamp = {
            let mut clock = self.clock.lock();
            clock.increment(&self.id);
            clock.get(&self.id)
        };

        let signature = match self.behavior {
            NodeBehavior::Honest => Some(self.scheme.sign(&self.id, timestamp)),
            NodeBehavior::Byzantine => {
                warn!("byzantine node {} emitting unsigned update", self.id);
                None
            }
        };

        debug!("node {} emitted update at timestamp {}", self.id, timestamp);
        Attestation::new(self.id.clone(), timestamp, signature)
    }

    /// Verify an incoming attestation and merge it into the local clock
    /// on success.
    ///
    /// A Byzantine receiver always rejects: it does not honestly
    /// participate in propagation. An honest receiver rejects any
    /// attestation whose signature is absent or fails verification
    /// against the claimed origin.
    pub fn receive(&self, attestation: &Attestation) -> ReceiveOutcome {
        if self.behavior == NodeBehavior::Byzantine {
            warn!(
                "byzantine node {} refusing update from {}",
                self.id, attestation.origin_id
            );
            return ReceiveOutcome::RejectedByzantineSelf;
        }

        let verified = attestation
            .signature
            .as_deref()
            .map(|sig| {
                self.scheme
                    .verify(&attestation.origin_id, attestation.timestamp, sig)
            })
            .unwrap_or(false);

        if !verified {
            warn!(
                "node {} rejecting update from {}: signature missing or invalid",
                self.id, attestation.origin_id
            );
            return ReceiveOutcome::RejectedBadSignature;
        }

        self.clock
            .lock()
            .update(&attestation.origin_id, attestation.timestamp);

        debug!(
            "node {} merged update from {} at timestamp {}",
            self.id, attestation.origin_id, attestation.timestamp
        );
        ReceiveOutcome::Accepted
    }

    /// Read-only copy of the local clock for reporting.
    pub fn vector_clock_snapshot(&self) -> BTreeMap<NodeId, u64> {
        self.clock.lock().snapshot()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node {} ({:?})", self.id, self.behavior)
    }
}
