// ATTESTATION PROPAGATION
// Partition-aware fan-out across the declared topology edges
//
// SAFETY INVARIANTS:
// 1. A delivery succeeds only if the directed edge is declared, the origin
//    can send, and the neighbor can receive
// 2. Blocked deliveries are silently dropped: no retry, no error, matching
//    a partition model where drops are expected until state changes
// 3. No broadcast order is guaranteed; deliveries are independent and may
//    run in parallel, each taking only the target node's own lock

use crate::quorum::{required_quorum, QuorumError, QuorumTracker};
use crate::topology::{Topology, TopologyError};
use causeway_clock::NodeId;
use causeway_core::{Attestation, ReceiveOutcome};
use log::{debug, info};
use parking_lot::Mutex;
use rayon::prelude::*;

/// Why a delivery attempt never reached a neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The origin is isolated and cannot send
    OriginIsolated,

    /// The neighbor is isolated and cannot receive
    NeighborIsolated,

    /// The directed origin->neighbor edge is blocked
    EdgeBlocked,

    /// The declared neighbor id is not registered in the topology
    UnknownNeighbor,
}

/// Per-neighbor result of one propagation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// The neighbor's receive ran and returned this outcome
    Delivered(ReceiveOutcome),

    /// The delivery was dropped before reaching the neighbor
    Dropped(DropReason),
}

/// Summary of one fan-out. Drops are first-class outcomes here, not
/// errors: callers inspect the report to characterize the scenario.
#[derive(Debug, Clone, Default)]
pub struct PropagationReport {
    pub deliveries: Vec<(NodeId, DeliveryStatus)>,
}

impl PropagationReport {
    pub fn accepted_count(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|(_, status)| {
                matches!(status, DeliveryStatus::Delivered(ReceiveOutcome::Accepted))
            })
            .count()
    }

    pub fn dropped_count(&self) -> usize {
        self.deliveries
            .iter()
            .filter(|(_, status)| matches!(status, DeliveryStatus::Dropped(_)))
            .count()
    }

    pub fn status_for(&self, neighbor_id: &str) -> Option<&DeliveryStatus> {
        self.deliveries
            .iter()
            .find(|(id, _)| id.as_str() == neighbor_id)
            .map(|(_, status)| status)
    }
}

/// Drives attestation distribution across the topology, respecting
/// partition state and per-node honesty, and accumulates verified
/// deliveries toward the Byzantine quorum threshold.
#[derive(Debug, Default)]
pub struct Propagator {
    tracker: Mutex<QuorumTracker>,
}

impl Propagator {
    pub fn new() -> Self {
        Propagator {
            tracker: Mutex::new(QuorumTracker::new()),
        }
    }

    /// Fan an attestation out to the origin's declared neighbors.
    ///
    /// Fire-and-forget per delivery attempt: each neighbor is handled
    /// independently, in no guaranteed order, and a dropped delivery is
    /// not retried. Accepted deliveries are recorded in the quorum
    /// tracker keyed by `(origin, timestamp)`, once per verifying node.
    pub fn propagate(
        &self,
        topology: &Topology,
        origin_id: &str,
        attestation: &Attestation,
    ) -> Result<PropagationReport, TopologyError> {
        let origin = topology
            .node(origin_id)
            .ok_or_else(|| TopologyError::UnknownNode(origin_id.to_string()))?;

        let origin_isolated = topology.is_isolated(origin_id);

        let deliveries: Vec<(NodeId, DeliveryStatus)> = origin
            .neighbors()
            .par_iter()
            .map(|neighbor_id| {
                let status = if origin_isolated {
                    DeliveryStatus::Dropped(DropReason::OriginIsolated)
                } else if topology.is_isolated(neighbor_id) {
                    DeliveryStatus::Dropped(DropReason::NeighborIsolated)
                } else if topology.is_edge_blocked(origin_id, neighbor_id) {
                    DeliveryStatus::Dropped(DropReason::EdgeBlocked)
                } else {
                    match topology.node(neighbor_id) {
                        Some(neighbor) => DeliveryStatus::Delivered(neighbor.receive(attestation)),
                        None => DeliveryStatus::Dropped(DropReason::UnknownNeighbor),
                    }
                };
                debug!(
                    "delivery {} -> {}: {:?}",
                    origin_id, neighbor_id, status
                );
                (neighbor_id.clone(), status)
            })
            .collect();

        let mut tracker = self.tracker.lock();
        for (neighbor_id, status) in &deliveries {
            if matches!(status, DeliveryStatus::Delivered(ReceiveOutcome::Accepted)) {
                tracker.record_verification(neighbor_id, attestation);
            }
        }
        drop(tracker);

        let report = PropagationReport { deliveries };
        info!(
            "propagated update from {} (ts {}): {} accepted, {} dropped",
            origin_id,
            attestation.timestamp,
            report.accepted_count(),
            report.dropped_count()
        );
        Ok(report)
    }

    /// Distinct verifiers accumulated for `(origin, timestamp)` across all
    /// propagation passes so far.
    pub fn verified_count(&self, origin_id: &str, timestamp: u64) -> usize {
        self.tracker.lock().verified_count(origin_id, timestamp)
    }

    /// Whether the accumulated verifications for this attestation meet
    /// `required_quorum(n, f)` for the topology's node count.
    pub fn is_trusted(
        &self,
        topology: &Topology,
        attestation: &Attestation,
        faults: i64,
    ) -> Result<bool, QuorumError> {
        let quorum = required_quorum(topology.len() as i64, faults)?;
        let count = self.verified_count(&attestation.origin_id, attestation.timestamp) as i64;
        Ok(count >= quorum)
    }
}
