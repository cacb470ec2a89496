// BYZANTINE QUORUM ARITHMETIC
// The one formula the propagation protocol exists to make checkable
//
// SAFETY INVARIANTS:
// 1. required_quorum is a pure function with no side effects
// 2. Configuration errors (f < 0, f >= n, n <= 0) are surfaced to the
//    caller, never silently defaulted
// 3. Quorum counting is idempotent per distinct verifier: the same
//    verifier counted twice never inflates the count

use causeway_clock::NodeId;
use causeway_core::Attestation;
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

/// Configuration errors in the quorum arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuorumError {
    #[error("fault bound f = {f} must be non-negative")]
    NegativeFaults { f: i64 },

    #[error("node count n = {n} must be positive")]
    NonPositiveNodes { n: i64 },

    #[error("no finite quorum is safe with f = {f} Byzantine nodes out of n = {n}")]
    FaultsExceedNodes { n: i64, f: i64 },
}

/// Minimum number of independent, signature-verified attestations for the
/// same `(origin, timestamp)` that must be collected before the update is
/// safe to trust against up to `f` Byzantine participants out of `n`
/// total: `n - f + 1`.
pub fn required_quorum(n: i64, f: i64) -> Result<i64, QuorumError> {
    if n <= 0 {
        return Err(QuorumError::NonPositiveNodes { n });
    }
    if f < 0 {
        return Err(QuorumError::NegativeFaults { f });
    }
    if f >= n {
        return Err(QuorumError::FaultsExceedNodes { n, f });
    }
    Ok(n - f + 1)
}

/// Accumulates independent verifications per `(origin, timestamp)`.
///
/// Attestations for the same update may arrive out of order or from
/// overlapping sources concurrently; recording is keyed by verifier id,
/// so double-counting a verifier is impossible.
#[derive(Debug, Clone, Default)]
pub struct QuorumTracker {
    verifications: HashMap<(NodeId, u64), BTreeSet<NodeId>>,
}

impl QuorumTracker {
    pub fn new() -> Self {
        QuorumTracker {
            verifications: HashMap::new(),
        }
    }

    /// Record that `verifier_id` independently verified the attestation.
    /// Returns true if this verifier had not been counted before.
    pub fn record_verification(&mut self, verifier_id: &str, attestation: &Attestation) -> bool {
        self.verifications
            .entry((attestation.origin_id.clone(), attestation.timestamp))
            .or_default()
            .insert(verifier_id.to_string())
    }

    /// Number of distinct verifiers recorded for `(origin, timestamp)`.
    pub fn verified_count(&self, origin_id: &str, timestamp: u64) -> usize {
        self.verifications
            .get(&(origin_id.to_string(), timestamp))
            .map(BTreeSet::len)
            .unwrap_or(0)
    }

    /// The distinct verifiers recorded for `(origin, timestamp)`, sorted.
    pub fn verifiers(&self, origin_id: &str, timestamp: u64) -> Vec<NodeId> {
        self.verifications
            .get(&(origin_id.to_string(), timestamp))
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether the accumulated verifications meet `required_quorum(n, f)`.
    pub fn meets_quorum(
        &self,
        origin_id: &str,
        timestamp: u64,
        n: i64,
        f: i64,
    ) -> Result<bool, QuorumError> {
        let quorum = required_quorum(n, f)?;
        Ok(self.verified_count(origin_id, timestamp) as i64 >= quorum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attestation(origin: &str, timestamp: u64) -> Attestation {
        Attestation::new(origin.to_string(), timestamp, Some("sig".to_string()))
    }

    #[test]
    fn test_required_quorum_formula() {
        assert_eq!(required_quorum(7, 2), Ok(6));
        assert_eq!(required_quorum(4, 1), Ok(4));
        assert_eq!(required_quorum(3, 1), Ok(3));
        assert_eq!(required_quorum(1, 0), Ok(2));
    }

    #[test]
    fn test_required_quorum_rejects_negative_faults() {
        assert_eq!(
            required_quorum(3, -1),
            Err(QuorumError::NegativeFaults { f: -1 })
        );
    }

    #[test]
    fn test_required_quorum_rejects_faults_at_or_above_node_count() {
        assert_eq!(
            required_quorum(3, 3),
            Err(QuorumError::FaultsExceedNodes { n: 3, f: 3 })
        );
        assert_eq!(
            required_quorum(3, 4),
            Err(QuorumError::FaultsExceedNodes { n: 3, f: 4 })
        );
    }

    #[test]
    fn test_required_quorum_rejects_non_positive_node_count() {
        assert_eq!(
            required_quorum(0, 0),
            Err(QuorumError::NonPositiveNodes { n: 0 })
        );
    }

    #[test]
    fn test_tracker_counts_distinct_verifiers() {
        let mut tracker = QuorumTracker::new();
        let update = attestation("A", 1);

        assert!(tracker.record_verification("B", &update));
        assert!(tracker.record_verification("C", &update));

        assert_eq!(tracker.verified_count("A", 1), 2);
        assert_eq!(tracker.verifiers("A", 1), vec!["B", "C"]);
    }

    #[test]
    fn test_tracker_is_idempotent_per_verifier() {
        let mut tracker = QuorumTracker::new();
        let update = attestation("A", 1);

        assert!(tracker.record_verification("B", &update));
        assert!(!tracker.record_verification("B", &update));

        assert_eq!(tracker.verified_count("A", 1), 1);
    }

    #[test]
    fn test_tracker_separates_timestamps() {
        let mut tracker = QuorumTracker::new();

        tracker.record_verification("B", &attestation("A", 1));
        tracker.record_verification("B", &attestation("A", 2));

        assert_eq!(tracker.verified_count("A", 1), 1);
        assert_eq!(tracker.verified_count("A", 2), 1);
        assert_eq!(tracker.verified_count("A", 3), 0);
    }

    #[test]
    fn test_meets_quorum() {
        let mut tracker = QuorumTracker::new();
        let update = attestation("A", 1);

        for verifier in ["B", "C", "D", "E", "F", "G"] {
            tracker.record_verification(verifier, &update);
        }

        // n = 7, f = 2 requires 6 verifiers
        assert_eq!(tracker.meets_quorum("A", 1, 7, 2), Ok(true));
        assert_eq!(tracker.meets_quorum("A", 1, 7, 0), Ok(false)); // needs 8
        assert!(tracker.meets_quorum("A", 1, 7, 7).is_err());
    }
}
