// VECTOR CLOCKS FOR CAUSAL ORDERING
// Per-node counter maps establishing a happens-before partial order
//
// INVARIANTS:
// 1. A node's own counter strictly increases on every local event
// 2. Counters for other nodes only move upward via merge, never backward
// 3. An absent node id reads as zero, never as an error
// 4. compare(A, B) and compare(B, A) are exact inverses

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier for a node in the topology.
pub type NodeId = String;

/// Result of comparing two vector clocks under the causal partial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CausalOrder {
    /// Every coordinate is <= the other's and at least one is strictly less
    Before,

    /// Every coordinate is >= the other's and at least one is strictly greater
    After,

    /// Every node id present in either clock has equal counters in both
    Equal,

    /// Neither clock dominates the other
    Concurrent,
}

impl CausalOrder {
    /// The order that the swapped comparison must return.
    pub fn inverse(self) -> CausalOrder {
        match self {
            CausalOrder::Before => CausalOrder::After,
            CausalOrder::After => CausalOrder::Before,
            CausalOrder::Equal => CausalOrder::Equal,
            CausalOrder::Concurrent => CausalOrder::Concurrent,
        }
    }
}

impl fmt::Display for CausalOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CausalOrder::Before => write!(f, "BEFORE"),
            CausalOrder::After => write!(f, "AFTER"),
            CausalOrder::Equal => write!(f, "EQUAL"),
            CausalOrder::Concurrent => write!(f, "CONCURRENT"),
        }
    }
}

/// Sparse causal timestamp: node id mapped to a monotonically
/// non-decreasing counter.
///
/// Each clock is owned exclusively by one node and mutated only through
/// that node's own operations; remote observations arrive as data and are
/// folded in through `update`. Counters are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorClock {
    timestamps: BTreeMap<NodeId, u64>,
}

impl VectorClock {
    /// Create an empty clock (all counters implicitly zero).
    pub fn new() -> Self {
        VectorClock {
            timestamps: BTreeMap::new(),
        }
    }

    /// Advance the owning node's counter by one local event.
    pub fn increment(&mut self, node_id: &str) {
        *self.timestamps.entry(node_id.to_string()).or_insert(0) += 1;
    }

    /// Merge a remote observation for `node_id`.
    ///
    /// Takes the max of the stored and observed counters; a counter never
    /// moves backward.
    pub fn update(&mut self, node_id: &str, timestamp: u64) {
        let entry = self.timestamps.entry(node_id.to_string()).or_insert(0);
        *entry = (*entry).max(timestamp);
    }

    /// Counter for `node_id`. Absence is zero, not an error.
    pub fn get(&self, node_id: &str) -> u64 {
        self.timestamps.get(node_id).copied().unwrap_or(0)
    }

    /// Compare under the standard vector-clock partial order, treating
    /// absent node ids as zero in both clocks.
    pub fn compare(&self, other: &VectorClock) -> CausalOrder {
        let mut behind = false;
        let mut ahead = false;

        for id in self.timestamps.keys().chain(other.timestamps.keys()) {
            let ours = self.get(id);
            let theirs = other.get(id);
            if ours < theirs {
                behind = true;
            } else if ours > theirs {
                ahead = true;
            }
        }

        match (behind, ahead) {
            (false, false) => CausalOrder::Equal,
            (true, false) => CausalOrder::Before,
            (false, true) => CausalOrder::After,
            (true, true) => CausalOrder::Concurrent,
        }
    }

    /// Read-only copy of all recorded counters, for reporting.
    pub fn snapshot(&self) -> BTreeMap<NodeId, u64> {
        self.timestamps.clone()
    }

    /// Number of node ids with a recorded counter.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether no counter has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn clock_of(entries: &[(&str, u64)]) -> VectorClock {
        let mut clock = VectorClock::new();
        for (id, ts) in entries {
            clock.update(id, *ts);
        }
        clock
    }

    #[test]
    fn test_absent_node_reads_zero() {
        let clock = VectorClock::new();
        assert_eq!(clock.get("A"), 0);
        assert!(clock.is_empty());
    }

    #[test]
    fn test_increment_advances_by_exactly_one() {
        let mut clock = clock_of(&[("A", 3), ("B", 7)]);

        clock.increment("A");

        assert_eq!(clock.get("A"), 4);
        assert_eq!(clock.get("B"), 7);
    }

    #[test]
    fn test_increment_starts_from_implicit_zero() {
        let mut clock = VectorClock::new();
        clock.increment("A");
        assert_eq!(clock.get("A"), 1);
    }

    #[test]
    fn test_update_never_moves_backward() {
        let mut clock = clock_of(&[("A", 10)]);

        clock.update("A", 4);
        assert_eq!(clock.get("A"), 10);

        clock.update("A", 12);
        assert_eq!(clock.get("A"), 12);
    }

    #[test]
    fn test_compare_equal_on_self() {
        let clock = clock_of(&[("A", 1), ("B", 2)]);
        assert_eq!(clock.compare(&clock), CausalOrder::Equal);
    }

    #[test]
    fn test_compare_equal_treats_absent_as_zero() {
        let a = clock_of(&[("A", 1), ("B", 0)]);
        let b = clock_of(&[("A", 1)]);
        assert_eq!(a.compare(&b), CausalOrder::Equal);
    }

    #[test]
    fn test_compare_before_and_after() {
        let earlier = clock_of(&[("A", 1), ("B", 2)]);
        let later = clock_of(&[("A", 2), ("B", 2)]);

        assert_eq!(earlier.compare(&later), CausalOrder::Before);
        assert_eq!(later.compare(&earlier), CausalOrder::After);
    }

    #[test]
    fn test_compare_dominance_via_absent_coordinate() {
        let a = clock_of(&[("A", 1)]);
        let b = clock_of(&[("A", 1), ("C", 3)]);

        assert_eq!(a.compare(&b), CausalOrder::Before);
        assert_eq!(b.compare(&a), CausalOrder::After);
    }

    #[test]
    fn test_compare_concurrent() {
        let a = clock_of(&[("A", 2), ("B", 1)]);
        let b = clock_of(&[("A", 1), ("B", 2)]);

        assert_eq!(a.compare(&b), CausalOrder::Concurrent);
        assert_eq!(b.compare(&a), CausalOrder::Concurrent);
    }

    #[test]
    fn test_before_is_transitive() {
        let a = clock_of(&[("A", 1)]);
        let b = clock_of(&[("A", 2)]);
        let c = clock_of(&[("A", 2), ("B", 1)]);

        assert_eq!(a.compare(&b), CausalOrder::Before);
        assert_eq!(b.compare(&c), CausalOrder::Before);
        assert_eq!(a.compare(&c), CausalOrder::Before);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut clock = clock_of(&[("A", 1)]);
        let snapshot = clock.snapshot();

        clock.increment("A");

        assert_eq!(snapshot.get("A"), Some(&1));
        assert_eq!(clock.get("A"), 2);
    }

    #[test]
    fn test_serde_round_trip() {
        let clock = clock_of(&[("A", 1), ("B", 5)]);
        let json = serde_json::to_string(&clock).unwrap();
        let back: VectorClock = serde_json::from_str(&json).unwrap();
        assert_eq!(clock, back);
    }

    fn arb_clock() -> impl Strategy<Value = VectorClock> {
        proptest::collection::btree_map("[A-E]", 0u64..20, 0..5).prop_map(|entries| {
            let mut clock = VectorClock::new();
            for (id, ts) in entries {
                clock.update(&id, ts);
            }
            clock
        })
    }

    proptest! {
        #[test]
        fn prop_compare_is_reflexive(a in arb_clock()) {
            prop_assert_eq!(a.compare(&a), CausalOrder::Equal);
        }

        #[test]
        fn prop_compare_inverts_on_swap(a in arb_clock(), b in arb_clock()) {
            prop_assert_eq!(a.compare(&b), b.compare(&a).inverse());
        }

        #[test]
        fn prop_update_is_monotonic(a in arb_clock(), ts in 0u64..40) {
            let mut updated = a.clone();
            updated.update("C", ts);
            prop_assert!(updated.get("C") >= ts);
            prop_assert!(updated.get("C") >= a.get("C"));
        }

        #[test]
        fn prop_increment_leaves_other_entries_unchanged(a in arb_clock()) {
            let mut bumped = a.clone();
            bumped.increment("A");
            prop_assert_eq!(bumped.get("A"), a.get("A") + 1);
            for (id, ts) in a.snapshot() {
                if id != "A" {
                    prop_assert_eq!(bumped.get(&id), ts);
                }
            }
        }

        #[test]
        fn prop_merged_clock_dominates_both(a in arb_clock(), b in arb_clock()) {
            let mut merged = a.clone();
            for (id, ts) in b.snapshot() {
                merged.update(&id, ts);
            }
            let vs_a = merged.compare(&a);
            let vs_b = merged.compare(&b);
            prop_assert!(vs_a == CausalOrder::After || vs_a == CausalOrder::Equal);
            prop_assert!(vs_b == CausalOrder::After || vs_b == CausalOrder::Equal);
        }
    }
}
