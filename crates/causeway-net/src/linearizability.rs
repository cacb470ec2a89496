// LINEARIZABILITY DIAGNOSTIC
// Advisory analysis of whether the current topology could still support a
// single global order of operations. Reporting only; node state is never
// altered.

use crate::topology::Topology;
use causeway_clock::NodeId;
use log::debug;
use std::collections::{HashSet, VecDeque};

/// Returns false when the topology cannot support linearizable operation:
/// - any node is isolated and cannot participate, or
/// - the subgraph reachable from the leader over usable links excludes a
///   live majority of nodes, or
/// - a Byzantine node sits on the only path between two honest partitions.
pub fn is_linearizable(topology: &Topology) -> bool {
    if topology.is_empty() {
        return true;
    }

    let ids = topology.node_ids();

    for id in &ids {
        if topology.is_isolated(id) {
            debug!("not linearizable: node {} is isolated", id);
            return false;
        }
    }

    if let Some(leader) = topology.leader_id() {
        let reached = reachable_from(topology, leader, None);
        let majority = topology.len() / 2 + 1;
        if reached.len() < majority {
            debug!(
                "not linearizable: leader {} reaches {} of {} nodes",
                leader,
                reached.len(),
                topology.len()
            );
            return false;
        }
    }

    // A Byzantine node must never be the sole bridge between honest nodes:
    // every honest pair connected through the full graph must stay
    // connected with each Byzantine node removed.
    let honest: Vec<NodeId> = ids
        .iter()
        .filter(|id| topology.node(id.as_str()).map(|n| n.is_honest()).unwrap_or(false))
        .cloned()
        .collect();
    let byzantine: Vec<NodeId> = ids
        .iter()
        .filter(|id| topology.node(id.as_str()).map(|n| !n.is_honest()).unwrap_or(false))
        .cloned()
        .collect();

    for bridge in &byzantine {
        for source in &honest {
            let full = reachable_from(topology, source, None);
            let without = reachable_from(topology, source, Some(bridge.as_str()));
            for target in &honest {
                if full.contains(target.as_str()) && !without.contains(target.as_str()) {
                    debug!(
                        "not linearizable: byzantine node {} is the only path {} -> {}",
                        bridge, source, target
                    );
                    return false;
                }
            }
        }
    }

    true
}

/// Node ids reachable from `start` over currently usable directed edges,
/// optionally pretending `excluded` has been removed from the graph.
fn reachable_from(topology: &Topology, start: &str, excluded: Option<&str>) -> HashSet<NodeId> {
    let mut reached = HashSet::new();
    let mut queue = VecDeque::new();

    if topology.node(start).is_none() || excluded == Some(start) {
        return reached;
    }

    reached.insert(start.to_string());
    queue.push_back(start.to_string());

    while let Some(current) = queue.pop_front() {
        let Some(node) = topology.node(&current) else {
            continue;
        };
        for neighbor in node.neighbors() {
            if excluded == Some(neighbor.as_str()) || reached.contains(neighbor) {
                continue;
            }
            if !topology.edge_usable(&current, neighbor) {
                continue;
            }
            if topology.node(neighbor).is_some() {
                reached.insert(neighbor.clone());
                queue.push_back(neighbor.clone());
            }
        }
    }

    reached
}
