// NETWORK TOPOLOGY & PARTITION STATE
// The node set, leader designation, and mutable partition membership
//
// SAFETY INVARIANTS:
// 1. Node ids are unique within a topology
// 2. Partition state is topology-global: an isolated node can neither
//    send nor receive; a unidirectional failure blocks one directed edge
// 3. The leader designation is advisory, never enforced

use causeway_clock::NodeId;
use causeway_core::{Node, NodeBehavior};
use causeway_crypto::{KeyedSignatureScheme, SignatureScheme};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while constructing or addressing a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("node {0} already registered")]
    DuplicateNode(NodeId),

    #[error("node {0} not found in topology")]
    UnknownNode(NodeId),
}

/// Declarative description of one node for scenario setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: NodeId,
    pub honest: bool,
    pub neighbors: Vec<NodeId>,
}

impl NodeSpec {
    pub fn new(id: &str, honest: bool, neighbors: &[&str]) -> Self {
        NodeSpec {
            id: id.to_string(),
            honest,
            neighbors: neighbors.iter().map(|n| n.to_string()).collect(),
        }
    }
}

/// The set of nodes, the leader designation, and the partition membership
/// state that governs which links are currently usable.
///
/// Edges are directed: the declared neighbor set gives outbound links, and
/// a link A→B may be blocked while B→A stays usable.
#[derive(Debug)]
pub struct Topology {
    nodes: HashMap<NodeId, Arc<Node>>,
    leader_id: Option<NodeId>,
    isolated: HashSet<NodeId>,
    blocked_edges: HashSet<(NodeId, NodeId)>,
}

impl Topology {
    /// Build a topology with the default keyed signature scheme.
    pub fn new(specs: Vec<NodeSpec>) -> Result<Self, TopologyError> {
        Self::with_scheme(specs, Arc::new(KeyedSignatureScheme::new()))
    }

    /// Build a topology with an injected signing capability.
    pub fn with_scheme(
        specs: Vec<NodeSpec>,
        scheme: Arc<dyn SignatureScheme>,
    ) -> Result<Self, TopologyError> {
        let mut nodes: HashMap<NodeId, Arc<Node>> = HashMap::with_capacity(specs.len());

        for spec in specs {
            if nodes.contains_key(&spec.id) {
                return Err(TopologyError::DuplicateNode(spec.id));
            }
            let behavior = if spec.honest {
                NodeBehavior::Honest
            } else {
                NodeBehavior::Byzantine
            };
            let node = Node::new(spec.id.clone(), behavior, spec.neighbors, Arc::clone(&scheme));
            nodes.insert(spec.id, Arc::new(node));
        }

        Ok(Topology {
            nodes,
            leader_id: None,
            isolated: HashSet::new(),
            blocked_edges: HashSet::new(),
        })
    }

    pub fn node(&self, id: &str) -> Option<&Arc<Node>> {
        self.nodes.get(id)
    }

    /// All node ids, sorted for deterministic reporting.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leader_id(&self) -> Option<&str> {
        self.leader_id.as_deref()
    }

    /// Designate a leader. Advisory only; nothing enforces it.
    pub fn set_leader(&mut self, id: &str) {
        info!("leader set to {}", id);
        self.leader_id = Some(id.to_string());
    }

    /// Mark a node isolated (unable to send AND unable to receive) or
    /// restore it. Unknown ids are inert: the flag only matters once a
    /// node with that id participates in propagation.
    pub fn set_partition(&mut self, id: &str, isolated: bool) {
        if isolated {
            info!("node {} isolated by partition", id);
            self.isolated.insert(id.to_string());
        } else {
            info!("node {} rejoined from partition", id);
            self.isolated.remove(id);
        }
    }

    pub fn is_isolated(&self, id: &str) -> bool {
        self.isolated.contains(id)
    }

    /// Block or unblock a single directed edge, modeling a unidirectional
    /// failure without isolating either endpoint.
    pub fn set_edge_blocked(&mut self, from: &str, to: &str, blocked: bool) {
        let edge = (from.to_string(), to.to_string());
        if blocked {
            info!("edge {} -> {} blocked", from, to);
            self.blocked_edges.insert(edge);
        } else {
            info!("edge {} -> {} unblocked", from, to);
            self.blocked_edges.remove(&edge);
        }
    }

    pub fn is_edge_blocked(&self, from: &str, to: &str) -> bool {
        self.blocked_edges
            .contains(&(from.to_string(), to.to_string()))
    }

    /// Whether `from` declares a directed edge to `to`.
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.nodes
            .get(from)
            .map(|node| node.neighbors().iter().any(|n| n.as_str() == to))
            .unwrap_or(false)
    }

    /// Whether a message can currently traverse the directed link:
    /// the edge is declared, neither endpoint is isolated, and the edge
    /// is not administratively blocked.
    pub fn edge_usable(&self, from: &str, to: &str) -> bool {
        self.has_edge(from, to)
            && !self.is_isolated(from)
            && !self.is_isolated(to)
            && !self.is_edge_blocked(from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_node_specs() -> Vec<NodeSpec> {
        vec![
            NodeSpec::new("A", true, &["B", "C"]),
            NodeSpec::new("B", true, &["A", "C"]),
            NodeSpec::new("C", true, &["A", "B"]),
        ]
    }

    #[test]
    fn test_topology_construction() {
        let topology = Topology::new(three_node_specs()).unwrap();

        assert_eq!(topology.len(), 3);
        assert_eq!(topology.node_ids(), vec!["A", "B", "C"]);
        assert!(topology.node("A").unwrap().is_honest());
    }

    #[test]
    fn test_duplicate_node_id_rejected() {
        let specs = vec![
            NodeSpec::new("A", true, &[]),
            NodeSpec::new("A", true, &[]),
        ];
        assert_eq!(
            Topology::new(specs).unwrap_err(),
            TopologyError::DuplicateNode("A".to_string())
        );
    }

    #[test]
    fn test_leader_designation() {
        let mut topology = Topology::new(three_node_specs()).unwrap();
        assert_eq!(topology.leader_id(), None);

        topology.set_leader("A");
        assert_eq!(topology.leader_id(), Some("A"));
    }

    #[test]
    fn test_partition_toggling() {
        let mut topology = Topology::new(three_node_specs()).unwrap();

        topology.set_partition("B", true);
        assert!(topology.is_isolated("B"));
        assert!(!topology.edge_usable("A", "B"));
        assert!(!topology.edge_usable("B", "A"));

        topology.set_partition("B", false);
        assert!(!topology.is_isolated("B"));
        assert!(topology.edge_usable("A", "B"));
    }

    #[test]
    fn test_directed_edge_blocking_is_one_way() {
        let mut topology = Topology::new(three_node_specs()).unwrap();

        topology.set_edge_blocked("A", "B", true);

        assert!(!topology.edge_usable("A", "B"));
        assert!(topology.edge_usable("B", "A"));

        topology.set_edge_blocked("A", "B", false);
        assert!(topology.edge_usable("A", "B"));
    }

    #[test]
    fn test_edge_usable_requires_declared_edge() {
        let specs = vec![
            NodeSpec::new("A", true, &["B"]),
            NodeSpec::new("B", true, &[]),
        ];
        let topology = Topology::new(specs).unwrap();

        assert!(topology.edge_usable("A", "B"));
        // B never declared an edge back to A
        assert!(!topology.edge_usable("B", "A"));
    }
}
