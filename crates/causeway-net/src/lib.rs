pub mod linearizability;
pub mod propagation;
pub mod quorum;
pub mod topology;


pub use linearizability::is_linearizable;
pub use propagation::{DeliveryStatus, DropReason, PropagationReport, Propagator};
pub use quorum::{required_quorum, QuorumError, QuorumTracker};
pub use topology::{NodeSpec, Topology, TopologyError};
