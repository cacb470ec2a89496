pub mod attestation;
pub mod node;

pub use attestation::Attestation;
pub use node::{Node, NodeBehavior, ReceiveOutcome};
