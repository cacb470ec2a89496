pub mod clock;

pub use clock::{CausalOrder, NodeId, VectorClock};
