//! Pure state transitions of an assembly attempt.

mod state;

pub use state::{AssemblyState, Partition, PendingFragment, Resolution, Snapshot};
