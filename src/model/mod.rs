//! # Coverage Model
//!
//! Plain data shared by every stage: node identities of the coverage graph
//! and the solutions read back from a sampler.
//!
//! This module is pure data: no graph state, no matrix, no logging.

pub mod node;
pub mod solution;

pub use node::{DemandPoint, NodeId, NodeKind, Sensor};
pub use solution::Solution;
