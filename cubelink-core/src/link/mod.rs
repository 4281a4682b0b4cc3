//! Peer link bookkeeping
//!
//! - [`LinkRegistry`]: fixed table of established peer links
//! - [`Admission`]: how a node acquires peers (hub listens, leaf links)

pub mod admission;
pub mod registry;

pub use admission::Admission;
pub use registry::{LinkRegistry, RegistryFull, SlotIndex};
