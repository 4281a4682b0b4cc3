//! Board-agnostic core logic for Cubelink mesh nodes
//!
//! This crate contains all node logic that does not depend on specific
//! hardware:
//!
//! - Interrupt-safe buffering and signalling (ring buffer, semaphores)
//! - Peer link registry and admission policies
//! - Clock synchronization to the hub reference time
//! - Sinusoidal PWM waveform generation
//! - Shared interrupt state and the cooperative main loop
//! - Radio and indicator abstraction traits
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod clock;
pub mod config;
pub mod link;
pub mod scheduler;
pub mod sync;
pub mod traits;
pub mod waveform;

pub use clock::{ClockSync, SyncPolicy, SyncState};
pub use config::NodeConfig;
pub use scheduler::{MainLoop, SharedState};
