//! Node scheduling
//!
//! Splits the node into its two execution contexts:
//!
//! - [`SharedState`]: everything interrupt handlers touch, with the tick
//!   and radio-callback entry points
//! - [`MainLoop`]: the cooperative loop that admits peers, moves frames
//!   between radio and host serial link, and applies received commands

pub mod main_loop;
pub mod shared;

pub use main_loop::{MainLoop, NodeState, SerialBuffer, SERIAL_BUFFER_LEN};
pub use shared::{SharedState, TickOutput};
