//! Cubelink Wire Protocol
//!
//! This crate defines everything that crosses a wire in a Cubelink mesh:
//!
//! - the over-the-air messages the hub and leaves exchange through the radio
//!   (time sync, motor commands, status reports), see [`messages`];
//! - the UART framing used to reach the radio network processor, see
//!   [`frame`];
//! - the network processor's request/event vocabulary, see [`nwp`].
//!
//! # Link Framing
//!
//! ```text
//! ┌───────┬────────┬──────┬─────────────┬──────────┐
//! │ START │ LENGTH │ TYPE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B   │ 0–48B       │ 1B       │
//! └───────┴────────┴──────┴─────────────┴──────────┘
//! ```
//!
//! Over-the-air messages carry no framing of their own: the radio delivers
//! whole payloads, and the 2-byte tag at offset 0 selects the layout.

#![no_std]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod frame;
pub mod messages;
pub mod nwp;

pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use messages::{
    motor_command_len, LinkMessage, MessageError, MotorFrame, MotorSetpoint, ScaledTriplet,
    StatusReport, MAX_MESSAGE_LEN, MAX_MOTORS, MOTOR_SCALE,
};
pub use nwp::{NwpEvent, NwpRequest, NwpStatus};
