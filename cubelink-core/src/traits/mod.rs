//! Hardware abstraction traits
//!
//! These traits define the interface between the node logic and the
//! board-specific radio and indicator implementations. Retry spacing uses
//! `embedded_hal::delay::DelayNs` directly.

pub mod indicator;
pub mod radio;

pub use indicator::Indicator;
pub use radio::{LinkId, Radio, RadioCallback, RadioError};
