//! Configuration types
//!
//! Board-agnostic node configuration, stored as postcard binary data and
//! baked into the firmware image at build time.

pub mod types;

pub use types::*;
