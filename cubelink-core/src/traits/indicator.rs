//! Status indicator trait

/// The two status LEDs every node carries
///
/// Blinking together means the radio is still coming up, solid means the
/// node is waiting for or holding a link, and a short toggle marks traffic.
pub trait Indicator {
    /// Drive both indicators on or off
    fn set_all(&mut self, on: bool);

    /// Invert both indicators
    fn toggle_all(&mut self);

    /// Mark one unit of link traffic
    fn activity(&mut self);
}
