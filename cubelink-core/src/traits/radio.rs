//! Radio transport trait
//!
//! The radio stack (MAC, RF, power management) lives outside this crate.
//! Nodes reach it only through these few link-level primitives.

/// Link identifier assigned by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkId(pub u8);

impl LinkId {
    /// Reported in a callback when a new peer asks to join
    pub const JOIN: LinkId = LinkId(0x00);
    /// The broadcast link every leaf listens on
    pub const BROADCAST: LinkId = LinkId(0xFF);

    pub fn is_join(self) -> bool {
        self == Self::JOIN
    }

    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }
}

/// Errors reported by the radio stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// No answer in time
    Timeout,
    /// Link unknown or not established
    NoLink,
    /// No frame waiting on the link
    NoFrame,
    /// Request rejected as malformed
    BadParam,
    /// Any other stack failure
    Failure,
}

/// Callback invoked by the radio stack in interrupt context
///
/// Receives the link a frame arrived on, [`LinkId::JOIN`] for a join
/// request. It must only record the event; reading the frame is done
/// later from the main loop.
pub type RadioCallback = fn(LinkId);

/// Link-level radio primitives
pub trait Radio {
    /// Bring the stack up and register the frame callback
    fn init(&mut self, callback: RadioCallback) -> Result<(), RadioError>;

    /// Send one frame on a link
    fn send(&mut self, link: LinkId, payload: &[u8]) -> Result<(), RadioError>;

    /// Fetch one received frame, returning its length
    fn receive(&mut self, link: LinkId, buffer: &mut [u8]) -> Result<usize, RadioError>;

    /// Accept one joining peer (hub side)
    fn listen_for_link(&mut self) -> Result<LinkId, RadioError>;

    /// Link to the hub (leaf side)
    fn link(&mut self) -> Result<LinkId, RadioError>;
}
