//! Peer admission policies
//!
//! A hub waits for join requests and accepts one link per request. A leaf
//! keeps linking to the hub until it holds its single peer.

use crate::config::Role;
use crate::traits::{LinkId, Radio, RadioError};

/// How a node acquires peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Admission {
    /// Accept joining leaves, one per pending join request
    ListenForPeers,
    /// Link to the hub while no link is held
    LinkToHub,
}

impl Admission {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::AccessPoint => Admission::ListenForPeers,
            Role::EndDevice => Admission::LinkToHub,
        }
    }

    /// Whether an admission should be attempted now
    pub fn wants_peer(&self, join_pending: bool, peer_count: usize) -> bool {
        match self {
            Admission::ListenForPeers => join_pending,
            Admission::LinkToHub => peer_count == 0,
        }
    }

    /// One attempt of the underlying link primitive
    pub fn attempt<R: Radio>(&self, radio: &mut R) -> Result<LinkId, RadioError> {
        match self {
            Admission::ListenForPeers => radio.listen_for_link(),
            Admission::LinkToHub => radio.link(),
        }
    }

    /// Whether a successful admission consumes one join request
    pub fn consumes_join(&self) -> bool {
        matches!(self, Admission::ListenForPeers)
    }

    /// Pause between failed attempts (ms)
    pub fn retry_delay_ms(&self) -> u32 {
        match self {
            Admission::ListenForPeers => 0,
            Admission::LinkToHub => 1_000,
        }
    }
}
