//! Fixed-capacity table of peer links
//!
//! Links are appended first-fit and never removed for the rest of the
//! session, so slot indices stay stable and the peer count only grows.

use heapless::Vec;

use crate::traits::{LinkId, RadioError};

/// Position of a peer in the registry
pub type SlotIndex = usize;

/// The registry already holds its maximum number of peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistryFull;

/// Established peer links, in admission order
#[derive(Debug, Clone, Default)]
pub struct LinkRegistry<const N: usize> {
    links: Vec<LinkId, N>,
}

impl<const N: usize> LinkRegistry<N> {
    pub const fn new() -> Self {
        Self { links: Vec::new() }
    }

    /// Admit one peer through `attempt`, retrying until it succeeds
    ///
    /// Returns [`RegistryFull`] without calling `attempt` when no slot is
    /// free. Otherwise blocks until the link primitive yields a link.
    pub fn try_admit_peer<F>(&mut self, mut attempt: F) -> Result<SlotIndex, RegistryFull>
    where
        F: FnMut() -> Result<LinkId, RadioError>,
    {
        if self.is_full() {
            return Err(RegistryFull);
        }

        let link = loop {
            match attempt() {
                Ok(link) => break link,
                Err(e) => trace!("link attempt failed: {}", e),
            }
        };

        let slot = self.links.len();
        self.links.push(link).map_err(|_| RegistryFull)?;
        info!("peer {} admitted in slot {}", link.0, slot);
        Ok(slot)
    }

    pub fn peer_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_full(&self) -> bool {
        self.links.is_full()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn get(&self, slot: SlotIndex) -> Option<LinkId> {
        self.links.get(slot).copied()
    }

    /// Peers in slot order
    pub fn peers(&self) -> impl Iterator<Item = LinkId> + '_ {
        self.links.iter().copied()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}
