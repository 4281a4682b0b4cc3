//! Embassy async tasks
//!
//! All tasks run on the high-priority interrupt executor and play the role
//! of interrupt producers/consumers for the thread-mode main loop.

pub mod host_rx;
pub mod host_tx;
pub mod nwp_rx;
pub mod nwp_tx;

pub use host_rx::host_rx_task;
pub use host_tx::host_tx_task;
pub use nwp_rx::nwp_rx_task;
pub use nwp_tx::nwp_tx_task;
