//! Inter-context communication
//!
//! The thread-mode main loop talks to the high-priority link tasks through
//! these statics. Host serial bytes go through the core ring buffers, which
//! live in `StaticCell`s created in `main`.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use cubelink_core::traits::RadioCallback;
use cubelink_core::SharedState;
use cubelink_protocol::{Frame, NwpEvent};

/// Request frames waiting to go out to the network processor
const NWP_REQUEST_DEPTH: usize = 2;

/// State shared with the tick interrupt and the radio callback
pub static SHARED: SharedState = SharedState::new();

/// Requests for the network processor (main loop → NWP TX task)
pub static NWP_REQUESTS: Channel<CriticalSectionRawMutex, Frame, NWP_REQUEST_DEPTH> =
    Channel::new();

/// Response to the outstanding request (NWP RX task → main loop)
pub static NWP_RESPONSE: Signal<CriticalSectionRawMutex, NwpEvent> = Signal::new();

/// Callback registered by the radio `init` request
pub static RADIO_CALLBACK: Mutex<CriticalSectionRawMutex, Cell<Option<RadioCallback>>> =
    Mutex::new(Cell::new(None));

/// Radio callback installed by the main loop
pub fn on_radio_event(link: cubelink_core::traits::LinkId) {
    SHARED.on_radio_event(link);
}
