//! Network processor receive task
//!
//! Parses frames from the NWP UART. Responses complete the main loop's
//! outstanding request; callbacks go straight to the registered radio
//! callback, the same way a radio interrupt would deliver them.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use cubelink_core::traits::LinkId;
use cubelink_protocol::{FrameParser, NwpEvent};

use crate::channels::{NWP_RESPONSE, RADIO_CALLBACK};

const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn nwp_rx_task(mut rx: BufferedUartRx) {
    info!("NWP RX task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match rx.read(&mut buf).await {
            Ok(n) => n,
            Err(e) => {
                warn!("NWP UART read error: {:?}", e);
                parser.reset();
                continue;
            }
        };

        for &byte in &buf[..n] {
            match parser.feed(byte) {
                Ok(Some(frame)) => match NwpEvent::from_frame(&frame) {
                    Ok(event) => handle_event(event),
                    Err(e) => debug!("unexpected NWP frame: {}", e),
                },
                Ok(None) => {}
                Err(e) => debug!("NWP frame error: {}", e),
            }
        }
    }
}

fn handle_event(event: NwpEvent) {
    match event {
        NwpEvent::Callback { link } => {
            trace!("radio callback on link {}", link);
            if let Some(callback) = RADIO_CALLBACK.lock(|cell| cell.get()) {
                callback(LinkId(link));
            }
        }
        response @ NwpEvent::Response { .. } => NWP_RESPONSE.signal(response),
    }
}
