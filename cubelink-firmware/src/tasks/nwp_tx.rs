//! Network processor transmit task
//!
//! Encodes queued request frames onto the NWP UART.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use cubelink_protocol::MAX_FRAME_SIZE;

use crate::channels::NWP_REQUESTS;

#[embassy_executor::task]
pub async fn nwp_tx_task(mut tx: BufferedUartTx) {
    info!("NWP TX task started");

    let mut buf = [0u8; MAX_FRAME_SIZE];
    loop {
        let frame = NWP_REQUESTS.receive().await;
        match frame.encode(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write_all(&buf[..len]).await {
                    warn!("NWP UART write error: {:?}", e);
                }
            }
            Err(e) => warn!("NWP frame encode failed: {}", e),
        }
    }
}
