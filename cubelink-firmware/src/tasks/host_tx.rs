//! Host serial transmit task
//!
//! Drains the serial TX ring buffer (command echoes and relayed peer
//! frames) to the host UART.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embassy_time::{Duration, Ticker};
use embedded_io_async::Write;

use cubelink_core::scheduler::SerialBuffer;

const TX_CHUNK: usize = 32;

/// Poll interval while the ring buffer is empty
const IDLE_POLL: Duration = Duration::from_millis(2);

#[embassy_executor::task]
pub async fn host_tx_task(mut tx: BufferedUartTx, serial_tx: &'static SerialBuffer) {
    info!("Host TX task started");

    let mut ticker = Ticker::every(IDLE_POLL);
    let mut chunk = [0u8; TX_CHUNK];

    loop {
        let len = serial_tx.available().min(TX_CHUNK);
        if len == 0 {
            ticker.next().await;
            continue;
        }

        if serial_tx.peek_into(&mut chunk[..len]) {
            if let Err(e) = tx.write_all(&chunk[..len]).await {
                warn!("host UART write error: {:?}", e);
            }
        }
        serial_tx.flush(len);
    }
}
