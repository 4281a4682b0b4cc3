//! Host serial receive task
//!
//! Moves bytes from the host UART into the serial RX ring buffer. Command
//! framing is left to the main loop.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use cubelink_core::scheduler::SerialBuffer;

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

#[embassy_executor::task]
pub async fn host_rx_task(mut rx: BufferedUartRx, serial_rx: &'static SerialBuffer) {
    info!("Host RX task started");

    let mut buf = [0u8; RX_BUF_SIZE];
    loop {
        match rx.read(&mut buf).await {
            Ok(n) => {
                trace!("host RX: {} bytes", n);
                serial_rx.write_slice(&buf[..n]);
            }
            Err(e) => warn!("host UART read error: {:?}", e),
        }
    }
}
