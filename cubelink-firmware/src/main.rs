//! Cubelink - Synchronized Actuator Mesh Firmware
//!
//! One binary for both node roles on RP2040 boards. The hub accepts leaves,
//! broadcasts its clock and relays host commands; each leaf tracks the hub
//! clock and drives a phase-locked sinusoidal servo pulse.
//!
//! Execution contexts:
//! - PWM wrap interrupt: clock tick and pulse update
//! - Interrupt executor (SWI_IRQ_1): UART tasks for the host link and the
//!   radio network processor
//! - Thread mode: the node main loop

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, BufferedUart, Config as UartConfig};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use cubelink_core::scheduler::{MainLoop, SerialBuffer};

use crate::channels::{on_radio_event, SHARED};
use crate::leds::StatusLeds;
use crate::radio::NwpRadio;

mod channels;
mod config;
mod leds;
mod radio;
mod tasks;
mod tick;

/// Host link baud rate
const HOST_BAUD: u32 = 57_600;

/// Network processor link baud rate
const NWP_BAUD: u32 = 115_200;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

// UART buffers and host serial rings (must live forever)
static HOST_TX_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static HOST_RX_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static NWP_TX_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static NWP_RX_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static SERIAL_RX: StaticCell<SerialBuffer> = StaticCell::new();
static SERIAL_TX: StaticCell<SerialBuffer> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Cubelink firmware starting...");

    let p = embassy_rp::init(Default::default());
    let config = config::load();

    let serial_rx: &'static SerialBuffer = SERIAL_RX.init(SerialBuffer::new());
    let serial_tx: &'static SerialBuffer = SERIAL_TX.init(SerialBuffer::new());

    // Host link on UART0 (GPIO0 TX, GPIO1 RX)
    let mut host_config = UartConfig::default();
    host_config.baudrate = HOST_BAUD;
    let host = BufferedUart::new(
        p.UART0,
        p.PIN_0,
        p.PIN_1,
        Irqs,
        HOST_TX_BUF.init([0u8; 128]),
        HOST_RX_BUF.init([0u8; 128]),
        host_config,
    );
    let (host_tx, host_rx) = host.split();

    // Network processor on UART1 (GPIO4 TX, GPIO5 RX)
    let mut nwp_config = UartConfig::default();
    nwp_config.baudrate = NWP_BAUD;
    let nwp = BufferedUart::new(
        p.UART1,
        p.PIN_4,
        p.PIN_5,
        Irqs,
        NWP_TX_BUF.init([0u8; 128]),
        NWP_RX_BUF.init([0u8; 128]),
        nwp_config,
    );
    let (nwp_tx, nwp_rx) = nwp.split();

    info!("UARTs initialized");

    // Link tasks run above thread mode so radio requests complete while
    // the main loop spins on them
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let spawner_high = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    spawner_high
        .spawn(tasks::host_rx_task(host_rx, serial_rx))
        .unwrap();
    spawner_high
        .spawn(tasks::host_tx_task(host_tx, serial_tx))
        .unwrap();
    spawner_high.spawn(tasks::nwp_rx_task(nwp_rx)).unwrap();
    spawner_high.spawn(tasks::nwp_tx_task(nwp_tx)).unwrap();

    // Status LEDs: onboard GPIO25 and GPIO15
    let leds = StatusLeds::new(
        Output::new(p.PIN_15, Level::Low),
        Output::new(p.PIN_25, Level::Low),
    );

    // config::load only returns validated configurations
    let mut main_loop = MainLoop::new(
        &SHARED, NwpRadio, leds, Delay, serial_rx, serial_tx, config,
    )
    .unwrap();

    // Motor pulse on GPIO16 (PWM slice 0, channel A) also paces the tick
    let pwm = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, PwmConfig::default());
    tick::start(pwm, config.timing.nominal_period);
    info!("Tick running at period {}", config.timing.nominal_period);

    main_loop.start(on_radio_event);
    info!("Radio up, entering main loop");

    loop {
        main_loop.poll();
        yield_now().await;
    }
}
