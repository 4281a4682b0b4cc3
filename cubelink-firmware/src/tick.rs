//! Tick timer and motor PWM
//!
//! One PWM slice counts at 1 MHz and both generates the motor pulse and
//! paces the tick: its wrap interrupt advances the synchronized clock and
//! reloads TOP (the corrected period) and the compare value.
//!
//! TOP and CC are double-buffered and latch at the next wrap, so values
//! written here take effect one period after the interrupt. The duty in
//! [`TickOutput`] is already computed for that period; the period
//! correction simply lands one tick later.

use core::cell::RefCell;

use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use cubelink_core::scheduler::TickOutput;

use crate::channels::SHARED;

/// 125 MHz system clock / 125 = 1 MHz timer counts
const PWM_DIVIDER: u8 = 125;

/// PWM slice driving the motor output; also the tick source
static TICK_PWM: Mutex<CriticalSectionRawMutex, RefCell<Option<Pwm<'static>>>> =
    Mutex::new(RefCell::new(None));

fn pwm_config(output: TickOutput) -> PwmConfig {
    let mut config = PwmConfig::default();
    config.divider = PWM_DIVIDER.into();
    config.top = u16::try_from(output.period.saturating_sub(1)).unwrap_or(u16::MAX);
    config.compare_a = u16::try_from(output.duty.compare()).unwrap_or(config.top);
    config
}

/// Start the tick with the output off and the nominal period
pub fn start(mut pwm: Pwm<'static>, nominal_period: u32) {
    pwm.set_config(&pwm_config(TickOutput {
        period: nominal_period,
        duty: cubelink_core::waveform::DutyCycle::Off,
    }));
    pwm.clear_wrapped();
    TICK_PWM.lock(|cell| *cell.borrow_mut() = Some(pwm));

    // Slice 0 wrap interrupt
    embassy_rp::pac::PWM.inte().modify(|w| w.0 |= 1);

    interrupt::PWM_IRQ_WRAP.set_priority(Priority::P0);
    interrupt::PWM_IRQ_WRAP.unpend();
    // SAFETY: the handler only touches TICK_PWM and SHARED, both ready here
    unsafe { interrupt::PWM_IRQ_WRAP.enable() };
}

#[interrupt]
fn PWM_IRQ_WRAP() {
    TICK_PWM.lock(|cell| {
        if let Some(pwm) = cell.borrow_mut().as_mut() {
            pwm.clear_wrapped();
            let output = SHARED.on_tick();
            pwm.set_config(&pwm_config(output));
        }
    });
}
