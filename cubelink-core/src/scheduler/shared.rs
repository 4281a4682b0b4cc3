//! State shared between interrupt handlers and the main loop

use cubelink_protocol::MotorSetpoint;

use crate::clock::{ClockSync, SyncEvent, SyncPolicy};
use crate::config::{ClockPolicyKind, NodeConfig, TimingConfig, WaveformConfig};
use crate::sync::{Semaphore, Shared};
use crate::traits::LinkId;
use crate::waveform::{DutyCycle, MotorCommand, WaveformGenerator};

/// Timer programming for the next tick
///
/// Double-buffered timers latch new values at the end of the period that
/// is already running, so `duty` is evaluated one tick step ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickOutput {
    /// Timer reload value
    pub period: u32,
    /// PWM output
    pub duty: DutyCycle,
}

/// Bitmap of registered peer links, one bit per link id
type LinkMask = [u32; 8];

fn mask_bit(link: LinkId) -> (usize, u32) {
    (usize::from(link.0 / 32), 1 << (link.0 % 32))
}

/// Cross-context node state
///
/// Const-constructible so it can live in a `static`. The tick interrupt
/// calls [`on_tick`](Self::on_tick), the radio callback calls
/// [`on_radio_event`](Self::on_radio_event); everything else belongs to the
/// main loop.
pub struct SharedState {
    clock: Shared<ClockSync<SyncPolicy>>,
    motor: Shared<MotorCommand>,
    waveform: Shared<WaveformGenerator>,
    links: Shared<LinkMask>,
    /// A peer asked to join
    pub join: Semaphore,
    /// A frame waits on the broadcast link
    pub broadcast_ready: Semaphore,
    /// A frame waits on a peer link
    pub frame_ready: Semaphore,
    /// A host command is staged for the peers
    pub send_pending: Semaphore,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    pub const fn new() -> Self {
        Self {
            clock: Shared::new(ClockSync::new(
                SyncPolicy::from_kind(ClockPolicyKind::RateCorrection),
                TimingConfig::DEFAULT,
            )),
            motor: Shared::new(MotorCommand::idle()),
            waveform: Shared::new(WaveformGenerator::new(WaveformConfig::DEFAULT)),
            links: Shared::new([0; 8]),
            join: Semaphore::new(),
            broadcast_ready: Semaphore::new(),
            frame_ready: Semaphore::new(),
            send_pending: Semaphore::new(),
        }
    }

    /// Reset clock, motor and waveform to a node configuration
    pub fn configure(&self, config: &NodeConfig) {
        critical_section::with(|cs| {
            self.clock.update_in(cs, |clock| {
                *clock = ClockSync::new(SyncPolicy::from_kind(config.clock_policy), config.timing)
            });
            self.motor.update_in(cs, |motor| *motor = MotorCommand::idle());
            self.waveform
                .update_in(cs, |gen| *gen = WaveformGenerator::new(config.waveform));
            self.links.update_in(cs, |mask| *mask = [0; 8]);
        });
    }

    /// Tick interrupt entry point
    ///
    /// Advances the clock and computes the PWM output in one critical
    /// section.
    pub fn on_tick(&self) -> TickOutput {
        critical_section::with(|cs| {
            let (period, now, step) = self.clock.update_in(cs, |clock| {
                (clock.tick(), clock.now(), clock.timing().tick_step_s)
            });
            let motor = self.motor.get_in(cs);
            let duty = self.waveform.get_in(cs).duty(period, now + step, &motor);
            TickOutput { period, duty }
        })
    }

    /// Radio callback entry point
    ///
    /// Frame notifications for links that were never registered are
    /// dropped.
    pub fn on_radio_event(&self, link: LinkId) {
        if link.is_join() {
            self.join.signal();
        } else if link.is_broadcast() {
            self.broadcast_ready.signal();
        } else if self.is_registered(link) {
            self.frame_ready.signal();
        }
    }

    /// Accept frame notifications from `link`
    pub fn register_link(&self, link: LinkId) {
        let (word, bit) = mask_bit(link);
        self.links.update(|mask| mask[word] |= bit);
    }

    pub fn is_registered(&self, link: LinkId) -> bool {
        let (word, bit) = mask_bit(link);
        self.links.get()[word] & bit != 0
    }

    /// Feed a hub reference sample to the clock
    pub fn apply_reference(&self, reference_s: f32) -> SyncEvent {
        self.clock.update(|clock| clock.on_reference(reference_s))
    }

    /// Start a new motor command at the current synchronized time
    pub fn apply_setpoint(&self, setpoint: MotorSetpoint) -> MotorCommand {
        critical_section::with(|cs| {
            let command = MotorCommand::from_setpoint(setpoint, self.clock.get_in(cs).now());
            self.motor.update_in(cs, |motor| *motor = command);
            command
        })
    }

    /// Synchronized time (s)
    pub fn now(&self) -> f32 {
        self.clock.get().now()
    }

    pub fn clock(&self) -> ClockSync<SyncPolicy> {
        self.clock.get()
    }

    pub fn motor_command(&self) -> MotorCommand {
        self.motor.get()
    }
}
