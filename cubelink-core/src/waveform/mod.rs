//! Sinusoidal PWM waveform generation
//!
//! Every tick the generator turns the synchronized time and the active
//! motor command into a PWM compare value:
//!
//! ```text
//! compare = center + swing · amplitude · sin(frequency · (t − start) + phase)
//! center  = center_fraction    · period
//! swing   = amplitude_fraction · period
//! ```
//!
//! Both terms follow the corrected period, so the pulse width stays a fixed
//! fraction of the tick even while the clock is being steered.

use cubelink_protocol::MotorSetpoint;

use crate::config::WaveformConfig;

/// Active motor command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorCommand {
    /// Drive amplitude; zero (or less) turns the output off
    pub amplitude: f32,
    /// Angular frequency (rad/s)
    pub frequency: f32,
    /// Phase offset (rad)
    pub phase: f32,
    /// Synchronized time the command took effect (s)
    pub start_time: f32,
}

impl MotorCommand {
    /// Output off
    pub const fn idle() -> Self {
        Self {
            amplitude: 0.0,
            frequency: 0.0,
            phase: 0.0,
            start_time: 0.0,
        }
    }

    /// Command from a received setpoint, starting at `start_time`
    pub fn from_setpoint(setpoint: MotorSetpoint, start_time: f32) -> Self {
        Self {
            amplitude: setpoint.amplitude,
            frequency: setpoint.frequency,
            phase: setpoint.phase,
            start_time,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.amplitude > 0.0
    }
}

impl Default for MotorCommand {
    fn default() -> Self {
        Self::idle()
    }
}

/// PWM output for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DutyCycle {
    /// Output held low
    Off,
    /// Compare value within `[0, period]`
    Active(u32),
}

impl DutyCycle {
    /// Value to load into the compare register
    pub fn compare(self) -> u32 {
        match self {
            DutyCycle::Off => 0,
            DutyCycle::Active(compare) => compare,
        }
    }
}

/// Turns synchronized time into PWM compare values
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaveformGenerator {
    config: WaveformConfig,
}

impl WaveformGenerator {
    pub const fn new(config: WaveformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WaveformConfig {
        &self.config
    }

    /// Pulse width at zero offset for `period`
    pub fn center_duty(&self, period: u32) -> f32 {
        self.config.center_fraction * period as f32
    }

    /// Pulse width swing at unit amplitude for `period`
    pub fn duty_amplitude(&self, period: u32) -> f32 {
        self.config.amplitude_fraction * period as f32
    }

    /// Duty for the tick that ends at `synced_time`
    pub fn duty(&self, period: u32, synced_time: f32, command: &MotorCommand) -> DutyCycle {
        if !command.is_enabled() {
            return DutyCycle::Off;
        }

        let theta = command.frequency * (synced_time - command.start_time) + command.phase;
        let offset = self.duty_amplitude(period) * command.amplitude * libm::sinf(theta);
        let compare = self.center_duty(period) + offset;

        if compare.is_nan() || compare <= 0.0 {
            DutyCycle::Active(0)
        } else if compare >= period as f32 {
            DutyCycle::Active(period)
        } else {
            DutyCycle::Active(libm::roundf(compare) as u32)
        }
    }
}

impl Default for WaveformGenerator {
    fn default() -> Self {
        Self::new(WaveformConfig::DEFAULT)
    }
}
