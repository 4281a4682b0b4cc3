//! Configuration type definitions
//!
//! One [`NodeConfig`] describes a node: its role in the mesh, which motor it
//! drives, how it tracks the hub clock and how it shapes the PWM waveform.

use cubelink_protocol::MAX_MOTORS;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Current configuration layout version
pub const CONFIG_VERSION: u8 = 1;

/// Peer links a hub keeps (one per motor)
pub const MAX_PEERS: usize = MAX_MOTORS;

/// Node role in the mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Role {
    /// Hub: accepts leaves, broadcasts time, relays host commands
    AccessPoint,
    /// Leaf: tracks hub time and drives one motor
    #[default]
    EndDevice,
}

/// How a leaf steers its tick period toward the hub clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ClockPolicyKind {
    /// Scale the period by the observed rate ratio, every tick
    #[default]
    RateCorrection,
    /// Shorten or stretch a single tick by the observed offset
    OffsetNudge,
}

/// Tick timer parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimingConfig {
    /// Timer reload value for one nominal tick (counts)
    pub nominal_period: u32,
    /// Timer count rate (Hz)
    pub timer_hz: u32,
    /// Synchronized time added per tick (s)
    pub tick_step_s: f32,
    /// Allowed period deviation from nominal, as a fraction
    pub period_band: f32,
    /// Offset-nudge gain
    pub nudge_gain: f32,
    /// Largest single offset nudge (s)
    pub nudge_limit_s: f32,
}

impl TimingConfig {
    pub const DEFAULT: Self = Self {
        nominal_period: 20_000,
        timer_hz: 1_000_000,
        tick_step_s: 0.02,
        period_band: 0.1,
        nudge_gain: 2.5,
        nudge_limit_s: 0.001,
    };

    /// Smallest period the clock may select
    pub fn min_period(&self) -> u32 {
        libm::roundf(self.nominal_period as f32 * (1.0 - self.period_band)) as u32
    }

    /// Largest period the clock may select
    pub fn max_period(&self) -> u32 {
        libm::roundf(self.nominal_period as f32 * (1.0 + self.period_band)) as u32
    }

    /// Clamp a candidate period into the allowed band
    pub fn clamp_period(&self, candidate: f32) -> u32 {
        let lo = self.min_period();
        let hi = self.max_period();
        if candidate.is_nan() {
            return self.nominal_period;
        }
        let rounded = libm::roundf(candidate);
        if rounded <= lo as f32 {
            lo
        } else if rounded >= hi as f32 {
            hi
        } else {
            rounded as u32
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// PWM pulse shaping, as fractions of the tick period
///
/// The defaults give a 1500 ± 500 µs servo pulse at a 20 ms period.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaveformConfig {
    /// Pulse width at zero offset
    pub center_fraction: f32,
    /// Pulse width swing at unit amplitude
    pub amplitude_fraction: f32,
}

impl WaveformConfig {
    pub const DEFAULT: Self = Self {
        center_fraction: 0.075,
        amplitude_fraction: 0.025,
    };
}

impl Default for WaveformConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Mesh traffic parameters
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LinkConfig {
    /// Motors addressed by each command frame
    pub num_motors: u8,
    /// Hub time-sync broadcast interval (s), `None` to disable
    pub broadcast_interval_s: Option<f32>,
    /// Leaf status report interval (s), `None` to disable
    pub status_interval_s: Option<f32>,
}

impl LinkConfig {
    pub const DEFAULT: Self = Self {
        num_motors: 3,
        broadcast_interval_s: Some(2.0),
        status_interval_s: Some(5.0),
    };
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Complete node configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeConfig {
    /// Layout version, must equal [`CONFIG_VERSION`]
    pub version: u8,
    pub role: Role,
    /// Leaf address, 1-based; selects the motor triplet
    pub device_address: u8,
    pub clock_policy: ClockPolicyKind,
    pub timing: TimingConfig,
    pub waveform: WaveformConfig,
    pub link: LinkConfig,
}

impl NodeConfig {
    pub const DEFAULT: Self = Self {
        version: CONFIG_VERSION,
        role: Role::EndDevice,
        device_address: 1,
        clock_policy: ClockPolicyKind::RateCorrection,
        timing: TimingConfig::DEFAULT,
        waveform: WaveformConfig::DEFAULT,
        link: LinkConfig::DEFAULT,
    };

    /// Zero-based motor triplet this node drives
    pub fn motor_index(&self) -> usize {
        self.device_address.saturating_sub(1) as usize
    }

    /// Length of one host command frame
    pub fn command_len(&self) -> usize {
        cubelink_protocol::motor_command_len(self.link.num_motors as usize)
    }

    /// Check every field for a usable value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::VersionMismatch);
        }

        let t = &self.timing;
        if t.nominal_period == 0 || t.timer_hz == 0 {
            return Err(ConfigError::InvalidPeriod);
        }
        if t.tick_step_s.is_nan() || t.tick_step_s <= 0.0 {
            return Err(ConfigError::InvalidTickStep);
        }
        if t.period_band.is_nan() || t.period_band <= 0.0 || t.period_band >= 1.0 {
            return Err(ConfigError::InvalidBand);
        }
        let non_negative = |x: f32| x >= 0.0;
        if !non_negative(t.nudge_gain) || !non_negative(t.nudge_limit_s) {
            return Err(ConfigError::InvalidNudge);
        }

        let w = &self.waveform;
        let in_unit = |f: f32| (0.0..=1.0).contains(&f);
        if !in_unit(w.center_fraction)
            || !in_unit(w.amplitude_fraction)
            || w.center_fraction + w.amplitude_fraction > 1.0
        {
            return Err(ConfigError::InvalidWaveform);
        }

        let motors = self.link.num_motors as usize;
        if motors == 0 || motors > MAX_MOTORS {
            return Err(ConfigError::InvalidMotorCount);
        }
        if self.role == Role::EndDevice
            && (self.device_address == 0 || self.device_address as usize > motors)
        {
            return Err(ConfigError::InvalidAddress);
        }

        let positive = |interval: Option<f32>| interval.map_or(true, |s| s > 0.0);
        if !positive(self.link.broadcast_interval_s) || !positive(self.link.status_interval_s) {
            return Err(ConfigError::InvalidInterval);
        }

        Ok(())
    }

    /// Decode and validate a postcard-encoded configuration
    #[cfg(feature = "serde")]
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: NodeConfig =
            postcard::from_bytes(bytes).map_err(|_| ConfigError::Deserialize)?;
        config.validate()?;
        Ok(config)
    }

    /// Encode into `buffer`, returning the used prefix
    #[cfg(feature = "serde")]
    pub fn to_postcard<'a>(&self, buffer: &'a mut [u8]) -> Result<&'a mut [u8], ConfigError> {
        postcard::to_slice(self, buffer).map_err(|_| ConfigError::Serialize)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configuration problems
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Layout version does not match this firmware
    VersionMismatch,
    /// Zero period or timer rate
    InvalidPeriod,
    /// Tick step not positive
    InvalidTickStep,
    /// Period band outside (0, 1)
    InvalidBand,
    /// Negative nudge gain or limit
    InvalidNudge,
    /// Pulse fractions outside the period
    InvalidWaveform,
    /// Motor count outside 1..=MAX_MOTORS
    InvalidMotorCount,
    /// Leaf address does not name a motor
    InvalidAddress,
    /// Non-positive traffic interval
    InvalidInterval,
    /// Postcard decode failed
    Deserialize,
    /// Postcard encode failed
    Serialize,
}
