//! Period correction policies
//!
//! A policy runs on every reference sample after the first one and decides
//! what reload value the tick timer uses while the clock is synced.

use super::LocalClock;
use crate::config::{ClockPolicyKind, TimingConfig};

/// Steers the tick period toward the reference clock
pub trait ClockPolicy {
    /// Handle a reference sample, before the clock is re-anchored to it
    fn on_sample(&mut self, clock: &mut LocalClock, reference_s: f32, timing: &TimingConfig);

    /// Reload value for the next tick while synced
    fn next_period(&mut self, clock: &mut LocalClock, timing: &TimingConfig) -> u32;
}

/// Scale the period by local time elapsed over reference time elapsed
///
/// A local clock running 2 % fast sees 1.02 s pass for every reference
/// second and lengthens its period by the same ratio. The correction is
/// kept until the next sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateCorrection;

impl ClockPolicy for RateCorrection {
    fn on_sample(&mut self, clock: &mut LocalClock, reference_s: f32, timing: &TimingConfig) {
        let interval = reference_s - clock.time_of_last_sync;
        // Duplicate or out-of-order sample: keep the current correction
        if interval.is_nan() || interval <= 0.0 {
            debug!("reference interval {} ignored", interval);
            return;
        }

        let ratio = clock.time_since_sync / interval;
        clock.period_correction = timing.clamp_period(ratio * timing.nominal_period as f32);
        debug!("rate ratio {}, period {}", ratio, clock.period_correction);
    }

    fn next_period(&mut self, clock: &mut LocalClock, _timing: &TimingConfig) -> u32 {
        clock.period_correction
    }
}

/// Remove the observed offset with one shortened or stretched tick
///
/// A local clock behind the reference gets one shorter tick, one ahead gets
/// one longer tick. The nudge is proportional to the offset and limited so a
/// single tick never moves by more than `nudge_limit_s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OffsetNudge {
    pending: Option<u32>,
}

impl ClockPolicy for OffsetNudge {
    fn on_sample(&mut self, clock: &mut LocalClock, reference_s: f32, timing: &TimingConfig) {
        let error = reference_s - clock.synced_time;
        let nudge = (error * timing.nudge_gain).clamp(-timing.nudge_limit_s, timing.nudge_limit_s);
        let counts = nudge * timing.timer_hz as f32;
        let period = timing.clamp_period(timing.nominal_period as f32 - counts);

        debug!("offset {} s, one-shot period {}", error, period);
        self.pending = Some(period);
    }

    fn next_period(&mut self, clock: &mut LocalClock, timing: &TimingConfig) -> u32 {
        let period = self.pending.take().unwrap_or(timing.nominal_period);
        clock.period_correction = period;
        period
    }
}

/// Policy selected by configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncPolicy {
    Rate(RateCorrection),
    Nudge(OffsetNudge),
}

impl SyncPolicy {
    pub const fn from_kind(kind: ClockPolicyKind) -> Self {
        match kind {
            ClockPolicyKind::RateCorrection => SyncPolicy::Rate(RateCorrection),
            ClockPolicyKind::OffsetNudge => SyncPolicy::Nudge(OffsetNudge { pending: None }),
        }
    }

    pub fn kind(&self) -> ClockPolicyKind {
        match self {
            SyncPolicy::Rate(_) => ClockPolicyKind::RateCorrection,
            SyncPolicy::Nudge(_) => ClockPolicyKind::OffsetNudge,
        }
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self::from_kind(ClockPolicyKind::default())
    }
}

impl ClockPolicy for SyncPolicy {
    fn on_sample(&mut self, clock: &mut LocalClock, reference_s: f32, timing: &TimingConfig) {
        match self {
            SyncPolicy::Rate(p) => p.on_sample(clock, reference_s, timing),
            SyncPolicy::Nudge(p) => p.on_sample(clock, reference_s, timing),
        }
    }

    fn next_period(&mut self, clock: &mut LocalClock, timing: &TimingConfig) -> u32 {
        match self {
            SyncPolicy::Rate(p) => p.next_period(clock, timing),
            SyncPolicy::Nudge(p) => p.next_period(clock, timing),
        }
    }
}
