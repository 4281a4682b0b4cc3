//! Leaf clock synchronization
//!
//! A leaf keeps its own notion of the hub's time, advanced by a fixed step
//! on every timer tick. Reference samples from the hub re-anchor that time
//! and let a [`ClockPolicy`] adjust the tick period so the local rate
//! follows the hub's.
//!
//! ```text
//!            first sample                 later samples
//! Unsynced ───────────────▶ Synced ──────────────────────┐
//!  period = nominal          period = policy(...)  ◀──────┘
//! ```

pub mod policy;

use crate::config::TimingConfig;

pub use policy::{ClockPolicy, OffsetNudge, RateCorrection, SyncPolicy};

/// Synchronization state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncState {
    /// No reference sample seen yet
    Unsynced,
    /// Tracking the hub clock
    Synced,
}

/// Local clock bookkeeping
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalClock {
    /// Best estimate of hub time (s)
    pub synced_time: f32,
    /// Hub time of the first accepted sample, `None` until connected
    pub time_since_connect: Option<f32>,
    /// Hub time of the most recent sample (s)
    pub time_of_last_sync: f32,
    /// Local time elapsed since the most recent sample (s)
    pub time_since_sync: f32,
    /// Reload value in use while synced
    pub period_correction: u32,
}

impl LocalClock {
    pub const fn new(nominal_period: u32) -> Self {
        Self {
            synced_time: 0.0,
            time_since_connect: None,
            time_of_last_sync: 0.0,
            time_since_sync: 0.0,
            period_correction: nominal_period,
        }
    }
}

/// What a reference sample did to the clock
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncEvent {
    /// First sample, clock jumped to the reference
    Acquired,
    /// Later sample; `offset_s` is reference minus local time before the jam
    Tracked { offset_s: f32 },
}

/// Clock synchronization state machine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockSync<P> {
    clock: LocalClock,
    policy: P,
    timing: TimingConfig,
}

impl<P: ClockPolicy> ClockSync<P> {
    pub const fn new(policy: P, timing: TimingConfig) -> Self {
        Self {
            clock: LocalClock::new(timing.nominal_period),
            policy,
            timing,
        }
    }

    pub fn state(&self) -> SyncState {
        match self.clock.time_since_connect {
            Some(_) => SyncState::Synced,
            None => SyncState::Unsynced,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.state() == SyncState::Synced
    }

    /// Synchronized time (s)
    pub fn now(&self) -> f32 {
        self.clock.synced_time
    }

    pub fn clock(&self) -> &LocalClock {
        &self.clock
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Reload value the last tick selected
    pub fn period(&self) -> u32 {
        if self.is_synced() {
            self.clock.period_correction
        } else {
            self.timing.nominal_period
        }
    }

    /// Apply a reference sample from the hub
    pub fn on_reference(&mut self, reference_s: f32) -> SyncEvent {
        if !self.is_synced() {
            self.clock.time_since_connect = Some(reference_s);
            self.clock.time_of_last_sync = reference_s;
            self.clock.synced_time = reference_s;
            self.clock.time_since_sync = 0.0;
            return SyncEvent::Acquired;
        }

        let offset_s = reference_s - self.clock.synced_time;
        self.policy
            .on_sample(&mut self.clock, reference_s, &self.timing);

        self.clock.time_of_last_sync = reference_s;
        self.clock.time_since_sync = 0.0;
        self.clock.synced_time = reference_s;

        SyncEvent::Tracked { offset_s }
    }

    /// Advance by one tick, returning the reload value for the next period
    pub fn tick(&mut self) -> u32 {
        let step = self.timing.tick_step_s;
        self.clock.synced_time += step;

        if self.is_synced() {
            self.clock.time_since_sync += step;
            self.policy.next_period(&mut self.clock, &self.timing)
        } else {
            self.timing.nominal_period
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(step: f32) -> TimingConfig {
        TimingConfig {
            tick_step_s: step,
            ..TimingConfig::DEFAULT
        }
    }

    fn rate(step: f32) -> ClockSync<RateCorrection> {
        ClockSync::new(RateCorrection, timing(step))
    }

    #[test]
    fn test_first_sample_jumps_to_reference() {
        let mut sync = rate(0.01);
        assert_eq!(sync.state(), SyncState::Unsynced);
        assert_eq!(sync.tick(), 20_000);
        // Unsynced ticks still advance time but not the since-sync counter
        assert!((sync.now() - 0.01).abs() < 1e-6);
        assert_eq!(sync.clock().time_since_sync, 0.0);

        assert_eq!(sync.on_reference(5.0), SyncEvent::Acquired);
        assert_eq!(sync.state(), SyncState::Synced);
        assert_eq!(sync.now(), 5.0);
        assert_eq!(sync.clock().time_since_connect, Some(5.0));
        assert_eq!(sync.clock().time_of_last_sync, 5.0);
        assert_eq!(sync.period(), 20_000);
    }

    #[test]
    fn test_matched_rate_keeps_nominal_period() {
        let mut sync = rate(0.01);
        sync.on_reference(5.0);
        for _ in 0..200 {
            sync.tick();
        }
        sync.on_reference(7.0);

        assert_eq!(sync.clock().period_correction, 20_000);
        assert_eq!(sync.now(), 7.0);
        assert_eq!(sync.clock().time_since_sync, 0.0);
    }

    #[test]
    fn test_fast_local_clock_lengthens_period() {
        let mut sync = rate(0.02);
        sync.on_reference(1.0);
        // 50 local ticks = 1.0 s, but only 0.98 s of reference time passed
        for _ in 0..50 {
            sync.tick();
        }
        let event = sync.on_reference(1.98);

        match event {
            SyncEvent::Tracked { offset_s } => assert!((offset_s + 0.02).abs() < 1e-4),
            other => panic!("unexpected event {:?}", other),
        }
        let period = sync.tick();
        assert!((20_407..=20_409).contains(&period), "period {}", period);
    }

    #[test]
    fn test_correction_clamped_to_band() {
        let mut sync = rate(0.02);
        sync.on_reference(0.0);
        for _ in 0..100 {
            sync.tick();
        }
        // Local saw 2 s for 1 s of reference time
        sync.on_reference(1.0);
        assert_eq!(sync.tick(), 22_000);

        for _ in 0..10 {
            sync.tick();
        }
        sync.on_reference(10.0);
        assert_eq!(sync.tick(), 18_000);
    }

    #[test]
    fn test_repeated_reference_keeps_correction() {
        let mut sync = rate(0.02);
        sync.on_reference(3.0);
        for _ in 0..100 {
            sync.tick();
        }
        sync.on_reference(5.0);
        let before = sync.clock().period_correction;

        sync.on_reference(5.0);
        assert_eq!(sync.clock().period_correction, before);
        assert_eq!(sync.now(), 5.0);

        sync.on_reference(4.0);
        assert_eq!(sync.clock().period_correction, before);
        assert_eq!(sync.clock().time_of_last_sync, 4.0);
    }

    #[test]
    fn test_nudge_is_one_shot() {
        let mut sync = ClockSync::new(OffsetNudge::default(), timing(0.02));
        sync.on_reference(1.0);
        for _ in 0..10 {
            sync.tick();
        }
        // Local reads 1.2, reference 1.2002: behind by 0.2 ms
        sync.on_reference(1.2002);

        // nudge = 0.0002 * 2.5 = 0.0005 s = 500 counts shorter
        let nudged = sync.tick();
        assert!((19_495..=19_505).contains(&nudged), "period {}", nudged);
        assert_eq!(sync.tick(), 20_000);
    }

    #[test]
    fn test_nudge_limited() {
        let mut sync = ClockSync::new(OffsetNudge::default(), timing(0.02));
        sync.on_reference(1.0);
        // Local ahead by far more than the limit
        sync.on_reference(0.5);
        assert_eq!(sync.tick(), 21_000);
    }

    #[test]
    fn test_policy_from_config() {
        use crate::config::ClockPolicyKind;

        let mut sync = ClockSync::new(
            SyncPolicy::from_kind(ClockPolicyKind::OffsetNudge),
            timing(0.02),
        );
        assert_eq!(sync.policy().kind(), ClockPolicyKind::OffsetNudge);
        sync.on_reference(2.0);
        sync.on_reference(1.0);
        assert_eq!(sync.tick(), 21_000);
        assert_eq!(sync.tick(), 20_000);
    }
}
