//! Cooperative node main loop
//!
//! One loop serves both roles; the role only selects the admission policy
//! and what happens to received frames. Each [`poll`](MainLoop::poll) runs
//! the following steps in order:
//!
//! 1. admit a peer if the admission policy wants one and a slot is free
//! 2. hub: broadcast a time sample when due; leaf: report status when due
//! 3. send the staged host command to every peer
//! 4. drain one broadcast frame and one frame per peer, then dispatch them
//! 5. hub: stage a complete host command from the serial RX buffer

use embedded_hal::delay::DelayNs;
use heapless::Vec;

use cubelink_protocol::{LinkMessage, StatusReport, MAX_MESSAGE_LEN};

use super::shared::SharedState;
use crate::clock::SyncEvent;
use crate::config::{ConfigError, NodeConfig, Role, MAX_PEERS};
use crate::link::{Admission, LinkRegistry};
use crate::sync::RingBuffer;
use crate::traits::{Indicator, LinkId, Radio, RadioCallback};

/// Capacity of each host serial buffer
pub const SERIAL_BUFFER_LEN: usize = 64;

/// Host serial byte queue
pub type SerialBuffer = RingBuffer<u8, SERIAL_BUFFER_LEN>;

/// Pause between failed radio bring-up attempts (ms)
const INIT_RETRY_MS: u32 = 1_000;

/// Node lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NodeState {
    /// Radio not up yet
    Initializing,
    /// Radio up, no peer yet
    AwaitingPeers,
    /// At least one peer link
    Linked,
}

/// The node's main loop and everything it owns
pub struct MainLoop<'a, R, I, D> {
    shared: &'a SharedState,
    radio: R,
    indicator: I,
    delay: D,
    serial_rx: &'a SerialBuffer,
    serial_tx: &'a SerialBuffer,
    registry: LinkRegistry<MAX_PEERS>,
    admission: Admission,
    config: NodeConfig,
    /// Host command waiting to go out to the peers
    outbound: Option<Vec<u8, MAX_MESSAGE_LEN>>,
    next_broadcast_s: Option<f32>,
    next_status_s: Option<f32>,
    state: NodeState,
}

impl<'a, R, I, D> MainLoop<'a, R, I, D>
where
    R: Radio,
    I: Indicator,
    D: DelayNs,
{
    /// Build the loop and load `config` into the shared state
    ///
    /// Fails without touching the shared state if `config` is invalid.
    pub fn new(
        shared: &'a SharedState,
        radio: R,
        indicator: I,
        delay: D,
        serial_rx: &'a SerialBuffer,
        serial_tx: &'a SerialBuffer,
        config: NodeConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        shared.configure(&config);
        serial_rx.reset();
        serial_tx.reset();

        Ok(Self {
            shared,
            radio,
            indicator,
            delay,
            serial_rx,
            serial_tx,
            registry: LinkRegistry::new(),
            admission: Admission::for_role(config.role),
            config,
            outbound: None,
            next_broadcast_s: None,
            next_status_s: None,
            state: NodeState::Initializing,
        })
    }

    pub fn state(&self) -> NodeState {
        self.state
    }

    pub fn registry(&self) -> &LinkRegistry<MAX_PEERS> {
        &self.registry
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Bring the radio up, retrying until it answers
    ///
    /// Indicators blink while retrying and stay lit once the radio is up.
    pub fn start(&mut self, callback: RadioCallback) {
        self.indicator.set_all(false);
        while let Err(e) = self.radio.init(callback) {
            warn!("radio init failed: {}", e);
            self.indicator.toggle_all();
            self.delay.delay_ms(INIT_RETRY_MS);
        }

        self.indicator.set_all(true);
        self.state = NodeState::AwaitingPeers;
        info!("radio up, waiting for peers");
    }

    /// Run one pass of the main loop
    pub fn poll(&mut self) {
        self.admit_peer();
        self.run_periodic();
        self.send_staged();
        self.drain_radio();
        if self.config.role == Role::AccessPoint {
            self.stage_host_command();
        }
    }

    fn admit_peer(&mut self) {
        let join_pending = self.shared.join.is_pending();
        if self.registry.is_full()
            || !self
                .admission
                .wants_peer(join_pending, self.registry.peer_count())
        {
            return;
        }

        let admission = self.admission;
        let radio = &mut self.radio;
        let indicator = &mut self.indicator;
        let delay = &mut self.delay;

        let admitted = self.registry.try_admit_peer(|| {
            let result = admission.attempt(radio);
            if result.is_err() && admission.retry_delay_ms() > 0 {
                indicator.toggle_all();
                delay.delay_ms(admission.retry_delay_ms());
            }
            result
        });

        if let Ok(slot) = admitted {
            if let Some(link) = self.registry.get(slot) {
                self.shared.register_link(link);
            }
            if admission.consumes_join() {
                self.shared.join.take();
            }
            self.indicator.set_all(true);
            self.state = NodeState::Linked;
        }
    }

    fn run_periodic(&mut self) {
        let now = self.shared.now();
        match self.config.role {
            Role::AccessPoint => {
                if interval_elapsed(
                    &mut self.next_broadcast_s,
                    now,
                    self.config.link.broadcast_interval_s,
                ) {
                    self.broadcast_time(now);
                }
            }
            Role::EndDevice => {
                let Some(hub) = self.registry.get(0) else {
                    return;
                };
                if interval_elapsed(
                    &mut self.next_status_s,
                    now,
                    self.config.link.status_interval_s,
                ) {
                    self.report_status(hub);
                }
            }
        }
    }

    fn broadcast_time(&mut self, now: f32) {
        let message = LinkMessage::TimeSync { reference_s: now };
        match message.encode_to_vec() {
            Ok(bytes) => {
                if let Err(e) = self.radio.send(LinkId::BROADCAST, &bytes) {
                    warn!("time broadcast failed: {}", e);
                }
            }
            Err(e) => warn!("time sync encode failed: {}", e),
        }
    }

    fn report_status(&mut self, hub: LinkId) {
        let clock = self.shared.clock();
        let report = StatusReport {
            motor_index: self.config.motor_index() as u8,
            synced_time: clock.now(),
            period: clock.period(),
        };
        match LinkMessage::Status(report).encode_to_vec() {
            Ok(bytes) => {
                if let Err(e) = self.radio.send(hub, &bytes) {
                    debug!("status report dropped: {}", e);
                }
            }
            Err(e) => warn!("status encode failed: {}", e),
        }
    }

    fn send_staged(&mut self) {
        if !self.shared.send_pending.is_pending() {
            return;
        }

        if let Some(frame) = self.outbound.take() {
            for link in self.registry.peers() {
                // Delivery is best effort
                let _ = self.radio.send(link, &frame);
            }
            trace!("command sent to {} peers", self.registry.peer_count());
        }
        self.shared.send_pending.take();
    }

    fn drain_radio(&mut self) {
        let mut buffer = [0u8; MAX_MESSAGE_LEN];

        if self.shared.broadcast_ready.is_pending() {
            // The count stays pending until the frame is actually read
            match self.radio.receive(LinkId::BROADCAST, &mut buffer) {
                Ok(len) => {
                    self.dispatch(LinkId::BROADCAST, &buffer[..len]);
                    self.shared.broadcast_ready.take();
                }
                Err(e) => trace!("broadcast receive failed: {}", e),
            }
        }

        if self.shared.frame_ready.is_pending() {
            for slot in 0..self.registry.peer_count() {
                let Some(link) = self.registry.get(slot) else {
                    continue;
                };
                if let Ok(len) = self.radio.receive(link, &mut buffer) {
                    self.dispatch(link, &buffer[..len]);
                    self.shared.frame_ready.take();
                }
            }
        }
    }

    fn dispatch(&mut self, link: LinkId, frame: &[u8]) {
        match self.config.role {
            Role::AccessPoint => {
                if link.is_broadcast() {
                    return;
                }
                self.serial_tx.write_slice(frame);
                self.indicator.activity();
            }
            Role::EndDevice => match LinkMessage::decode(frame) {
                Ok(LinkMessage::TimeSync { reference_s }) if link.is_broadcast() => {
                    match self.shared.apply_reference(reference_s) {
                        SyncEvent::Acquired => info!("clock acquired at {}", reference_s),
                        SyncEvent::Tracked { offset_s } => trace!("clock offset {}", offset_s),
                    }
                }
                Ok(LinkMessage::MotorCommand(command)) => {
                    if let Some(setpoint) = command.setpoint(self.config.motor_index()) {
                        let applied = self.shared.apply_setpoint(setpoint);
                        debug!(
                            "motor amplitude {} frequency {} phase {}",
                            applied.amplitude,
                            applied.frequency,
                            applied.phase
                        );
                        self.indicator.activity();
                    }
                }
                Ok(_) => trace!("frame on link {} ignored", link.0),
                Err(e) => trace!("undecodable frame: {}", e),
            },
        }
    }

    fn stage_host_command(&mut self) {
        let len = self.config.command_len();
        if self.serial_rx.available() < len {
            return;
        }

        let mut frame = [0u8; MAX_MESSAGE_LEN];
        if !self.serial_rx.peek_into(&mut frame[..len]) {
            return;
        }
        self.serial_tx.write_slice(&frame[..len]);
        self.outbound = Vec::from_slice(&frame[..len]).ok();
        self.serial_rx.flush(len);
        self.shared.send_pending.signal();
    }
}

/// Check a periodic deadline, rescheduling it when it fires
///
/// The first call only schedules. A deadline further away than one interval
/// (the clock jumped backwards on a sync) is pulled back in.
fn interval_elapsed(next: &mut Option<f32>, now: f32, interval: Option<f32>) -> bool {
    let Some(interval) = interval else {
        return false;
    };

    match *next {
        Some(due) if now >= due => {
            *next = Some(now + interval);
            true
        }
        Some(due) if due - now <= interval => false,
        _ => {
            *next = Some(now + interval);
            false
        }
    }
}
