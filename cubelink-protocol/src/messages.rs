//! Over-the-air messages exchanged between the hub and the leaves
//!
//! Every message starts with a 2-byte little-endian tag:
//!
//! ```text
//! Time sync (hub → all, broadcast link, 6 bytes)
//! ┌──────────┬──────────────────────┐
//! │ FE FF    │ reference time f32 LE│
//! └──────────┴──────────────────────┘
//!
//! Motor command (hub → peers, 2 + 6·n bytes)
//! ┌──────────┬────────────────────────────┬─────┐
//! │ FF FF    │ amp i16 │ freq i16 │ ph i16│ ... │   one triplet per motor
//! └──────────┴────────────────────────────┴─────┘
//!
//! Status report (leaf → hub, 11 bytes)
//! ┌──────────┬───────┬──────────────────┬─────────────┐
//! │ FD FF    │ motor │ synced time f32  │ period u32  │
//! └──────────┴───────┴──────────────────┴─────────────┘
//! ```
//!
//! Triplet values are real values multiplied by [`MOTOR_SCALE`] and stored
//! as 16-bit two's-complement integers, lowest byte first.

use heapless::Vec;

/// Tag of a time-sync message
pub const TIME_SYNC_TAG: u16 = 0xFFFE;

/// Tag of a motor-command message
pub const MOTOR_COMMAND_TAG: u16 = 0xFFFF;

/// Tag of a leaf status report
pub const STATUS_TAG: u16 = 0xFFFD;

/// Size of the tag prefix
pub const TAG_LEN: usize = 2;

/// Exact length of a time-sync message
pub const TIME_SYNC_LEN: usize = TAG_LEN + 4;

/// Exact length of a status report
pub const STATUS_LEN: usize = TAG_LEN + 1 + 4 + 4;

/// Bytes per motor triplet
pub const MOTOR_TRIPLET_LEN: usize = 6;

/// Fixed-point scale of triplet values
pub const MOTOR_SCALE: f32 = 500.0;

/// Maximum motors addressed by a single command
pub const MAX_MOTORS: usize = 6;

/// Largest message of any kind
pub const MAX_MESSAGE_LEN: usize = motor_command_len(MAX_MOTORS);

/// Length of a motor command carrying `num_motors` triplets
pub const fn motor_command_len(num_motors: usize) -> usize {
    TAG_LEN + MOTOR_TRIPLET_LEN * num_motors
}

/// Errors raised while decoding or encoding messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MessageError {
    /// Fewer bytes than a tag
    TooShort,
    /// Tag does not name a known message
    UnknownTag(u16),
    /// Length does not match the tagged layout
    InvalidLength,
    /// Output buffer too small for encoding
    BufferTooSmall,
}

/// Read the tag of a raw message
pub fn tag_of(bytes: &[u8]) -> Result<u16, MessageError> {
    match bytes {
        [lo, hi, ..] => Ok(u16::from_le_bytes([*lo, *hi])),
        _ => Err(MessageError::TooShort),
    }
}

/// One motor's scaled triplet, exactly as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaledTriplet {
    pub amplitude: i16,
    pub frequency: i16,
    pub phase: i16,
}

/// One motor's setpoint in real units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorSetpoint {
    /// Drive amplitude (0 disables the output)
    pub amplitude: f32,
    /// Angular frequency in rad/s
    pub frequency: f32,
    /// Phase offset in rad
    pub phase: f32,
}

impl MotorSetpoint {
    pub const fn new(amplitude: f32, frequency: f32, phase: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase,
        }
    }
}

/// Quantize a real value to its wire integer, saturating at the i16 range
fn quantize(value: f32) -> i16 {
    let scaled = value * MOTOR_SCALE;
    // Round half away from zero without std
    let rounded = if scaled >= 0.0 {
        scaled + 0.5
    } else {
        scaled - 0.5
    };
    // `as` saturates and maps NaN to zero
    rounded as i16
}

fn dequantize(raw: i16) -> f32 {
    raw as f32 / MOTOR_SCALE
}

impl ScaledTriplet {
    /// Quantize a setpoint
    pub fn from_setpoint(setpoint: MotorSetpoint) -> Self {
        Self {
            amplitude: quantize(setpoint.amplitude),
            frequency: quantize(setpoint.frequency),
            phase: quantize(setpoint.phase),
        }
    }

    /// Expand back to real units
    pub fn to_setpoint(self) -> MotorSetpoint {
        MotorSetpoint {
            amplitude: dequantize(self.amplitude),
            frequency: dequantize(self.frequency),
            phase: dequantize(self.phase),
        }
    }

    fn read(bytes: &[u8]) -> Self {
        Self {
            amplitude: i16::from_le_bytes([bytes[0], bytes[1]]),
            frequency: i16::from_le_bytes([bytes[2], bytes[3]]),
            phase: i16::from_le_bytes([bytes[4], bytes[5]]),
        }
    }

    fn write(&self, out: &mut [u8]) {
        out[0..2].copy_from_slice(&self.amplitude.to_le_bytes());
        out[2..4].copy_from_slice(&self.frequency.to_le_bytes());
        out[4..6].copy_from_slice(&self.phase.to_le_bytes());
    }
}

/// Motor command for up to [`MAX_MOTORS`] motors
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotorFrame {
    triplets: Vec<ScaledTriplet, MAX_MOTORS>,
}

impl MotorFrame {
    /// Create an empty command
    pub fn new() -> Self {
        Self {
            triplets: Vec::new(),
        }
    }

    /// Build a command from real-valued setpoints, one per motor index
    pub fn from_setpoints(setpoints: &[MotorSetpoint]) -> Result<Self, MessageError> {
        let mut frame = Self::new();
        for setpoint in setpoints {
            frame.push(ScaledTriplet::from_setpoint(*setpoint))?;
        }
        Ok(frame)
    }

    /// Append the next motor's triplet
    pub fn push(&mut self, triplet: ScaledTriplet) -> Result<(), MessageError> {
        self.triplets
            .push(triplet)
            .map_err(|_| MessageError::InvalidLength)
    }

    /// Number of motors addressed
    pub fn len(&self) -> usize {
        self.triplets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triplets.is_empty()
    }

    /// Raw triplet for a motor index
    pub fn triplet(&self, motor_index: usize) -> Option<ScaledTriplet> {
        self.triplets.get(motor_index).copied()
    }

    /// Real-valued setpoint for a motor index
    pub fn setpoint(&self, motor_index: usize) -> Option<MotorSetpoint> {
        self.triplet(motor_index).map(ScaledTriplet::to_setpoint)
    }

    /// Encoded length of this command
    pub fn encoded_len(&self) -> usize {
        motor_command_len(self.triplets.len())
    }

    fn decode_body(body: &[u8]) -> Result<Self, MessageError> {
        if body.is_empty() || body.len() % MOTOR_TRIPLET_LEN != 0 {
            return Err(MessageError::InvalidLength);
        }
        let mut frame = Self::new();
        for chunk in body.chunks_exact(MOTOR_TRIPLET_LEN) {
            frame.push(ScaledTriplet::read(chunk))?;
        }
        Ok(frame)
    }
}

/// Leaf state reported back to the hub
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    /// Zero-based motor index of the reporting leaf
    pub motor_index: u8,
    /// Leaf's synchronized time in seconds
    pub synced_time: f32,
    /// Timer reload value currently in use
    pub period: u32,
}

/// A decoded over-the-air message
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkMessage {
    /// Hub reference time in seconds
    TimeSync { reference_s: f32 },
    /// Per-motor amplitude/frequency/phase command
    MotorCommand(MotorFrame),
    /// Leaf status report
    Status(StatusReport),
}

impl LinkMessage {
    /// Decode a message from a received payload
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let tag = tag_of(bytes)?;
        let body = &bytes[TAG_LEN..];

        match tag {
            TIME_SYNC_TAG => {
                if bytes.len() != TIME_SYNC_LEN {
                    return Err(MessageError::InvalidLength);
                }
                let reference_s = f32::from_le_bytes([body[0], body[1], body[2], body[3]]);
                Ok(LinkMessage::TimeSync { reference_s })
            }
            MOTOR_COMMAND_TAG => MotorFrame::decode_body(body).map(LinkMessage::MotorCommand),
            STATUS_TAG => {
                if bytes.len() != STATUS_LEN {
                    return Err(MessageError::InvalidLength);
                }
                Ok(LinkMessage::Status(StatusReport {
                    motor_index: body[0],
                    synced_time: f32::from_le_bytes([body[1], body[2], body[3], body[4]]),
                    period: u32::from_le_bytes([body[5], body[6], body[7], body[8]]),
                }))
            }
            other => Err(MessageError::UnknownTag(other)),
        }
    }

    /// Encoded length of this message
    pub fn encoded_len(&self) -> usize {
        match self {
            LinkMessage::TimeSync { .. } => TIME_SYNC_LEN,
            LinkMessage::MotorCommand(frame) => frame.encoded_len(),
            LinkMessage::Status(_) => STATUS_LEN,
        }
    }

    /// Encode into `buffer`, returning the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, MessageError> {
        let len = self.encoded_len();
        if buffer.len() < len {
            return Err(MessageError::BufferTooSmall);
        }

        match self {
            LinkMessage::TimeSync { reference_s } => {
                buffer[..TAG_LEN].copy_from_slice(&TIME_SYNC_TAG.to_le_bytes());
                buffer[TAG_LEN..len].copy_from_slice(&reference_s.to_le_bytes());
            }
            LinkMessage::MotorCommand(frame) => {
                if frame.is_empty() {
                    return Err(MessageError::InvalidLength);
                }
                buffer[..TAG_LEN].copy_from_slice(&MOTOR_COMMAND_TAG.to_le_bytes());
                for (i, triplet) in frame.triplets.iter().enumerate() {
                    let offset = TAG_LEN + MOTOR_TRIPLET_LEN * i;
                    triplet.write(&mut buffer[offset..offset + MOTOR_TRIPLET_LEN]);
                }
            }
            LinkMessage::Status(report) => {
                buffer[..TAG_LEN].copy_from_slice(&STATUS_TAG.to_le_bytes());
                buffer[2] = report.motor_index;
                buffer[3..7].copy_from_slice(&report.synced_time.to_le_bytes());
                buffer[7..11].copy_from_slice(&report.period.to_le_bytes());
            }
        }

        Ok(len)
    }

    /// Encode into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_MESSAGE_LEN>, MessageError> {
        let mut buffer = [0u8; MAX_MESSAGE_LEN];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| MessageError::BufferTooSmall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_sync_layout() {
        let msg = LinkMessage::TimeSync { reference_s: 5.0 };
        let bytes = msg.encode_to_vec().unwrap();

        assert_eq!(bytes.len(), TIME_SYNC_LEN);
        assert_eq!(&bytes[..2], &[0xFE, 0xFF]);
        // 5.0f32 = 0x40A00000, lowest byte first
        assert_eq!(&bytes[2..], &[0x00, 0x00, 0xA0, 0x40]);
        assert_eq!(LinkMessage::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_time_sync_wrong_length_rejected() {
        let bytes = [0xFE, 0xFF, 0x00, 0x00, 0xA0, 0x40, 0x00];
        assert_eq!(LinkMessage::decode(&bytes), Err(MessageError::InvalidLength));
        assert_eq!(
            LinkMessage::decode(&bytes[..5]),
            Err(MessageError::InvalidLength)
        );
    }

    #[test]
    fn test_motor_command_quantization() {
        let frame = MotorFrame::from_setpoints(&[MotorSetpoint::new(2.5, 10.0, 0.0)]).unwrap();
        let bytes = LinkMessage::MotorCommand(frame).encode_to_vec().unwrap();

        assert_eq!(bytes.len(), motor_command_len(1));
        assert_eq!(&bytes[..2], &[0xFF, 0xFF]);

        let decoded = match LinkMessage::decode(&bytes).unwrap() {
            LinkMessage::MotorCommand(frame) => frame,
            other => panic!("unexpected message {:?}", other),
        };
        assert_eq!(
            decoded.triplet(0),
            Some(ScaledTriplet {
                amplitude: 1250,
                frequency: 5000,
                phase: 0
            })
        );

        let setpoint = decoded.setpoint(0).unwrap();
        let step = 1.0 / MOTOR_SCALE;
        assert!((setpoint.amplitude - 2.5).abs() <= step);
        assert!((setpoint.frequency - 10.0).abs() <= step);
        assert!(setpoint.phase.abs() <= step);
    }

    #[test]
    fn test_motor_command_indexing() {
        // Three motors, address the third: offset 6 * 2 + 2 = 14
        let mut bytes = [0u8; 20];
        bytes[0] = 0xFF;
        bytes[1] = 0xFF;
        bytes[14..16].copy_from_slice(&750i16.to_le_bytes());
        bytes[16..18].copy_from_slice(&(-250i16).to_le_bytes());
        bytes[18..20].copy_from_slice(&1571i16.to_le_bytes());

        let frame = match LinkMessage::decode(&bytes).unwrap() {
            LinkMessage::MotorCommand(frame) => frame,
            other => panic!("unexpected message {:?}", other),
        };
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.setpoint(0), Some(MotorSetpoint::default()));

        let third = frame.setpoint(2).unwrap();
        assert_eq!(third.amplitude, 1.5);
        assert_eq!(third.frequency, -0.5);
        assert!((third.phase - 3.142).abs() < 1e-6);
        assert!(frame.setpoint(3).is_none());
    }

    #[test]
    fn test_raw_triplets_survive_reencoding() {
        let raw = [0xFF, 0xFF, 0x01, 0x80, 0xFF, 0x7F, 0x34, 0x12];
        let msg = LinkMessage::decode(&raw).unwrap();
        let reencoded = msg.encode_to_vec().unwrap();
        assert_eq!(&reencoded[..], &raw[..]);
    }

    #[test]
    fn test_quantization_saturates() {
        let triplet = ScaledTriplet::from_setpoint(MotorSetpoint::new(100.0, -100.0, f32::NAN));
        assert_eq!(triplet.amplitude, i16::MAX);
        assert_eq!(triplet.frequency, i16::MIN);
        assert_eq!(triplet.phase, 0);
    }

    #[test]
    fn test_motor_command_bad_length() {
        let bytes = [0xFF, 0xFF, 1, 2, 3];
        assert_eq!(LinkMessage::decode(&bytes), Err(MessageError::InvalidLength));
        assert_eq!(
            LinkMessage::decode(&[0xFF, 0xFF]),
            Err(MessageError::InvalidLength)
        );

        let too_many = [0u8; motor_command_len(MAX_MOTORS + 1)];
        let mut bytes = too_many;
        bytes[0] = 0xFF;
        bytes[1] = 0xFF;
        assert_eq!(LinkMessage::decode(&bytes), Err(MessageError::InvalidLength));
    }

    #[test]
    fn test_unknown_tag_and_short_input() {
        assert_eq!(
            LinkMessage::decode(&[0x34, 0x12, 0, 0]),
            Err(MessageError::UnknownTag(0x1234))
        );
        assert_eq!(LinkMessage::decode(&[0xFE]), Err(MessageError::TooShort));
        assert_eq!(LinkMessage::decode(&[]), Err(MessageError::TooShort));
    }

    #[test]
    fn test_status_report_layout() {
        let report = StatusReport {
            motor_index: 2,
            synced_time: 1.5,
            period: 20_408,
        };
        let bytes = LinkMessage::Status(report).encode_to_vec().unwrap();

        assert_eq!(bytes.len(), STATUS_LEN);
        assert_eq!(&bytes[..3], &[0xFD, 0xFF, 2]);
        assert_eq!(&bytes[7..], &20_408u32.to_le_bytes());
        assert_eq!(
            LinkMessage::decode(&bytes).unwrap(),
            LinkMessage::Status(report)
        );
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let msg = LinkMessage::TimeSync { reference_s: 1.0 };
        let mut buffer = [0u8; 4];
        assert_eq!(msg.encode(&mut buffer), Err(MessageError::BufferTooSmall));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn scaled_triplets_reencode_bit_for_bit(
                raw in proptest::collection::vec(any::<(i16, i16, i16)>(), 1..=MAX_MOTORS)
            ) {
                let mut frame = MotorFrame::new();
                for (amplitude, frequency, phase) in &raw {
                    frame.push(ScaledTriplet { amplitude: *amplitude, frequency: *frequency, phase: *phase }).unwrap();
                }
                let bytes = LinkMessage::MotorCommand(frame.clone()).encode_to_vec().unwrap();
                prop_assert_eq!(bytes.len(), motor_command_len(raw.len()));
                prop_assert_eq!(LinkMessage::decode(&bytes).unwrap(), LinkMessage::MotorCommand(frame));
            }

            #[test]
            fn quantization_error_within_one_step(value in -60.0f32..60.0) {
                let triplet = ScaledTriplet::from_setpoint(MotorSetpoint::new(value, 0.0, 0.0));
                let back = triplet.to_setpoint().amplitude;
                prop_assert!((back - value).abs() <= 1.0 / MOTOR_SCALE);
            }
        }
    }
}
