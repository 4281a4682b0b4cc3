//! Request and event messages for the radio network processor (NWP)
//!
//! The host never touches the radio directly. It sends one request frame at
//! a time and waits for the matching response; link callbacks arrive
//! unsolicited.
//!
//! Requests (host → NWP):
//! - 0x01 INIT: no payload
//! - 0x02 SEND: [link, data...]
//! - 0x03 RECEIVE: [link]
//! - 0x04 LINK: no payload (leaf links to the hub)
//! - 0x05 LISTEN: no payload (hub accepts one joining leaf)
//!
//! Events (NWP → host):
//! - 0x81 RESPONSE: [request, status, link, data...], where `request` is
//!   the type of the request being answered
//! - 0x82 CALLBACK: [link]

use heapless::Vec;

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

/// Request type identifiers
pub mod kind {
    pub const INIT: u8 = 0x01;
    pub const SEND: u8 = 0x02;
    pub const RECEIVE: u8 = 0x03;
    pub const LINK: u8 = 0x04;
    pub const LISTEN: u8 = 0x05;

    pub const RESPONSE: u8 = 0x81;
    pub const CALLBACK: u8 = 0x82;
}

/// Largest data block carried in a response
pub const MAX_RESPONSE_DATA: usize = MAX_PAYLOAD_SIZE - 3;

/// Completion status reported by the network processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NwpStatus {
    Success = 0x00,
    Timeout = 0x01,
    NoLink = 0x02,
    NoFrame = 0x03,
    BadParam = 0x04,
    Failure = 0xFF,
}

impl NwpStatus {
    /// Decode a status byte; unknown values are treated as failures
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => NwpStatus::Success,
            0x01 => NwpStatus::Timeout,
            0x02 => NwpStatus::NoLink,
            0x03 => NwpStatus::NoFrame,
            0x04 => NwpStatus::BadParam,
            _ => NwpStatus::Failure,
        }
    }

    pub fn to_byte(self) -> u8 {
        self as u8
    }

    pub fn is_success(self) -> bool {
        self == NwpStatus::Success
    }
}

/// Request sent to the network processor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NwpRequest<'a> {
    Init,
    Send { link: u8, data: &'a [u8] },
    Receive { link: u8 },
    Link,
    Listen,
}

impl NwpRequest<'_> {
    /// Frame type of this request
    pub fn kind(&self) -> u8 {
        match self {
            NwpRequest::Init => kind::INIT,
            NwpRequest::Send { .. } => kind::SEND,
            NwpRequest::Receive { .. } => kind::RECEIVE,
            NwpRequest::Link => kind::LINK,
            NwpRequest::Listen => kind::LISTEN,
        }
    }

    /// Build the link frame for this request
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match *self {
            NwpRequest::Init => Ok(Frame::empty(kind::INIT)),
            NwpRequest::Send { link, data } => Frame::with_header(kind::SEND, &[link], data),
            NwpRequest::Receive { link } => Frame::new(kind::RECEIVE, &[link]),
            NwpRequest::Link => Ok(Frame::empty(kind::LINK)),
            NwpRequest::Listen => Ok(Frame::empty(kind::LISTEN)),
        }
    }
}

/// Unsolicited or solicited message from the network processor
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NwpEvent {
    /// Completion of a request
    Response {
        /// Type of the request this answers
        request: u8,
        status: NwpStatus,
        link: u8,
        data: Vec<u8, MAX_RESPONSE_DATA>,
    },
    /// Frame-arrival or join notification for a link
    Callback { link: u8 },
}

impl NwpEvent {
    /// Whether this is the response to a request of type `request_kind`
    pub fn answers(&self, request_kind: u8) -> bool {
        matches!(self, NwpEvent::Response { request, .. } if *request == request_kind)
    }

    /// Interpret a parsed link frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match (frame.kind, frame.payload.as_slice()) {
            (kind::RESPONSE, [request, status, link, data @ ..]) => Ok(NwpEvent::Response {
                request: *request,
                status: NwpStatus::from_byte(*status),
                link: *link,
                data: Vec::from_slice(data).map_err(|_| FrameError::PayloadTooLarge)?,
            }),
            (kind::CALLBACK, [link]) => Ok(NwpEvent::Callback { link: *link }),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Build the frame an NWP would send for this event
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            NwpEvent::Response {
                request,
                status,
                link,
                data,
            } => Frame::with_header(kind::RESPONSE, &[*request, status.to_byte(), *link], data),
            NwpEvent::Callback { link } => Frame::new(kind::CALLBACK, &[*link]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameParser;

    #[test]
    fn test_send_request_layout() {
        let frame = NwpRequest::Send {
            link: 4,
            data: &[0xFF, 0xFF, 1, 0],
        }
        .to_frame()
        .unwrap();

        assert_eq!(frame.kind, kind::SEND);
        assert_eq!(frame.payload.as_slice(), &[4, 0xFF, 0xFF, 1, 0]);
    }

    #[test]
    fn test_simple_requests_have_no_payload() {
        for (request, expected) in [
            (NwpRequest::Init, kind::INIT),
            (NwpRequest::Link, kind::LINK),
            (NwpRequest::Listen, kind::LISTEN),
        ] {
            let frame = request.to_frame().unwrap();
            assert_eq!(frame.kind, expected);
            assert!(frame.payload.is_empty());
        }

        let receive = NwpRequest::Receive { link: 0xFF }.to_frame().unwrap();
        assert_eq!(receive.payload.as_slice(), &[0xFF]);
    }

    #[test]
    fn test_response_from_wire() {
        let event = NwpEvent::Response {
            request: kind::RECEIVE,
            status: NwpStatus::Success,
            link: 0xFF,
            data: Vec::from_slice(&[0xFE, 0xFF, 0, 0, 0xA0, 0x40]).unwrap(),
        };
        let bytes = event.to_frame().unwrap().encode_to_vec().unwrap();

        let mut parser = FrameParser::new();
        let (frame, _) = parser.feed_bytes(&bytes).unwrap();
        assert_eq!(NwpEvent::from_frame(&frame.unwrap()), Ok(event));
    }

    #[test]
    fn test_callback_and_malformed_events() {
        let callback = Frame::new(kind::CALLBACK, &[0]).unwrap();
        assert_eq!(
            NwpEvent::from_frame(&callback),
            Ok(NwpEvent::Callback { link: 0 })
        );

        let truncated = Frame::new(kind::RESPONSE, &[kind::LINK, 0]).unwrap();
        assert_eq!(
            NwpEvent::from_frame(&truncated),
            Err(FrameError::InvalidFrame)
        );

        let request_echo = Frame::empty(kind::INIT);
        assert_eq!(
            NwpEvent::from_frame(&request_echo),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_response_matches_only_its_request() {
        let frame = Frame::new(kind::RESPONSE, &[kind::LISTEN, 0x00, 3]).unwrap();
        let late_listen = NwpEvent::from_frame(&frame).unwrap();

        assert!(late_listen.answers(NwpRequest::Listen.kind()));
        assert!(!late_listen.answers(NwpRequest::Receive { link: 3 }.kind()));
        assert!(!NwpEvent::Callback { link: 3 }.answers(kind::CALLBACK));
        assert_eq!(
            NwpRequest::Send { link: 1, data: &[] }.kind(),
            kind::SEND
        );
    }

    #[test]
    fn test_unknown_status_is_failure() {
        assert_eq!(NwpStatus::from_byte(0x42), NwpStatus::Failure);
        assert!(NwpStatus::from_byte(0).is_success());
        assert_eq!(NwpStatus::NoFrame.to_byte(), 0x03);
    }
}
