//! Radio transport over the network processor UART link
//!
//! Each [`Radio`] call becomes one request frame. The call then spins until
//! the NWP RX task posts the matching response or the timeout expires.
//! Late responses to an earlier, timed-out request are discarded. The
//! main loop runs in thread mode while the link tasks run on the interrupt
//! executor, so they keep making progress during the spin.

use defmt::*;
use embassy_time::{Duration, Instant};

use cubelink_core::traits::{LinkId, Radio, RadioCallback, RadioError};
use cubelink_protocol::nwp::MAX_RESPONSE_DATA;
use cubelink_protocol::{NwpEvent, NwpRequest, NwpStatus};
use heapless::Vec;

use crate::channels::{NWP_REQUESTS, NWP_RESPONSE, RADIO_CALLBACK};

/// Longest wait for a response to an ordinary request
const RESPONSE_TIMEOUT: Duration = Duration::from_millis(100);

/// Link and listen can take a whole join handshake
const LINK_TIMEOUT: Duration = Duration::from_millis(500);

/// Payload of a successful response
struct Response {
    link: u8,
    data: Vec<u8, MAX_RESPONSE_DATA>,
}

fn status_to_result(status: NwpStatus) -> Result<(), RadioError> {
    match status {
        NwpStatus::Success => Ok(()),
        NwpStatus::Timeout => Err(RadioError::Timeout),
        NwpStatus::NoLink => Err(RadioError::NoLink),
        NwpStatus::NoFrame => Err(RadioError::NoFrame),
        NwpStatus::BadParam => Err(RadioError::BadParam),
        NwpStatus::Failure => Err(RadioError::Failure),
    }
}

/// Radio reached through the network processor
pub struct NwpRadio;

impl NwpRadio {
    fn transact(
        &mut self,
        request: NwpRequest<'_>,
        timeout: Duration,
    ) -> Result<Response, RadioError> {
        let frame = request.to_frame().map_err(|_| RadioError::BadParam)?;
        let expected = request.kind();

        NWP_RESPONSE.reset();
        NWP_REQUESTS
            .try_send(frame)
            .map_err(|_| RadioError::Failure)?;

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(event) = NWP_RESPONSE.try_take() {
                if !event.answers(expected) {
                    trace!("stale NWP event dropped");
                } else if let NwpEvent::Response {
                    status, link, data, ..
                } = event
                {
                    return status_to_result(status).map(|_| Response { link, data });
                }
            }
            if Instant::now() >= deadline {
                trace!("NWP request timed out");
                return Err(RadioError::Timeout);
            }
        }
    }
}

impl Radio for NwpRadio {
    fn init(&mut self, callback: RadioCallback) -> Result<(), RadioError> {
        RADIO_CALLBACK.lock(|cell| cell.set(Some(callback)));
        self.transact(NwpRequest::Init, RESPONSE_TIMEOUT).map(|_| ())
    }

    fn send(&mut self, link: LinkId, payload: &[u8]) -> Result<(), RadioError> {
        self.transact(
            NwpRequest::Send {
                link: link.0,
                data: payload,
            },
            RESPONSE_TIMEOUT,
        )
        .map(|_| ())
    }

    fn receive(&mut self, link: LinkId, buffer: &mut [u8]) -> Result<usize, RadioError> {
        let response = self.transact(NwpRequest::Receive { link: link.0 }, RESPONSE_TIMEOUT)?;
        let len = response.data.len();
        if len > buffer.len() {
            return Err(RadioError::BadParam);
        }
        buffer[..len].copy_from_slice(&response.data);
        Ok(len)
    }

    fn listen_for_link(&mut self) -> Result<LinkId, RadioError> {
        self.transact(NwpRequest::Listen, LINK_TIMEOUT)
            .map(|r| LinkId(r.link))
    }

    fn link(&mut self) -> Result<LinkId, RadioError> {
        self.transact(NwpRequest::Link, LINK_TIMEOUT)
            .map(|r| LinkId(r.link))
    }
}
