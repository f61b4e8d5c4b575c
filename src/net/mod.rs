//! Transport abstraction over the PTP socket pair.
//!
//! A unicast session talks to the grandmaster over two UDP flows: event
//! messages on port 319 (which need precise timestamps) and general
//! messages on port 320. The [`Transport`] trait is the seam between the
//! state machine and the sockets: it sends on either flow, reports the
//! transmit timestamp of event datagrams, and merges both inbound flows
//! into one ordered stream of [`Inbound`] items.

mod udp;

#[cfg(test)]
mod tests;

pub use udp::UdpTransport;

use std::net::SocketAddr;

use async_trait::async_trait;
use bytes::Bytes;

use crate::types::Timestamp;

/// Standard PTP event port (Sync, `Delay_Req`).
pub const EVENT_PORT: u16 = 319;

/// Standard PTP general port (Announce, `Follow_Up`, `Delay_Resp`, Signaling).
pub const GENERAL_PORT: u16 = 320;

/// Timestamp source preference for event-port traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Timestamping {
    /// Hardware when the interface supports it, kernel software otherwise.
    #[default]
    Auto,
    /// Hardware only; setup fails when unavailable.
    Hardware,
    /// Kernel software timestamps.
    Software,
}

/// Transport-level failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Socket operation failed.
    #[error("socket i/o failed: {0}")]
    Io(#[from] std::io::Error),
    /// Hardware timestamping was requested but the transport cannot
    /// provide it.
    #[error("hardware timestamping is not available on this transport")]
    HardwareTimestampingUnavailable,
    /// The transport was shut down.
    #[error("transport closed")]
    Closed,
}

/// One received datagram, stamped on arrival.
#[derive(Debug, Clone)]
pub struct Inbound {
    /// Raw datagram payload.
    pub payload: Bytes,
    /// Sender address.
    pub source: SocketAddr,
    /// Receive timestamp; precise for event-port traffic, wall-clock at
    /// `recv` for general-port traffic.
    pub rx_timestamp: Timestamp,
    /// Whether the datagram arrived on the event port.
    pub event_port: bool,
}

/// The socket pair a unicast session runs over.
///
/// Implementations must filter inbound traffic down to the configured
/// grandmaster and keep each flow's arrival order; no ordering is
/// guaranteed between the two flows.
#[async_trait]
pub trait Transport: Send {
    /// Send a datagram to the grandmaster's general port.
    async fn send_general(&self, payload: &[u8]) -> Result<(), TransportError>;

    /// Send a datagram to the grandmaster's event port and return its
    /// transmit timestamp.
    async fn send_event(&self, payload: &[u8]) -> Result<Timestamp, TransportError>;

    /// Receive the next datagram from either flow.
    ///
    /// Returns `None` once the transport has been shut down and the
    /// already-received backlog is drained.
    async fn recv(&mut self) -> Option<Inbound>;

    /// Stop the reader tasks and close the inbound stream.
    fn shutdown(&mut self);
}
