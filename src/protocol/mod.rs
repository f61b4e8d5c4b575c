//! PTPv2 message codec (IEEE 1588-2019 §13–§16).
//!
//! Marshalling and unmarshalling for every message the unicast client
//! exchanges with a grandmaster: the event/general message bodies, the
//! Signaling envelope with its unicast-negotiation TLVs, and Management
//! messages. [`decode_packet`] is the single entry point for inbound
//! datagrams; it dispatches on the message-type nibble of the first byte
//! and returns a tagged [`Packet`] variant.
//!
//! Wire rules honoured throughout:
//!
//! - All multi-byte integers are big-endian.
//! - `messageLength` in the header is the authoritative payload size;
//!   trailing bytes beyond it are ignored, but a declared length larger
//!   than the datagram is an error.
//! - Every outbound datagram carries two trailing zero octets of checksum
//!   slack which peers ignore.
//! - TLVs occupy an even number of octets; fixed-layout TLVs must match
//!   their declared length exactly, variable-layout ones at least their
//!   minimum.

pub mod header;
pub mod management;
pub mod messages;
pub mod signaling;

#[cfg(test)]
mod tests;

pub use header::{Header, MessageType};
pub use management::{
    Management, ManagementAction, ManagementErrorId, ManagementErrorStatus, ManagementPayload,
    ManagementTlv,
};
pub use messages::{Announce, DelayReq, DelayResp, FollowUp, Packet, Sync, decode_packet};
pub use signaling::{
    AcknowledgeCancelUnicast, AlternateTimeOffsetIndicator, CancelUnicast, GrantUnicast, PathTrace,
    RequestUnicast, Signaling, Tlv,
};

/// Errors from PTP datagram parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// Buffer ends before the structure it should contain.
    #[error("packet too short: need {needed} bytes, have {have}")]
    TooShort {
        /// Minimum bytes needed.
        needed: usize,
        /// Bytes actually available.
        have: usize,
    },
    /// Header `messageLength` exceeds the datagram.
    #[error("declared message length {declared} exceeds {available}-byte datagram")]
    BadPacketLength {
        /// Length declared in the header.
        declared: usize,
        /// Bytes actually available.
        available: usize,
    },
    /// Message-type nibble not handled by this client.
    #[error("unsupported PTP message type 0x{0:02x}")]
    UnsupportedMessageType(u8),
    /// TLV type not handled by this client.
    #[error("unsupported TLV type 0x{0:04x}")]
    UnsupportedTlv(u16),
    /// TLV length field does not fit its layout.
    #[error("{kind} TLV length {got} (expected {expected})")]
    BadTlvLength {
        /// TLV kind being parsed.
        kind: &'static str,
        /// Exact or minimum length the layout requires.
        expected: usize,
        /// Length declared on the wire.
        got: usize,
    },
    /// Signaling message without a single TLV.
    #[error("signaling message carries no TLVs")]
    EmptySignaling,
    /// Text field too short or not valid UTF-8.
    #[error("malformed PTP text field")]
    BadText,
    /// Management action nibble outside the defined range.
    #[error("unsupported management action 0x{0:02x}")]
    UnsupportedManagementAction(u8),
}
