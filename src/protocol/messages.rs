//! Event and general message bodies, and the [`Packet`] entry point.

use crate::types::{ClockIdentity, ClockQuality, PortIdentity, TimeSource, Timestamp};

use super::ProtocolError;
use super::header::{Header, MessageType};
use super::management::Management;
use super::signaling::{Signaling, Tlv, read_tlvs};

/// Trailing zero octets appended to every outbound datagram so transports
/// can rewrite the UDP checksum on IPv6 without growing the packet.
pub const CHECKSUM_SLACK: usize = 2;

/// Sync message (event): approximate origin timestamp; the precise one
/// follows in a `Follow_Up` when the two-step flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sync {
    /// Message header.
    pub header: Header,
    /// Origin timestamp.
    pub origin_timestamp: Timestamp,
}

/// Delay request message (event), sent by the client at t3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayReq {
    /// Message header.
    pub header: Header,
    /// Origin timestamp; a unicast client leaves it empty and relies on
    /// the transmit timestamp of the datagram itself.
    pub origin_timestamp: Timestamp,
}

/// Follow-up message (general): precise origin timestamp of the matching Sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUp {
    /// Message header.
    pub header: Header,
    /// Precise origin timestamp (t1).
    pub precise_origin_timestamp: Timestamp,
}

/// Delay response message (general): when the master received the
/// `Delay_Req`, and from whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayResp {
    /// Message header.
    pub header: Header,
    /// Receive timestamp (t4).
    pub receive_timestamp: Timestamp,
    /// Port identity of the requester.
    pub requesting_port_identity: PortIdentity,
}

/// Announce message (general): grandmaster properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announce {
    /// Message header.
    pub header: Header,
    /// Origin timestamp; may be empty.
    pub origin_timestamp: Timestamp,
    /// Offset between TAI and UTC in seconds.
    pub current_utc_offset: i16,
    /// Grandmaster priority 1.
    pub grandmaster_priority1: u8,
    /// Grandmaster clock quality.
    pub grandmaster_clock_quality: ClockQuality,
    /// Grandmaster priority 2.
    pub grandmaster_priority2: u8,
    /// Grandmaster clock identity.
    pub grandmaster_identity: ClockIdentity,
    /// Number of boundary clocks between the grandmaster and the receiver.
    pub steps_removed: u16,
    /// Source of time the grandmaster uses.
    pub time_source: TimeSource,
    /// Optional trailing TLVs (path trace, alternate timescales).
    pub tlvs: Vec<Tlv>,
}

impl Sync {
    const BODY_SIZE: usize = Timestamp::SIZE;
}

impl DelayReq {
    const BODY_SIZE: usize = Timestamp::SIZE;

    /// Create a `Delay_Req` with an empty origin timestamp.
    #[must_use]
    pub fn new(source: PortIdentity, sequence_id: u16) -> Self {
        Self {
            header: Header::new(MessageType::DelayReq, source, sequence_id),
            origin_timestamp: Timestamp::ZERO,
        }
    }
}

impl FollowUp {
    const BODY_SIZE: usize = Timestamp::SIZE;
}

impl DelayResp {
    const BODY_SIZE: usize = Timestamp::SIZE + PortIdentity::SIZE;
}

impl Announce {
    const BODY_SIZE: usize = 30;
}

/// A decoded PTP datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// Sync (event).
    Sync(Sync),
    /// Delay request (event).
    DelayReq(DelayReq),
    /// Follow-up (general).
    FollowUp(FollowUp),
    /// Delay response (general).
    DelayResp(DelayResp),
    /// Announce (general).
    Announce(Announce),
    /// Signaling (general).
    Signaling(Signaling),
    /// Management (general).
    Management(Management),
}

impl Packet {
    /// The common header of the decoded message.
    #[must_use]
    pub fn header(&self) -> &Header {
        match self {
            Self::Sync(m) => &m.header,
            Self::DelayReq(m) => &m.header,
            Self::FollowUp(m) => &m.header,
            Self::DelayResp(m) => &m.header,
            Self::Announce(m) => &m.header,
            Self::Signaling(m) => &m.header,
            Self::Management(m) => &m.header,
        }
    }

    /// Encode to a full datagram, checksum slack included.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let body = match self {
            Self::Sync(m) => m.origin_timestamp.encode().to_vec(),
            Self::DelayReq(m) => m.origin_timestamp.encode().to_vec(),
            Self::FollowUp(m) => m.precise_origin_timestamp.encode().to_vec(),
            Self::DelayResp(m) => {
                let mut buf = Vec::with_capacity(DelayResp::BODY_SIZE);
                buf.extend_from_slice(&m.receive_timestamp.encode());
                buf.extend_from_slice(&m.requesting_port_identity.encode());
                buf
            }
            Self::Announce(m) => {
                let mut buf = Vec::with_capacity(Announce::BODY_SIZE);
                buf.extend_from_slice(&m.origin_timestamp.encode());
                buf.extend_from_slice(&m.current_utc_offset.to_be_bytes());
                buf.push(0);
                buf.push(m.grandmaster_priority1);
                buf.extend_from_slice(&m.grandmaster_clock_quality.encode());
                buf.push(m.grandmaster_priority2);
                buf.extend_from_slice(&m.grandmaster_identity.encode());
                buf.extend_from_slice(&m.steps_removed.to_be_bytes());
                buf.push(m.time_source.0);
                for tlv in &m.tlvs {
                    tlv.write(&mut buf);
                }
                buf
            }
            Self::Signaling(m) => m.encode_body(),
            Self::Management(m) => m.encode_body(),
        };
        let header = self.header().encode(body.len());
        let mut buf = Vec::with_capacity(Header::SIZE + body.len() + CHECKSUM_SLACK);
        buf.extend_from_slice(&header);
        buf.extend_from_slice(&body);
        buf.extend_from_slice(&[0; CHECKSUM_SLACK]);
        buf
    }
}

/// Decode a datagram into a typed [`Packet`].
///
/// Dispatches on the message-type nibble of the first byte. The header's
/// `messageLength` bounds the parse; trailing bytes (checksum slack) are
/// ignored.
pub fn decode_packet(data: &[u8]) -> Result<Packet, ProtocolError> {
    let header = Header::decode(data)?;
    let declared = usize::from(header.message_length);
    if declared > data.len() {
        return Err(ProtocolError::BadPacketLength {
            declared,
            available: data.len(),
        });
    }
    if declared < Header::SIZE {
        return Err(ProtocolError::TooShort {
            needed: Header::SIZE,
            have: declared,
        });
    }
    let body = &data[Header::SIZE..declared];

    let packet = match header.message_type {
        MessageType::Sync => Packet::Sync(Sync {
            header,
            origin_timestamp: read_timestamp(body, Sync::BODY_SIZE)?,
        }),
        MessageType::DelayReq => Packet::DelayReq(DelayReq {
            header,
            origin_timestamp: read_timestamp(body, DelayReq::BODY_SIZE)?,
        }),
        MessageType::FollowUp => Packet::FollowUp(FollowUp {
            header,
            precise_origin_timestamp: read_timestamp(body, FollowUp::BODY_SIZE)?,
        }),
        MessageType::DelayResp => {
            if body.len() < DelayResp::BODY_SIZE {
                return Err(ProtocolError::TooShort {
                    needed: Header::SIZE + DelayResp::BODY_SIZE,
                    have: Header::SIZE + body.len(),
                });
            }
            Packet::DelayResp(DelayResp {
                header,
                receive_timestamp: read_timestamp(body, Timestamp::SIZE)?,
                requesting_port_identity: PortIdentity::decode(&body[Timestamp::SIZE..])
                    .ok_or(ProtocolError::TooShort {
                        needed: Header::SIZE + DelayResp::BODY_SIZE,
                        have: Header::SIZE + body.len(),
                    })?,
            })
        }
        MessageType::Announce => {
            if body.len() < Announce::BODY_SIZE {
                return Err(ProtocolError::TooShort {
                    needed: Header::SIZE + Announce::BODY_SIZE,
                    have: Header::SIZE + body.len(),
                });
            }
            Packet::Announce(Announce {
                header,
                origin_timestamp: read_timestamp(body, Timestamp::SIZE)?,
                current_utc_offset: i16::from_be_bytes([body[10], body[11]]),
                grandmaster_priority1: body[13],
                grandmaster_clock_quality: ClockQuality::decode(&body[14..18]).ok_or(
                    ProtocolError::TooShort {
                        needed: Header::SIZE + Announce::BODY_SIZE,
                        have: Header::SIZE + body.len(),
                    },
                )?,
                grandmaster_priority2: body[18],
                grandmaster_identity: ClockIdentity::decode(&body[19..27]).ok_or(
                    ProtocolError::TooShort {
                        needed: Header::SIZE + Announce::BODY_SIZE,
                        have: Header::SIZE + body.len(),
                    },
                )?,
                steps_removed: u16::from_be_bytes([body[27], body[28]]),
                time_source: TimeSource(body[29]),
                tlvs: read_tlvs(&body[Announce::BODY_SIZE..])?,
            })
        }
        MessageType::Signaling => Packet::Signaling(Signaling::decode(header, body)?),
        MessageType::Management => Packet::Management(Management::decode(header, body)?),
        other => return Err(ProtocolError::UnsupportedMessageType(other as u8)),
    };
    Ok(packet)
}

fn read_timestamp(body: &[u8], body_size: usize) -> Result<Timestamp, ProtocolError> {
    if body.len() < body_size {
        return Err(ProtocolError::TooShort {
            needed: Header::SIZE + body_size,
            have: Header::SIZE + body.len(),
        });
    }
    Timestamp::decode(body).ok_or(ProtocolError::TooShort {
        needed: Header::SIZE + Timestamp::SIZE,
        have: Header::SIZE + body.len(),
    })
}
