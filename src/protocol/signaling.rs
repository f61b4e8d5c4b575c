//! Signaling messages and the TLVs they carry.
//!
//! Unicast negotiation (IEEE 1588 §16.1) runs entirely over Signaling
//! messages: the client requests per-message-type transmission grants,
//! the grandmaster answers with grants (or denials), and either side may
//! cancel. Announce messages may additionally append `PathTrace` and
//! `AlternateTimeOffsetIndicator` TLVs, parsed by the same reader.

use crate::types::{ClockIdentity, PortIdentity, PtpText, Timestamp};

use super::ProtocolError;
use super::header::{Header, MessageType};

/// TLV type: management.
pub const TLV_MANAGEMENT: u16 = 0x0001;
/// TLV type: management error status.
pub const TLV_MANAGEMENT_ERROR_STATUS: u16 = 0x0002;
/// TLV type: request unicast transmission.
pub const TLV_REQUEST_UNICAST_TRANSMISSION: u16 = 0x0004;
/// TLV type: grant unicast transmission.
pub const TLV_GRANT_UNICAST_TRANSMISSION: u16 = 0x0005;
/// TLV type: cancel unicast transmission.
pub const TLV_CANCEL_UNICAST_TRANSMISSION: u16 = 0x0006;
/// TLV type: acknowledge cancel unicast transmission.
pub const TLV_ACKNOWLEDGE_CANCEL_UNICAST_TRANSMISSION: u16 = 0x0007;
/// TLV type: path trace.
pub const TLV_PATH_TRACE: u16 = 0x0008;
/// TLV type: alternate time offset indicator.
pub const TLV_ALTERNATE_TIME_OFFSET_INDICATOR: u16 = 0x0009;

/// Size of a TLV head (type + length).
pub(crate) const TLV_HEAD_SIZE: usize = 4;

/// `REQUEST_UNICAST_TRANSMISSION` TLV (fixed 6-byte payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestUnicast {
    /// Message type the grant is requested for.
    pub message_type: MessageType,
    /// Log2 of the requested inter-message period in seconds.
    pub log_inter_message_period: i8,
    /// Requested grant duration in seconds.
    pub duration: u32,
}

/// `GRANT_UNICAST_TRANSMISSION` TLV (fixed 8-byte payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantUnicast {
    /// Message type the grant covers.
    pub message_type: MessageType,
    /// Log2 of the granted inter-message period in seconds.
    pub log_inter_message_period: i8,
    /// Granted duration in seconds; zero means the request was denied.
    pub duration: u32,
    /// Whether the master invites renewal requests before expiry.
    pub renewal_invited: bool,
}

/// `CANCEL_UNICAST_TRANSMISSION` TLV (fixed 2-byte payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelUnicast {
    /// Message type whose grant is cancelled.
    pub message_type: MessageType,
    /// Maintain-request / maintain-grant flag bits (low nibble of byte 0).
    pub flags: u8,
}

/// `ACKNOWLEDGE_CANCEL_UNICAST_TRANSMISSION` TLV (fixed 2-byte payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcknowledgeCancelUnicast {
    /// Message type whose cancellation is acknowledged.
    pub message_type: MessageType,
    /// Flag bits mirrored from the cancel.
    pub flags: u8,
}

/// `PATH_TRACE` TLV: the chain of clock identities the Announce crossed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathTrace {
    /// Clock identities, grandmaster first.
    pub path: Vec<ClockIdentity>,
}

/// `ALTERNATE_TIME_OFFSET_INDICATOR` TLV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateTimeOffsetIndicator {
    /// Key identifying the alternate timescale.
    pub key_field: u8,
    /// Offset of the alternate timescale in seconds.
    pub current_offset: i32,
    /// Seconds inserted at the next discontinuity.
    pub jump_seconds: i32,
    /// Time of the next discontinuity (48-bit seconds).
    pub time_of_next_jump: u64,
    /// Human-readable timescale name.
    pub display_name: PtpText,
}

/// A TLV recognised by this client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tlv {
    /// Request a unicast transmission grant.
    RequestUnicast(RequestUnicast),
    /// Grant (or deny) a unicast transmission request.
    GrantUnicast(GrantUnicast),
    /// Cancel a granted unicast transmission.
    CancelUnicast(CancelUnicast),
    /// Acknowledge a cancellation.
    AcknowledgeCancelUnicast(AcknowledgeCancelUnicast),
    /// Path of clocks an Announce traversed.
    PathTrace(PathTrace),
    /// Alternate timescale description.
    AlternateTimeOffsetIndicator(AlternateTimeOffsetIndicator),
}

impl Tlv {
    /// Wire TLV type of this value.
    #[must_use]
    pub fn tlv_type(&self) -> u16 {
        match self {
            Self::RequestUnicast(_) => TLV_REQUEST_UNICAST_TRANSMISSION,
            Self::GrantUnicast(_) => TLV_GRANT_UNICAST_TRANSMISSION,
            Self::CancelUnicast(_) => TLV_CANCEL_UNICAST_TRANSMISSION,
            Self::AcknowledgeCancelUnicast(_) => TLV_ACKNOWLEDGE_CANCEL_UNICAST_TRANSMISSION,
            Self::PathTrace(_) => TLV_PATH_TRACE,
            Self::AlternateTimeOffsetIndicator(_) => TLV_ALTERNATE_TIME_OFFSET_INDICATOR,
        }
    }

    /// Append the wire form (head + payload, padded to even) to `buf`.
    pub fn write(&self, buf: &mut Vec<u8>) {
        let mut payload = Vec::new();
        match self {
            Self::RequestUnicast(req) => {
                payload.push((req.message_type as u8) << 4);
                payload.push(req.log_inter_message_period as u8);
                payload.extend_from_slice(&req.duration.to_be_bytes());
            }
            Self::GrantUnicast(grant) => {
                payload.push((grant.message_type as u8) << 4);
                payload.push(grant.log_inter_message_period as u8);
                payload.extend_from_slice(&grant.duration.to_be_bytes());
                payload.push(0);
                payload.push(u8::from(grant.renewal_invited));
            }
            Self::CancelUnicast(cancel) => {
                payload.push(((cancel.message_type as u8) << 4) | (cancel.flags & 0x0F));
                payload.push(0);
            }
            Self::AcknowledgeCancelUnicast(ack) => {
                payload.push(((ack.message_type as u8) << 4) | (ack.flags & 0x0F));
                payload.push(0);
            }
            Self::PathTrace(trace) => {
                for identity in &trace.path {
                    payload.extend_from_slice(&identity.encode());
                }
            }
            Self::AlternateTimeOffsetIndicator(alt) => {
                payload.push(alt.key_field);
                payload.extend_from_slice(&alt.current_offset.to_be_bytes());
                payload.extend_from_slice(&alt.jump_seconds.to_be_bytes());
                payload.extend_from_slice(&Timestamp::new(alt.time_of_next_jump, 0).encode()[0..6]);
                alt.display_name.write(&mut payload);
            }
        }
        if payload.len() % 2 != 0 {
            payload.push(0);
        }
        buf.extend_from_slice(&self.tlv_type().to_be_bytes());
        #[allow(clippy::cast_possible_truncation, reason = "TLV payloads are far below 64 KiB")]
        buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        buf.extend_from_slice(&payload);
    }

    /// Read one TLV, returning it and the number of bytes consumed.
    pub fn read(data: &[u8]) -> Result<(Self, usize), ProtocolError> {
        if data.len() < TLV_HEAD_SIZE {
            return Err(ProtocolError::TooShort {
                needed: TLV_HEAD_SIZE,
                have: data.len(),
            });
        }
        let tlv_type = u16::from_be_bytes([data[0], data[1]]);
        let length = usize::from(u16::from_be_bytes([data[2], data[3]]));
        if data.len() < TLV_HEAD_SIZE + length {
            return Err(ProtocolError::TooShort {
                needed: TLV_HEAD_SIZE + length,
                have: data.len(),
            });
        }
        let payload = &data[TLV_HEAD_SIZE..TLV_HEAD_SIZE + length];
        let tlv = match tlv_type {
            TLV_REQUEST_UNICAST_TRANSMISSION => {
                expect_exact("REQUEST_UNICAST_TRANSMISSION", 6, length)?;
                Self::RequestUnicast(RequestUnicast {
                    message_type: MessageType::from_nibble(payload[0] >> 4)?,
                    log_inter_message_period: payload[1] as i8,
                    duration: u32::from_be_bytes([payload[2], payload[3], payload[4], payload[5]]),
                })
            }
            TLV_GRANT_UNICAST_TRANSMISSION => {
                expect_exact("GRANT_UNICAST_TRANSMISSION", 8, length)?;
                Self::GrantUnicast(GrantUnicast {
                    message_type: MessageType::from_nibble(payload[0] >> 4)?,
                    log_inter_message_period: payload[1] as i8,
                    duration: u32::from_be_bytes([payload[2], payload[3], payload[4], payload[5]]),
                    renewal_invited: payload[7] & 0x01 != 0,
                })
            }
            TLV_CANCEL_UNICAST_TRANSMISSION => {
                expect_exact("CANCEL_UNICAST_TRANSMISSION", 2, length)?;
                Self::CancelUnicast(CancelUnicast {
                    message_type: MessageType::from_nibble(payload[0] >> 4)?,
                    flags: payload[0] & 0x0F,
                })
            }
            TLV_ACKNOWLEDGE_CANCEL_UNICAST_TRANSMISSION => {
                expect_exact("ACKNOWLEDGE_CANCEL_UNICAST_TRANSMISSION", 2, length)?;
                Self::AcknowledgeCancelUnicast(AcknowledgeCancelUnicast {
                    message_type: MessageType::from_nibble(payload[0] >> 4)?,
                    flags: payload[0] & 0x0F,
                })
            }
            TLV_PATH_TRACE => {
                if length % ClockIdentity::SIZE != 0 {
                    return Err(ProtocolError::BadTlvLength {
                        kind: "PATH_TRACE",
                        expected: ClockIdentity::SIZE,
                        got: length,
                    });
                }
                let path = payload
                    .chunks_exact(ClockIdentity::SIZE)
                    .filter_map(ClockIdentity::decode)
                    .collect();
                Self::PathTrace(PathTrace { path })
            }
            TLV_ALTERNATE_TIME_OFFSET_INDICATOR => {
                // keyField + currentOffset + jumpSeconds + timeOfNextJump
                // + at least a text length octet and its pad.
                const FIXED: usize = 15;
                if length < FIXED + 1 {
                    return Err(ProtocolError::BadTlvLength {
                        kind: "ALTERNATE_TIME_OFFSET_INDICATOR",
                        expected: FIXED + 1,
                        got: length,
                    });
                }
                let (display_name, _) =
                    PtpText::read(&payload[FIXED..]).ok_or(ProtocolError::BadText)?;
                Self::AlternateTimeOffsetIndicator(AlternateTimeOffsetIndicator {
                    key_field: payload[0],
                    current_offset: i32::from_be_bytes([
                        payload[1], payload[2], payload[3], payload[4],
                    ]),
                    jump_seconds: i32::from_be_bytes([
                        payload[5], payload[6], payload[7], payload[8],
                    ]),
                    time_of_next_jump: u64::from_be_bytes([
                        0,
                        0,
                        payload[9],
                        payload[10],
                        payload[11],
                        payload[12],
                        payload[13],
                        payload[14],
                    ]),
                    display_name,
                })
            }
            other => return Err(ProtocolError::UnsupportedTlv(other)),
        };
        Ok((tlv, TLV_HEAD_SIZE + length))
    }
}

fn expect_exact(kind: &'static str, expected: usize, got: usize) -> Result<(), ProtocolError> {
    if got == expected {
        Ok(())
    } else {
        Err(ProtocolError::BadTlvLength {
            kind,
            expected,
            got,
        })
    }
}

/// Read consecutive TLVs until fewer than a TLV head remains.
pub(crate) fn read_tlvs(data: &[u8]) -> Result<Vec<Tlv>, ProtocolError> {
    let mut tlvs = Vec::new();
    let mut pos = 0;
    while pos + TLV_HEAD_SIZE <= data.len() {
        let (tlv, consumed) = Tlv::read(&data[pos..])?;
        tlvs.push(tlv);
        pos += consumed;
    }
    Ok(tlvs)
}

/// A Signaling message: a target port identity plus one or more TLVs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signaling {
    /// Message header.
    pub header: Header,
    /// Port the signaling is addressed to; often the wildcard.
    pub target_port_identity: PortIdentity,
    /// Carried TLVs; never empty on a valid message.
    pub tlvs: Vec<Tlv>,
}

impl Signaling {
    /// Create a signaling message carrying `tlvs`.
    #[must_use]
    pub fn new(source: PortIdentity, sequence_id: u16, tlvs: Vec<Tlv>) -> Self {
        Self {
            header: Header::new(MessageType::Signaling, source, sequence_id),
            target_port_identity: PortIdentity::WILDCARD,
            tlvs,
        }
    }

    /// Encode the body (target port identity + TLVs).
    #[must_use]
    pub fn encode_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(PortIdentity::SIZE + 16 * self.tlvs.len());
        buf.extend_from_slice(&self.target_port_identity.encode());
        for tlv in &self.tlvs {
            tlv.write(&mut buf);
        }
        buf
    }

    /// Decode from a header and its body bytes.
    pub fn decode(header: Header, body: &[u8]) -> Result<Self, ProtocolError> {
        let target_port_identity =
            PortIdentity::decode(body).ok_or(ProtocolError::TooShort {
                needed: Header::SIZE + PortIdentity::SIZE,
                have: Header::SIZE + body.len(),
            })?;
        let tlvs = read_tlvs(&body[PortIdentity::SIZE..])?;
        if tlvs.is_empty() {
            return Err(ProtocolError::EmptySignaling);
        }
        Ok(Self {
            header,
            target_port_identity,
            tlvs,
        })
    }
}
