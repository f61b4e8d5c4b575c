//! The common 34-byte PTPv2 message header.

use crate::types::{Correction, PortIdentity};

use super::ProtocolError;

/// PTP message type identifiers (IEEE 1588 §13.3.2.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Sync (master → slave, event), carries t1.
    Sync = 0x0,
    /// Delay request (slave → master, event), sent at t3.
    DelayReq = 0x1,
    /// Peer delay request.
    PdelayReq = 0x2,
    /// Peer delay response.
    PdelayResp = 0x3,
    /// Follow-up (master → slave), carries precise t1.
    FollowUp = 0x8,
    /// Delay response (master → slave), carries t4.
    DelayResp = 0x9,
    /// Peer delay response follow-up.
    PdelayRespFollowUp = 0xA,
    /// Announce (master → slave), clock properties.
    Announce = 0xB,
    /// Signaling, carries TLVs (unicast negotiation).
    Signaling = 0xC,
    /// Management.
    Management = 0xD,
}

impl MessageType {
    /// Parse from the lower 4 bits of a byte.
    pub fn from_nibble(value: u8) -> Result<Self, ProtocolError> {
        match value & 0x0F {
            0x0 => Ok(Self::Sync),
            0x1 => Ok(Self::DelayReq),
            0x2 => Ok(Self::PdelayReq),
            0x3 => Ok(Self::PdelayResp),
            0x8 => Ok(Self::FollowUp),
            0x9 => Ok(Self::DelayResp),
            0xA => Ok(Self::PdelayRespFollowUp),
            0xB => Ok(Self::Announce),
            0xC => Ok(Self::Signaling),
            0xD => Ok(Self::Management),
            other => Err(ProtocolError::UnsupportedMessageType(other)),
        }
    }

    /// Whether this message type travels on the event port and needs
    /// precise timestamping.
    #[must_use]
    pub fn is_event(&self) -> bool {
        matches!(self, Self::Sync | Self::DelayReq | Self::PdelayReq | Self::PdelayResp)
    }

    /// Default `controlField` value for this message type.
    #[must_use]
    pub fn control_field(&self) -> u8 {
        match self {
            Self::Sync => 0x00,
            Self::DelayReq => 0x01,
            Self::FollowUp => 0x02,
            Self::DelayResp => 0x03,
            Self::Management => 0x04,
            _ => 0x05,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Sync => "Sync",
            Self::DelayReq => "Delay_Req",
            Self::PdelayReq => "Pdelay_Req",
            Self::PdelayResp => "Pdelay_Resp",
            Self::FollowUp => "Follow_Up",
            Self::DelayResp => "Delay_Resp",
            Self::PdelayRespFollowUp => "Pdelay_Resp_Follow_Up",
            Self::Announce => "Announce",
            Self::Signaling => "Signaling",
            Self::Management => "Management",
        };
        f.write_str(name)
    }
}

/// Full PTPv2 message header (34 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Upper 4 bits of byte 0 (`majorSdoId`).
    pub major_sdo_id: u8,
    /// Message type (lower 4 bits of byte 0).
    pub message_type: MessageType,
    /// Version byte: minor version in the upper nibble, major in the lower.
    pub version: u8,
    /// Total message length including header and TLVs, excluding the
    /// checksum-slack suffix.
    pub message_length: u16,
    /// Domain number.
    pub domain_number: u8,
    /// Minor SDO id.
    pub minor_sdo_id: u8,
    /// Flag field, see [`crate::types::flags`].
    pub flags: u16,
    /// Accumulated residence-time correction.
    pub correction: Correction,
    /// Message-type-specific field.
    pub message_type_specific: u32,
    /// Source port identity.
    pub source_port_identity: PortIdentity,
    /// Sequence id.
    pub sequence_id: u16,
    /// Control field (deprecated in v2, still carried).
    pub control_field: u8,
    /// Log message interval; `0x7F` for unicast messages.
    pub log_message_interval: i8,
}

impl Header {
    /// Header size in bytes.
    pub const SIZE: usize = 34;

    /// PTP major version.
    pub const VERSION_PTP_2: u8 = 2;

    /// Log interval value used on unicast messages.
    pub const LOG_INTERVAL_UNICAST: i8 = 0x7F;

    /// Create a header with the defaults a unicast client uses.
    #[must_use]
    pub fn new(message_type: MessageType, source: PortIdentity, sequence_id: u16) -> Self {
        Self {
            major_sdo_id: 0,
            message_type,
            version: Self::VERSION_PTP_2,
            message_length: 0, // filled in on encode
            domain_number: 0,
            minor_sdo_id: 0,
            flags: crate::types::flags::UNICAST,
            correction: Correction::default(),
            message_type_specific: 0,
            source_port_identity: source,
            sequence_id,
            control_field: message_type.control_field(),
            log_message_interval: Self::LOG_INTERVAL_UNICAST,
        }
    }

    /// Encode to 34 bytes, computing `messageLength` from `body_length`.
    #[must_use]
    pub fn encode(&self, body_length: usize) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0] = (self.major_sdo_id << 4) | (self.message_type as u8 & 0x0F);
        buf[1] = self.version;
        #[allow(clippy::cast_possible_truncation, reason = "PTP messages are far below 64 KiB")]
        let total_len = (Self::SIZE + body_length) as u16;
        buf[2..4].copy_from_slice(&total_len.to_be_bytes());
        buf[4] = self.domain_number;
        buf[5] = self.minor_sdo_id;
        buf[6..8].copy_from_slice(&self.flags.to_be_bytes());
        buf[8..16].copy_from_slice(&self.correction.raw().to_be_bytes());
        buf[16..20].copy_from_slice(&self.message_type_specific.to_be_bytes());
        buf[20..30].copy_from_slice(&self.source_port_identity.encode());
        buf[30..32].copy_from_slice(&self.sequence_id.to_be_bytes());
        buf[32] = self.control_field;
        buf[33] = self.log_message_interval as u8;
        buf
    }

    /// Decode from bytes.
    pub fn decode(data: &[u8]) -> Result<Self, ProtocolError> {
        if data.len() < Self::SIZE {
            return Err(ProtocolError::TooShort {
                needed: Self::SIZE,
                have: data.len(),
            });
        }
        let message_type = MessageType::from_nibble(data[0])?;
        let source_port_identity =
            PortIdentity::decode(&data[20..30]).ok_or(ProtocolError::TooShort {
                needed: 30,
                have: data.len(),
            })?;
        Ok(Self {
            major_sdo_id: data[0] >> 4,
            message_type,
            version: data[1],
            message_length: u16::from_be_bytes([data[2], data[3]]),
            domain_number: data[4],
            minor_sdo_id: data[5],
            flags: u16::from_be_bytes([data[6], data[7]]),
            correction: Correction::from_raw(i64::from_be_bytes([
                data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
            ])),
            message_type_specific: u32::from_be_bytes([data[16], data[17], data[18], data[19]]),
            source_port_identity,
            sequence_id: u16::from_be_bytes([data[30], data[31]]),
            control_field: data[32],
            log_message_interval: data[33] as i8,
        })
    }
}
