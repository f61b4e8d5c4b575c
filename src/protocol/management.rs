//! Management messages and their inner TLVs.
//!
//! The unicast client itself never issues management requests, but a
//! grandmaster (or a monitoring tool sharing the socket pair) may send
//! them, so the decoder understands the envelope: the management header
//! fields plus exactly one inner TLV, either a `MANAGEMENT` TLV carrying
//! a dataset payload or a `MANAGEMENT_ERROR_STATUS` TLV.

use crate::types::{PortIdentity, PtpText};

use super::ProtocolError;
use super::header::{Header, MessageType};
use super::signaling::{TLV_HEAD_SIZE, TLV_MANAGEMENT, TLV_MANAGEMENT_ERROR_STATUS};

/// Management action nibble (IEEE 1588 table 15.4.1.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ManagementAction {
    /// Read a dataset.
    Get = 0,
    /// Write a dataset.
    Set = 1,
    /// Reply to a Get/Set.
    Response = 2,
    /// Execute a command.
    Command = 3,
    /// Reply to a command.
    Acknowledge = 4,
}

impl ManagementAction {
    /// Parse from the lower 4 bits of a byte.
    pub fn from_nibble(value: u8) -> Result<Self, ProtocolError> {
        match value & 0x0F {
            0 => Ok(Self::Get),
            1 => Ok(Self::Set),
            2 => Ok(Self::Response),
            3 => Ok(Self::Command),
            4 => Ok(Self::Acknowledge),
            other => Err(ProtocolError::UnsupportedManagementAction(other)),
        }
    }
}

/// Management error code carried in a `MANAGEMENT_ERROR_STATUS` TLV.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagementErrorId(pub u16);

impl ManagementErrorId {
    /// The response would not fit a single message.
    pub const RESPONSE_TOO_BIG: Self = Self(0x0001);
    /// The management id is not recognised.
    pub const NO_SUCH_ID: Self = Self(0x0002);
    /// The payload length is wrong for the management id.
    pub const WRONG_LENGTH: Self = Self(0x0003);
    /// A payload value is out of range.
    pub const WRONG_VALUE: Self = Self(0x0004);
    /// The dataset is read-only.
    pub const NOT_SETABLE: Self = Self(0x0005);
    /// The management id is not supported.
    pub const NOT_SUPPORTED: Self = Self(0x0006);
    /// Any other failure.
    pub const GENERAL_ERROR: Self = Self(0xFFFE);
}

/// Inner `MANAGEMENT` TLV: a management id plus its raw dataset payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementTlv {
    /// Dataset selector.
    pub management_id: u16,
    /// Raw dataset bytes; interpretation is management-id specific.
    pub data: Vec<u8>,
}

/// Inner `MANAGEMENT_ERROR_STATUS` TLV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagementErrorStatus {
    /// Error code.
    pub error_id: ManagementErrorId,
    /// Management id the error refers to.
    pub management_id: u16,
    /// Optional human-readable diagnostics.
    pub display_data: PtpText,
}

/// The single TLV a management message carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagementPayload {
    /// Dataset request or response.
    Tlv(ManagementTlv),
    /// Error report.
    ErrorStatus(ManagementErrorStatus),
}

/// A decoded management message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Management {
    /// Message header.
    pub header: Header,
    /// Port the management message is addressed to.
    pub target_port_identity: PortIdentity,
    /// Boundary hops requested by the sender.
    pub starting_boundary_hops: u8,
    /// Boundary hops remaining.
    pub boundary_hops: u8,
    /// Action field.
    pub action: ManagementAction,
    /// The inner TLV.
    pub payload: ManagementPayload,
}

impl Management {
    /// Management fields between the common header and the inner TLV.
    const PREFIX_SIZE: usize = PortIdentity::SIZE + 4;

    /// Create a management message carrying a dataset TLV.
    #[must_use]
    pub fn new(
        source: PortIdentity,
        sequence_id: u16,
        action: ManagementAction,
        tlv: ManagementTlv,
    ) -> Self {
        Self {
            header: Header::new(MessageType::Management, source, sequence_id),
            target_port_identity: PortIdentity::WILDCARD,
            starting_boundary_hops: 0,
            boundary_hops: 0,
            action,
            payload: ManagementPayload::Tlv(tlv),
        }
    }

    /// Encode the body (management prefix + inner TLV).
    #[must_use]
    pub fn encode_body(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::PREFIX_SIZE + 16);
        buf.extend_from_slice(&self.target_port_identity.encode());
        buf.push(self.starting_boundary_hops);
        buf.push(self.boundary_hops);
        buf.push(self.action as u8);
        buf.push(0);
        match &self.payload {
            ManagementPayload::Tlv(tlv) => {
                let mut payload = Vec::with_capacity(2 + tlv.data.len());
                payload.extend_from_slice(&tlv.management_id.to_be_bytes());
                payload.extend_from_slice(&tlv.data);
                if payload.len() % 2 != 0 {
                    payload.push(0);
                }
                write_tlv(&mut buf, TLV_MANAGEMENT, &payload);
            }
            ManagementPayload::ErrorStatus(status) => {
                let mut payload = Vec::with_capacity(9 + status.display_data.wire_len());
                payload.extend_from_slice(&status.error_id.0.to_be_bytes());
                payload.extend_from_slice(&status.management_id.to_be_bytes());
                payload.extend_from_slice(&[0; 4]);
                status.display_data.write(&mut payload);
                if payload.len() % 2 != 0 {
                    payload.push(0);
                }
                write_tlv(&mut buf, TLV_MANAGEMENT_ERROR_STATUS, &payload);
            }
        }
        buf
    }

    /// Decode from a header and its body bytes.
    pub fn decode(header: Header, body: &[u8]) -> Result<Self, ProtocolError> {
        if body.len() < Self::PREFIX_SIZE + TLV_HEAD_SIZE {
            return Err(ProtocolError::TooShort {
                needed: Header::SIZE + Self::PREFIX_SIZE + TLV_HEAD_SIZE,
                have: Header::SIZE + body.len(),
            });
        }
        let target_port_identity = PortIdentity::decode(body).ok_or(ProtocolError::TooShort {
            needed: Header::SIZE + PortIdentity::SIZE,
            have: Header::SIZE + body.len(),
        })?;
        let starting_boundary_hops = body[10];
        let boundary_hops = body[11];
        let action = ManagementAction::from_nibble(body[12])?;

        let tlv_bytes = &body[Self::PREFIX_SIZE..];
        let tlv_type = u16::from_be_bytes([tlv_bytes[0], tlv_bytes[1]]);
        let length = usize::from(u16::from_be_bytes([tlv_bytes[2], tlv_bytes[3]]));
        if tlv_bytes.len() < TLV_HEAD_SIZE + length {
            return Err(ProtocolError::TooShort {
                needed: Header::SIZE + Self::PREFIX_SIZE + TLV_HEAD_SIZE + length,
                have: Header::SIZE + body.len(),
            });
        }
        let payload_bytes = &tlv_bytes[TLV_HEAD_SIZE..TLV_HEAD_SIZE + length];

        let payload = match tlv_type {
            TLV_MANAGEMENT => {
                if length < 2 {
                    return Err(ProtocolError::BadTlvLength {
                        kind: "MANAGEMENT",
                        expected: 2,
                        got: length,
                    });
                }
                ManagementPayload::Tlv(ManagementTlv {
                    management_id: u16::from_be_bytes([payload_bytes[0], payload_bytes[1]]),
                    data: payload_bytes[2..].to_vec(),
                })
            }
            TLV_MANAGEMENT_ERROR_STATUS => {
                if length < 8 + 2 {
                    return Err(ProtocolError::BadTlvLength {
                        kind: "MANAGEMENT_ERROR_STATUS",
                        expected: 10,
                        got: length,
                    });
                }
                let (display_data, _) =
                    PtpText::read(&payload_bytes[8..]).ok_or(ProtocolError::BadText)?;
                ManagementPayload::ErrorStatus(ManagementErrorStatus {
                    error_id: ManagementErrorId(u16::from_be_bytes([
                        payload_bytes[0],
                        payload_bytes[1],
                    ])),
                    management_id: u16::from_be_bytes([payload_bytes[2], payload_bytes[3]]),
                    display_data,
                })
            }
            other => return Err(ProtocolError::UnsupportedTlv(other)),
        };

        Ok(Self {
            header,
            target_port_identity,
            starting_boundary_hops,
            boundary_hops,
            action,
            payload,
        })
    }
}

fn write_tlv(buf: &mut Vec<u8>, tlv_type: u16, payload: &[u8]) {
    buf.extend_from_slice(&tlv_type.to_be_bytes());
    #[allow(clippy::cast_possible_truncation, reason = "TLV payloads are far below 64 KiB")]
    buf.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    buf.extend_from_slice(payload);
}
