use crate::protocol::header::{Header, MessageType};
use crate::protocol::messages::Packet;
use crate::protocol::signaling::{
    AcknowledgeCancelUnicast, AlternateTimeOffsetIndicator, CancelUnicast, GrantUnicast,
    RequestUnicast, Signaling, TLV_GRANT_UNICAST_TRANSMISSION, Tlv,
};
use crate::protocol::{ProtocolError, decode_packet};
use crate::types::{ClockIdentity, PortIdentity, PtpText};

fn source() -> PortIdentity {
    PortIdentity::new(ClockIdentity(0x0C42_A1FF_FE6D_7CC6), 1)
}

fn signaling_with(tlvs: Vec<Tlv>) -> Vec<u8> {
    Packet::Signaling(Signaling::new(source(), 5, tlvs)).encode()
}

fn decode_single_tlv(encoded: &[u8]) -> Tlv {
    match decode_packet(encoded).unwrap() {
        Packet::Signaling(sig) => {
            assert_eq!(sig.tlvs.len(), 1);
            sig.tlvs.into_iter().next().unwrap()
        }
        other => panic!("expected Signaling, got {other:?}"),
    }
}

// ===== unicast negotiation TLVs =====

#[test]
fn test_request_unicast_roundtrip() {
    let request = RequestUnicast {
        message_type: MessageType::Announce,
        log_inter_message_period: 1,
        duration: 300,
    };
    let tlv = decode_single_tlv(&signaling_with(vec![Tlv::RequestUnicast(request)]));
    assert_eq!(tlv, Tlv::RequestUnicast(request));
}

#[test]
fn test_grant_unicast_roundtrip() {
    let grant = GrantUnicast {
        message_type: MessageType::Sync,
        log_inter_message_period: 0,
        duration: 60,
        renewal_invited: true,
    };
    let tlv = decode_single_tlv(&signaling_with(vec![Tlv::GrantUnicast(grant)]));
    assert_eq!(tlv, Tlv::GrantUnicast(grant));
}

#[test]
fn test_grant_with_zero_duration_decodes() {
    // Denial is a protocol-level meaning; the codec must pass it through.
    let grant = GrantUnicast {
        message_type: MessageType::DelayResp,
        log_inter_message_period: 0,
        duration: 0,
        renewal_invited: false,
    };
    let tlv = decode_single_tlv(&signaling_with(vec![Tlv::GrantUnicast(grant)]));
    assert_eq!(tlv, Tlv::GrantUnicast(grant));
}

#[test]
fn test_cancel_and_acknowledge_roundtrip() {
    let cancel = CancelUnicast {
        message_type: MessageType::Announce,
        flags: 0x3,
    };
    let ack = AcknowledgeCancelUnicast {
        message_type: MessageType::Announce,
        flags: 0x3,
    };
    let tlvs = decode_single_tlv(&signaling_with(vec![Tlv::CancelUnicast(cancel)]));
    assert_eq!(tlvs, Tlv::CancelUnicast(cancel));
    let tlvs = decode_single_tlv(&signaling_with(vec![Tlv::AcknowledgeCancelUnicast(ack)]));
    assert_eq!(tlvs, Tlv::AcknowledgeCancelUnicast(ack));
}

#[test]
fn test_multiple_tlvs_in_one_signaling() {
    let request = |message_type| {
        Tlv::RequestUnicast(RequestUnicast {
            message_type,
            log_inter_message_period: 0,
            duration: 120,
        })
    };
    let encoded = signaling_with(vec![
        request(MessageType::Announce),
        request(MessageType::Sync),
        request(MessageType::DelayResp),
    ]);
    match decode_packet(&encoded).unwrap() {
        Packet::Signaling(sig) => assert_eq!(sig.tlvs.len(), 3),
        other => panic!("expected Signaling, got {other:?}"),
    }
}

#[test]
fn test_signaling_targets_wildcard_port() {
    let encoded = signaling_with(vec![Tlv::CancelUnicast(CancelUnicast {
        message_type: MessageType::Sync,
        flags: 0,
    })]);
    match decode_packet(&encoded).unwrap() {
        Packet::Signaling(sig) => {
            assert_eq!(sig.target_port_identity, PortIdentity::WILDCARD);
        }
        other => panic!("expected Signaling, got {other:?}"),
    }
}

// ===== framing strictness =====

#[test]
fn test_signaling_without_tlvs_rejected() {
    let sig = Signaling {
        header: Header::new(MessageType::Signaling, source(), 0),
        target_port_identity: PortIdentity::WILDCARD,
        tlvs: Vec::new(),
    };
    let encoded = Packet::Signaling(sig).encode();
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::EmptySignaling)
    ));
}

#[test]
fn test_fixed_tlv_with_wrong_length_rejected() {
    let mut encoded = signaling_with(vec![Tlv::GrantUnicast(GrantUnicast {
        message_type: MessageType::Sync,
        log_inter_message_period: 0,
        duration: 60,
        renewal_invited: false,
    })]);
    // Grow the declared TLV length from 8 to 10 and pad the datagram to
    // keep messageLength consistent.
    let tlv_len_at = Header::SIZE + PortIdentity::SIZE + 2;
    encoded[tlv_len_at] = 0;
    encoded[tlv_len_at + 1] = 10;
    let slack_at = encoded.len() - 2;
    encoded.splice(slack_at..slack_at, [0u8, 0u8]);
    let new_len = (encoded.len() - 2) as u16;
    encoded[2..4].copy_from_slice(&new_len.to_be_bytes());

    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::BadTlvLength {
            kind: "GRANT_UNICAST_TRANSMISSION",
            expected: 8,
            got: 10,
        })
    ));
}

#[test]
fn test_unknown_tlv_type_rejected() {
    let mut encoded = signaling_with(vec![Tlv::GrantUnicast(GrantUnicast {
        message_type: MessageType::Sync,
        log_inter_message_period: 0,
        duration: 60,
        renewal_invited: false,
    })]);
    // Rewrite the TLV type to an unassigned value.
    let tlv_type_at = Header::SIZE + PortIdentity::SIZE;
    encoded[tlv_type_at] = 0x7F;
    encoded[tlv_type_at + 1] = 0x00;
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::UnsupportedTlv(0x7F00))
    ));
}

#[test]
fn test_tlv_length_beyond_message_rejected() {
    let mut encoded = signaling_with(vec![Tlv::CancelUnicast(CancelUnicast {
        message_type: MessageType::Sync,
        flags: 0,
    })]);
    let tlv_len_at = Header::SIZE + PortIdentity::SIZE + 2;
    encoded[tlv_len_at] = 0xFF;
    encoded[tlv_len_at + 1] = 0xFF;
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::TooShort { .. })
    ));
}

#[test]
fn test_grant_tlv_type_constant() {
    let encoded = signaling_with(vec![Tlv::GrantUnicast(GrantUnicast {
        message_type: MessageType::Sync,
        log_inter_message_period: 0,
        duration: 1,
        renewal_invited: false,
    })]);
    let tlv_type_at = Header::SIZE + PortIdentity::SIZE;
    let tlv_type = u16::from_be_bytes([encoded[tlv_type_at], encoded[tlv_type_at + 1]]);
    assert_eq!(tlv_type, TLV_GRANT_UNICAST_TRANSMISSION);
}

// ===== variable-length TLVs =====

#[test]
fn test_path_trace_with_bad_length_rejected() {
    let mut encoded = signaling_with(vec![Tlv::PathTrace(
        crate::protocol::signaling::PathTrace {
            path: vec![ClockIdentity(9)],
        },
    )]);
    // Shrink the declared TLV length to a non-multiple of 8 and shrink
    // messageLength to match the now-shorter TLV area.
    let tlv_len_at = Header::SIZE + PortIdentity::SIZE + 2;
    encoded[tlv_len_at] = 0;
    encoded[tlv_len_at + 1] = 6;
    let new_len = (usize::from(u16::from_be_bytes([encoded[2], encoded[3]])) - 2) as u16;
    encoded[2..4].copy_from_slice(&new_len.to_be_bytes());
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::BadTlvLength {
            kind: "PATH_TRACE",
            ..
        })
    ));
}

#[test]
fn test_alternate_time_offset_roundtrip_odd_name() {
    let alt = AlternateTimeOffsetIndicator {
        key_field: 1,
        current_offset: -37,
        jump_seconds: 1,
        time_of_next_jump: 1_767_225_600,
        display_name: PtpText::new("UTC").unwrap(),
    };
    let tlv = decode_single_tlv(&signaling_with(vec![Tlv::AlternateTimeOffsetIndicator(
        alt.clone(),
    )]));
    assert_eq!(tlv, Tlv::AlternateTimeOffsetIndicator(alt));
}

#[test]
fn test_alternate_time_offset_roundtrip_even_name() {
    let alt = AlternateTimeOffsetIndicator {
        key_field: 0,
        current_offset: 0,
        jump_seconds: 0,
        time_of_next_jump: 0,
        display_name: PtpText::new("TAI-like").unwrap(),
    };
    let tlv = decode_single_tlv(&signaling_with(vec![Tlv::AlternateTimeOffsetIndicator(
        alt.clone(),
    )]));
    assert_eq!(tlv, Tlv::AlternateTimeOffsetIndicator(alt));
}

#[test]
fn test_alternate_time_offset_below_minimum_rejected() {
    let mut encoded = signaling_with(vec![Tlv::AlternateTimeOffsetIndicator(
        AlternateTimeOffsetIndicator {
            key_field: 0,
            current_offset: 0,
            jump_seconds: 0,
            time_of_next_jump: 0,
            display_name: PtpText::default(),
        },
    )]);
    let tlv_len_at = Header::SIZE + PortIdentity::SIZE + 2;
    encoded[tlv_len_at] = 0;
    encoded[tlv_len_at + 1] = 14;
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::BadTlvLength {
            kind: "ALTERNATE_TIME_OFFSET_INDICATOR",
            ..
        })
    ));
}
