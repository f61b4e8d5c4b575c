use proptest::prelude::*;

use crate::protocol::header::{Header, MessageType};
use crate::protocol::messages::{Announce, DelayReq, DelayResp, FollowUp, Packet, Sync};
use crate::protocol::signaling::{PathTrace, Tlv};
use crate::protocol::{ProtocolError, decode_packet};
use crate::types::{
    ClockAccuracy, ClockClass, ClockIdentity, ClockQuality, Correction, PortIdentity, TimeSource,
    Timestamp,
};

fn source() -> PortIdentity {
    PortIdentity::new(ClockIdentity(0xAABB_CCDD_EEFF_0011), 1)
}

fn announce() -> Announce {
    Announce {
        header: Header::new(MessageType::Announce, source(), 3),
        origin_timestamp: Timestamp::ZERO,
        current_utc_offset: 37,
        grandmaster_priority1: 128,
        grandmaster_clock_quality: ClockQuality {
            class: ClockClass::LOCKED,
            accuracy: ClockAccuracy::NANOSECOND_100,
            offset_scaled_log_variance: 0x4E5D,
        },
        grandmaster_priority2: 248,
        grandmaster_identity: ClockIdentity(0x0C42_A1FF_FE6D_7CC6),
        steps_removed: 1,
        time_source: TimeSource::GNSS,
        tlvs: Vec::new(),
    }
}

// ===== round-trips through decode_packet =====

#[test]
fn test_sync_roundtrip() {
    let msg = Sync {
        header: Header::new(MessageType::Sync, source(), 7),
        origin_timestamp: Timestamp::new(1000, 500_000_000),
    };
    let encoded = Packet::Sync(msg).encode();
    // 34-byte header + 10-byte body + 2 slack bytes.
    assert_eq!(encoded.len(), 46);

    match decode_packet(&encoded).unwrap() {
        Packet::Sync(decoded) => {
            assert_eq!(decoded.header.sequence_id, 7);
            assert_eq!(decoded.origin_timestamp, Timestamp::new(1000, 500_000_000));
        }
        other => panic!("expected Sync, got {other:?}"),
    }
}

#[test]
fn test_delay_req_roundtrip() {
    let msg = DelayReq::new(source(), 99);
    let encoded = Packet::DelayReq(msg).encode();
    match decode_packet(&encoded).unwrap() {
        Packet::DelayReq(decoded) => {
            assert_eq!(decoded.header.sequence_id, 99);
            assert!(decoded.origin_timestamp.is_empty());
        }
        other => panic!("expected DelayReq, got {other:?}"),
    }
}

#[test]
fn test_follow_up_roundtrip() {
    let msg = FollowUp {
        header: Header::new(MessageType::FollowUp, source(), 12),
        precise_origin_timestamp: Timestamp::new(2000, 123_456_789),
    };
    let encoded = Packet::FollowUp(msg).encode();
    match decode_packet(&encoded).unwrap() {
        Packet::FollowUp(decoded) => {
            assert_eq!(
                decoded.precise_origin_timestamp,
                Timestamp::new(2000, 123_456_789)
            );
        }
        other => panic!("expected FollowUp, got {other:?}"),
    }
}

#[test]
fn test_delay_resp_roundtrip() {
    let requesting = PortIdentity::new(ClockIdentity(0x2222_2222_2222_2222), 2);
    let mut msg = DelayResp {
        header: Header::new(MessageType::DelayResp, source(), 50),
        receive_timestamp: Timestamp::new(4000, 1),
        requesting_port_identity: requesting,
    };
    msg.header.correction = Correction::from_nanos(4_000.0);
    let encoded = Packet::DelayResp(msg).encode();
    match decode_packet(&encoded).unwrap() {
        Packet::DelayResp(decoded) => {
            assert_eq!(decoded.receive_timestamp, Timestamp::new(4000, 1));
            assert_eq!(decoded.requesting_port_identity, requesting);
            assert_eq!(decoded.header.correction, Correction::from_nanos(4_000.0));
        }
        other => panic!("expected DelayResp, got {other:?}"),
    }
}

#[test]
fn test_announce_roundtrip() {
    let encoded = Packet::Announce(announce()).encode();
    // 34 + 30 + 2 slack.
    assert_eq!(encoded.len(), 66);
    match decode_packet(&encoded).unwrap() {
        Packet::Announce(decoded) => {
            assert_eq!(decoded.current_utc_offset, 37);
            assert_eq!(decoded.grandmaster_priority1, 128);
            assert_eq!(decoded.grandmaster_priority2, 248);
            assert_eq!(
                decoded.grandmaster_identity,
                ClockIdentity(0x0C42_A1FF_FE6D_7CC6)
            );
            assert_eq!(decoded.steps_removed, 1);
            assert_eq!(decoded.time_source, TimeSource::GNSS);
            assert_eq!(
                decoded.grandmaster_clock_quality.accuracy,
                ClockAccuracy::NANOSECOND_100
            );
            assert!(decoded.tlvs.is_empty());
        }
        other => panic!("expected Announce, got {other:?}"),
    }
}

#[test]
fn test_announce_with_path_trace_tlv() {
    let mut msg = announce();
    msg.tlvs.push(Tlv::PathTrace(PathTrace {
        path: vec![ClockIdentity(1), ClockIdentity(2)],
    }));
    let encoded = Packet::Announce(msg).encode();
    match decode_packet(&encoded).unwrap() {
        Packet::Announce(decoded) => {
            assert_eq!(decoded.tlvs.len(), 1);
            match &decoded.tlvs[0] {
                Tlv::PathTrace(trace) => {
                    assert_eq!(trace.path, vec![ClockIdentity(1), ClockIdentity(2)]);
                }
                other => panic!("expected PathTrace, got {other:?}"),
            }
        }
        other => panic!("expected Announce, got {other:?}"),
    }
}

#[test]
fn test_reencode_is_byte_identical() {
    let packets = [
        Packet::Sync(Sync {
            header: Header::new(MessageType::Sync, source(), 1),
            origin_timestamp: Timestamp::new(17, 23),
        }),
        Packet::Announce(announce()),
    ];
    for packet in packets {
        let encoded = packet.encode();
        let reencoded = decode_packet(&encoded).unwrap().encode();
        assert_eq!(encoded, reencoded);
    }
}

// ===== framing rules =====

#[test]
fn test_trailing_garbage_tolerated() {
    let mut encoded = Packet::Announce(announce()).encode();
    encoded.extend_from_slice(&[0xDE, 0xAD]);
    assert!(decode_packet(&encoded).is_ok());
}

#[test]
fn test_message_length_beyond_buffer_rejected() {
    let encoded = Packet::Announce(announce()).encode();
    // Strip the slack and one payload byte: messageLength now exceeds it.
    let truncated = &encoded[..encoded.len() - 3];
    assert!(matches!(
        decode_packet(truncated),
        Err(ProtocolError::BadPacketLength { .. })
    ));
}

#[test]
fn test_message_length_shorter_than_header_rejected() {
    let mut encoded = Packet::Sync(Sync {
        header: Header::new(MessageType::Sync, source(), 0),
        origin_timestamp: Timestamp::ZERO,
    })
    .encode();
    encoded[2] = 0;
    encoded[3] = 20;
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::TooShort { .. })
    ));
}

#[test]
fn test_empty_datagram_rejected() {
    assert!(decode_packet(&[]).is_err());
}

#[test]
fn test_pdelay_messages_unsupported() {
    let mut encoded = Packet::Sync(Sync {
        header: Header::new(MessageType::Sync, source(), 0),
        origin_timestamp: Timestamp::ZERO,
    })
    .encode();
    // Rewrite the type nibble to Pdelay_Req.
    encoded[0] = (encoded[0] & 0xF0) | 0x2;
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::UnsupportedMessageType(0x2))
    ));
}

// ===== decode safety =====

proptest! {
    #[test]
    fn test_decode_arbitrary_bytes_never_panics(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let _ = decode_packet(&data);
    }

    #[test]
    fn test_truncated_announce_never_decodes(cut in 1usize..65) {
        let encoded = Packet::Announce(announce()).encode();
        // Any cut below the declared message length must fail cleanly;
        // only the 2-byte slack is optional.
        let truncated = &encoded[..encoded.len() - 2 - cut.min(64)];
        prop_assert!(decode_packet(truncated).is_err());
    }
}
