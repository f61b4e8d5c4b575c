use crate::protocol::header::{Header, MessageType};
use crate::protocol::management::{
    Management, ManagementAction, ManagementErrorId, ManagementErrorStatus, ManagementPayload,
    ManagementTlv,
};
use crate::protocol::messages::Packet;
use crate::protocol::{ProtocolError, decode_packet};
use crate::types::{ClockIdentity, PortIdentity, PtpText};

fn source() -> PortIdentity {
    PortIdentity::new(ClockIdentity(0x1111_2222_3333_4444), 1)
}

#[test]
fn test_management_get_roundtrip() {
    let msg = Management::new(
        source(),
        21,
        ManagementAction::Get,
        ManagementTlv {
            management_id: 0x2001, // CURRENT_DATA_SET
            data: Vec::new(),
        },
    );
    let encoded = Packet::Management(msg).encode();
    match decode_packet(&encoded).unwrap() {
        Packet::Management(decoded) => {
            assert_eq!(decoded.action, ManagementAction::Get);
            assert_eq!(decoded.target_port_identity, PortIdentity::WILDCARD);
            match decoded.payload {
                ManagementPayload::Tlv(tlv) => {
                    assert_eq!(tlv.management_id, 0x2001);
                    assert!(tlv.data.is_empty());
                }
                other => panic!("expected Management TLV, got {other:?}"),
            }
        }
        other => panic!("expected Management, got {other:?}"),
    }
}

#[test]
fn test_management_response_with_payload_roundtrip() {
    let msg = Management::new(
        source(),
        22,
        ManagementAction::Response,
        ManagementTlv {
            management_id: 0x2000,
            data: vec![0xAA, 0xBB, 0xCC, 0xDD],
        },
    );
    let encoded = Packet::Management(msg).encode();
    let reencoded = decode_packet(&encoded).unwrap().encode();
    assert_eq!(encoded, reencoded);
}

#[test]
fn test_management_error_status_roundtrip() {
    let msg = Management {
        header: Header::new(MessageType::Management, source(), 23),
        target_port_identity: source(),
        starting_boundary_hops: 1,
        boundary_hops: 1,
        action: ManagementAction::Response,
        payload: ManagementPayload::ErrorStatus(ManagementErrorStatus {
            error_id: ManagementErrorId::NO_SUCH_ID,
            management_id: 0x7777,
            display_data: PtpText::new("no such dataset").unwrap(),
        }),
    };
    let encoded = Packet::Management(msg).encode();
    match decode_packet(&encoded).unwrap() {
        Packet::Management(decoded) => match decoded.payload {
            ManagementPayload::ErrorStatus(status) => {
                assert_eq!(status.error_id, ManagementErrorId::NO_SUCH_ID);
                assert_eq!(status.management_id, 0x7777);
                assert_eq!(status.display_data.0, "no such dataset");
            }
            other => panic!("expected error status, got {other:?}"),
        },
        other => panic!("expected Management, got {other:?}"),
    }
}

#[test]
fn test_management_unknown_inner_tlv_rejected() {
    let msg = Management::new(
        source(),
        24,
        ManagementAction::Get,
        ManagementTlv {
            management_id: 0,
            data: Vec::new(),
        },
    );
    let mut encoded = Packet::Management(msg).encode();
    // Inner TLV type sits right after the management prefix.
    let tlv_type_at = Header::SIZE + PortIdentity::SIZE + 4;
    encoded[tlv_type_at] = 0x00;
    encoded[tlv_type_at + 1] = 0x42;
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::UnsupportedTlv(0x0042))
    ));
}

#[test]
fn test_management_bad_action_rejected() {
    let msg = Management::new(
        source(),
        25,
        ManagementAction::Get,
        ManagementTlv {
            management_id: 0,
            data: Vec::new(),
        },
    );
    let mut encoded = Packet::Management(msg).encode();
    let action_at = Header::SIZE + PortIdentity::SIZE + 2;
    encoded[action_at] = 0x0F;
    assert!(matches!(
        decode_packet(&encoded),
        Err(ProtocolError::UnsupportedManagementAction(0x0F))
    ));
}

#[test]
fn test_management_truncated_inner_tlv_rejected() {
    let msg = Management::new(
        source(),
        26,
        ManagementAction::Get,
        ManagementTlv {
            management_id: 0,
            data: Vec::new(),
        },
    );
    let encoded = Packet::Management(msg).encode();
    // Cut into the inner TLV head (and below messageLength).
    let truncated = &encoded[..Header::SIZE + PortIdentity::SIZE + 4 + 2];
    assert!(decode_packet(truncated).is_err());
}
