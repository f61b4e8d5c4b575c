//! In-process mock grandmaster implementing [`Transport`].
//!
//! The mock answers grant requests from a configured grant table, answers
//! `Delay_Req` with scripted `(t4, correction)` pairs, and hands scripted
//! transmit timestamps back to the client, so tests control every
//! timestamp of an exchange exactly. Messages the grandmaster originates
//! (Announce, Sync, `Follow_Up`, Cancel) are injected through
//! [`MockHandle`].

use std::collections::{HashMap, VecDeque};
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::net::{Inbound, Transport, TransportError};
use crate::protocol::header::{Header, MessageType};
use crate::protocol::messages::{Announce, DelayResp, FollowUp, Packet, Sync, decode_packet};
use crate::protocol::signaling::{CancelUnicast, GrantUnicast, Signaling, Tlv};
use crate::types::{
    ClockIdentity, ClockQuality, Correction, PortIdentity, TimeSource, Timestamp,
};

/// Address the mock pretends to serve from.
fn mock_server_addr() -> SocketAddr {
    SocketAddr::new(IpAddr::from([192, 0, 2, 1]), 320)
}

fn gm_port_identity() -> PortIdentity {
    PortIdentity::new(ClockIdentity(0x0C42_A1FF_FE00_0001), 1)
}

#[derive(Debug, Default)]
struct Script {
    /// Grant duration per requested message type; absent = stay silent.
    grants: HashMap<MessageType, u32>,
    /// Transmit timestamps handed out for event-port sends, in order.
    tx_timestamps: Mutex<VecDeque<Timestamp>>,
    /// Scripted `Delay_Resp` answers, in order.
    delay_responses: Mutex<VecDeque<(Timestamp, Correction)>>,
}

/// Builder for a scripted mock grandmaster.
#[derive(Debug, Default)]
pub struct MockGrandmaster {
    grants: HashMap<MessageType, u32>,
    tx_timestamps: VecDeque<Timestamp>,
    delay_responses: VecDeque<(Timestamp, Correction)>,
}

impl MockGrandmaster {
    /// A grandmaster that answers nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A grandmaster granting Announce, Sync and `Delay_Resp` for
    /// `duration` seconds.
    #[must_use]
    pub fn granting_all(duration: u32) -> Self {
        Self::new()
            .with_grant(MessageType::Announce, duration)
            .with_grant(MessageType::Sync, duration)
            .with_grant(MessageType::DelayResp, duration)
    }

    /// Answer requests for `message_type` with `duration` (0 = deny).
    #[must_use]
    pub fn with_grant(mut self, message_type: MessageType, duration: u32) -> Self {
        self.grants.insert(message_type, duration);
        self
    }

    /// Queue a transmit timestamp for the next event-port send.
    #[must_use]
    pub fn with_tx_timestamp(mut self, t3: Timestamp) -> Self {
        self.tx_timestamps.push_back(t3);
        self
    }

    /// Queue an automatic `Delay_Resp` for the next `Delay_Req`.
    #[must_use]
    pub fn with_delay_response(mut self, t4: Timestamp, correction: Correction) -> Self {
        self.delay_responses.push_back((t4, correction));
        self
    }

    /// Split into the client-side transport and the test-side handle.
    #[must_use]
    pub fn build(self) -> (MockTransport, MockHandle) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let gm_sequence = Arc::new(AtomicU16::new(0));
        let transport = MockTransport {
            inbound_rx,
            inbound_tx: inbound_tx.clone(),
            script: Script {
                grants: self.grants,
                tx_timestamps: Mutex::new(self.tx_timestamps),
                delay_responses: Mutex::new(self.delay_responses),
            },
            sent: Arc::clone(&sent),
            gm_sequence: Arc::clone(&gm_sequence),
        };
        let handle = MockHandle {
            inbound_tx,
            sent,
            gm_sequence,
        };
        (transport, handle)
    }
}

/// Client-side half: a [`Transport`] backed by channels.
pub struct MockTransport {
    inbound_rx: mpsc::UnboundedReceiver<Inbound>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    script: Script,
    sent: Arc<Mutex<Vec<Packet>>>,
    gm_sequence: Arc<AtomicU16>,
}

impl MockTransport {
    fn record(&self, payload: &[u8]) -> Packet {
        let packet = decode_packet(payload).expect("client sent an undecodable datagram");
        self.sent.lock().unwrap().push(packet.clone());
        packet
    }

    fn answer_request(&self, signaling: &Signaling) {
        for tlv in &signaling.tlvs {
            if let Tlv::RequestUnicast(request) = tlv {
                if let Some(&duration) = self.script.grants.get(&request.message_type) {
                    let grant = GrantUnicast {
                        message_type: request.message_type,
                        log_inter_message_period: request.log_inter_message_period,
                        duration,
                        renewal_invited: false,
                    };
                    let sequence_id = self.gm_sequence.fetch_add(1, Ordering::Relaxed);
                    let reply =
                        Signaling::new(gm_port_identity(), sequence_id, vec![Tlv::GrantUnicast(
                            grant,
                        )]);
                    let _ = self.inbound_tx.send(general_inbound(Packet::Signaling(reply)));
                }
            }
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_general(&self, payload: &[u8]) -> Result<(), TransportError> {
        let packet = self.record(payload);
        if let Packet::Signaling(signaling) = &packet {
            self.answer_request(signaling);
        }
        Ok(())
    }

    async fn send_event(&self, payload: &[u8]) -> Result<Timestamp, TransportError> {
        let packet = self.record(payload);
        let t3 = self
            .script
            .tx_timestamps
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(Timestamp::now);
        if let Packet::DelayReq(request) = &packet {
            if let Some((t4, correction)) =
                self.script.delay_responses.lock().unwrap().pop_front()
            {
                let mut resp = DelayResp {
                    header: Header::new(
                        MessageType::DelayResp,
                        gm_port_identity(),
                        request.header.sequence_id,
                    ),
                    receive_timestamp: t4,
                    requesting_port_identity: request.header.source_port_identity,
                };
                resp.header.correction = correction;
                let _ = self.inbound_tx.send(general_inbound(Packet::DelayResp(resp)));
            }
        }
        Ok(t3)
    }

    async fn recv(&mut self) -> Option<Inbound> {
        self.inbound_rx.recv().await
    }

    fn shutdown(&mut self) {
        self.inbound_rx.close();
    }
}

/// Test-side half: injects grandmaster-originated traffic and inspects
/// what the client sent.
#[derive(Clone)]
pub struct MockHandle {
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    sent: Arc<Mutex<Vec<Packet>>>,
    gm_sequence: Arc<AtomicU16>,
}

impl MockHandle {
    fn next_sequence(&self) -> u16 {
        self.gm_sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Inject an arbitrary general-port datagram.
    pub fn inject_general(&self, packet: Packet) {
        let _ = self.inbound_tx.send(general_inbound(packet));
    }

    /// Inject raw general-port bytes, undecodable ones included.
    pub fn inject_general_bytes(&self, payload: Vec<u8>) {
        let _ = self.inbound_tx.send(Inbound {
            payload: Bytes::from(payload),
            source: mock_server_addr(),
            rx_timestamp: Timestamp::now(),
            event_port: false,
        });
    }

    /// Inject an Announce with the mock grandmaster's properties.
    pub fn inject_announce(&self, current_utc_offset: i16) {
        let announce = Announce {
            header: Header::new(MessageType::Announce, gm_port_identity(), self.next_sequence()),
            origin_timestamp: Timestamp::ZERO,
            current_utc_offset,
            grandmaster_priority1: 128,
            grandmaster_clock_quality: ClockQuality::default(),
            grandmaster_priority2: 128,
            grandmaster_identity: gm_port_identity().clock_identity,
            steps_removed: 0,
            time_source: TimeSource::GNSS,
            tlvs: Vec::new(),
        };
        self.inject_general(Packet::Announce(announce));
    }

    /// Inject a Sync observed locally at `rx_timestamp` (t2).
    pub fn inject_sync(&self, sequence_id: u16, rx_timestamp: Timestamp, correction: Correction) {
        let mut sync = Sync {
            header: Header::new(MessageType::Sync, gm_port_identity(), sequence_id),
            origin_timestamp: Timestamp::ZERO,
        };
        sync.header.flags |= crate::types::flags::TWO_STEP;
        sync.header.correction = correction;
        let _ = self.inbound_tx.send(Inbound {
            payload: Bytes::from(Packet::Sync(sync).encode()),
            source: SocketAddr::new(mock_server_addr().ip(), 319),
            rx_timestamp,
            event_port: true,
        });
    }

    /// Inject the `Follow_Up` carrying the precise origin (t1).
    pub fn inject_follow_up(&self, sequence_id: u16, t1: Timestamp, correction: Correction) {
        let mut follow_up = FollowUp {
            header: Header::new(MessageType::FollowUp, gm_port_identity(), sequence_id),
            precise_origin_timestamp: t1,
        };
        follow_up.header.correction = correction;
        self.inject_general(Packet::FollowUp(follow_up));
    }

    /// Inject a server-initiated cancel for `message_type`.
    pub fn inject_cancel(&self, message_type: MessageType) {
        let cancel = Signaling::new(gm_port_identity(), self.next_sequence(), vec![
            Tlv::CancelUnicast(CancelUnicast {
                message_type,
                flags: 0,
            }),
        ]);
        self.inject_general(Packet::Signaling(cancel));
    }

    /// Everything the client sent so far, decoded.
    #[must_use]
    pub fn sent(&self) -> Vec<Packet> {
        self.sent.lock().unwrap().clone()
    }

    /// Message types the client requested grants for, in order.
    #[must_use]
    pub fn requested_grants(&self) -> Vec<MessageType> {
        self.sent()
            .iter()
            .filter_map(|packet| match packet {
                Packet::Signaling(signaling) => Some(signaling.tlvs.iter().filter_map(|tlv| {
                    match tlv {
                        Tlv::RequestUnicast(request) => Some(request.message_type),
                        _ => None,
                    }
                })),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Message types the client acknowledged cancels for, in order.
    #[must_use]
    pub fn acknowledged_cancels(&self) -> Vec<MessageType> {
        self.sent()
            .iter()
            .filter_map(|packet| match packet {
                Packet::Signaling(signaling) => Some(signaling.tlvs.iter().filter_map(|tlv| {
                    match tlv {
                        Tlv::AcknowledgeCancelUnicast(ack) => Some(ack.message_type),
                        _ => None,
                    }
                })),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Sequence ids of the `Delay_Req` messages the client sent.
    #[must_use]
    pub fn delay_req_sequences(&self) -> Vec<u16> {
        self.sent()
            .iter()
            .filter_map(|packet| match packet {
                Packet::DelayReq(request) => Some(request.header.sequence_id),
                _ => None,
            })
            .collect()
    }
}

fn general_inbound(packet: Packet) -> Inbound {
    Inbound {
        payload: Bytes::from(packet.encode()),
        source: mock_server_addr(),
        rx_timestamp: Timestamp::now(),
        event_port: false,
    }
}
