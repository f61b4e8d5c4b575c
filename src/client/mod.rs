//! Unicast PTPv2 two-step client.
//!
//! The client negotiates per-message-type transmission grants with a
//! grandmaster (IEEE 1588 §16.1), then consumes the granted Announce /
//! Sync / `Follow_Up` flows, answers each completed `Follow_Up` with a
//! `Delay_Req`, and folds the resulting four-timestamp exchanges into
//! path-delay / clock-offset measurements delivered through a callback.
//!
//! ## Session lifecycle
//!
//! ```text
//! Init ──── Grant(Announce) ───▶ InProgress ──── Cancel / shutdown ───▶ Done
//!  │ request Announce every 1s     │ request Sync, then Delay_Resp grants
//!  │                               │ Sync/Follow_Up/Delay_Resp exchange
//!  ▼                               ▼
//! deadline ⇒ Timeout            grant with duration 0 ⇒ GrantDenied
//! ```
//!
//! The state machine runs single-threaded inside [`UnicastClient::run`];
//! the transport's reader tasks are the only other tasks of a session.

pub mod ledger;

#[cfg(test)]
mod tests;

pub use ledger::{MeasurementResult, Measurements};

use std::net::IpAddr;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::ClientError;
use crate::net::{Inbound, Timestamping, Transport, TransportError, UdpTransport};
use crate::protocol::header::MessageType;
use crate::protocol::messages::{DelayReq, Packet, decode_packet};
use crate::protocol::signaling::{
    AcknowledgeCancelUnicast, CancelUnicast, GrantUnicast, RequestUnicast, Signaling, Tlv,
};
use crate::types::{ClockIdentity, ClockQuality, PortIdentity, TimeSource};

/// Configuration of a unicast session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Grandmaster address.
    pub server: IpAddr,
    /// Identity this client presents, conventionally derived from the
    /// MAC of the interface it binds.
    pub clock_identity: ClockIdentity,
    /// PTP domain to participate in.
    pub domain_number: u8,
    /// Horizon of each unicast grant request.
    pub grant_duration: Duration,
    /// Whole-session deadline.
    pub timeout: Duration,
    /// Timestamp source preference for event traffic.
    pub timestamping: Timestamping,
}

impl ClientConfig {
    /// Interval at which the Announce grant request is repeated while the
    /// handshake has not started.
    pub const REQUEST_RETRY_INTERVAL: Duration = Duration::from_secs(1);

    /// Create a config with the defaults used by the probes.
    #[must_use]
    pub fn new(server: IpAddr, clock_identity: ClockIdentity) -> Self {
        Self {
            server,
            clock_identity,
            domain_number: 0,
            grant_duration: Duration::from_secs(300),
            timeout: Duration::from_secs(60),
            timestamping: Timestamping::Auto,
        }
    }
}

/// How a session ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The caller signalled shutdown.
    ShutDown,
    /// The grandmaster cancelled the unicast grants; the cancellation was
    /// acknowledged.
    ServerCancelled,
}

/// Last grandmaster properties seen in an Announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerState {
    /// Grandmaster clock identity.
    pub grandmaster_identity: ClockIdentity,
    /// TAI − UTC offset the server reports.
    pub current_utc_offset: i16,
    /// Time source feeding the grandmaster.
    pub time_source: TimeSource,
    /// Grandmaster clock quality.
    pub clock_quality: ClockQuality,
    /// Boundary clocks between the grandmaster and this client.
    pub steps_removed: u16,
}

/// Closing report of a session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// How the session ended.
    pub outcome: SessionOutcome,
    /// Measurements handed to the callback.
    pub measurements_delivered: u64,
    /// Datagrams received from the grandmaster (decodable or not).
    pub packets_received: u64,
    /// Last observed grandmaster properties, if any Announce arrived.
    pub server_state: Option<ServerState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    /// Waiting for the Announce grant; re-requesting every second.
    Init,
    /// Announce granted; exchanging messages.
    InProgress,
}

/// Unicast PTP client over a [`Transport`].
pub struct UnicastClient<T: Transport> {
    transport: T,
    config: ClientConfig,
    state: SessionState,
    local_port: PortIdentity,
    /// Sequence counter for general-port sends (signaling).
    general_sequence: u16,
    /// Sequence counter for event-port sends (`Delay_Req`).
    event_sequence: u16,
    measurements: Measurements,
    server_state: Option<ServerState>,
    sync_requested: bool,
    delay_resp_requested: bool,
    measurements_delivered: u64,
    packets_received: u64,
}

impl UnicastClient<UdpTransport> {
    /// Bind UDP sockets towards the configured grandmaster.
    ///
    /// # Errors
    /// Returns a setup error when the sockets cannot be bound or the
    /// requested timestamping mode is unavailable.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = UdpTransport::bind(config.server, config.timestamping)
            .await
            .map_err(ClientError::Setup)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> UnicastClient<T> {
    /// Build a client over an existing transport.
    #[must_use]
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let local_port = PortIdentity::new(config.clock_identity, 1);
        Self {
            transport,
            config,
            state: SessionState::Init,
            local_port,
            general_sequence: 0,
            event_sequence: 0,
            measurements: Measurements::new(),
            server_state: None,
            sync_requested: false,
            delay_resp_requested: false,
            measurements_delivered: 0,
            packets_received: 0,
        }
    }

    /// Run the session until shutdown, server cancel, the deadline, or a
    /// fatal error.
    ///
    /// `on_measurement` is invoked synchronously from the session loop for
    /// every completed exchange; it must not block.
    ///
    /// # Errors
    /// [`ClientError::GrantDenied`] when the server answers a request with
    /// a zero-duration grant, [`ClientError::Timeout`] when the configured
    /// session deadline passes, and [`ClientError::Transport`] on socket
    /// failures.
    pub async fn run<F>(
        mut self,
        mut shutdown: watch::Receiver<bool>,
        mut on_measurement: F,
    ) -> Result<SessionSummary, ClientError>
    where
        F: FnMut(MeasurementResult) + Send,
    {
        let deadline = tokio::time::Instant::now() + self.config.timeout;
        let mut request_timer = tokio::time::interval(ClientConfig::REQUEST_RETRY_INTERVAL);

        tracing::info!(
            server = %self.config.server,
            domain = self.config.domain_number,
            "unicast session starting"
        );

        loop {
            tokio::select! {
                inbound = self.transport.recv() => {
                    let Some(inbound) = inbound else {
                        return Err(ClientError::Transport(TransportError::Closed));
                    };
                    self.packets_received += 1;
                    match decode_packet(&inbound.payload) {
                        Ok(packet) => {
                            if let Some(outcome) =
                                self.handle_packet(packet, &inbound, &mut on_measurement).await?
                            {
                                self.transport.shutdown();
                                return Ok(self.summary(outcome));
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                source = %inbound.source,
                                len = inbound.payload.len(),
                                "dropping undecodable datagram: {e}"
                            );
                        }
                    }
                }

                // Repeat the Announce grant request until the handshake
                // starts. The first tick fires immediately and doubles as
                // the initial request.
                _ = request_timer.tick() => {
                    if self.state == SessionState::Init {
                        self.request_grant(MessageType::Announce).await?;
                    }
                }

                () = tokio::time::sleep_until(deadline) => {
                    tracing::warn!("session deadline elapsed");
                    self.transport.shutdown();
                    return Err(ClientError::Timeout);
                }

                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("unicast session shutting down");
                        self.transport.shutdown();
                        return Ok(self.summary(SessionOutcome::ShutDown));
                    }
                }
            }
        }
    }

    fn summary(&self, outcome: SessionOutcome) -> SessionSummary {
        SessionSummary {
            outcome,
            measurements_delivered: self.measurements_delivered,
            packets_received: self.packets_received,
            server_state: self.server_state,
        }
    }

    async fn handle_packet<F>(
        &mut self,
        packet: Packet,
        inbound: &Inbound,
        on_measurement: &mut F,
    ) -> Result<Option<SessionOutcome>, ClientError>
    where
        F: FnMut(MeasurementResult) + Send,
    {
        match packet {
            Packet::Signaling(signaling) => {
                for tlv in signaling.tlvs {
                    match tlv {
                        Tlv::GrantUnicast(grant) => self.handle_grant(grant).await?,
                        Tlv::CancelUnicast(cancel) => {
                            self.acknowledge_cancel(cancel).await?;
                            return Ok(Some(SessionOutcome::ServerCancelled));
                        }
                        other => {
                            tracing::debug!("ignoring signaling TLV {:04x}", other.tlv_type());
                        }
                    }
                }
            }
            Packet::Announce(announce) => {
                tracing::debug!(
                    seq = announce.header.sequence_id,
                    gm = %announce.grandmaster_identity,
                    utc_offset = announce.current_utc_offset,
                    "announce"
                );
                self.server_state = Some(ServerState {
                    grandmaster_identity: announce.grandmaster_identity,
                    current_utc_offset: announce.current_utc_offset,
                    time_source: announce.time_source,
                    clock_quality: announce.grandmaster_clock_quality,
                    steps_removed: announce.steps_removed,
                });
            }
            Packet::Sync(sync) => {
                // t2 is when the frame hit our receive path, not anything
                // carried in the body.
                tracing::debug!(seq = sync.header.sequence_id, t2 = %inbound.rx_timestamp, "sync");
                self.measurements.add_sync(
                    sync.header.sequence_id,
                    inbound.rx_timestamp,
                    sync.header.correction,
                );
            }
            Packet::FollowUp(follow_up) => {
                tracing::debug!(
                    seq = follow_up.header.sequence_id,
                    t1 = %follow_up.precise_origin_timestamp,
                    "follow-up"
                );
                self.measurements.add_follow_up(
                    follow_up.header.sequence_id,
                    follow_up.precise_origin_timestamp,
                    follow_up.header.correction,
                );
                self.send_delay_req().await?;
            }
            Packet::DelayResp(resp) => {
                tracing::debug!(
                    seq = resp.header.sequence_id,
                    t4 = %resp.receive_timestamp,
                    "delay-resp"
                );
                self.measurements.add_delay_resp(
                    resp.header.sequence_id,
                    resp.receive_timestamp,
                    resp.header.correction,
                );
                if let Some(result) = self.measurements.latest() {
                    self.measurements_delivered += 1;
                    on_measurement(result);
                }
            }
            Packet::DelayReq(_) | Packet::Management(_) => {
                tracing::debug!("ignoring {} from server", packet.header().message_type);
            }
        }
        Ok(None)
    }

    async fn handle_grant(&mut self, grant: GrantUnicast) -> Result<(), ClientError> {
        if grant.duration == 0 {
            tracing::warn!(%grant.message_type, "server denied unicast grant");
            return Err(ClientError::GrantDenied(grant.message_type));
        }
        tracing::info!(
            %grant.message_type,
            duration = grant.duration,
            renewal = grant.renewal_invited,
            "unicast grant received"
        );
        match grant.message_type {
            MessageType::Announce => {
                if self.state == SessionState::Init {
                    self.state = SessionState::InProgress;
                }
                if !self.sync_requested {
                    self.sync_requested = true;
                    self.request_grant(MessageType::Sync).await?;
                }
            }
            MessageType::Sync => {
                if !self.delay_resp_requested {
                    self.delay_resp_requested = true;
                    self.request_grant(MessageType::DelayResp).await?;
                }
            }
            MessageType::DelayResp => {
                tracing::info!("unicast handshake complete");
            }
            other => {
                tracing::debug!(%other, "grant for a message type we never requested");
            }
        }
        Ok(())
    }

    async fn request_grant(&mut self, message_type: MessageType) -> Result<(), ClientError> {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "grant durations are configured in seconds well below u32::MAX"
        )]
        let request = RequestUnicast {
            message_type,
            log_inter_message_period: 0,
            duration: self.config.grant_duration.as_secs() as u32,
        };
        tracing::debug!(%message_type, duration = request.duration, "requesting unicast grant");
        self.send_signaling(vec![Tlv::RequestUnicast(request)]).await
    }

    async fn acknowledge_cancel(&mut self, cancel: CancelUnicast) -> Result<(), ClientError> {
        tracing::info!(%cancel.message_type, "server cancelled unicast grant, acknowledging");
        self.send_signaling(vec![Tlv::AcknowledgeCancelUnicast(AcknowledgeCancelUnicast {
            message_type: cancel.message_type,
            flags: cancel.flags,
        })])
        .await
    }

    async fn send_signaling(&mut self, tlvs: Vec<Tlv>) -> Result<(), ClientError> {
        let sequence_id = self.general_sequence;
        self.general_sequence = self.general_sequence.wrapping_add(1);
        let mut signaling = Signaling::new(self.local_port, sequence_id, tlvs);
        signaling.header.domain_number = self.config.domain_number;
        self.transport
            .send_general(&Packet::Signaling(signaling).encode())
            .await?;
        Ok(())
    }

    async fn send_delay_req(&mut self) -> Result<(), ClientError> {
        let sequence_id = self.event_sequence;
        self.event_sequence = self.event_sequence.wrapping_add(1);
        let mut delay_req = DelayReq::new(self.local_port, sequence_id);
        delay_req.header.domain_number = self.config.domain_number;
        let t3 = self
            .transport
            .send_event(&Packet::DelayReq(delay_req).encode())
            .await?;
        tracing::debug!(seq = sequence_id, %t3, "delay-req sent");
        self.measurements.add_delay_req(sequence_id, t3);
        Ok(())
    }
}
