//! Tokio UDP implementation of [`Transport`].

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::types::Timestamp;

use super::{EVENT_PORT, GENERAL_PORT, Inbound, Timestamping, Transport, TransportError};

/// Capacity of the merged inbound channel.
const INBOUND_QUEUE: usize = 64;

/// Receive buffer size; PTP datagrams are far smaller.
const RECV_BUF_SIZE: usize = 1024;

/// UDP socket pair talking to one grandmaster.
///
/// Binds two ephemeral local ports, one per flow, and spawns a reader
/// task per socket. Both readers stamp datagrams on arrival and feed a
/// single inbound queue; traffic from any address other than the
/// configured grandmaster is dropped with a warning.
///
/// Timestamps are captured in software at the `send`/`recv` call
/// boundary. Obtaining NIC hardware stamps requires a platform
/// timestamping capability this transport does not wrap, so
/// [`Timestamping::Hardware`] fails at bind and [`Timestamping::Auto`]
/// degrades to software.
pub struct UdpTransport {
    event_socket: Arc<UdpSocket>,
    general_socket: Arc<UdpSocket>,
    event_dest: SocketAddr,
    general_dest: SocketAddr,
    inbound: mpsc::Receiver<Inbound>,
    shutdown_tx: watch::Sender<bool>,
    readers: Vec<JoinHandle<()>>,
}

impl UdpTransport {
    /// Bind a socket pair aimed at `server` on the standard PTP ports.
    ///
    /// # Errors
    /// Fails if either socket cannot be bound or if hardware timestamps
    /// were demanded.
    pub async fn bind(server: IpAddr, timestamping: Timestamping) -> Result<Self, TransportError> {
        Self::bind_with_ports(server, EVENT_PORT, GENERAL_PORT, timestamping).await
    }

    /// Bind a socket pair aimed at non-standard server ports.
    ///
    /// Exists for tests and port-forwarded setups; production servers
    /// listen on 319/320.
    ///
    /// # Errors
    /// Fails if either socket cannot be bound or if hardware timestamps
    /// were demanded.
    pub async fn bind_with_ports(
        server: IpAddr,
        event_port: u16,
        general_port: u16,
        timestamping: Timestamping,
    ) -> Result<Self, TransportError> {
        match timestamping {
            Timestamping::Hardware => {
                return Err(TransportError::HardwareTimestampingUnavailable);
            }
            Timestamping::Auto => {
                tracing::debug!("hardware timestamps unavailable, using software timestamps");
            }
            Timestamping::Software => {}
        }

        let local: SocketAddr = if server.is_ipv4() {
            (IpAddr::from([0u8, 0, 0, 0]), 0).into()
        } else {
            (IpAddr::from([0u16, 0, 0, 0, 0, 0, 0, 0]), 0).into()
        };
        let event_socket = Arc::new(UdpSocket::bind(local).await?);
        let general_socket = Arc::new(UdpSocket::bind(local).await?);

        let (inbound_tx, inbound) = mpsc::channel(INBOUND_QUEUE);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let readers = vec![
            tokio::spawn(reader_loop(
                Arc::clone(&event_socket),
                server,
                true,
                inbound_tx.clone(),
                shutdown_rx.clone(),
            )),
            tokio::spawn(reader_loop(
                Arc::clone(&general_socket),
                server,
                false,
                inbound_tx,
                shutdown_rx,
            )),
        ];

        Ok(Self {
            event_socket,
            general_socket,
            event_dest: SocketAddr::new(server, event_port),
            general_dest: SocketAddr::new(server, general_port),
            inbound,
            shutdown_tx,
            readers,
        })
    }

    /// Local address of the event socket.
    ///
    /// # Errors
    /// Propagates the socket error.
    pub fn event_local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.event_socket.local_addr()?)
    }

    /// Local address of the general socket.
    ///
    /// # Errors
    /// Propagates the socket error.
    pub fn general_local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.general_socket.local_addr()?)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn send_general(&self, payload: &[u8]) -> Result<(), TransportError> {
        self.general_socket.send_to(payload, self.general_dest).await?;
        Ok(())
    }

    async fn send_event(&self, payload: &[u8]) -> Result<Timestamp, TransportError> {
        self.event_socket.send_to(payload, self.event_dest).await?;
        // Software transmit timestamp: taken right after the datagram
        // left the socket buffer.
        Ok(Timestamp::now())
    }

    async fn recv(&mut self) -> Option<Inbound> {
        self.inbound.recv().await
    }

    fn shutdown(&mut self) {
        let _ = self.shutdown_tx.send(true);
        for reader in self.readers.drain(..) {
            reader.abort();
        }
        self.inbound.close();
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn reader_loop(
    socket: Arc<UdpSocket>,
    server: IpAddr,
    event_port: bool,
    inbound_tx: mpsc::Sender<Inbound>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; RECV_BUF_SIZE];
    loop {
        tokio::select! {
            result = socket.recv_from(&mut buf) => {
                match result {
                    Ok((len, source)) => {
                        let rx_timestamp = Timestamp::now();
                        if source.ip() != server {
                            tracing::warn!(
                                %source,
                                expected = %server,
                                "dropping datagram from foreign source"
                            );
                            continue;
                        }
                        let item = Inbound {
                            payload: Bytes::copy_from_slice(&buf[..len]),
                            source,
                            rx_timestamp,
                            event_port,
                        };
                        if inbound_tx.send(item).await.is_err() {
                            break;
                        }
                    }
                    Err(e) if is_transient_udp_error(&e) => {
                        tracing::debug!("transient udp receive error: {e}");
                    }
                    Err(e) => {
                        tracing::warn!(event_port, "udp receive failed: {e}");
                        break;
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// Whether a UDP receive error is transient and worth retrying.
///
/// `recv_from` can report a connection reset after an earlier `send_to`
/// triggered an ICMP port-unreachable; the grandmaster may simply not be
/// listening yet.
fn is_transient_udp_error(e: &std::io::Error) -> bool {
    e.kind() == std::io::ErrorKind::ConnectionReset
}
