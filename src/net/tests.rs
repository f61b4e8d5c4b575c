use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::UdpSocket;

use super::{Timestamping, Transport, TransportError, UdpTransport};

const LOCALHOST: IpAddr = IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);

/// Bind a pretend grandmaster socket pair on ephemeral localhost ports.
async fn bind_server() -> (UdpSocket, UdpSocket, u16, u16) {
    let event = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
    let general = UdpSocket::bind((LOCALHOST, 0)).await.unwrap();
    let event_port = event.local_addr().unwrap().port();
    let general_port = general.local_addr().unwrap().port();
    (event, general, event_port, general_port)
}

fn reply_addr(transport_local: SocketAddr) -> SocketAddr {
    SocketAddr::new(LOCALHOST, transport_local.port())
}

#[tokio::test]
async fn test_hardware_timestamping_fails_setup() {
    let result = UdpTransport::bind(LOCALHOST, Timestamping::Hardware).await;
    assert!(matches!(
        result,
        Err(TransportError::HardwareTimestampingUnavailable)
    ));
}

#[tokio::test]
async fn test_general_send_and_receive() {
    let (_event, general, event_port, general_port) = bind_server().await;
    let mut transport =
        UdpTransport::bind_with_ports(LOCALHOST, event_port, general_port, Timestamping::Auto)
            .await
            .unwrap();

    transport.send_general(b"request").await.unwrap();
    let mut buf = [0u8; 64];
    let (len, src) = general.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..len], b"request");
    assert_eq!(src.port(), transport.general_local_addr().unwrap().port());

    general.send_to(b"grant", src).await.unwrap();
    let inbound = transport.recv().await.unwrap();
    assert_eq!(&inbound.payload[..], b"grant");
    assert!(!inbound.event_port);
    assert!(!inbound.rx_timestamp.is_empty());
}

#[tokio::test]
async fn test_event_send_returns_tx_timestamp() {
    let (event, _general, event_port, general_port) = bind_server().await;
    let mut transport =
        UdpTransport::bind_with_ports(LOCALHOST, event_port, general_port, Timestamping::Software)
            .await
            .unwrap();

    let tx_timestamp = transport.send_event(b"delay-req").await.unwrap();
    assert!(!tx_timestamp.is_empty());

    let mut buf = [0u8; 64];
    let (len, src) = event.recv_from(&mut buf).await.unwrap();
    assert_eq!(&buf[..len], b"delay-req");

    event.send_to(b"sync", src).await.unwrap();
    let inbound = transport.recv().await.unwrap();
    assert_eq!(&inbound.payload[..], b"sync");
    assert!(inbound.event_port);
}

#[tokio::test]
async fn test_foreign_source_dropped() {
    let (_event, general, event_port, general_port) = bind_server().await;
    let mut transport =
        UdpTransport::bind_with_ports(LOCALHOST, event_port, general_port, Timestamping::Software)
            .await
            .unwrap();

    // A sender on a different loopback address must be filtered out.
    let foreign = UdpSocket::bind("127.0.0.2:0").await.unwrap();
    let dest = reply_addr(transport.general_local_addr().unwrap());
    foreign.send_to(b"spoofed", dest).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    general.send_to(b"legit", dest).await.unwrap();

    let inbound = transport.recv().await.unwrap();
    assert_eq!(&inbound.payload[..], b"legit");
}

#[tokio::test]
async fn test_recv_ends_after_shutdown() {
    let (_event, _general, event_port, general_port) = bind_server().await;
    let mut transport =
        UdpTransport::bind_with_ports(LOCALHOST, event_port, general_port, Timestamping::Software)
            .await
            .unwrap();

    transport.shutdown();
    assert!(transport.recv().await.is_none());
}
