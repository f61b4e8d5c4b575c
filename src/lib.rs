//! # ptpclient
//!
//! A unicast PTPv2 (IEEE 1588-2019) two-step client with bit-exact wire
//! codecs.
//!
//! The client negotiates per-message-type unicast grants with a
//! grandmaster, exchanges event messages on a timestamped socket pair,
//! and correlates the four timestamps of each delay request-response
//! exchange into path-delay and clock-offset measurements. It emits
//! measurements; disciplining a clock from them is the caller's business.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ptpclient::{ClientConfig, UnicastClient};
//! use ptpclient::types::ClockIdentity;
//!
//! # async fn example() -> Result<(), ptpclient::ClientError> {
//! let config = ClientConfig::new(
//!     "192.0.2.1".parse().unwrap(),
//!     ClockIdentity::from_mac(&[0x0C, 0x42, 0xA1, 0x6D, 0x7C, 0xC6]).unwrap(),
//! );
//! let client = UnicastClient::connect(config).await?;
//!
//! let (_shutdown, shutdown_rx) = tokio::sync::watch::channel(false);
//! let summary = client
//!     .run(shutdown_rx, |m| {
//!         println!("delay {} ns, offset {} ns", m.delay_ns, m.offset_ns);
//!     })
//!     .await?;
//! println!("session over: {:?}", summary.outcome);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Error types
pub mod error;
/// Wire primitives
pub mod types;

pub mod client;
pub mod net;
pub mod protocol;
pub mod testing;

// Re-exports
pub use client::{
    ClientConfig, MeasurementResult, Measurements, ServerState, SessionOutcome, SessionSummary,
    UnicastClient,
};
pub use error::ClientError;
pub use net::{Timestamping, Transport, UdpTransport};
pub use protocol::{Packet, decode_packet};
