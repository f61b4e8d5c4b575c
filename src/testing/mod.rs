//! Test doubles for exercising the unicast client without sockets.

#![allow(clippy::missing_panics_doc)]

pub mod mock_grandmaster;

pub use mock_grandmaster::{MockGrandmaster, MockHandle, MockTransport};
