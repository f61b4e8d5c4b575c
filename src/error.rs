//! Session-level error types.

use crate::net::TransportError;
use crate::protocol::header::MessageType;

/// Fatal errors of a unicast session.
///
/// Per-datagram problems (parse failures, unsupported TLVs, foreign
/// sources) are logged and recovered inside the session loop; everything
/// here terminates the session.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Socket setup failed before the session loop started.
    #[error("transport setup failed: {0}")]
    Setup(#[source] TransportError),
    /// Socket send/receive failed mid-session.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The server answered a grant request with a zero duration.
    #[error("server denied unicast grant for {0}")]
    GrantDenied(MessageType),
    /// The session deadline elapsed.
    #[error("session deadline elapsed")]
    Timeout,
}
