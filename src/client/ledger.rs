//! Measurement ledger: pairs the four timestamps of each unicast exchange.
//!
//! Messages of one exchange arrive in no particular order, so the ledger
//! keeps two per-direction maps keyed by sequence id and merges halves as
//! they show up: Sync + `Follow_Up` complete a server-to-client sample,
//! the `Delay_Req` transmit timestamp + `Delay_Resp` complete a
//! client-to-server sample. [`Measurements::latest`] combines the most
//! recent complete sample of each direction into a path-delay / offset
//! result using the IEEE 1588 delay request-response algebra, corrections
//! included.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::{Correction, Timestamp};

/// One complete delay request-response measurement.
///
/// All quantities are signed nanoseconds. `offset` is (client − server):
/// positive means the local clock is ahead of the grandmaster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasurementResult {
    /// Mean path delay.
    pub delay_ns: i128,
    /// Clock offset.
    pub offset_ns: i128,
    /// Corrected server-to-client transit time (t2 − t1 − c1 − c2).
    pub server_to_client_ns: i128,
    /// Corrected client-to-server transit time (t4 − t3 − c3).
    pub client_to_server_ns: i128,
    /// Server receive time (t4) of the contributing exchange.
    pub timestamp: Timestamp,
}

/// Sync/`Follow_Up` half of an exchange.
#[derive(Debug, Clone, Copy, Default)]
struct ServerToClientSample {
    /// Server departure time, from the `Follow_Up` precise origin.
    t1: Timestamp,
    /// Local receive time of the Sync.
    t2: Timestamp,
    /// Sync correction field.
    c1: Correction,
    /// `Follow_Up` correction field.
    c2: Correction,
}

impl ServerToClientSample {
    fn is_complete(&self) -> bool {
        !self.t1.is_empty() && !self.t2.is_empty()
    }
}

/// `Delay_Req`/`Delay_Resp` half of an exchange.
#[derive(Debug, Clone, Copy, Default)]
struct ClientToServerSample {
    /// Local transmit time of the `Delay_Req`.
    t3: Timestamp,
    /// Server receive time, from the `Delay_Resp`.
    t4: Timestamp,
    /// `Delay_Resp` correction field.
    c3: Correction,
}

impl ClientToServerSample {
    fn is_complete(&self) -> bool {
        !self.t3.is_empty() && !self.t4.is_empty()
    }
}

#[derive(Debug, Default)]
struct Inner {
    server_to_client: HashMap<u16, ServerToClientSample>,
    client_to_server: HashMap<u16, ClientToServerSample>,
}

/// Ledger of partial and complete samples, serialised by one mutex.
///
/// All operations are idempotent per `(sequence id, direction)`: the
/// first value recorded for a field wins, so a completed sample is never
/// rewritten by duplicated or replayed datagrams.
#[derive(Debug, Default)]
pub struct Measurements {
    inner: Mutex<Inner>,
}

impl Measurements {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the local receive time and correction of a Sync.
    pub fn add_sync(&self, sequence_id: u16, t2: Timestamp, correction: Correction) {
        let mut inner = self.inner.lock().unwrap();
        let sample = inner.server_to_client.entry(sequence_id).or_default();
        if sample.t2.is_empty() {
            sample.t2 = t2;
            sample.c1 = correction;
        }
    }

    /// Record the precise origin time and correction of a `Follow_Up`.
    pub fn add_follow_up(&self, sequence_id: u16, t1: Timestamp, correction: Correction) {
        let mut inner = self.inner.lock().unwrap();
        let sample = inner.server_to_client.entry(sequence_id).or_default();
        if sample.t1.is_empty() {
            sample.t1 = t1;
            sample.c2 = correction;
        }
    }

    /// Record the transmit time of a `Delay_Req`.
    pub fn add_delay_req(&self, sequence_id: u16, t3: Timestamp) {
        let mut inner = self.inner.lock().unwrap();
        let sample = inner.client_to_server.entry(sequence_id).or_default();
        if sample.t3.is_empty() {
            sample.t3 = t3;
        }
    }

    /// Record the server receive time and correction of a `Delay_Resp`.
    pub fn add_delay_resp(&self, sequence_id: u16, t4: Timestamp, correction: Correction) {
        let mut inner = self.inner.lock().unwrap();
        let sample = inner.client_to_server.entry(sequence_id).or_default();
        if sample.t4.is_empty() {
            sample.t4 = t4;
            sample.c3 = correction;
        }
    }

    /// Combine the freshest complete sample of each direction.
    ///
    /// Returns `None` until both directions have completed at least one
    /// exchange. The two directions are paired by recency, not by
    /// sequence id, so 16-bit wrap-around is harmless.
    #[must_use]
    pub fn latest(&self) -> Option<MeasurementResult> {
        let inner = self.inner.lock().unwrap();
        let server_to_client = inner
            .server_to_client
            .values()
            .filter(|s| s.is_complete())
            .max_by_key(|s| s.t2)?;
        let client_to_server = inner
            .client_to_server
            .values()
            .filter(|s| s.is_complete())
            .max_by_key(|s| s.t4)?;

        let stc = server_to_client.t2.diff_nanos(&server_to_client.t1)
            - i128::from(server_to_client.c1.measurement_nanos())
            - i128::from(server_to_client.c2.measurement_nanos());
        let cts = client_to_server.t4.diff_nanos(&client_to_server.t3)
            - i128::from(client_to_server.c3.measurement_nanos());
        let delay = (stc + cts) / 2;
        let offset = stc - delay;

        Some(MeasurementResult {
            delay_ns: delay,
            offset_ns: offset,
            server_to_client_ns: stc,
            client_to_server_ns: cts,
            timestamp: client_to_server.t4,
        })
    }

    /// Number of complete samples per direction, for diagnostics.
    #[must_use]
    pub fn complete_counts(&self) -> (usize, usize) {
        let inner = self.inner.lock().unwrap();
        (
            inner
                .server_to_client
                .values()
                .filter(|s| s.is_complete())
                .count(),
            inner
                .client_to_server
                .values()
                .filter(|s| s.is_complete())
                .count(),
        )
    }
}
