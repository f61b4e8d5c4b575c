use crate::client::ledger::Measurements;
use crate::types::{Correction, Timestamp};

const MS: i128 = 1_000_000;

fn ts(base_s: u64, offset_ns: i128) -> Timestamp {
    Timestamp::from_nanos(Timestamp::new(base_s, 0).to_nanos() + offset_ns)
}

fn no_correction() -> Correction {
    Correction::default()
}

/// Four adds of one symmetric exchange: delay = transit, offset = 0.
fn add_symmetric(ledger: &Measurements, seq: u16) {
    let t1 = ts(1000, 0);
    let t2 = ts(1000, 100 * MS);
    let t3 = ts(1000, 200 * MS);
    let t4 = ts(1000, 300 * MS);
    ledger.add_follow_up(seq, t1, no_correction());
    ledger.add_sync(seq, t2, no_correction());
    ledger.add_delay_req(seq, t3);
    ledger.add_delay_resp(seq, t4, no_correction());
}

#[test]
fn test_empty_ledger_has_no_result() {
    let ledger = Measurements::new();
    assert!(ledger.latest().is_none());
}

#[test]
fn test_symmetric_exchange() {
    let ledger = Measurements::new();
    add_symmetric(&ledger, 0);
    let result = ledger.latest().unwrap();
    assert_eq!(result.delay_ns, 100 * MS);
    assert_eq!(result.offset_ns, 0);
    assert_eq!(result.server_to_client_ns, 100 * MS);
    assert_eq!(result.client_to_server_ns, 100 * MS);
    assert_eq!(result.timestamp, ts(1000, 300 * MS));
}

#[test]
fn test_asymmetric_exchange() {
    let ledger = Measurements::new();
    // Server-to-client transit 200 ms, client-to-server 400 ms.
    ledger.add_follow_up(5, ts(1000, 0), no_correction());
    ledger.add_sync(5, ts(1000, 200 * MS), no_correction());
    ledger.add_delay_req(0, ts(1000, 300 * MS));
    ledger.add_delay_resp(0, ts(1000, 700 * MS), no_correction());

    let result = ledger.latest().unwrap();
    assert_eq!(result.delay_ns, 300 * MS);
    assert_eq!(result.offset_ns, -100 * MS);
    assert_eq!(result.server_to_client_ns, 200 * MS);
    assert_eq!(result.client_to_server_ns, 400 * MS);
}

#[test]
fn test_corrections_enter_the_math() {
    let ledger = Measurements::new();
    ledger.add_sync(5, ts(1000, 200 * MS), Correction::from_nanos(6_000.0));
    ledger.add_follow_up(5, ts(1000, 0), no_correction());
    ledger.add_delay_req(0, ts(1000, 300 * MS));
    ledger.add_delay_resp(0, ts(1000, 700 * MS), Correction::from_nanos(4_000.0));

    let result = ledger.latest().unwrap();
    assert_eq!(result.server_to_client_ns, 199_994_000);
    assert_eq!(result.client_to_server_ns, 399_996_000);
    assert_eq!(result.delay_ns, 299_995_000);
    assert_eq!(result.offset_ns, -100_001_000);
}

#[test]
fn test_too_big_correction_contributes_nothing() {
    let ledger = Measurements::new();
    ledger.add_sync(1, ts(1000, 100 * MS), Correction::TOO_BIG);
    ledger.add_follow_up(1, ts(1000, 0), no_correction());
    ledger.add_delay_req(0, ts(1000, 200 * MS));
    ledger.add_delay_resp(0, ts(1000, 300 * MS), no_correction());

    let result = ledger.latest().unwrap();
    assert_eq!(result.delay_ns, 100 * MS);
    assert_eq!(result.offset_ns, 0);
}

#[test]
fn test_adds_commute() {
    // The four halves may land in any order and still complete the same
    // sample.
    let t1 = ts(1000, 0);
    let t2 = ts(1000, 200 * MS);
    let t3 = ts(1000, 300 * MS);
    let t4 = ts(1000, 700 * MS);

    let orders: [&[u8]; 4] = [
        &[0, 1, 2, 3],
        &[1, 0, 3, 2],
        &[3, 2, 1, 0],
        &[2, 3, 0, 1],
    ];
    let mut results = Vec::new();
    for order in orders {
        let ledger = Measurements::new();
        for &step in order {
            match step {
                0 => ledger.add_sync(9, t2, no_correction()),
                1 => ledger.add_follow_up(9, t1, no_correction()),
                2 => ledger.add_delay_req(9, t3),
                _ => ledger.add_delay_resp(9, t4, no_correction()),
            }
        }
        results.push(ledger.latest().unwrap());
    }
    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}

#[test]
fn test_incomplete_directions_yield_nothing() {
    let ledger = Measurements::new();
    // Only the server-to-client half.
    ledger.add_sync(0, ts(1000, 1), no_correction());
    ledger.add_follow_up(0, ts(1000, 0), no_correction());
    assert!(ledger.latest().is_none());

    // A delay-req with no response still does not complete the other
    // direction.
    ledger.add_delay_req(0, ts(1000, 2));
    assert!(ledger.latest().is_none());
}

#[test]
fn test_latest_picks_most_recent_complete_sample() {
    let ledger = Measurements::new();
    // Older exchange: 100 ms transit both ways.
    add_symmetric(&ledger, 0);
    // Newer server-to-client sample with a larger t2 and different transit.
    ledger.add_follow_up(1, ts(2000, 0), no_correction());
    ledger.add_sync(1, ts(2000, 50 * MS), no_correction());

    let result = ledger.latest().unwrap();
    // stc from the newer sample (50 ms), cts still from the old one (100 ms).
    assert_eq!(result.server_to_client_ns, 50 * MS);
    assert_eq!(result.client_to_server_ns, 100 * MS);
}

#[test]
fn test_completed_sample_is_never_rewritten() {
    let ledger = Measurements::new();
    add_symmetric(&ledger, 0);
    let first = ledger.latest().unwrap();

    // Replays with different values must not disturb the completed sample.
    ledger.add_sync(0, ts(3000, 0), Correction::from_nanos(1e6));
    ledger.add_delay_resp(0, ts(3000, 0), Correction::from_nanos(1e6));
    assert_eq!(ledger.latest().unwrap(), first);
}

#[test]
fn test_sequence_wraparound_pairs_by_recency() {
    let ledger = Measurements::new();
    ledger.add_follow_up(u16::MAX, ts(1000, 0), no_correction());
    ledger.add_sync(u16::MAX, ts(1000, 100 * MS), no_correction());
    // The delay exchange after the wrap uses sequence id 0.
    ledger.add_delay_req(0, ts(1000, 200 * MS));
    ledger.add_delay_resp(0, ts(1000, 300 * MS), no_correction());

    let result = ledger.latest().unwrap();
    assert_eq!(result.delay_ns, 100 * MS);
    assert_eq!(result.offset_ns, 0);
}

#[test]
fn test_complete_counts() {
    let ledger = Measurements::new();
    add_symmetric(&ledger, 0);
    ledger.add_sync(1, ts(1000, 1), no_correction());
    assert_eq!(ledger.complete_counts(), (1, 1));
}
