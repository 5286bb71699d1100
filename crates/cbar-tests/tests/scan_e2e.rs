//! End-to-end tests for status scans
//!
//! Run with: cargo test -p cbar-tests --test scan_e2e

use std::time::Duration;

use cbar_core::{AggregateBarringState, BarringCategory, BarringError, ChannelError, RawResponse};
use cbar_ril::{MockConfig, Scripted};
use cbar_session::{SessionConfig, SessionSnapshot, SessionUpdate, SCAN_ORDER};
use cbar_tests::TestHarness;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_all_categories_disabled() {
    let mut h = TestHarness::new(MockConfig::default());

    let state = h.start().await;
    assert_eq!(state, AggregateBarringState::default());

    let snapshot = h.snapshot().await;
    assert!(!snapshot.stale);
}

#[tokio::test]
async fn test_outgoing_international_only() {
    let mut h = TestHarness::with_active(&["OI"]);

    let state = h.start().await;
    assert_eq!(state.outgoing(), Some(BarringCategory::OutgoingInternational));
    assert_eq!(state.incoming(), None);
}

#[tokio::test]
async fn test_queries_are_sequential_and_ordered() {
    let mut h = TestHarness::new(MockConfig {
        latency_ms: 5,
        active: vec!["OX".into(), "AI".into()],
        ..Default::default()
    });

    h.start().await;
    assert_eq!(h.channel.queried_categories(), SCAN_ORDER.to_vec());
    assert_eq!(h.channel.max_concurrent_requests(), 1);
}

#[tokio::test]
async fn test_repeated_scan_is_idempotent() {
    let mut h = TestHarness::with_active(&["OX", "IR"]);

    let first = h.start().await;
    h.handle.refresh().unwrap();
    let second = h.wait_for_aggregate().await;

    assert_eq!(first, second);
    assert_eq!(h.channel.queried_categories().len(), 2 * SCAN_ORDER.len());
}

#[tokio::test]
async fn test_failed_query_keeps_previous_state() {
    let mut h = TestHarness::with_active(&["AI"]);
    let before = h.start().await;

    h.channel
        .push_script(Scripted::Respond(RawResponse::status(false)));
    h.channel
        .push_script(Scripted::Respond(RawResponse::status(false)));
    h.channel.push_script(Scripted::Respond(RawResponse::exception(
        ChannelError::CommandFailed("modem reset".into()),
    )));

    h.handle.refresh().unwrap();
    let result = h.wait_for_result().await;
    assert!(matches!(result, Err(BarringError::Exception(_))));

    let snapshot = h.snapshot().await;
    assert_eq!(snapshot.aggregate, before);
    assert!(snapshot.stale);
    assert_eq!(h.channel.queried_categories().len(), SCAN_ORDER.len() + 3);
}

#[tokio::test]
async fn test_embedded_error_is_unexpected_response() {
    let mut h = TestHarness::new(MockConfig::default());
    h.channel
        .push_script(Scripted::Respond(RawResponse::embedded_error("bad state")));

    h.handle.start().unwrap();
    assert_eq!(
        h.wait_for_result().await,
        Err(BarringError::UnexpectedResponse)
    );
    assert_eq!(h.channel.queried_categories().len(), 1);
}

#[tokio::test]
async fn test_radio_off_terminates_without_querying() {
    let mut h = TestHarness::new(MockConfig {
        radio_on: false,
        ..Default::default()
    });

    h.handle.start().unwrap();
    let update = h
        .wait_for(|u| matches!(u, SessionUpdate::Terminated { .. }))
        .await;
    assert_eq!(
        update,
        SessionUpdate::Terminated {
            reason: BarringError::RadioOff
        }
    );
    assert!(h.channel.requests().is_empty());
}

#[tokio::test]
async fn test_hung_query_times_out() {
    let mut h = TestHarness::with_options(
        MockConfig::default(),
        SessionConfig {
            command_timeout_ms: 50,
        },
        None,
    );
    h.channel.push_script(Scripted::Hang);

    h.handle.start().unwrap();
    let Err(BarringError::Exception(cause)) = h.wait_for_result().await else {
        panic!("Expected a synthesized exception");
    };
    assert!(cause.contains("Timeout"));
    assert!(h.snapshot().await.stale);

    // Not stuck busy: a retry goes through
    h.handle.refresh().unwrap();
    assert_eq!(h.wait_for_aggregate().await, AggregateBarringState::default());
}

#[tokio::test]
async fn test_cancelled_scan_drops_late_replies() {
    let mut h = TestHarness::new(MockConfig {
        latency_ms: 50,
        active: vec!["AO".into()],
        ..Default::default()
    });

    h.handle.start().unwrap();
    h.wait_for(|u| matches!(u, SessionUpdate::BusyChanged { busy: true }))
        .await;
    h.handle.cancel_scan().unwrap();
    h.wait_for(|u| matches!(u, SessionUpdate::BusyChanged { busy: false }))
        .await;

    tokio::time::sleep(Duration::from_millis(150)).await;
    let late = h.drain();
    assert!(late.is_empty(), "late updates: {:?}", late);
    assert_eq!(h.channel.queried_categories().len(), 1);

    let snapshot = h.snapshot().await;
    assert!(snapshot.stale);
    assert_eq!(snapshot.aggregate, AggregateBarringState::default());
}

#[tokio::test]
async fn test_restart_after_cancel_keeps_single_request_in_flight() {
    let mut h = TestHarness::new(MockConfig {
        latency_ms: 30,
        active: vec!["IR".into()],
        ..Default::default()
    });

    h.handle.start().unwrap();
    h.handle.cancel_scan().unwrap();
    let state = h.start().await;

    assert_eq!(state.incoming(), Some(BarringCategory::IncomingWhenRoaming));
    assert_eq!(h.channel.max_concurrent_requests(), 1);
    assert_eq!(h.channel.queried_categories().len(), SCAN_ORDER.len() + 1);
}

#[tokio::test]
async fn test_fresh_snapshot_is_republished_without_scanning() {
    let mut first = TestHarness::with_active(&["OI", "IR"]);
    let state = first.start().await;

    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), first.snapshot().await.to_json().unwrap()).unwrap();
    let restored =
        SessionSnapshot::from_json(&std::fs::read_to_string(file.path()).unwrap()).unwrap();

    let mut second = TestHarness::with_options(
        MockConfig::default(),
        SessionConfig::default(),
        Some(restored),
    );
    assert_eq!(second.start().await, state);
    assert!(second.channel.requests().is_empty());
}

#[tokio::test]
async fn test_busy_session_rejects_commands() {
    let mut h = TestHarness::new(MockConfig {
        latency_ms: 30,
        ..Default::default()
    });

    h.handle.start().unwrap();
    h.handle.request_change_password().unwrap();
    assert_eq!(h.wait_for_result().await, Err(BarringError::Busy));

    h.wait_for_aggregate().await;
}
