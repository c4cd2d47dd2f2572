//! Integration tests for Store action broadcasting
//!
//! HTTP handlers send a command and wait for the outcome carrying their
//! request id. These tests cover that request-response pattern.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use eventure_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use eventure_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum DeskAction {
    /// Ask for a ticket; answered through a two-step effect chain
    Request { id: u64 },
    /// Intermediate step
    Checked { id: u64 },
    /// Terminal outcome
    Issued { id: u64, number: u32 },
    /// Terminal outcome that never arrives
    Refused { id: u64 },
    /// Two effects at once
    Broadcast,
    Note(&'static str),
}

#[derive(Debug, Default)]
struct Desk {
    issued: u32,
    notes: Vec<&'static str>,
}

#[derive(Clone)]
struct DeskReducer;

impl Reducer for DeskReducer {
    type State = Desk;
    type Action = DeskAction;
    type Environment = ();

    fn reduce(&self, state: &mut Desk, action: DeskAction, _env: &()) -> SmallVec<[Effect<DeskAction>; 4]> {
        match action {
            DeskAction::Request { id } => smallvec![Effect::future(async move {
                tokio::time::sleep(Duration::from_millis(2)).await;
                Some(DeskAction::Checked { id })
            })],
            DeskAction::Checked { id } => {
                state.issued += 1;
                smallvec![Effect::emit(DeskAction::Issued { id, number: state.issued })]
            },
            DeskAction::Broadcast => smallvec![Effect::merge(vec![
                Effect::emit(DeskAction::Note("first")),
                Effect::emit(DeskAction::Note("second")),
            ])],
            DeskAction::Note(note) => {
                state.notes.push(note);
                SmallVec::new()
            },
            DeskAction::Issued { .. } | DeskAction::Refused { .. } => SmallVec::new(),
        }
    }
}

fn desk() -> Store<Desk, DeskAction, (), DeskReducer> {
    Store::new(Desk::default(), DeskReducer, ())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn waits_through_an_effect_chain() {
    let store = desk();

    let outcome = store
        .send_and_wait_for(
            DeskAction::Request { id: 7 },
            |a| matches!(a, DeskAction::Issued { id: 7, .. }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(outcome, DeskAction::Issued { id: 7, number: 1 });
    // The outcome is observed after its state change.
    assert_eq!(store.state(|s| s.issued).await, 1);
}

#[tokio::test]
async fn missing_outcome_times_out() {
    let store = desk();

    let result = store
        .send_and_wait_for(
            DeskAction::Request { id: 1 },
            |a| matches!(a, DeskAction::Refused { id: 1 }),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_waiters_each_get_their_own_outcome() {
    let store = Arc::new(desk());

    let handles: Vec<_> = (0..32_u64)
        .map(|id| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .send_and_wait_for(
                        DeskAction::Request { id },
                        move |a| matches!(a, DeskAction::Issued { id: got, .. } if *got == id),
                        Duration::from_secs(2),
                    )
                    .await
            })
        })
        .collect();

    let mut numbers = Vec::new();
    for (id, handle) in (0_u64..).zip(handles) {
        match handle.await.unwrap().unwrap() {
            DeskAction::Issued { id: got, number } => {
                assert_eq!(got, id);
                numbers.push(number);
            },
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    numbers.sort_unstable();
    assert_eq!(numbers, (1..=32).collect::<Vec<_>>());
}

#[tokio::test]
async fn commands_are_not_broadcast() {
    let store = desk();
    let mut rx = store.subscribe_actions();

    store.send(DeskAction::Note("direct")).await.unwrap();

    assert!(rx.try_recv().is_err());
    assert_eq!(store.state(|s| s.notes.clone()).await, vec!["direct"]);
}

#[tokio::test]
async fn parallel_effects_are_broadcast() {
    let store = desk();
    let mut rx = store.subscribe_actions();

    store.send(DeskAction::Broadcast).await.unwrap();
    store.settle(Duration::from_secs(1)).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(action) = rx.try_recv() {
        seen.push(action);
    }
    assert_eq!(seen.len(), 2);
    assert!(seen.contains(&DeskAction::Note("first")));
    assert!(seen.contains(&DeskAction::Note("second")));
}

#[tokio::test]
async fn small_channel_lags_slow_observers() {
    let store = Store::with_broadcast_capacity(Desk::default(), DeskReducer, (), 2);
    let mut rx = store.subscribe_actions();

    for _ in 0..4 {
        store.send(DeskAction::Broadcast).await.unwrap();
    }
    store.settle(Duration::from_secs(1)).await.unwrap();

    assert!(matches!(
        rx.try_recv(),
        Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_))
    ));
}

#[tokio::test]
async fn shutdown_drains_in_flight_work() {
    let store = desk();
    let mut rx = store.subscribe_actions();

    store.send(DeskAction::Request { id: 3 }).await.unwrap();
    store.shutdown(Duration::from_secs(1)).await.unwrap();

    // The chain started before shutdown still completes.
    let mut outcomes = Vec::new();
    while let Ok(action) = rx.try_recv() {
        outcomes.push(action);
    }
    assert!(outcomes.contains(&DeskAction::Issued { id: 3, number: 1 }));
    assert!(matches!(
        store.send(DeskAction::Request { id: 4 }).await,
        Err(StoreError::ShutdownInProgress)
    ));
}
