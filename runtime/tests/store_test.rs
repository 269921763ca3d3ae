//! Integration tests for the Store runtime.
//!
//! Exercises the reducer loop, effect execution with action feedback, state
//! subscriptions, request-response waiting, and graceful shutdown.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code

use std::time::Duration;
use ticketbook_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use ticketbook_runtime::{Store, StoreError};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TestAction {
    /// Command: bump the counter, echoing the new value via an effect
    Increment,
    /// Event: the counter reached a value
    Incremented { value: u32 },
    /// Command: start a three-step chain driven by effect feedback
    StartChain,
    /// Event: one chain step landed
    StepDone { step: u32 },
    /// Command: record a value after a delay
    RecordLater { value: u32, after: Duration },
    /// Command: run a slow effect (shutdown draining)
    SlowWork { duration: Duration },
    /// Event: slow effect finished
    WorkDone,
    /// Command: run two futures strictly in order
    RunSequence,
}

#[derive(Debug, Clone, Default)]
struct TestState {
    counter: u32,
    steps: Vec<u32>,
    recorded: Vec<u32>,
    work_done: bool,
}

#[derive(Clone)]
struct TestEnvironment;

#[derive(Clone)]
struct TestReducer;

impl Reducer for TestReducer {
    type State = TestState;
    type Action = TestAction;
    type Environment = TestEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TestAction::Increment => {
                state.counter += 1;
                let value = state.counter;
                smallvec![Effect::future(async move {
                    Some(TestAction::Incremented { value })
                })]
            },

            TestAction::Incremented { value } => {
                state.recorded.push(value);
                smallvec![Effect::None]
            },

            TestAction::StartChain => {
                state.steps.clear();
                smallvec![Effect::future(async move {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Some(TestAction::StepDone { step: 1 })
                })]
            },

            TestAction::StepDone { step } => {
                state.steps.push(step);
                if step < 3 {
                    smallvec![Effect::future(async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        Some(TestAction::StepDone { step: step + 1 })
                    })]
                } else {
                    smallvec![Effect::None]
                }
            },

            TestAction::RecordLater { value, after } => {
                smallvec![Effect::Delay {
                    duration: after,
                    action: Box::new(TestAction::Incremented { value }),
                }]
            },

            TestAction::SlowWork { duration } => {
                smallvec![Effect::future(async move {
                    tokio::time::sleep(duration).await;
                    Some(TestAction::WorkDone)
                })]
            },

            TestAction::WorkDone => {
                state.work_done = true;
                smallvec![Effect::None]
            },

            TestAction::RunSequence => {
                smallvec![Effect::chain(vec![
                    Effect::future(async move {
                        tokio::time::sleep(Duration::from_millis(10)).await;
                        Some(TestAction::StepDone { step: 10 })
                    }),
                    Effect::future(async move { Some(TestAction::StepDone { step: 20 }) }),
                ])]
            },
        }
    }
}

fn new_store() -> Store<TestState, TestAction, TestEnvironment, TestReducer> {
    Store::new(TestState::default(), TestReducer, TestEnvironment)
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn send_applies_the_reducer_synchronously() {
    let store = new_store();

    store.send(TestAction::Increment).await.unwrap();

    assert_eq!(store.state(|s| s.counter).await, 1);
}

#[tokio::test]
async fn effect_handle_waits_for_direct_effects() {
    let store = new_store();
    let mut observed = store.observe_actions();

    let mut handle = store.send(TestAction::Increment).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    // The feedback action was broadcast before the effect completed
    let action = observed.recv().await.unwrap();
    assert_eq!(action, TestAction::Incremented { value: 1 });
}

#[tokio::test]
async fn feedback_chain_runs_to_completion() {
    let store = new_store();

    store
        .send_and_wait_for(
            TestAction::StartChain,
            |a| matches!(a, TestAction::StepDone { step: 3 }),
            Duration::from_secs(2),
        )
        .await
        .unwrap();

    assert_eq!(store.state(|s| s.steps.clone()).await, vec![1, 2, 3]);
}

#[tokio::test]
async fn send_and_wait_for_times_out_without_a_match() {
    let store = new_store();

    let result = store
        .send_and_wait_for(
            TestAction::Increment,
            |a| matches!(a, TestAction::StepDone { .. }),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn subscribers_see_every_reduced_action() {
    let store = new_store();
    let mut updates = store.subscribe();

    assert_eq!(updates.borrow_and_update().counter, 0);

    store.send(TestAction::Increment).await.unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().counter, 1);

    store.send(TestAction::Increment).await.unwrap();
    updates.changed().await.unwrap();
    assert_eq!(updates.borrow_and_update().counter, 2);
}

#[tokio::test]
async fn delay_effect_dispatches_after_the_interval() {
    let store = new_store();

    let mut handle = store
        .send(TestAction::RecordLater {
            value: 42,
            after: Duration::from_millis(100),
        })
        .await
        .unwrap();

    // Not yet landed
    assert!(store.state(|s| s.recorded.is_empty()).await);

    handle
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(store.state(|s| s.recorded.clone()).await, vec![42]);
}

#[tokio::test]
async fn sequential_effects_preserve_order() {
    let store = new_store();

    let mut handle = store.send(TestAction::RunSequence).await.unwrap();
    handle
        .wait_with_timeout(Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(store.state(|s| s.steps.clone()).await, vec![10, 20]);
}

#[tokio::test]
async fn handle_returns_immediately_with_no_effects() {
    let store = new_store();

    let mut handle = store
        .send(TestAction::Incremented { value: 7 })
        .await
        .unwrap();
    handle
        .wait_with_timeout(Duration::from_millis(100))
        .await
        .unwrap();
}

#[tokio::test]
async fn shutdown_drains_in_flight_effects() {
    let store = new_store();

    store
        .send(TestAction::SlowWork {
            duration: Duration::from_millis(50),
        })
        .await
        .unwrap();

    store.shutdown(Duration::from_secs(2)).await.unwrap();

    assert!(store.state(|s| s.work_done).await);
    assert_eq!(store.pending_effects(), 0);

    let rejected = store.send(TestAction::Increment).await;
    assert!(matches!(rejected, Err(StoreError::ShutdownInProgress)));
}

#[tokio::test]
async fn shutdown_times_out_on_stuck_effects() {
    let store = new_store();

    store
        .send(TestAction::SlowWork {
            duration: Duration::from_secs(5),
        })
        .await
        .unwrap();

    let result = store.shutdown(Duration::from_millis(50)).await;
    assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
}
