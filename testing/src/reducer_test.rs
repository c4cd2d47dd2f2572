//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.
//! Earlier actions can be replayed onto the given state, and the resulting
//! effects can be handed back for draining in async tests.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use eventure_core::{effect::Effect, reducer::Reducer};

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use eventure_testing::ReducerTest;
///
/// ReducerTest::new(AdmissionReducer::new())
///     .with_env(test_environment())
///     .given_state(state_with_ledger(event_id, 2))
///     .given_actions([loaded(first_request, user, 0)])
///     .when_action(RsvpAction::WriteEvent(write))
///     .then_state(|state| {
///         assert_eq!(state.in_flight(&event_id), 1);
///     })
///     .then_effects(|effects| {
///         assertions::assert_no_effects(effects);
///     })
///     .run();
/// ```
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    history: Vec<A>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            history: Vec::new(),
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Reduce these actions onto the given state first, dropping their effects
    #[must_use]
    pub fn given_actions(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.history.extend(actions);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    pub fn run(self) {
        let _ = self.into_effects();
    }

    /// Run the test like [`run`](Self::run) and hand back the effects
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set,
    /// or if any assertions fail.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    #[must_use]
    pub fn into_effects(self) -> Vec<Effect<A>> {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        for earlier in self.history {
            let _ = self.reducer.reduce(&mut state, earlier, &env);
        }

        // Execute reducer
        let effects = self.reducer.reduce(&mut state, action, &env);

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&state);
        }

        // Run effect assertions
        for assertion in self.effect_assertions {
            assertion(&effects);
        }

        effects.into_vec()
    }
}

/// Helper assertions for effects
pub mod assertions {
    use eventure_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventure_core::effect::Effect;
    use eventure_core::reducer::Reducer;
    use eventure_core::{SmallVec, smallvec};

    #[derive(Clone, Debug)]
    struct SeatState {
        held: u32,
        limit: u32,
    }

    #[derive(Clone, Debug)]
    enum SeatAction {
        Hold,
        Release,
        Overflowed,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = SeatState;
        type Action = SeatAction;
        type Environment = TestEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                SeatAction::Hold if state.held < state.limit => {
                    state.held += 1;
                    smallvec![Effect::None]
                }
                SeatAction::Hold => smallvec![Effect::emit(SeatAction::Overflowed)],
                SeatAction::Release => {
                    state.held = state.held.saturating_sub(1);
                    smallvec![Effect::None]
                }
                SeatAction::Overflowed => SmallVec::new(),
            }
        }
    }

    #[test]
    fn hold_below_limit_takes_a_seat() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(SeatState { held: 0, limit: 1 })
            .when_action(SeatAction::Hold)
            .then_state(|state| {
                assert_eq!(state.held, 1);
            })
            .then_effects(|effects| {
                assertions::assert_no_effects(effects);
            })
            .run();
    }

    #[test]
    fn hold_at_limit_emits_overflow() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(SeatState { held: 1, limit: 1 })
            .when_action(SeatAction::Hold)
            .then_state(|state| {
                assert_eq!(state.held, 1);
            })
            .then_effects(|effects| {
                assertions::assert_has_future_effect(effects);
                assertions::assert_effects_count(effects, 1);
            })
            .run();
    }

    #[test]
    fn release_frees_a_seat() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(SeatState { held: 1, limit: 1 })
            .when_action(SeatAction::Release)
            .then_state(|state| {
                assert_eq!(state.held, 0);
            })
            .run();
    }

    #[test]
    fn test_assertions_no_effects() {
        assertions::assert_no_effects::<SeatAction>(&[Effect::None]);
        assertions::assert_no_effects::<SeatAction>(&[]);
    }

    #[test]
    fn earlier_actions_are_replayed_before_the_action_under_test() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(SeatState { held: 0, limit: 2 })
            .given_actions([SeatAction::Hold, SeatAction::Hold])
            .when_action(SeatAction::Release)
            .then_state(|state| {
                assert_eq!(state.held, 1);
            })
            .run();
    }

    #[test]
    fn into_effects_hands_back_what_the_reducer_returned() {
        let effects = ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(SeatState { held: 1, limit: 1 })
            .when_action(SeatAction::Hold)
            .into_effects();

        assert!(matches!(effects.as_slice(), [Effect::Future(_)]));
    }
}
