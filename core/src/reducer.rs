//! Reducer trait and the per-lifecycle state machine
//!
//! A [`LifecycleReducer`] matches an action against its [`ActionTypes`] and
//! picks a transition:
//!
//! ```text
//! Async:  Idle ──request──► Requested{loading} ──success──► Succeeded{data}
//!                                             └─failure──► Failed{error}
//! Sync:   Idle ──request──► Completed{data}
//!             └─failure──► Failed{error}
//! ```
//!
//! Overrides replace the default transition for a phase. An override that
//! returns `Err` never escapes: the reducer falls back to a failure transition.

use crate::action::{ActionTypes, DispatchedAction, Flavor, Phase};
use crate::error::ReducerError;
use crate::transition::{self, Transition};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A fallible state transition
///
/// Receives the feature area's state and the action, returns the partial
/// state to merge. Implemented for any matching closure.
///
/// # Example
///
/// ```
/// use reflux_core::reducer::Reducer;
/// use reflux_core::action::DispatchedAction;
/// use reflux_core::error::ReducerError;
/// use serde_json::{json, Value};
///
/// let count_items = |_state: &Value, action: &DispatchedAction| -> Result<Value, ReducerError> {
///     let items = action.data.as_array().map_or(0, Vec::len);
///     Ok(json!({ "data": action.data, "count": items, "loading": false }))
/// };
///
/// let partial = count_items
///     .reduce(&Value::Null, &DispatchedAction::new("X").with_data(json!([1, 2])))
///     .unwrap();
/// assert_eq!(partial["count"], 2);
/// ```
pub trait Reducer: Send + Sync {
    /// Compute the partial state for `action`
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError`] when the transition cannot be evaluated.
    fn reduce(&self, state: &Value, action: &DispatchedAction) -> Result<Value, ReducerError>;
}

impl<F> Reducer for F
where
    F: Fn(&Value, &DispatchedAction) -> Result<Value, ReducerError> + Send + Sync,
{
    fn reduce(&self, state: &Value, action: &DispatchedAction) -> Result<Value, ReducerError> {
        self(state, action)
    }
}

/// Shared handle to an override reducer
pub type SharedReducer = Arc<dyn Reducer>;

/// Optional per-phase overrides of the default transitions
#[derive(Clone, Default)]
pub struct Overrides {
    /// Replaces the request transition
    pub request: Option<SharedReducer>,
    /// Replaces the success transition (and, for synchronous lifecycles
    /// without a request override, the request transition)
    pub success: Option<SharedReducer>,
    /// Replaces the failure transition
    pub failure: Option<SharedReducer>,
}

impl fmt::Debug for Overrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("request", &self.request.is_some())
            .field("success", &self.success.is_some())
            .field("failure", &self.failure.is_some())
            .finish()
    }
}

/// The transition picked for one action
enum Step<'a> {
    Default(Transition),
    Override(&'a dyn Reducer),
}

impl Step<'_> {
    fn apply(&self, state: &Value, action: &DispatchedAction) -> Result<Value, ReducerError> {
        match self {
            Step::Default(transition) => Ok(transition(state, action)),
            Step::Override(reducer) => reducer.reduce(state, action),
        }
    }

    const fn is_override(&self) -> bool {
        matches!(self, Step::Override(_))
    }
}

/// State machine for one lifecycle
#[derive(Debug, Clone)]
pub struct LifecycleReducer {
    types: ActionTypes,
    overrides: Overrides,
}

impl LifecycleReducer {
    /// Build a reducer for `types` with `overrides`
    #[must_use]
    pub const fn new(types: ActionTypes, overrides: Overrides) -> Self {
        Self { types, overrides }
    }

    /// The action types this reducer answers to
    #[must_use]
    pub const fn types(&self) -> &ActionTypes {
        &self.types
    }

    const fn flavor(&self) -> Flavor {
        self.types.flavor
    }

    fn step_for(&self, phase: Phase) -> Step<'_> {
        let chosen = match phase {
            Phase::Request => self.overrides.request.as_ref().or_else(|| {
                // A synchronous lifecycle has no success phase of its own
                if self.flavor().is_async() {
                    None
                } else {
                    self.overrides.success.as_ref()
                }
            }),
            Phase::Success => self.overrides.success.as_ref(),
            Phase::Failure => self.overrides.failure.as_ref(),
        };

        match chosen {
            Some(reducer) => Step::Override(reducer.as_ref()),
            None => Step::Default(transition::default_for(self.flavor(), phase)),
        }
    }

    /// Reduce `action`
    ///
    /// Returns `None` when the action type is not one of this lifecycle's
    /// types, meaning the state is left as it was.
    #[must_use]
    pub fn reduce(&self, state: &Value, action: &DispatchedAction) -> Option<Value> {
        let phase = self.types.phase_of(&action.action_type)?;
        let step = self.step_for(phase);

        match step.apply(state, action) {
            Ok(partial) => Some(partial),
            Err(error) => Some(self.recover(state, action, phase, &step, &error)),
        }
    }

    fn recover(
        &self,
        state: &Value,
        action: &DispatchedAction,
        phase: Phase,
        failed: &Step<'_>,
        error: &ReducerError,
    ) -> Value {
        tracing::error!(
            action_type = %action.action_type,
            payload = ?action,
            error = %error,
            "Error in reducer"
        );

        let mut failed_action = action.clone();
        failed_action.error = Value::String(error.message().to_string());

        let default_failure = transition::default_for(self.flavor(), Phase::Failure);

        // A broken failure override must not be retried
        if phase == Phase::Failure && failed.is_override() {
            return default_failure(state, &failed_action);
        }

        match self.step_for(Phase::Failure).apply(state, &failed_action) {
            Ok(partial) => partial,
            Err(nested) => {
                tracing::error!(
                    action_type = %action.action_type,
                    error = %nested,
                    "Failure reducer also failed, using default failure transition"
                );
                default_failure(state, &failed_action)
            },
        }
    }
}
