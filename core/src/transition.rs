//! Default transition reducers
//!
//! Each transition returns a *partial* state that the composite dispatcher
//! merges into the feature area. None of them look at the previous state.

use crate::action::{DispatchedAction, Flavor, Phase};
use serde_json::{Value, json};

/// Signature shared by the default transitions
pub type Transition = fn(&Value, &DispatchedAction) -> Value;

/// Asynchronous request: `{loading: true}`
#[must_use]
pub fn async_request(_state: &Value, _action: &DispatchedAction) -> Value {
    json!({ "loading": true })
}

/// Asynchronous success: `{data, loading: false}`
#[must_use]
pub fn async_success(_state: &Value, action: &DispatchedAction) -> Value {
    json!({ "data": action.data, "loading": false })
}

/// Asynchronous failure: `{error, loading: false}`
#[must_use]
pub fn async_failure(_state: &Value, action: &DispatchedAction) -> Value {
    json!({ "error": action.error, "loading": false })
}

/// Synchronous request, which is also the completion: `{data}`
#[must_use]
pub fn sync_request(_state: &Value, action: &DispatchedAction) -> Value {
    json!({ "data": action.data })
}

/// Synchronous failure: `{error}`
#[must_use]
pub fn sync_failure(_state: &Value, action: &DispatchedAction) -> Value {
    json!({ "error": action.error })
}

/// Default transition for `phase` of a `flavor` lifecycle
///
/// Synchronous lifecycles never emit a success action; if one is dispatched
/// anyway it is reduced like an asynchronous success.
#[must_use]
pub fn default_for(flavor: Flavor, phase: Phase) -> Transition {
    match (flavor, phase) {
        (Flavor::Async, Phase::Request) => async_request,
        (Flavor::Sync, Phase::Request) => sync_request,
        (_, Phase::Success) => async_success,
        (Flavor::Async, Phase::Failure) => async_failure,
        (Flavor::Sync, Phase::Failure) => sync_failure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_phases_toggle_loading() {
        let state = Value::Null;
        let request = DispatchedAction::new("X_REQUEST");
        assert_eq!(async_request(&state, &request), json!({ "loading": true }));

        let success = DispatchedAction::new("X_SUCCESS").with_data(json!([1, 2]));
        assert_eq!(
            async_success(&state, &success),
            json!({ "data": [1, 2], "loading": false })
        );

        let failure = DispatchedAction::new("X_FAILURE").with_error(json!("boom"));
        assert_eq!(
            async_failure(&state, &failure),
            json!({ "error": "boom", "loading": false })
        );
    }

    #[test]
    fn test_sync_phases_never_mention_loading() {
        let state = Value::Null;
        let request = DispatchedAction::new("X").with_data(json!("v"));
        assert_eq!(sync_request(&state, &request), json!({ "data": "v" }));

        let failure = DispatchedAction::new("X_FAILURE").with_error(json!("bad"));
        assert_eq!(sync_failure(&state, &failure), json!({ "error": "bad" }));
    }

    #[test]
    fn test_defaults_are_chosen_per_flavor() {
        let action = DispatchedAction::new("X").with_data(json!(1));
        let sync = default_for(Flavor::Sync, Phase::Request);
        let asynchronous = default_for(Flavor::Async, Phase::Request);
        assert_eq!(sync(&Value::Null, &action), json!({ "data": 1 }));
        assert_eq!(asynchronous(&Value::Null, &action), json!({ "loading": true }));
    }
}
