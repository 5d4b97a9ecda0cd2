//! Collaborators injected into lifecycles and stores
//!
//! The engine never reaches for a global store, router or response decoder.
//! Each is a trait object handed over at construction time:
//!
//! - [`Store`]: accepts dispatched actions and answers state queries
//! - [`Navigator`]: performs route changes requested by reduced actions
//! - [`ResponseParser`]: decodes the raw value a deferred computation resolved with

use crate::action::DispatchedAction;
use crate::state::StatePath;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Status value that marks a parsed response as successful
pub const STATUS_OK: &str = "OK";

/// The external pub/sub store
///
/// `dispatch` is fire-and-forget; implementations are expected to run every
/// feature area's dispatcher synchronously before returning.
pub trait Store: Send + Sync {
    /// Deliver `action` to every feature area
    fn dispatch(&self, action: DispatchedAction);

    /// Current value at `path`, if present
    fn get_state(&self, path: &StatePath) -> Option<Value>;

    /// Stream of the value at `path`, emitting only on change
    fn select(&self, path: &StatePath) -> BoxStream<'static, Value>;
}

/// Application router
pub trait Navigator: Send + Sync {
    /// Navigate to `path`
    fn navigate_by_url(&self, path: &str);
}

/// Navigator for hosts without routing; drops every request
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate_by_url(&self, path: &str) {
        tracing::trace!(path, "Navigation requested without a router");
    }
}

/// A decoded service response
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedResponse {
    /// Status envelope, conventionally `{ "Response": { "Status", "Exception" } }`
    #[serde(default)]
    pub status_data: Value,

    /// The payload
    #[serde(default)]
    pub response_data: Value,
}

impl ParsedResponse {
    /// Reported status; a missing or malformed status reads as [`STATUS_OK`]
    #[must_use]
    pub fn status(&self) -> &str {
        self.status_data
            .pointer("/Response/Status")
            .and_then(Value::as_str)
            .unwrap_or(STATUS_OK)
    }

    /// True when [`status`](Self::status) is [`STATUS_OK`]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status() == STATUS_OK
    }

    /// The reported exception, `null` when absent
    #[must_use]
    pub fn exception(&self) -> Value {
        self.status_data
            .pointer("/Response/Exception")
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// Decodes raw responses for the deferred branch of a runner
pub trait ResponseParser: Send + Sync {
    /// Decode `raw`
    fn parse(&self, raw: &Value) -> ParsedResponse;
}

/// Parser for responses already shaped as `{statusData, responseData}`
///
/// Anything else is taken as a bare payload with no status.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeParser;

impl ResponseParser for EnvelopeParser {
    fn parse(&self, raw: &Value) -> ParsedResponse {
        match raw {
            Value::Object(map)
                if map.contains_key("statusData") || map.contains_key("responseData") =>
            {
                ParsedResponse {
                    status_data: map.get("statusData").cloned().unwrap_or(Value::Null),
                    response_data: map.get("responseData").cloned().unwrap_or(Value::Null),
                }
            },
            other => ParsedResponse {
                status_data: Value::Null,
                response_data: other.clone(),
            },
        }
    }
}

/// Collaborators a lifecycle runner closes over
#[derive(Clone)]
pub struct Environment {
    /// Where runners dispatch
    pub store: Arc<dyn Store>,

    /// Response decoder; `None` selects the simplified mode where every
    /// resolved deferred value is a success payload
    pub parser: Option<Arc<dyn ResponseParser>>,
}

impl Environment {
    /// Environment with a response parser
    #[must_use]
    pub fn new(store: Arc<dyn Store>, parser: Arc<dyn ResponseParser>) -> Self {
        Self {
            store,
            parser: Some(parser),
        }
    }

    /// Environment without response parsing
    #[must_use]
    pub fn without_parser(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            parser: None,
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("parser", &self.parser.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_status_reads_as_ok() {
        let parsed = EnvelopeParser.parse(&json!({ "items": [1] }));
        assert!(parsed.is_success());
        assert_eq!(parsed.response_data, json!({ "items": [1] }));
    }

    #[test]
    fn test_envelope_status_and_exception_are_extracted() {
        let parsed = EnvelopeParser.parse(&json!({
            "statusData": { "Response": { "Status": "ERROR", "Exception": "Out of stock" } },
            "responseData": null
        }));
        assert!(!parsed.is_success());
        assert_eq!(parsed.status(), "ERROR");
        assert_eq!(parsed.exception(), json!("Out of stock"));
    }

    #[test]
    fn test_malformed_status_reads_as_ok() {
        let parsed = EnvelopeParser.parse(&json!({
            "statusData": { "Response": { "Status": 500 } },
            "responseData": "payload"
        }));
        assert!(parsed.is_success());
    }
}
