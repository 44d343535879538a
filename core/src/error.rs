//! Error types for the NFe API client.
//!
//! # Design
//! The API reports failures in two JSON shapes: a single `{"message": "..."}`
//! object, or a collection of such entries (either a bare array or wrapped
//! in `{"errors": [...]}`). Both shapes implement `StructuredError`, which is
//! a classification probe rather than a parser: a body that does not match
//! yields an empty value instead of a parse error.
//!
//! Probing is structural. A body only counts as a single error when it is a
//! JSON object whose `message` field is a string, and only counts as a
//! collection when every entry is such an object. A success payload that
//! happens to carry a non-empty string `message` is still reported as an
//! error, matching how the API has always been read.

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Boxed error returned by transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A response body shape that may describe an API error.
pub trait StructuredError: Sized {
    /// Read `body` as this shape, or return the empty value if it does not match.
    fn probe(body: &[u8]) -> Self;

    /// Whether the probed value actually carries an error.
    fn is_error(&self) -> bool;
}

/// A single API error, `{"message": "..."}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Error)]
#[error("{message}")]
pub struct ErrorMessage {
    pub message: String,
}

impl StructuredError for ErrorMessage {
    fn probe(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => match field(&map, "message") {
                Some(Value::String(message)) => ErrorMessage {
                    message: message.clone(),
                },
                _ => ErrorMessage::default(),
            },
            _ => ErrorMessage::default(),
        }
    }

    fn is_error(&self) -> bool {
        !self.message.is_empty()
    }
}

/// Look up `name` in a JSON object, preferring an exact key and falling back
/// to an ASCII case-insensitive match (`Message`, `MESSAGE`, ...).
fn field<'a>(map: &'a Map<String, Value>, name: &str) -> Option<&'a Value> {
    map.get(name).or_else(|| {
        map.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

/// One entry of an error collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    pub code: Option<Value>,
    pub message: String,
}

impl ErrorEntry {
    fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        let message = field(map, "message")?.as_str()?.to_string();
        Some(ErrorEntry {
            code: field(map, "code").filter(|code| !code.is_null()).cloned(),
            message,
        })
    }
}

/// A collection of API errors, in the order the server reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorCollection {
    pub errors: Vec<ErrorEntry>,
}

impl ErrorCollection {
    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(|entry| entry.message.as_str())
    }
}

impl fmt::Display for ErrorCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self.messages().collect::<Vec<_>>().join("; ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ErrorCollection {}

impl StructuredError for ErrorCollection {
    fn probe(body: &[u8]) -> Self {
        let parsed = match serde_json::from_slice::<Value>(body) {
            Ok(parsed) => parsed,
            Err(_) => return ErrorCollection::default(),
        };
        let entries = match &parsed {
            Value::Array(entries) => entries,
            Value::Object(map) => match field(map, "errors") {
                Some(Value::Array(entries)) => entries,
                _ => return ErrorCollection::default(),
            },
            _ => return ErrorCollection::default(),
        };

        // Every entry must be error-shaped, otherwise this is an ordinary list.
        let errors = entries
            .iter()
            .map(ErrorEntry::from_value)
            .collect::<Option<Vec<_>>>();

        ErrorCollection {
            errors: errors.unwrap_or_default(),
        }
    }

    fn is_error(&self) -> bool {
        self.count() > 0
    }
}

/// Errors returned by `Client` operations.
///
/// Every variant is terminal for the call that produced it. Nothing is
/// retried internally and no partial result accompanies an error.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request parameters could not be serialized to JSON. No request was sent.
    #[error("serialization failed: {0}")]
    SerializationError(#[source] serde_json::Error),

    /// The transport failed before a complete response was read.
    #[error("transport failed: {0}")]
    TransportError(#[source] BoxError),

    /// The server answered with a single error message.
    #[error(transparent)]
    MessageError(#[from] ErrorMessage),

    /// The server answered with a collection of errors.
    #[error(transparent)]
    CollectionError(#[from] ErrorCollection),

    /// The server returned a status outside the success allow-list and the
    /// body was not a structured error. `message` is the raw body, or the
    /// status line when the body is empty.
    #[error("{message}")]
    HttpError { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    DeserializationError(#[source] serde_json::Error),

    /// The response carried a document the output slot cannot hold. This is
    /// a programming error on the caller's side.
    #[error("response carried a {received} document but the output slot expects {expected}")]
    SlotMismatch {
        expected: &'static str,
        received: &'static str,
    },

    /// Client configuration was missing or invalid.
    #[error("invalid configuration: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_probe_reads_message_field() {
        let erm = ErrorMessage::probe(br#"{"message":"bad thing"}"#);
        assert!(erm.is_error());
        assert_eq!(erm.to_string(), "bad thing");
    }

    #[test]
    fn message_probe_is_empty_for_other_shapes() {
        assert!(!ErrorMessage::probe(b"").is_error());
        assert!(!ErrorMessage::probe(b"not json").is_error());
        assert!(!ErrorMessage::probe(br#"[{"message":"x"}]"#).is_error());
        assert!(!ErrorMessage::probe(br#"{"message":42}"#).is_error());
        assert!(!ErrorMessage::probe(br#"{"message":""}"#).is_error());
        assert!(!ErrorMessage::probe(br#"{"id":"abc"}"#).is_error());
    }

    #[test]
    fn collection_probe_accepts_bare_array() {
        let errs = ErrorCollection::probe(br#"[{"message":"a"},{"code":12,"message":"b"}]"#);
        assert_eq!(errs.count(), 2);
        assert_eq!(errs.errors[1].code, Some(serde_json::json!(12)));
        assert_eq!(errs.to_string(), "a; b");
    }

    #[test]
    fn collection_probe_accepts_wrapped_errors() {
        let errs = ErrorCollection::probe(br#"{"errors":[{"code":"E1","message":"missing total"}]}"#);
        assert!(errs.is_error());
        assert_eq!(errs.to_string(), "missing total");
    }

    #[test]
    fn field_names_match_case_insensitively() {
        let erm = ErrorMessage::probe(br#"{"Message":"Authorization has been denied"}"#);
        assert_eq!(erm.message, "Authorization has been denied");

        // An exact key wins over a differently-cased one.
        let erm = ErrorMessage::probe(br#"{"MESSAGE":"upper","message":"exact"}"#);
        assert_eq!(erm.message, "exact");

        let errs = ErrorCollection::probe(br#"{"Errors":[{"Code":3,"Message":"a"},{"message":"b"}]}"#);
        assert_eq!(errs.count(), 2);
        assert_eq!(errs.errors[0].code, Some(serde_json::json!(3)));
        assert_eq!(errs.to_string(), "a; b");
    }

    #[test]
    fn collection_probe_rejects_ordinary_lists() {
        assert!(!ErrorCollection::probe(br#"[{"id":"abc"}]"#).is_error());
        assert!(!ErrorCollection::probe(br#"[{"message":"a"},{"id":"b"}]"#).is_error());
        assert!(!ErrorCollection::probe(br#"[1,2,3]"#).is_error());
        assert!(!ErrorCollection::probe(br#"[]"#).is_error());
        assert!(!ErrorCollection::probe(br#"{"errors":"nope"}"#).is_error());
    }

    #[test]
    fn api_error_displays_server_message_verbatim() {
        let err = ApiError::from(ErrorMessage {
            message: "bad thing".to_string(),
        });
        assert_eq!(err.to_string(), "bad thing");

        let err = ApiError::HttpError {
            status: 500,
            message: "internal failure".to_string(),
        };
        assert_eq!(err.to_string(), "internal failure");
    }
}
