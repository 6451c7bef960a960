//! Response shaping: remote 2xx body → [`InferenceResult`].
//!
//! The decision boundary:
//!
//! | Remote body | Outcome |
//! |---|---|
//! | empty, not JSON, no `choices`, `choices` not an array | `RemoteFormat` error, HTTP 500 |
//! | `choices` array without a usable `[0].message.content` | sentinel content, HTTP 200 |
//! | `choices[0].message.content` is a non-empty string | that string, HTTP 200 |
//!
//! "Usable" means present and a non-empty string; an empty string, `null`, or
//! a non-string value all degrade to [`UNPARSEABLE_RESULT`].

use crate::error::GatewayError;
use crate::output::InferenceResult;
use crate::prompts::UNPARSEABLE_RESULT;
use serde_json::Value;
use tracing::{debug, warn};

/// Shape a successful remote body into the local result contract.
pub fn shape(body: &[u8]) -> Result<InferenceResult, GatewayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(GatewayError::RemoteFormat("API response is empty".into()));
    }

    let value: Value = serde_json::from_slice(body).map_err(|e| {
        GatewayError::RemoteFormat(format!("API response is not valid JSON: {e}"))
    })?;

    let choices = match value.get("choices") {
        Some(Value::Array(choices)) => choices,
        Some(_) => {
            return Err(GatewayError::RemoteFormat(
                "API response choices is not an array".into(),
            ))
        }
        None => {
            return Err(GatewayError::RemoteFormat(
                "API response is missing the choices array".into(),
            ))
        }
    };

    let content = choices
        .first()
        .and_then(|choice| choice.pointer("/message/content"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());

    match content {
        Some(text) => {
            debug!("Normalised result: {} chars", text.chars().count());
            Ok(InferenceResult::new(text))
        }
        None => {
            warn!(
                "API response has {} choices but no usable message content",
                choices.len()
            );
            Ok(InferenceResult::new(UNPARSEABLE_RESULT))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(body: &str) -> String {
        shape(body.as_bytes()).unwrap().content().to_string()
    }

    fn format_error(body: &str) -> String {
        match shape(body.as_bytes()) {
            Err(GatewayError::RemoteFormat(msg)) => msg,
            other => panic!("expected RemoteFormat, got {other:?}"),
        }
    }

    #[test]
    fn extracts_first_choice() {
        assert_eq!(
            content(r#"{"choices":[{"message":{"content":"42"}},{"message":{"content":"43"}}]}"#),
            "42"
        );
    }

    #[test]
    fn missing_message_degrades_to_sentinel() {
        assert_eq!(content(r#"{"choices":[{}]}"#), UNPARSEABLE_RESULT);
    }

    #[test]
    fn missing_or_blank_content_degrades_to_sentinel() {
        assert_eq!(content(r#"{"choices":[{"message":{}}]}"#), UNPARSEABLE_RESULT);
        assert_eq!(
            content(r#"{"choices":[{"message":{"content":null}}]}"#),
            UNPARSEABLE_RESULT
        );
        assert_eq!(
            content(r#"{"choices":[{"message":{"content":""}}]}"#),
            UNPARSEABLE_RESULT
        );
        assert_eq!(
            content(r#"{"choices":[{"message":{"content":7}}]}"#),
            UNPARSEABLE_RESULT
        );
    }

    #[test]
    fn empty_choices_degrades_to_sentinel() {
        assert_eq!(content(r#"{"choices":[]}"#), UNPARSEABLE_RESULT);
    }

    #[test]
    fn missing_choices_is_an_error() {
        assert!(format_error("{}").contains("missing the choices array"));
        assert!(format_error("null").contains("missing the choices array"));
    }

    #[test]
    fn non_array_choices_is_an_error() {
        assert!(format_error(r#"{"choices":{"0":{}}}"#).contains("not an array"));
    }

    #[test]
    fn empty_or_garbage_body_is_an_error() {
        assert_eq!(format_error(""), "API response is empty");
        assert_eq!(format_error("  \n"), "API response is empty");
        assert!(format_error("<html>").contains("not valid JSON"));
    }

    #[test]
    fn format_errors_are_http_500() {
        let err = shape(b"{}").unwrap_err();
        assert_eq!(
            err.status_code(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(err.summary(), "API response format is invalid");
    }
}
