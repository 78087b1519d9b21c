use crate::Item;
use serde_json::Value;
use std::fmt::{Display, Formatter};

const BODY: &str = "body";
const QUERY_STRING_PARAMETERS: &str = "queryStringParameters";

/// Where the effective payload of a request was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    Body,
    // Trigger sources which pass structured input directly
    Envelope,
}

/// Errors arising from resolving the payload of a request envelope.
#[derive(Debug)]
pub enum RequestError {
    // The body was present but not valid JSON
    MalformedBody(serde_json::Error),
    // The payload was valid JSON but not a mapping
    NotAnObject(PayloadSource),
    // A body is required and none was sent
    MissingBody,
}

impl Display for RequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestError::MalformedBody(err) => write!(f, "malformed request body: {err}"),
            RequestError::NotAnObject(source) => {
                write!(f, "request payload from {source:?} is not a JSON object")
            }
            RequestError::MissingBody => f.write_str("Request body is required"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::MalformedBody(err) => Some(err),
            _ => None,
        }
    }
}

/// Resolve the effective payload of a request envelope.
///
/// A non-empty `body` wins and is parsed as JSON. Otherwise non-empty
/// `queryStringParameters` are used as-is, and failing that the envelope
/// itself is the payload. With `allow_fallback` unset only the body is
/// accepted.
pub fn resolve_payload(event: Value, allow_fallback: bool) -> Result<Item, RequestError> {
    let Value::Object(envelope) = event else {
        return Err(RequestError::NotAnObject(PayloadSource::Envelope));
    };

    match envelope.get(BODY) {
        Some(Value::String(body)) if !body.is_empty() => {
            return match serde_json::from_str::<Value>(body).map_err(RequestError::MalformedBody)? {
                Value::Object(payload) => Ok(payload),
                _ => Err(RequestError::NotAnObject(PayloadSource::Body)),
            };
        }
        // Some test harnesses send the body already decoded
        Some(Value::Object(payload)) if !payload.is_empty() => return Ok(payload.clone()),
        _ if !allow_fallback => return Err(RequestError::MissingBody),
        _ => {}
    }

    match envelope.get(QUERY_STRING_PARAMETERS) {
        Some(Value::Object(params)) if !params.is_empty() => Ok(params.clone()),
        _ => Ok(envelope),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn body_takes_priority_over_query_string() {
        let event: Value = json!({
            "body": "{\"tableName\": \"from-body\"}",
            "queryStringParameters": {"tableName": "from-query"},
        });

        let payload: Item = resolve_payload(event, true).expect("body should parse");

        assert_eq!(Some(&json!("from-body")), payload.get("tableName"));
    }

    #[test]
    fn query_string_used_when_body_empty() {
        let event: Value = json!({
            "body": "",
            "queryStringParameters": {"tableName": "T", "id": "1"},
        });

        let payload: Item = resolve_payload(event, true).expect("query string should be used");

        assert_eq!(Some(&json!("T")), payload.get("tableName"));
        assert_eq!(Some(&json!("1")), payload.get("id"));
    }

    #[test]
    fn envelope_used_when_nothing_else_present() {
        let event: Value = json!({
            "body": null,
            "queryStringParameters": null,
            "tableName": "T",
        });

        let payload: Item = resolve_payload(event, true).expect("envelope should be used");

        assert_eq!(Some(&json!("T")), payload.get("tableName"));
    }

    #[test]
    fn malformed_body_is_an_error() {
        let event: Value = json!({"body": "{not json"});

        let result: Result<Item, RequestError> = resolve_payload(event, true);

        assert!(matches!(result, Err(RequestError::MalformedBody(_))));
    }

    #[test]
    fn non_object_body_is_an_error() {
        let event: Value = json!({"body": "[1, 2]"});

        let result: Result<Item, RequestError> = resolve_payload(event, true);

        assert!(matches!(
            result,
            Err(RequestError::NotAnObject(PayloadSource::Body))
        ));
    }

    #[test]
    fn strict_resolution_requires_body() {
        let event: Value = json!({
            "queryStringParameters": {"name": "a"},
            "name": "a",
        });

        let result: Result<Item, RequestError> = resolve_payload(event, false);

        assert!(matches!(result, Err(RequestError::MissingBody)));
    }

    #[test]
    fn strict_resolution_rejects_empty_body() {
        let result: Result<Item, RequestError> = resolve_payload(json!({"body": ""}), false);

        assert!(matches!(result, Err(RequestError::MissingBody)));
    }
}
