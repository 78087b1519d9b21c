use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

pub const OK: u16 = 200;
pub const CREATED: u16 = 201;
pub const BAD_REQUEST: u16 = 400;
pub const NOT_FOUND: u16 = 404;
pub const INTERNAL_SERVER_ERROR: u16 = 500;

const CONTENT_TYPE: &str = "Content-Type";
const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";

/// The HTTP-style response returned by every handler.
///
/// The body is always a JSON-encoded object. Failures carry the shape
/// `{"error": "<message>"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HandlerResponse {
    /// Serialize `body` into a response with the default headers.
    pub fn json<T: Serialize>(status_code: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self::new(status_code, body),
            Err(err) => Self::error(
                INTERNAL_SERVER_ERROR,
                &format!("Internal server error: {err}"),
            ),
        }
    }

    pub fn error(status_code: u16, message: &str) -> Self {
        Self::new(status_code, json!({ "error": message }).to_string())
    }

    /// Decode the body back into JSON.
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    fn new(status_code: u16, body: String) -> Self {
        let headers: BTreeMap<String, String> = BTreeMap::from([
            (CONTENT_TYPE.to_string(), "application/json".to_string()),
            (ALLOW_ORIGIN.to_string(), "*".to_string()),
        ]);

        HandlerResponse {
            status_code,
            headers,
            body,
        }
    }
}
