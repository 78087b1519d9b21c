use crate::error::HandlerError;
use chrono::{SecondsFormat, Utc};
use model::Item;
use serde_json::Value;

pub(crate) const TABLE_NAME_REQUIRED: &str = "tableName is required";
pub(crate) const ID_REQUIRED: &str = "id is required";

/// A non-empty string field, or a validation error carrying `message`.
pub(crate) fn required_str<'a>(
    payload: &'a Item,
    field: &str,
    message: &str,
) -> Result<&'a str, HandlerError> {
    match payload.get(field) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.as_str()),
        _ => Err(HandlerError::Validation(message.to_string())),
    }
}

/// Current UTC time in ISO-8601 form, e.g. `2024-05-01T12:00:00.000000Z`.
pub(crate) fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::json;
    use test_utils::item;

    #[test]
    fn required_str_rejects_missing_empty_and_non_string() {
        let payload: Item = item(json!({"tableName": "T", "empty": "", "number": 1}));

        assert_eq!(
            "T",
            required_str(&payload, "tableName", TABLE_NAME_REQUIRED).expect("should be present")
        );

        for field in ["missing", "empty", "number"] {
            let err: HandlerError =
                required_str(&payload, field, ID_REQUIRED).expect_err("should be rejected");

            assert_eq!(ID_REQUIRED, err.to_string());
        }
    }

    #[test]
    fn timestamp_is_utc_iso_8601() {
        let timestamp: String = utc_timestamp();

        assert!(timestamp.ends_with('Z'));
        assert!(DateTime::parse_from_rfc3339(&timestamp).is_ok());
    }
}
