use serde_json::{Map, Value};

pub mod env;
pub mod request;
pub mod response;

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A single schemaless record of a table, keyed by [`ITEM_ID`].
///
/// Field order is preserved as received, which keeps update instructions
/// in the caller's field order.
pub type Item = Map<String, Value>;

/// The primary key attribute of every table.
pub const ITEM_ID: &str = "id";

/// Payload field naming the target table.
pub const TABLE_NAME_FIELD: &str = "tableName";

/// Payload field carrying item data for create and update.
pub const ITEM_FIELD: &str = "item";

/// Payload field selecting the read mode.
pub const OPERATION_FIELD: &str = "operation";

/// Returns the primary key of an item when it is a non-empty string.
pub fn item_id(item: &Item) -> Option<&str> {
    match item.get(ITEM_ID) {
        Some(Value::String(id)) if !id.is_empty() => Some(id.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn item_id_requires_non_empty_string() {
        let item: Item = json!({"id": "abc"}).as_object().cloned().unwrap_or_default();
        assert_eq!(Some("abc"), item_id(&item));

        let empty: Item = json!({"id": ""}).as_object().cloned().unwrap_or_default();
        assert_eq!(None, item_id(&empty));

        let numeric: Item = json!({"id": 7}).as_object().cloned().unwrap_or_default();
        assert_eq!(None, item_id(&numeric));
    }
}
