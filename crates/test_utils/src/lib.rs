use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use model::Item;
use model::response::HandlerResponse;
use serde_json::{Value, json};
use std::collections::HashMap;
use store::StoreErrorReason::BackendFailure;
use store::{ItemStore, StoreError, StoreOperation, UpdateInstruction, WriteMetadata};

/// Test table name
pub const TEST_TABLE: &str = "test_table";

/// Convert a JSON object literal into an item. Anything else is an empty item.
pub fn item(value: Value) -> Item {
    match value {
        Value::Object(item) => item,
        _ => Item::new(),
    }
}

/// Convert a JSON object literal into DynamoDB attributes, for mocked outputs
pub fn dynamo_item(value: Value) -> HashMap<String, AttributeValue> {
    serde_dynamo::to_item(item(value)).expect("test item should convert to attributes")
}

/// An API Gateway proxy request carrying `payload` as its JSON-encoded body
pub fn body_event(payload: Value) -> Value {
    json!({
        "resource": "/items",
        "path": "/items",
        "httpMethod": "POST",
        "headers": {"Content-Type": "application/json"},
        "queryStringParameters": null,
        "body": payload.to_string(),
        "isBase64Encoded": false,
    })
}

/// An API Gateway proxy request with query string parameters and no body
pub fn query_event(params: &[(&str, &str)]) -> Value {
    let params: Item = params
        .iter()
        .map(|&(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();

    json!({
        "resource": "/items",
        "path": "/items",
        "httpMethod": "GET",
        "headers": {},
        "queryStringParameters": params,
        "body": null,
        "isBase64Encoded": false,
    })
}

/// Decode a response body, panicking on invalid JSON
pub fn response_json(response: &HandlerResponse) -> Value {
    response
        .body_json()
        .expect("response body should be valid JSON")
}

/// Message reported by every [`FailingItemStore`] operation
pub const BACKEND_FAILURE: &str = "ThrottlingException: Rate exceeded";

/// A store whose backend rejects every request
pub struct FailingItemStore;

impl FailingItemStore {
    fn fail(table_name: &str, key: Option<&str>, operation: StoreOperation) -> StoreError {
        StoreError::new(table_name, key, operation, BackendFailure(BACKEND_FAILURE.into()))
    }
}

#[async_trait]
impl ItemStore for FailingItemStore {
    async fn put_item(&self, table_name: &str, item: &Item) -> Result<WriteMetadata, StoreError> {
        Err(Self::fail(table_name, model::item_id(item), StoreOperation::PutItem))
    }

    async fn get_item(&self, table_name: &str, id: &str) -> Result<Option<Item>, StoreError> {
        Err(Self::fail(table_name, Some(id), StoreOperation::GetItem))
    }

    async fn update_item(
        &self,
        table_name: &str,
        id: &str,
        _: &UpdateInstruction,
    ) -> Result<Item, StoreError> {
        Err(Self::fail(table_name, Some(id), StoreOperation::UpdateItem))
    }

    async fn delete_item(&self, table_name: &str, id: &str) -> Result<Option<Item>, StoreError> {
        Err(Self::fail(table_name, Some(id), StoreOperation::DeleteItem))
    }

    async fn scan_items(&self, table_name: &str) -> Result<Vec<Item>, StoreError> {
        Err(Self::fail(table_name, None, StoreOperation::Scan))
    }
}
