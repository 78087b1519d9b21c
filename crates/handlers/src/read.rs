use crate::ItemHandler;
use crate::error::HandlerError;
use crate::fields::{TABLE_NAME_REQUIRED, required_str};
use async_trait::async_trait;
use lambda_runtime::tracing;
use model::request::resolve_payload;
use model::response::{HandlerResponse, OK};
use model::{ITEM_ID, Item, OPERATION_FIELD, TABLE_NAME_FIELD};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use store::ItemStore;

const SCAN: &str = "scan";

/// Read mode selected by the `operation` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOperation {
    /// A single item by `id`
    Get,
    /// Every item in the table
    Scan,
}

impl ReadOperation {
    /// Anything other than `scan` is a get.
    pub fn from_payload(payload: &Item) -> Self {
        match payload.get(OPERATION_FIELD).and_then(Value::as_str) {
            Some(SCAN) => ReadOperation::Scan,
            _ => ReadOperation::Get,
        }
    }
}

#[derive(Serialize)]
struct ItemResponse<'a> {
    item: &'a Item,
}

#[derive(Serialize)]
struct ScanResponse<'a> {
    items: &'a [Item],
    count: usize,
}

pub struct ReadHandler {
    store: Arc<dyn ItemStore>,
}

impl ReadHandler {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        ReadHandler { store }
    }

    async fn get(&self, table_name: &str, payload: &Item) -> Result<HandlerResponse, HandlerError> {
        let id: &str = required_str(payload, ITEM_ID, "id is required for get operation")?;

        let item: Item = self
            .store
            .get_item(table_name, id)
            .await?
            .ok_or(HandlerError::NotFound)?;

        tracing::info!(table_name, id, "Read item");

        Ok(HandlerResponse::json(OK, &ItemResponse { item: &item }))
    }

    // Unbounded: the store follows every page of the table
    async fn scan(&self, table_name: &str) -> Result<HandlerResponse, HandlerError> {
        let items: Vec<Item> = self.store.scan_items(table_name).await?;

        tracing::info!(table_name, count = items.len(), "Scanned table");

        Ok(HandlerResponse::json(
            OK,
            &ScanResponse {
                items: &items,
                count: items.len(),
            },
        ))
    }
}

#[async_trait]
impl ItemHandler for ReadHandler {
    fn name(&self) -> &'static str {
        "ReadHandler"
    }

    async fn handle(&self, event: Value) -> Result<HandlerResponse, HandlerError> {
        let payload: Item = resolve_payload(event, true)?;
        let table_name: &str = required_str(&payload, TABLE_NAME_FIELD, TABLE_NAME_REQUIRED)?;

        match ReadOperation::from_payload(&payload) {
            ReadOperation::Get => self.get(table_name, &payload).await,
            ReadOperation::Scan => self.scan(table_name).await,
        }
    }
}
