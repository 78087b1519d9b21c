use crate::ItemHandler;
use crate::error::HandlerError;
use crate::fields::{ID_REQUIRED, TABLE_NAME_REQUIRED, required_str};
use async_trait::async_trait;
use lambda_runtime::tracing;
use model::request::resolve_payload;
use model::response::{HandlerResponse, OK};
use model::{ITEM_ID, Item, TABLE_NAME_FIELD};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use store::ItemStore;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeletedResponse<'a> {
    message: &'static str,
    deleted_item: &'a Item,
}

/// Removes an item, echoing it as it was immediately before deletion.
pub struct DeleteHandler {
    store: Arc<dyn ItemStore>,
}

impl DeleteHandler {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        DeleteHandler { store }
    }
}

#[async_trait]
impl ItemHandler for DeleteHandler {
    fn name(&self) -> &'static str {
        "DeleteHandler"
    }

    async fn handle(&self, event: Value) -> Result<HandlerResponse, HandlerError> {
        let payload: Item = resolve_payload(event, true)?;
        let table_name: &str = required_str(&payload, TABLE_NAME_FIELD, TABLE_NAME_REQUIRED)?;
        let id: &str = required_str(&payload, ITEM_ID, ID_REQUIRED)?;

        if self.store.get_item(table_name, id).await?.is_none() {
            return Err(HandlerError::NotFound);
        }

        // Another delete may have won since the check
        let deleted: Item = self
            .store
            .delete_item(table_name, id)
            .await?
            .ok_or(HandlerError::NotFound)?;

        tracing::info!(table_name, id, "Deleted item");

        Ok(HandlerResponse::json(
            OK,
            &DeletedResponse {
                message: "Item deleted successfully",
                deleted_item: &deleted,
            },
        ))
    }
}
