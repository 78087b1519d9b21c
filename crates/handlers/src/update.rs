use crate::ItemHandler;
use crate::error::HandlerError;
use crate::fields::{ID_REQUIRED, TABLE_NAME_REQUIRED, required_str, utc_timestamp};
use async_trait::async_trait;
use lambda_runtime::tracing;
use model::request::resolve_payload;
use model::response::{HandlerResponse, OK};
use model::{ITEM_FIELD, ITEM_ID, Item, TABLE_NAME_FIELD};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use store::{ItemStore, UpdateInstruction};

const UPDATED_AT: &str = "updatedAt";

#[derive(Serialize)]
struct UpdatedResponse<'a> {
    message: &'static str,
    item: &'a Item,
}

/// Partially updates an existing item, leaving unlisted fields untouched.
///
/// The existence check and the write are separate calls. The store must
/// refuse to update an item which has disappeared in between.
pub struct UpdateHandler {
    store: Arc<dyn ItemStore>,
}

impl UpdateHandler {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        UpdateHandler { store }
    }
}

#[async_trait]
impl ItemHandler for UpdateHandler {
    fn name(&self) -> &'static str {
        "UpdateHandler"
    }

    async fn handle(&self, event: Value) -> Result<HandlerResponse, HandlerError> {
        let payload: Item = resolve_payload(event, true)?;
        let table_name: &str = required_str(&payload, TABLE_NAME_FIELD, TABLE_NAME_REQUIRED)?;
        let id: &str = required_str(&payload, ITEM_ID, ID_REQUIRED)?;

        let mut fields: Item = match payload.get(ITEM_FIELD) {
            Some(Value::Object(fields)) if !fields.is_empty() => fields.clone(),
            _ => return Err(HandlerError::Validation("item data is required".to_string())),
        };

        if self.store.get_item(table_name, id).await?.is_none() {
            return Err(HandlerError::NotFound);
        }

        fields.insert(UPDATED_AT.to_string(), Value::String(utc_timestamp()));

        // The primary key is never rewritten, even when present in the fields
        let instruction: UpdateInstruction = UpdateInstruction::from_fields(&fields);
        let item: Item = self.store.update_item(table_name, id, &instruction).await?;

        tracing::info!(
            table_name,
            id,
            fields = instruction.assignments().len(),
            "Updated item"
        );

        Ok(HandlerResponse::json(
            OK,
            &UpdatedResponse {
                message: "Item updated successfully",
                item: &item,
            },
        ))
    }
}
