use async_trait::async_trait;
use model::{Item, item_id};
use store::StoreErrorReason::{BackendFailure, BadItem, MissingEntry};
use store::StoreOperation::{DeleteItem, GetItem, PutItem, Scan, UpdateItem};
use store::{ItemStore, StoreError, StoreOperation, UpdateInstruction, WriteMetadata};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Table = HashMap<String, Item>;

/// Tables held in process memory. Tables are created on first use.
#[derive(Clone, Default)]
pub struct InMemoryItemStore {
    tables: Arc<Mutex<HashMap<String, Table>>>,
}

impl InMemoryItemStore {
    fn lock(
        &self,
        table_name: &str,
        key: Option<&str>,
        operation: StoreOperation,
    ) -> Result<MutexGuard<'_, HashMap<String, Table>>, StoreError> {
        self.tables.lock().map_err(|err| {
            StoreError::new(
                table_name,
                key,
                operation,
                BackendFailure(err.to_string().into()),
            )
        })
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn put_item(&self, table_name: &str, item: &Item) -> Result<WriteMetadata, StoreError> {
        let id: &str = item_id(item).ok_or_else(|| {
            StoreError::new(
                table_name,
                None,
                PutItem,
                BadItem("item has no string id".to_string()),
            )
        })?;

        self.lock(table_name, Some(id), PutItem)?
            .entry(table_name.to_string())
            .or_default()
            .insert(id.to_string(), item.clone());

        Ok(WriteMetadata::default())
    }

    async fn get_item(&self, table_name: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let tables = self.lock(table_name, Some(id), GetItem)?;

        Ok(tables
            .get(table_name)
            .and_then(|table| table.get(id))
            .cloned())
    }

    async fn update_item(
        &self,
        table_name: &str,
        id: &str,
        instruction: &UpdateInstruction,
    ) -> Result<Item, StoreError> {
        let mut tables = self.lock(table_name, Some(id), UpdateItem)?;

        let item: &mut Item = tables
            .get_mut(table_name)
            .and_then(|table| table.get_mut(id))
            .ok_or_else(|| StoreError::new(table_name, Some(id), UpdateItem, MissingEntry))?;

        instruction.apply_to(item);

        Ok(item.clone())
    }

    async fn delete_item(&self, table_name: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let mut tables = self.lock(table_name, Some(id), DeleteItem)?;

        Ok(tables
            .get_mut(table_name)
            .and_then(|table| table.remove(id)))
    }

    async fn scan_items(&self, table_name: &str) -> Result<Vec<Item>, StoreError> {
        let tables = self.lock(table_name, None, Scan)?;

        Ok(tables
            .get(table_name)
            .map(|table| table.values().cloned().collect())
            .unwrap_or_default())
    }
}
