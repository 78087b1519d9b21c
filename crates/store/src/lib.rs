use async_trait::async_trait;
use model::{Error, Item};
use serde::Serialize;
use std::fmt::{Debug, Display, Formatter};

pub mod update;

pub use update::{FieldAssignment, UpdateInstruction};

/// A schemaless key-value table addressed by name, keyed by `id`.
///
/// Implementations only provide the primitives; existence checks and
/// timestamps are the caller's concern.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Unconditional upsert.
    async fn put_item(&self, table_name: &str, item: &Item) -> Result<WriteMetadata, StoreError>;

    async fn get_item(&self, table_name: &str, id: &str) -> Result<Option<Item>, StoreError>;

    /// Apply field assignments to an existing item and return its new state.
    /// Fails with [`StoreErrorReason::MissingEntry`] when `id` is absent.
    async fn update_item(
        &self,
        table_name: &str,
        id: &str,
        instruction: &UpdateInstruction,
    ) -> Result<Item, StoreError>;

    /// Remove an item, returning it as it was before deletion.
    async fn delete_item(&self, table_name: &str, id: &str) -> Result<Option<Item>, StoreError>;

    /// Every item in the table, in no particular order.
    async fn scan_items(&self, table_name: &str) -> Result<Vec<Item>, StoreError>;
}

/// Metadata reported by the backend for a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WriteMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Errors arising from the storage backend.
#[derive(Debug)]
pub struct StoreError {
    pub table_name: String,
    pub key: Option<String>,

    pub operation: StoreOperation,
    pub reason: StoreErrorReason,
}

#[derive(Debug)]
pub enum StoreErrorReason {
    // The item addressed by the key does not exist
    MissingEntry,
    // The item could not be converted to or from the backend format
    BadItem(String),
    // An error from the underlying store
    BackendFailure(Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    PutItem,
    GetItem,
    UpdateItem,
    DeleteItem,
    Scan,
}

impl StoreError {
    pub fn new(
        table_name: &str,
        key: Option<&str>,
        operation: StoreOperation,
        reason: StoreErrorReason,
    ) -> Self {
        StoreError {
            table_name: table_name.to_string(),
            key: key.map(str::to_string),
            operation,
            reason,
        }
    }

    pub fn is_missing_entry(&self) -> bool {
        matches!(self.reason, StoreErrorReason::MissingEntry)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} on table {}", self.operation, self.table_name)?;

        if let Some(key) = &self.key {
            write!(f, " for id {key}")?;
        }

        match &self.reason {
            StoreErrorReason::MissingEntry => f.write_str(" failed: item does not exist"),
            StoreErrorReason::BadItem(reason) => write!(f, " failed: bad item: {reason}"),
            StoreErrorReason::BackendFailure(err) => write!(f, " failed: {err}"),
        }
    }
}

impl std::error::Error for StoreError {}
