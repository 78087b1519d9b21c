use crate::ItemHandler;
use crate::error::HandlerError;
use crate::fields::{TABLE_NAME_REQUIRED, required_str, utc_timestamp};
use async_trait::async_trait;
use lambda_runtime::tracing;
use model::env::{CREATE_PROFILE, TABLE_NAME};
use model::request::resolve_payload;
use model::response::{CREATED, HandlerResponse};
use model::{Error, ITEM_FIELD, ITEM_ID, Item, TABLE_NAME_FIELD};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use store::{ItemStore, WriteMetadata};
use uuid::Uuid;

/// Where the create handler finds its table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    /// The `tableName` field of each request
    Payload,
    /// Fixed by process configuration, `None` when it was not set
    Environment(Option<String>),
}

/// What the create handler echoes back on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateResponse {
    /// A message, the stored item and the backend write metadata
    Envelope,
    /// Only the stored item
    Item,
}

/// A named configuration of the create handler.
///
/// The two deployments of create differ in where the table comes from, how
/// strictly the body is required, the timestamp field names and the
/// response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateProfile {
    pub table_source: TableSource,
    // Fall back to query string parameters and then the raw envelope
    pub body_fallback: bool,
    pub created_field: &'static str,
    pub updated_field: &'static str,
    pub response: CreateResponse,
}

impl CreateProfile {
    pub const PAYLOAD: &'static str = "payload";
    pub const ENVIRONMENT: &'static str = "environment";

    /// Table named in the request, item under its `item` field.
    pub fn payload() -> Self {
        CreateProfile {
            table_source: TableSource::Payload,
            body_fallback: true,
            created_field: "createdAt",
            updated_field: "updatedAt",
            response: CreateResponse::Envelope,
        }
    }

    /// Table fixed by configuration, the whole body is the item.
    pub fn environment(table_name: Option<String>) -> Self {
        CreateProfile {
            table_source: TableSource::Environment(table_name.filter(|name| !name.is_empty())),
            body_fallback: false,
            created_field: "created_at",
            updated_field: "updated_at",
            response: CreateResponse::Item,
        }
    }

    pub fn named(name: &str, table_name: Option<String>) -> Result<Self, Error> {
        match name {
            Self::PAYLOAD => Ok(Self::payload()),
            Self::ENVIRONMENT => Ok(Self::environment(table_name)),
            other => Err(format!(
                "Unknown {CREATE_PROFILE} {other}, expected {} or {}",
                Self::PAYLOAD,
                Self::ENVIRONMENT
            )
            .into()),
        }
    }

    /// Select the profile named by `CREATE_PROFILE`, defaulting to `payload`.
    pub fn from_env() -> Result<Self, Error> {
        let name: String =
            std::env::var(CREATE_PROFILE).unwrap_or_else(|_| Self::PAYLOAD.to_string());

        Self::named(&name, std::env::var(TABLE_NAME).ok())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatedResponse<'a> {
    message: &'static str,
    item: &'a Item,
    dynamo_response: &'a WriteMetadata,
}

/// Inserts a new item, generating its `id` when none is supplied.
///
/// Writes are unconditional so an existing item with the same `id` is replaced.
pub struct CreateHandler {
    store: Arc<dyn ItemStore>,
    profile: CreateProfile,
}

impl CreateHandler {
    pub fn new(store: Arc<dyn ItemStore>, profile: CreateProfile) -> Self {
        CreateHandler { store, profile }
    }

    pub fn profile(&self) -> &CreateProfile {
        &self.profile
    }

    /// Resolve the table and the item data from the request.
    fn table_and_item(&self, event: Value) -> Result<(String, Item), HandlerError> {
        // A missing configured table fails every request, whatever the body
        let configured_table: Option<String> = match &self.profile.table_source {
            TableSource::Payload => None,
            TableSource::Environment(Some(table_name)) => Some(table_name.clone()),
            TableSource::Environment(None) => {
                return Err(HandlerError::Configuration(format!(
                    "{TABLE_NAME} environment variable not set"
                )));
            }
        };

        let mut payload: Item = resolve_payload(event, self.profile.body_fallback)?;

        if let Some(table_name) = configured_table {
            return Ok((table_name, payload));
        }

        let table_name: String =
            required_str(&payload, TABLE_NAME_FIELD, TABLE_NAME_REQUIRED)?.to_string();

        let item: Item = match payload.remove(ITEM_FIELD) {
            None | Some(Value::Null) => Item::new(),
            Some(Value::Object(item)) => item,
            Some(_) => {
                return Err(HandlerError::Validation(
                    "item must be a JSON object".to_string(),
                ));
            }
        };

        Ok((table_name, item))
    }
}

#[async_trait]
impl ItemHandler for CreateHandler {
    fn name(&self) -> &'static str {
        "CreateHandler"
    }

    async fn handle(&self, event: Value) -> Result<HandlerResponse, HandlerError> {
        let (table_name, mut item) = self.table_and_item(event)?;

        match item.get(ITEM_ID) {
            None => {
                item.insert(ITEM_ID.to_string(), Value::String(Uuid::new_v4().to_string()));
            }
            Some(Value::String(id)) if !id.is_empty() => {}
            Some(_) => {
                return Err(HandlerError::Validation(
                    "id must be a non-empty string".to_string(),
                ));
            }
        }

        // Caller supplied timestamps are always overwritten
        let now: String = utc_timestamp();
        item.insert(
            self.profile.created_field.to_string(),
            Value::String(now.clone()),
        );
        item.insert(self.profile.updated_field.to_string(), Value::String(now));

        let metadata: WriteMetadata = self.store.put_item(&table_name, &item).await?;

        tracing::info!(
            table_name = table_name.as_str(),
            id = model::item_id(&item),
            "Created item"
        );

        Ok(match self.profile.response {
            CreateResponse::Envelope => HandlerResponse::json(
                CREATED,
                &CreatedResponse {
                    message: "Item created successfully",
                    item: &item,
                    dynamo_response: &metadata,
                },
            ),
            CreateResponse::Item => HandlerResponse::json(CREATED, &item),
        })
    }
}
