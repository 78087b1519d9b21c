use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::RequestId;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemOutput;
use aws_sdk_dynamodb::operation::get_item::GetItemOutput;
use aws_sdk_dynamodb::operation::put_item::PutItemOutput;
use aws_sdk_dynamodb::operation::scan::ScanOutput;
use aws_sdk_dynamodb::operation::update_item::UpdateItemOutput;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use model::env::CONSISTENT_READ;
use model::{Error, ITEM_ID, Item};
use store::StoreErrorReason::{BackendFailure, BadItem, MissingEntry};
use store::StoreOperation::{DeleteItem, GetItem, PutItem, Scan, UpdateItem};
use store::{ItemStore, StoreError, StoreErrorReason, UpdateInstruction, WriteMetadata};
use std::collections::HashMap;

type Attributes = HashMap<String, AttributeValue>;

// Never collides with the positional placeholders of an update
const KEY_PLACEHOLDER: &str = "#pk";

/// [`ItemStore`] backed by DynamoDB tables with a string `id` partition key.
#[derive(Clone)]
pub struct DynamoDbItemStore {
    dynamodb_client: aws_sdk_dynamodb::Client,
    consistent_read: bool,
}

impl DynamoDbItemStore {
    pub fn new(dynamodb_client: aws_sdk_dynamodb::Client) -> Self {
        DynamoDbItemStore {
            dynamodb_client,
            consistent_read: true,
        }
    }

    /// Build a client from the default AWS configuration chain.
    ///
    /// Reads are strongly consistent unless `CONSISTENT_READ` is `false`.
    pub async fn from_env() -> Result<Self, Error> {
        let consistent_read: bool = match std::env::var(CONSISTENT_READ) {
            Ok(value) => value.parse().map_err(|_| {
                format!("{CONSISTENT_READ} must be true or false, got {value}")
            })?,
            Err(_) => true,
        };

        let config = aws_config::load_defaults(BehaviorVersion::latest()).await;

        Ok(Self::new(aws_sdk_dynamodb::Client::new(&config)).with_consistent_read(consistent_read))
    }

    pub fn with_consistent_read(mut self, consistent_read: bool) -> Self {
        self.consistent_read = consistent_read;
        self
    }
}

#[async_trait]
impl ItemStore for DynamoDbItemStore {
    async fn put_item(&self, table_name: &str, item: &Item) -> Result<WriteMetadata, StoreError> {
        let id: Option<&str> = model::item_id(item);
        let attributes: Attributes = serde_dynamo::to_item(item).map_err(|err| {
            StoreError::new(table_name, id, PutItem, BadItem(err.to_string()))
        })?;

        let output: PutItemOutput = self
            .dynamodb_client
            .put_item()
            .table_name(table_name)
            .set_item(Some(attributes))
            .send()
            .await
            .map_err(|err| StoreError::new(table_name, id, PutItem, backend_failure(err)))?;

        Ok(WriteMetadata {
            request_id: output.request_id().map(str::to_string),
        })
    }

    async fn get_item(&self, table_name: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let output: GetItemOutput = self
            .dynamodb_client
            .get_item()
            .table_name(table_name)
            .set_key(Some(item_key(id)))
            .consistent_read(self.consistent_read)
            .send()
            .await
            .map_err(|err| StoreError::new(table_name, Some(id), GetItem, backend_failure(err)))?;

        output
            .item
            .map(|attributes| {
                from_attributes(attributes)
                    .map_err(|reason| StoreError::new(table_name, Some(id), GetItem, reason))
            })
            .transpose()
    }

    async fn update_item(
        &self,
        table_name: &str,
        id: &str,
        instruction: &UpdateInstruction,
    ) -> Result<Item, StoreError> {
        // Without the condition DynamoDB would create the item
        let mut request = self
            .dynamodb_client
            .update_item()
            .table_name(table_name)
            .set_key(Some(item_key(id)))
            .update_expression(instruction.set_expression())
            .condition_expression(format!("attribute_exists({KEY_PLACEHOLDER})"))
            .expression_attribute_names(KEY_PLACEHOLDER, ITEM_ID)
            .return_values(ReturnValue::AllNew);

        for assignment in instruction.assignments() {
            let value: AttributeValue = serde_dynamo::to_attribute_value(&assignment.value)
                .map_err(|err| {
                    StoreError::new(table_name, Some(id), UpdateItem, BadItem(err.to_string()))
                })?;

            request = request
                .expression_attribute_names(&assignment.name_placeholder, &assignment.field)
                .expression_attribute_values(&assignment.value_placeholder, value);
        }

        let output: UpdateItemOutput = request.send().await.map_err(|err| {
            let condition_failed: bool = err
                .as_service_error()
                .is_some_and(|service_err| service_err.is_conditional_check_failed_exception());

            let reason: StoreErrorReason = if condition_failed {
                MissingEntry
            } else {
                backend_failure(err)
            };

            StoreError::new(table_name, Some(id), UpdateItem, reason)
        })?;

        from_attributes(output.attributes.unwrap_or_default())
            .map_err(|reason| StoreError::new(table_name, Some(id), UpdateItem, reason))
    }

    async fn delete_item(&self, table_name: &str, id: &str) -> Result<Option<Item>, StoreError> {
        let output: DeleteItemOutput = self
            .dynamodb_client
            .delete_item()
            .table_name(table_name)
            .set_key(Some(item_key(id)))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|err| {
                StoreError::new(table_name, Some(id), DeleteItem, backend_failure(err))
            })?;

        output
            .attributes
            .map(|attributes| {
                from_attributes(attributes)
                    .map_err(|reason| StoreError::new(table_name, Some(id), DeleteItem, reason))
            })
            .transpose()
    }

    async fn scan_items(&self, table_name: &str) -> Result<Vec<Item>, StoreError> {
        let mut items: Vec<Item> = Vec::new();
        let mut exclusive_start_key: Option<Attributes> = None;

        // Follow pages until the table is exhausted
        loop {
            let output: ScanOutput = self
                .dynamodb_client
                .scan()
                .table_name(table_name)
                .consistent_read(self.consistent_read)
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|err| StoreError::new(table_name, None, Scan, backend_failure(err)))?;

            for attributes in output.items.unwrap_or_default() {
                let item: Item = from_attributes(attributes)
                    .map_err(|reason| StoreError::new(table_name, None, Scan, reason))?;
                items.push(item);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        Ok(items)
    }
}

fn item_key(id: &str) -> Attributes {
    HashMap::from([(ITEM_ID.to_string(), AttributeValue::S(id.to_string()))])
}

fn from_attributes(attributes: Attributes) -> Result<Item, StoreErrorReason> {
    serde_dynamo::from_item(attributes).map_err(|err| BadItem(err.to_string()))
}

// Keeps the service's own message rather than the bare "service error"
fn backend_failure(err: impl std::error::Error) -> StoreErrorReason {
    BackendFailure(DisplayErrorContext(err).to_string().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::get_item::GetItemError;
    use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
    use aws_sdk_dynamodb::types::error::{
        ConditionalCheckFailedException, ProvisionedThroughputExceededException,
    };
    use aws_smithy_mocks::{Rule, mock, mock_client};
    use serde_json::json;
    use test_utils::{TEST_TABLE, dynamo_item, item};

    #[tokio::test]
    async fn get_item_converts_attributes() {
        let get_rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item)
            .match_requests(|req| {
                req.table_name() == Some(TEST_TABLE)
                    && req.key().and_then(|key| key.get(ITEM_ID))
                        == Some(&AttributeValue::S("1".to_string()))
                    && req.consistent_read() == Some(true)
            })
            .then_output(|| {
                GetItemOutput::builder()
                    .set_item(Some(dynamo_item(json!({"id": "1", "name": "a", "size": 3}))))
                    .build()
            });

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&get_rule]));

        let fetched: Option<Item> = store
            .get_item(TEST_TABLE, "1")
            .await
            .expect("get should succeed");

        assert_eq!(Some(item(json!({"id": "1", "name": "a", "size": 3}))), fetched);
    }

    #[tokio::test]
    async fn get_item_absent_is_none() {
        let get_rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item)
            .then_output(|| GetItemOutput::builder().build());

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&get_rule]));

        let fetched: Option<Item> = store
            .get_item(TEST_TABLE, "missing")
            .await
            .expect("get should succeed");

        assert_eq!(None, fetched);
    }

    #[tokio::test]
    async fn get_item_backend_error_keeps_service_message() {
        let get_rule: Rule = mock!(aws_sdk_dynamodb::Client::get_item).then_error(|| {
            GetItemError::ProvisionedThroughputExceededException(
                ProvisionedThroughputExceededException::builder()
                    .message("Rate of requests exceeds the allowed throughput")
                    .build(),
            )
        });

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&get_rule]));

        let err: StoreError = store
            .get_item(TEST_TABLE, "1")
            .await
            .expect_err("get should fail");

        assert!(matches!(err.reason, BackendFailure(_)));
        assert!(
            err.to_string()
                .contains("Rate of requests exceeds the allowed throughput")
        );
    }

    #[tokio::test]
    async fn put_item_sends_whole_item() {
        let put_rule: Rule = mock!(aws_sdk_dynamodb::Client::put_item)
            .match_requests(|req| {
                req.table_name() == Some(TEST_TABLE)
                    && req.item() == Some(&dynamo_item(json!({"id": "1", "name": "a"})))
            })
            .then_output(|| PutItemOutput::builder().build());

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&put_rule]));

        store
            .put_item(TEST_TABLE, &item(json!({"id": "1", "name": "a"})))
            .await
            .expect("put should succeed");
    }

    #[tokio::test]
    async fn update_item_builds_conditional_set_expression() {
        let update_rule: Rule = mock!(aws_sdk_dynamodb::Client::update_item)
            .match_requests(|req| {
                let names: Option<&HashMap<String, String>> = req.expression_attribute_names();

                req.update_expression() == Some("SET #f0 = :v0, #f1 = :v1")
                    && req.condition_expression() == Some("attribute_exists(#pk)")
                    && names.and_then(|names| names.get("#f0")).map(String::as_str)
                        == Some("name")
                    && names.and_then(|names| names.get("#f1")).map(String::as_str)
                        == Some("updatedAt")
                    && names.and_then(|names| names.get("#pk")).map(String::as_str) == Some("id")
                    && req.return_values() == Some(&ReturnValue::AllNew)
            })
            .then_output(|| {
                UpdateItemOutput::builder()
                    .set_attributes(Some(dynamo_item(
                        json!({"id": "1", "name": "b", "colour": "red", "updatedAt": "now"}),
                    )))
                    .build()
            });

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&update_rule]));
        let instruction: UpdateInstruction = UpdateInstruction::from_fields(&item(
            json!({"id": "ignored", "name": "b", "updatedAt": "now"}),
        ));

        let updated: Item = store
            .update_item(TEST_TABLE, "1", &instruction)
            .await
            .expect("update should succeed");

        assert_eq!(
            item(json!({"id": "1", "name": "b", "colour": "red", "updatedAt": "now"})),
            updated
        );
    }

    #[tokio::test]
    async fn update_item_failed_condition_is_missing_entry() {
        let update_rule: Rule = mock!(aws_sdk_dynamodb::Client::update_item).then_error(|| {
            UpdateItemError::ConditionalCheckFailedException(
                ConditionalCheckFailedException::builder()
                    .message("The conditional request failed")
                    .build(),
            )
        });

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&update_rule]));
        let instruction: UpdateInstruction =
            UpdateInstruction::from_fields(&item(json!({"name": "b"})));

        let err: StoreError = store
            .update_item(TEST_TABLE, "1", &instruction)
            .await
            .expect_err("update should fail");

        assert!(err.is_missing_entry());
    }

    #[tokio::test]
    async fn delete_item_returns_old_attributes() {
        let delete_rule: Rule = mock!(aws_sdk_dynamodb::Client::delete_item)
            .match_requests(|req| req.return_values() == Some(&ReturnValue::AllOld))
            .then_output(|| {
                DeleteItemOutput::builder()
                    .set_attributes(Some(dynamo_item(json!({"id": "1", "name": "a"}))))
                    .build()
            });

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&delete_rule]));

        let deleted: Option<Item> = store
            .delete_item(TEST_TABLE, "1")
            .await
            .expect("delete should succeed");

        assert_eq!(Some(item(json!({"id": "1", "name": "a"}))), deleted);
    }

    #[tokio::test]
    async fn scan_follows_every_page() {
        let first_page: Rule = mock!(aws_sdk_dynamodb::Client::scan)
            .match_requests(|req| req.exclusive_start_key().is_none())
            .then_output(|| {
                ScanOutput::builder()
                    .set_items(Some(vec![dynamo_item(json!({"id": "1"}))]))
                    .set_last_evaluated_key(Some(dynamo_item(json!({"id": "1"}))))
                    .build()
            });
        let last_page: Rule = mock!(aws_sdk_dynamodb::Client::scan)
            .match_requests(|req| req.exclusive_start_key().is_some())
            .then_output(|| {
                ScanOutput::builder()
                    .set_items(Some(vec![dynamo_item(json!({"id": "2"}))]))
                    .build()
            });

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&first_page, &last_page]));

        let items: Vec<Item> = store.scan_items(TEST_TABLE).await.expect("scan should succeed");

        assert_eq!(vec![item(json!({"id": "1"})), item(json!({"id": "2"}))], items);
    }

    #[tokio::test]
    async fn scan_of_empty_table_is_empty() {
        let scan_rule: Rule = mock!(aws_sdk_dynamodb::Client::scan)
            .then_output(|| ScanOutput::builder().set_items(Some(Vec::new())).build());

        let store: DynamoDbItemStore =
            DynamoDbItemStore::new(mock_client!(aws_sdk_dynamodb, [&scan_rule]))
                .with_consistent_read(false);

        let items: Vec<Item> = store.scan_items(TEST_TABLE).await.expect("scan should succeed");

        assert!(items.is_empty());
    }
}
