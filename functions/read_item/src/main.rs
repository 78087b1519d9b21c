use model::Error;
use handlers::read::ReadHandler;
use lambda_runtime::tracing;
use std::sync::Arc;
use store::ItemStore;
use store_dynamodb::DynamoDbItemStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let store: Arc<dyn ItemStore> = Arc::new(DynamoDbItemStore::from_env().await?);

    handlers::run(ReadHandler::new(store)).await
}
