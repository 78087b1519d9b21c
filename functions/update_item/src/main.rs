use model::Error;
use handlers::update::UpdateHandler;
use lambda_runtime::tracing;
use std::sync::Arc;
use store::ItemStore;
use store_dynamodb::DynamoDbItemStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let store: Arc<dyn ItemStore> = Arc::new(DynamoDbItemStore::from_env().await?);

    handlers::run(UpdateHandler::new(store)).await
}
