use model::Error;
use handlers::create::{CreateHandler, CreateProfile};
use lambda_runtime::tracing;
use std::sync::Arc;
use store::ItemStore;
use store_dynamodb::DynamoDbItemStore;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    // A bad profile should stop the function before it takes any requests
    let profile: CreateProfile = CreateProfile::from_env()?;
    let store: Arc<dyn ItemStore> = Arc::new(DynamoDbItemStore::from_env().await?);

    handlers::run(CreateHandler::new(store, profile)).await
}
