use crate::error::HandlerError;
use async_trait::async_trait;
use lambda_runtime::tracing::{Instrument, Span};
use lambda_runtime::{LambdaEvent, service_fn, tracing};
use model::Error;
use model::response::{HandlerResponse, INTERNAL_SERVER_ERROR};
use serde_json::Value;

pub mod create;
pub mod delete;
pub mod error;
mod fields;
pub mod read;
pub mod update;

/// A request handler translating one kind of request into a storage operation.
///
/// Handlers are stateless across invocations; anything shared, such as the
/// storage client, is injected when the handler is built.
#[async_trait]
pub trait ItemHandler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn handle(&self, event: Value) -> Result<HandlerResponse, HandlerError>;
}

/// Handle a request envelope, shaping any failure into an error response.
pub async fn respond<H: ItemHandler + ?Sized>(handler: &H, event: Value) -> HandlerResponse {
    match handler.handle(event).await {
        Ok(response) => {
            tracing::info!(status_code = response.status_code, "Handled request");

            response
        }
        Err(err) => {
            let status_code: u16 = err.status_code();

            if status_code >= INTERNAL_SERVER_ERROR {
                tracing::error!(status_code, "Failed to handle request: {err}");
            } else {
                tracing::warn!(status_code, "Rejected request: {err}");
            }

            err.into()
        }
    }
}

/// Handler function for use with `lambda_runtime::run()`.
///
/// Never fails: every error is returned to the caller as a response envelope.
pub async fn handle_event<H: ItemHandler + ?Sized>(
    handler: &H,
    event: LambdaEvent<Value>,
) -> Result<HandlerResponse, Error> {
    let request_id: &str = event.context.request_id.as_str();
    let handler_span: Span = tracing::span!(
        tracing::Level::INFO,
        "Item Handler",
        handler = handler.name(),
        request_id
    );

    Ok(respond(handler, event.payload).instrument(handler_span).await)
}

/// Run a handler on the Lambda runtime until the process is shut down.
///
/// ```no_compile
/// use handlers::read::ReadHandler;
/// use store_dynamodb::DynamoDbItemStore;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     tracing::init_default_subscriber();
///
///     let store = Arc::new(DynamoDbItemStore::from_env().await?);
///
///     handlers::run(ReadHandler::new(store)).await
/// }
/// ```
pub async fn run<H: ItemHandler>(handler: H) -> Result<(), Error> {
    tracing::info!(handler = handler.name(), "Starting item handler");

    lambda_runtime::run(service_fn(|event: LambdaEvent<Value>| {
        handle_event(&handler, event)
    }))
    .await
}
