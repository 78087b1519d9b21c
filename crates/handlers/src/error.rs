use model::request::RequestError;
use model::response::{BAD_REQUEST, HandlerResponse, INTERNAL_SERVER_ERROR, NOT_FOUND};
use std::fmt::{Display, Formatter};
use store::{StoreError, StoreErrorReason};

/// Every way a request can fail. Each maps to one status code and message.
#[derive(Debug)]
pub enum HandlerError {
    // A required field was missing or empty
    Validation(String),
    // The request addressed an item which does not exist
    NotFound,
    // The process is missing configuration it needs to serve the request
    Configuration(String),
    // The storage backend reported a failure
    Backend(StoreError),
    // Anything else, such as a malformed request body
    Unclassified(String),
}

impl HandlerError {
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::Validation(_) => BAD_REQUEST,
            HandlerError::NotFound => NOT_FOUND,
            HandlerError::Configuration(_)
            | HandlerError::Backend(_)
            | HandlerError::Unclassified(_) => INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for HandlerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            HandlerError::Validation(message) | HandlerError::Configuration(message) => {
                f.write_str(message)
            }
            HandlerError::NotFound => f.write_str("Item not found"),
            HandlerError::Backend(err) => write!(f, "Storage error: {err}"),
            HandlerError::Unclassified(message) => write!(f, "Internal server error: {message}"),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HandlerError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        match err.reason {
            StoreErrorReason::MissingEntry => HandlerError::NotFound,
            StoreErrorReason::BadItem(_) => HandlerError::Unclassified(err.to_string()),
            StoreErrorReason::BackendFailure(_) => HandlerError::Backend(err),
        }
    }
}

impl From<RequestError> for HandlerError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::MissingBody => HandlerError::Validation(err.to_string()),
            _ => HandlerError::Unclassified(err.to_string()),
        }
    }
}

impl From<HandlerError> for HandlerResponse {
    fn from(err: HandlerError) -> Self {
        HandlerResponse::error(err.status_code(), &err.to_string())
    }
}
