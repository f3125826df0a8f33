use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use storefront_engine::{CheckoutError, ReconcileError};
use thiserror::Error;

const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Requests from this address are not accepted.")]
    ForbiddenPeer,
    #[error("{0}")]
    CheckoutFailed(#[from] CheckoutError),
    /// Result callbacks are answered in plain text, since the gateway does not read JSON.
    #[error("{0}")]
    CallbackRejected(#[from] ReconcileError),
}

impl ServerError {
    /// The message shown to clients. Internal failures are logged, but their details are never sent out.
    fn public_message(&self) -> String {
        match self {
            Self::CheckoutFailed(CheckoutError::Internal(_)) |
            Self::CallbackRejected(ReconcileError::Internal(_)) |
            Self::InitializeError(_) |
            Self::IOError(_) |
            Self::ConfigurationError(_) |
            Self::Unspecified(_) => {
                error!("💻️ {self}");
                INTERNAL_ERROR_MESSAGE.to_string()
            },
            _ => self.to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::ForbiddenPeer => StatusCode::FORBIDDEN,
            Self::CheckoutFailed(e) => match e {
                CheckoutError::ValidationError(_) => StatusCode::BAD_REQUEST,
                CheckoutError::InvalidLevel { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::NoValidItems => StatusCode::BAD_REQUEST,
                CheckoutError::NotFound(_) => StatusCode::NOT_FOUND,
                CheckoutError::Unavailable(_) => StatusCode::CONFLICT,
                CheckoutError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::CallbackRejected(e) => match e {
                ReconcileError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
                ReconcileError::ValidationError(_) => StatusCode::BAD_REQUEST,
                ReconcileError::AmountMismatch { .. } => StatusCode::BAD_REQUEST,
                ReconcileError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                ReconcileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.public_message();
        match self {
            Self::CallbackRejected(_) | Self::ForbiddenPeer => {
                HttpResponse::build(self.status_code()).insert_header(ContentType::plaintext()).body(message)
            },
            _ => HttpResponse::build(self.status_code())
                .insert_header(ContentType::json())
                .body(serde_json::json!({ "error": message }).to_string()),
        }
    }
}
