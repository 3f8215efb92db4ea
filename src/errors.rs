// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("MongoDB error: {0}")]
    MongoDB(#[from] mongodb::error::Error),

    #[error("Multipart error: {0}")]
    Multipart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("No payment scheme assigned")]
    NoSchemeAssigned,

    #[error("Two-factor verification required before payment")]
    VerificationRequired,

    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Loan application not found")]
    ApplicationNotFound,

    #[error("Receipt not found")]
    ReceiptNotFound,

    #[error("Invalid ObjectId: {0}")]
    InvalidObjectId(String),

    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    #[error("Receipt file too large")]
    ReceiptTooLarge,

    #[error("Unsupported receipt file type")]
    UnsupportedReceiptType,

    #[error("Authentication error")]
    AuthError,

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Mail API error: {0}")]
    MailApi(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::MongoDB(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string()),
            AppError::Multipart(_) => (StatusCode::BAD_REQUEST, "Invalid multipart data".to_string()),
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation failed".to_string()),
            AppError::NoSchemeAssigned => (StatusCode::PRECONDITION_FAILED, "No payment scheme assigned".to_string()),
            AppError::VerificationRequired => (StatusCode::FORBIDDEN, "Verification required".to_string()),
            AppError::PaymentNotFound => (StatusCode::NOT_FOUND, "Payment not found".to_string()),
            AppError::ApplicationNotFound => (StatusCode::NOT_FOUND, "Application not found".to_string()),
            AppError::ReceiptNotFound => (StatusCode::NOT_FOUND, "Receipt not found".to_string()),
            AppError::InvalidObjectId(_) => (StatusCode::BAD_REQUEST, "Invalid ID format".to_string()),
            AppError::UnknownPaymentMethod(_) => (StatusCode::BAD_REQUEST, "Unknown payment method".to_string()),
            AppError::ReceiptTooLarge => (StatusCode::BAD_REQUEST, "Receipt file too large".to_string()),
            AppError::UnsupportedReceiptType => (StatusCode::BAD_REQUEST, "Unsupported receipt file type".to_string()),
            AppError::AuthError => (StatusCode::UNAUTHORIZED, "Authentication failed".to_string()),
            AppError::Unauthorized => (StatusCode::FORBIDDEN, "Unauthorized access".to_string()),
            AppError::MailApi(_) => (StatusCode::BAD_GATEWAY, "Mail API error".to_string()),
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
            "message": self.to_string(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }));

        (status, body).into_response()
    }
}

// Manual From implementations
impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::MailApi(format!("HTTP request failed: {}", err))
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidObjectId(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

// Helper conversion functions
impl AppError {
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        AppError::MailApi(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
