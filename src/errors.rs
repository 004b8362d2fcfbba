use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rust_decimal::Decimal;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Standard error payload returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Additional error details (e.g., the per-component shortfall list)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// One component the requested build could not be satisfied for.
///
/// Stock validation reports every failing component at once so the caller
/// can surface the complete picture instead of fixing shortages one by one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComponentShortage {
    pub component_item_id: Uuid,
    pub component_name: String,
    pub required: Decimal,
    pub available: Decimal,
    pub shortage: Decimal,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Stock validation failed. Carries the full shortfall list, not just
    /// the first failing component.
    #[error("Insufficient stock for {} component(s)", shortages.len())]
    InsufficientStock { shortages: Vec<ComponentShortage> },

    /// Lot availability disagreed with the requested consumption. The lot
    /// records reconcile against the stock ledger independently, so this is
    /// reported separately from `InsufficientStock`.
    #[error("Insufficient lot quantity: {0}")]
    InsufficientLots(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

pub trait IntoDbErr {
    fn into_db_err(self) -> DbErr;
}

impl IntoDbErr for DbErr {
    fn into_db_err(self) -> DbErr {
        self
    }
}

impl IntoDbErr for String {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self)
    }
}

impl IntoDbErr for &str {
    fn into_db_err(self) -> DbErr {
        DbErr::Custom(self.to_string())
    }
}

impl ServiceError {
    /// Generic constructor that normalizes any supported database error input.
    pub fn db_error<E: IntoDbErr>(error: E) -> Self {
        ServiceError::DatabaseError(error.into_db_err())
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_)
            | Self::InvalidInput(_)
            | Self::InvalidOperation(_)
            | Self::InsufficientStock { .. }
            | Self::InsufficientLots(_) => StatusCode::BAD_REQUEST,
            Self::EventError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::EventError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Structured details attached to the HTTP payload, where the error
    /// carries more than its message.
    pub fn response_details(&self) -> Option<serde_json::Value> {
        match self {
            Self::InsufficientStock { shortages } => serde_json::to_value(shortages).ok(),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.response_details(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn insufficient_stock_maps_to_bad_request_with_details() {
        let err = ServiceError::InsufficientStock {
            shortages: vec![ComponentShortage {
                component_item_id: Uuid::new_v4(),
                component_name: "M3 screw".to_string(),
                required: dec!(6),
                available: dec!(4),
                shortage: dec!(2),
            }],
        };

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let details = err.response_details().expect("shortfall details expected");
        assert_eq!(details.as_array().map(|a| a.len()), Some(1));
    }

    #[test]
    fn database_errors_do_not_leak_messages() {
        let err = ServiceError::db_error("relation purchase_lots does not exist");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.response_message(), "Database error");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ServiceError::NotFound("BOM 42 not found".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
