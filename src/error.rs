use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::response::ApiResponse;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Table number '{0}' already exists")]
    DuplicateLabel(String),

    #[error("Table is occupied by '{holder}'")]
    TableOccupied { holder: String },

    #[error("No open bill for this table")]
    NoOpenBill,

    #[error("Insufficient wallet balance. Required: {required}, Available: {balance}")]
    InsufficientBalance {
        required: Decimal,
        balance: Decimal,
        shortfall: Decimal,
    },

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    shortfall: Option<Decimal>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::DuplicateLabel(_) => StatusCode::CONFLICT,
            AppError::TableOccupied { .. } => StatusCode::CONFLICT,
            AppError::NoOpenBill => StatusCode::CONFLICT,
            AppError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            AppError::InvalidTransition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DbError(_) | AppError::OrmError(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let shortfall = match &self {
            AppError::InsufficientBalance { shortfall, .. } => Some(*shortfall),
            _ => None,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = ?self, "request failed");
        }

        let body = ApiResponse::failure(
            self.to_string(),
            ErrorData {
                error: self.to_string(),
                shortfall,
            },
        );

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
