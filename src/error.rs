/*
 * Responsibility
 * - handler / middleware 共通の AppError 定義
 * - IntoResponse 実装: {"success": false, "error": <status>, "message": ...}
 * - 認可エラーは code/description を message オブジェクトとして残す
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::StoreError;
use crate::services::auth::AuthError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: u16,
    pub message: ErrorMessage,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Text(String),
    Auth {
        code: &'static str,
        description: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    #[error("resource not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("conflict")]
    Conflict,
    #[error("request timeout")]
    Timeout,
    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::Unprocessable(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(e) => e.status(),
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            AppError::Auth(e) => ErrorMessage::Auth {
                code: e.code(),
                description: e.description(),
            },
            AppError::Unprocessable(msg) => ErrorMessage::Text(msg.clone()),
            other => ErrorMessage::Text(other.to_string()),
        };

        let body = ErrorResponse {
            success: false,
            error: status.as_u16(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        AppError::Auth(self).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => AppError::Conflict,
            // Server-side failures; details go to the log only.
            other => {
                tracing::error!(error = ?other, "drink store failure");
                AppError::Internal
            }
        }
    }
}
