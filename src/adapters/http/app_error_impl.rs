use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};

use crate::app_error::{AppError, ConflictField, ErrorCode};

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(fields) => {
                tracing::debug!(fields = ?fields.as_map(), "Validation failed");
                let details = json!(fields.as_map());
                error_resp(
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorCode::ValidationError,
                    "the request contains invalid fields",
                    Some(details),
                )
            }
            AppError::BadRequest(msg) => {
                tracing::debug!(reason = %msg, "Bad request");
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::BadRequest, &msg, None)
            }
            AppError::NotFound => error_resp(
                StatusCode::NOT_FOUND,
                ErrorCode::NotFound,
                "the requested resource could not be found",
                None,
            ),
            AppError::MethodNotAllowed => error_resp(
                StatusCode::METHOD_NOT_ALLOWED,
                ErrorCode::MethodNotAllowed,
                "the method is not supported for this resource",
                None,
            ),
            AppError::InvalidToken(reason) => {
                // The reason stays in the logs; callers only learn the token was refused.
                tracing::debug!(%reason, "Token rejected");
                error_resp(
                    StatusCode::FORBIDDEN,
                    ErrorCode::InvalidToken,
                    "invalid or expired token",
                    None,
                )
            }
            AppError::Conflict(field) => {
                let message = match field {
                    ConflictField::Username => "a user with this username already exists",
                    ConflictField::Email => "a user with this email already exists",
                };
                let mut details = Map::new();
                details.insert(field.to_string(), Value::from(message));
                error_resp(
                    StatusCode::CONFLICT,
                    ErrorCode::Conflict,
                    message,
                    Some(Value::Object(details)),
                )
            }
            AppError::Database(cause) | AppError::Internal(cause) => {
                tracing::error!(error = %cause, "Request failed");
                error_resp(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InternalError,
                    "the server encountered a problem and could not process your request",
                    None,
                )
            }
        }
    }
}

fn error_resp(
    status: StatusCode,
    code: ErrorCode,
    message: &str,
    details: Option<Value>,
) -> Response {
    let mut error = json!({ "code": code.as_str(), "message": message });
    if let Some(details) = details {
        error["details"] = details;
    }
    (status, Json(json!({ "error": error }))).into_response()
}
