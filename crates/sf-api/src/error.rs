//! API error handling
//!
//! Every failure leaves the API as the same JSON error document. The
//! `message` is the server's own wording, unchanged, so clients can show it
//! as is.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sf_auth::AuthError;
use sf_core::error::{FailureKind, ValidationErrors};

const ERROR_PREFIX: &str = "urn:salesflow:api:v1:errors:";

/// API error types
#[derive(Debug)]
pub enum ApiError {
    /// A refused command, classified by its failure kind
    Validation(ValidationErrors),
    Unauthorized(String),
    BadRequest(String),
    Internal(String),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    /// A single field error, as a 422
    pub fn invalid_field(field: &str, msg: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, msg);
        ApiError::Validation(errors)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(errors) => match errors.kind {
                FailureKind::Invalid | FailureKind::BusinessRule => StatusCode::UNPROCESSABLE_ENTITY,
                FailureKind::Conflict => StatusCode::CONFLICT,
                FailureKind::NotFound => StatusCode::NOT_FOUND,
                FailureKind::Forbidden => StatusCode::FORBIDDEN,
                FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn identifier(&self) -> &'static str {
        match self {
            ApiError::Validation(errors) => match errors.kind {
                FailureKind::Invalid => "PropertyConstraintViolation",
                FailureKind::BusinessRule => "BusinessRuleViolation",
                FailureKind::Conflict => "UpdateConflict",
                FailureKind::NotFound => "NotFound",
                FailureKind::Forbidden => "MissingPermission",
                FailureKind::Internal => "InternalError",
            },
            ApiError::Unauthorized(_) => "Unauthenticated",
            ApiError::BadRequest(_) => "InvalidRequestBody",
            ApiError::Internal(_) => "InternalError",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    /// `None` for errors about the request as a whole
    attribute: Option<String>,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(rename = "_type")]
    type_name: &'static str,
    error_identifier: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<ErrorDetail>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_identifier = format!("{ERROR_PREFIX}{}", self.identifier());

        let (message, details) = match self {
            ApiError::Validation(errors) => {
                let message = errors
                    .first_message()
                    .unwrap_or_else(|| "The request was refused".to_string());
                let mut details: Vec<ErrorDetail> = errors
                    .base_errors
                    .iter()
                    .map(|msg| ErrorDetail {
                        attribute: None,
                        message: msg.clone(),
                    })
                    .collect();
                for (field, messages) in &errors.errors {
                    details.extend(messages.iter().map(|msg| ErrorDetail {
                        attribute: Some(field.clone()),
                        message: format!("{field} {msg}"),
                    }));
                }
                (message, details)
            }
            ApiError::Unauthorized(msg) | ApiError::BadRequest(msg) | ApiError::Internal(msg) => {
                (msg, Vec::new())
            }
        };

        let body = ErrorBody {
            type_name: "Error",
            error_identifier,
            message,
            details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Internal(reason) => {
                tracing::error!(%reason, "authentication failed internally");
                ApiError::internal("Authentication is unavailable")
            }
            other => ApiError::unauthorized(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_kind_maps_to_status() {
        let cases = [
            (FailureKind::Invalid, StatusCode::UNPROCESSABLE_ENTITY, "PropertyConstraintViolation"),
            (FailureKind::BusinessRule, StatusCode::UNPROCESSABLE_ENTITY, "BusinessRuleViolation"),
            (FailureKind::Conflict, StatusCode::CONFLICT, "UpdateConflict"),
            (FailureKind::NotFound, StatusCode::NOT_FOUND, "NotFound"),
            (FailureKind::Forbidden, StatusCode::FORBIDDEN, "MissingPermission"),
            (FailureKind::Internal, StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        ];
        for (kind, status, identifier) in cases {
            let (actual, body) = body_json(ValidationErrors::of_kind(kind, "refused").into()).await;
            assert_eq!(actual, status);
            assert_eq!(body["errorIdentifier"], format!("{ERROR_PREFIX}{identifier}"));
            assert_eq!(body["message"], "refused");
        }
    }

    #[tokio::test]
    async fn test_message_is_verbatim() {
        let mut errors = ValidationErrors::new();
        errors.reject("Requested discount of 30% exceeds the maximum allowed 20%");
        let (_, body) = body_json(errors.into()).await;
        assert_eq!(
            body["message"],
            "Requested discount of 30% exceeds the maximum allowed 20%"
        );
        assert_eq!(body["_type"], "Error");
    }

    #[tokio::test]
    async fn test_field_details() {
        let (status, body) = body_json(ApiError::invalid_field("reason", "can't be blank")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["message"], "reason can't be blank");
        assert_eq!(body["details"][0]["attribute"], "reason");
    }

    #[tokio::test]
    async fn test_auth_errors_are_401() {
        let (status, body) = body_json(AuthError::TokenExpired.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errorIdentifier"], format!("{ERROR_PREFIX}Unauthenticated"));
        assert!(body.get("details").is_none());
    }
}
