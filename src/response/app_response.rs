use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

/// Detailed validation error information
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ValidationErrorDetail {
    pub field: String,
    pub r#type: String,
    pub details: String,
}

impl ValidationErrorDetail {
    pub fn new(field: String, r#type: String, details: String) -> Self {
        Self { field, r#type, details }
    }
}

/// Standard envelope for every successful response
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct SuccessResponse<T> {
    pub status: u16,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip)]
    pub status_code: StatusCode,
}

impl<T> SuccessResponse<T> {
    /// Create a success response with default 200 OK status
    pub fn send(data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            success: true,
            message: "Success".to_string(),
            data,
            status_code: StatusCode::OK,
        }
    }

    /// Set custom status code (builder pattern)
    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status = status_code.as_u16();
        self.status_code = status_code;
        self
    }

    /// Set message (builder pattern)
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

impl<T> IntoResponse for SuccessResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Standard envelope for every error response
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ValidationErrorDetail>>,
    #[serde(skip)]
    pub status_code: StatusCode,
}

impl ErrorResponse {
    /// Create an error response with default 400 Bad Request status
    pub fn send(message: String) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST.as_u16(),
            success: false,
            message,
            errors: None,
            status_code: StatusCode::BAD_REQUEST,
        }
    }

    /// Create an error response with validation errors
    pub fn with_validation_errors(message: String, errors: Vec<ValidationErrorDetail>) -> Self {
        Self {
            errors: Some(errors),
            ..Self::send(message)
        }
    }

    /// Set custom status code (builder pattern)
    pub fn with_status(mut self, status_code: StatusCode) -> Self {
        self.status = status_code.as_u16();
        self.status_code = status_code;
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status_code, Json(self)).into_response()
    }
}
