use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Invalid access token")]
    InvalidToken,
    #[error("Access token has expired")]
    TokenExpired,
    #[error("Unauthorized request")]
    MissingToken,
    #[error("Token error: {0}")]
    TokenCreationError(String),
    #[error("Unauthorized request: refresh token missing")]
    MissingRefreshToken,
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
    #[error("Refresh token has expired")]
    RefreshTokenExpired,
    #[error("Invalid refresh token: user not found")]
    RefreshTokenUserNotFound,
    #[error("Refresh token is expired or used")]
    RefreshTokenMismatch,
}

impl TokenError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TokenError::TokenCreationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for TokenError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let message = match self {
            // Signing failures are internal; don't leak the cause
            TokenError::TokenCreationError(_) => "Something went wrong while generating tokens".to_string(),
            other => other.to_string(),
        };

        ErrorResponse::send(message).with_status(status_code).into_response()
    }
}
