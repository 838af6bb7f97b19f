use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("{0}")]
    SomethingWentWrong(String),
    #[error("{0}")]
    Persistence(String),
    #[error("Duplicate value for a unique column")]
    Conflict,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let message = match self {
            DbError::Sqlx(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        ErrorResponse::send(message)
            .with_status(StatusCode::INTERNAL_SERVER_ERROR)
            .into_response()
    }
}
