use crate::error::db_error::DbError;
use crate::error::media_error::MediaError;
use crate::error::request_error::RequestError;
use crate::error::token_error::TokenError;
use crate::error::user_error::UserError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Media(#[from] MediaError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Token(error) => error.status_code(),
            ApiError::User(error) => error.status_code(),
            ApiError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Media(error) => error.status_code(),
            ApiError::Request(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Token(error) => error.into_response(),
            ApiError::User(error) => error.into_response(),
            ApiError::Db(error) => error.into_response(),
            ApiError::Media(error) => error.into_response(),
            ApiError::Request(error) => error.into_response(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(error: sqlx::Error) -> Self {
        ApiError::Db(DbError::Sqlx(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_error_taxonomy() {
        assert_eq!(ApiError::from(UserError::MissingFields).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::from(UserError::UserAlreadyExists).status_code(), StatusCode::CONFLICT);
        assert_eq!(ApiError::from(UserError::UserNotFound).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(UserError::InvalidPassword).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::from(TokenError::RefreshTokenMismatch).status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::from(MediaError::UploadFailed("avatar".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(MediaError::DeletionFailed("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(DbError::Persistence("x".to_string())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_into_response_uses_status() {
        let response = ApiError::from(UserError::UserAlreadyExists).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
