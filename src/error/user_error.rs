use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UserError {
    #[error("User does not exist")]
    UserNotFound,
    #[error("Channel does not exist")]
    ChannelNotFound,
    #[error("User with this email or username already exists")]
    UserAlreadyExists,
    #[error("Invalid user credentials")]
    InvalidPassword,
    #[error("Invalid old password")]
    InvalidOldPassword,
    #[error("All fields are required")]
    MissingFields,
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Username and email are required")]
    MissingCredentials,
}

impl UserError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            UserError::UserNotFound | UserError::ChannelNotFound => StatusCode::NOT_FOUND,
            UserError::UserAlreadyExists => StatusCode::CONFLICT,
            UserError::InvalidPassword | UserError::InvalidOldPassword => StatusCode::UNAUTHORIZED,
            UserError::MissingFields | UserError::MissingField(_) | UserError::MissingCredentials => {
                StatusCode::BAD_REQUEST
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        ErrorResponse::send(self.to_string()).with_status(status_code).into_response()
    }
}
