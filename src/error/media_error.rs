use crate::response::app_response::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("{0} file is required")]
    MissingFile(&'static str),
    #[error("Error while uploading {0}")]
    UploadFailed(String),
    #[error("Couldn't delete file: {0}")]
    DeletionFailed(String),
    #[error("Couldn't delete file: no asset identifier in {0}")]
    InvalidAssetUrl(String),
}

impl MediaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            MediaError::MissingFile(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let message = match &self {
            MediaError::DeletionFailed(_) | MediaError::InvalidAssetUrl(_) => "Couldn't delete file".to_string(),
            other => other.to_string(),
        };

        ErrorResponse::send(message).with_status(status_code).into_response()
    }
}
