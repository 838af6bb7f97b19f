use crate::dto::media_dto::UploadFile;
use crate::response::app_response::{ErrorResponse, ValidationErrorDetail};
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{rejection::JsonRejection, FromRequest, Multipart, Request};
use axum::{Json, response::{IntoResponse, Response}, http::StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use validator::Validate;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    ValidationError(#[from] validator::ValidationErrors),
    #[error(transparent)]
    JsonRejection(#[from] JsonRejection),
    #[error(transparent)]
    MultipartRejection(#[from] MultipartRejection),
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedRequest<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedRequest<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await
            .map_err(RequestError::JsonRejection)?;
        value.validate()?;
        Ok(ValidatedRequest(value))
    }
}

/// A fully buffered multipart body: text fields and file parts by name.
/// Only the first part for each name is kept.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadFile>,
}

impl MultipartForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadFile> {
        self.files.remove(name)
    }
}

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await?;
        let mut form = MultipartForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = match field.name() {
                Some(name) => name.to_string(),
                None => continue,
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?;
                    // Browsers send an empty part when no file was picked
                    if bytes.is_empty() || form.files.contains_key(&name) {
                        continue;
                    }
                    form.files.insert(name, UploadFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                None => {
                    let text = field.text().await?;
                    form.fields.entry(name).or_insert(text);
                }
            }
        }

        Ok(form)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match self {
            RequestError::ValidationError(validation_errors) => {
                let details = convert_validation_errors_to_details(validation_errors);
                ErrorResponse::with_validation_errors(
                    "Validation failed".to_string(),
                    details
                ).with_status(StatusCode::BAD_REQUEST).into_response()
            }
            // Malformed or mistyped bodies are caller input errors, whatever axum picked
            RequestError::JsonRejection(rejection) => {
                ErrorResponse::send(rejection.body_text()).with_status(StatusCode::BAD_REQUEST).into_response()
            }
            RequestError::MultipartRejection(rejection) => {
                ErrorResponse::send(rejection.body_text()).with_status(StatusCode::BAD_REQUEST).into_response()
            }
            other => ErrorResponse::send(other.to_string()).with_status(StatusCode::BAD_REQUEST).into_response(),
        }
    }
}

fn convert_validation_errors_to_details(errors: validator::ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors.field_errors()
        .into_iter()
        .flat_map(|(field, field_errors)| {
            field_errors.iter().map(move |error| {
                let params_string_keys: HashMap<String, Value> = error.params
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect();

                let semantic_type = map_validator_code_to_semantic_type(
                    &error.code,
                    &params_string_keys
                );

                ValidationErrorDetail::new(
                    field.to_string(),
                    semantic_type,
                    error.message.clone()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string())
                )
            })
        })
        .collect();

    // HashMap iteration order is unstable; keep responses deterministic
    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

fn map_validator_code_to_semantic_type(code: &str, params: &HashMap<String, Value>) -> String {
    match code {
        "email" => "INVALID_FORMAT".to_string(),
        "length" => {
            match params.get("min").and_then(|v| v.as_i64()) {
                Some(1) if !params.contains_key("max") => "MISSING".to_string(),
                Some(_) if params.contains_key("max") => "INVALID_LENGTH".to_string(),
                Some(_) => "TOO_SHORT".to_string(),
                None => "INVALID_LENGTH".to_string(),
            }
        }
        "required" | "MISSING" => "MISSING".to_string(),
        _ => "INVALID_VALUE".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_min_one_maps_to_missing() {
        let mut params = HashMap::new();
        params.insert("min".to_string(), Value::from(1));
        assert_eq!(map_validator_code_to_semantic_type("length", &params), "MISSING");

        params.insert("max".to_string(), Value::from(30));
        assert_eq!(map_validator_code_to_semantic_type("length", &params), "INVALID_LENGTH");
    }

    #[test]
    fn test_email_maps_to_invalid_format() {
        assert_eq!(map_validator_code_to_semantic_type("email", &HashMap::new()), "INVALID_FORMAT");
        assert_eq!(map_validator_code_to_semantic_type("whatever", &HashMap::new()), "INVALID_VALUE");
    }

    #[test]
    fn test_multipart_form_take_file_removes_it() {
        let mut form = MultipartForm::default();
        form.files.insert("avatar".to_string(), UploadFile {
            file_name: "avatar.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![1, 2, 3],
        });

        assert!(form.take_file("avatar").is_some());
        assert!(form.take_file("avatar").is_none());
        assert!(form.text("fullname").is_none());
    }
}
