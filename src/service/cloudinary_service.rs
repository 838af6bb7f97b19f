use crate::config::app_config::CloudinaryConfig;
use crate::config::logging::secure_log;
use crate::dto::media_dto::{DeletionOutcome, ResourceType, UploadFile, UploadedAsset};
use crate::error::media_error::MediaError;
use crate::service::media_service::MediaStore;
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Cloudinary-backed media store using signed upload/destroy calls.
/// Signatures are SHA-256, so the product environment must be set to
/// accept SHA-256 API signatures.
#[derive(Clone)]
pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
    api_base: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: Option<String>,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            api_base: API_BASE.to_string(),
        }
    }

    fn endpoint(&self, resource_type: &str, action: &str) -> String {
        format!("{}/{}/{}/{}", self.api_base, self.config.cloud_name, resource_type, action)
    }

    /// Sign the parameters the way Cloudinary expects: sorted `key=value`
    /// pairs joined by `&`, secret appended, hex digest.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let to_sign = sorted
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join("&");

        hex::encode(Sha256::digest(format!("{}{}", to_sign, self.config.api_secret).as_bytes()))
    }

    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = self.sign(&params);
        params.push(("api_key", self.config.api_key.clone()));
        params.push(("signature_algorithm", "sha256".to_string()));
        params.push(("signature", signature));
        params
    }
}

fn timestamp() -> String {
    chrono::Utc::now().timestamp().to_string()
}

fn data_uri(file: &UploadFile) -> String {
    format!(
        "data:{};base64,{}",
        file.mime_type(),
        base64::engine::general_purpose::STANDARD.encode(&file.bytes)
    )
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, file: &UploadFile) -> Result<UploadedAsset, MediaError> {
        let mut params = vec![("timestamp", timestamp())];
        if let Some(folder) = &self.config.folder {
            params.push(("folder", folder.clone()));
        }

        let mut form = self.signed_form(params);
        form.push(("file", data_uri(file)));

        let response = self
            .client
            .post(self.endpoint("auto", "upload"))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                secure_log::secure_error!("Media upload request failed", e);
                MediaError::UploadFailed(file.file_name.clone())
            })?;

        if !response.status().is_success() {
            warn!("Media upload rejected with status {}", response.status());
            return Err(MediaError::UploadFailed(file.file_name.clone()));
        }

        let body: UploadResponse = response.json().await.map_err(|e| {
            secure_log::secure_error!("Media upload response unreadable", e);
            MediaError::UploadFailed(file.file_name.clone())
        })?;

        // A response without a URL counts as a failed upload
        let url = body
            .secure_url
            .or(body.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| MediaError::UploadFailed(file.file_name.clone()))?;
        let public_id = body.public_id.unwrap_or_default();

        info!("Media asset uploaded: {}", public_id);
        Ok(UploadedAsset { url, public_id })
    }

    async fn delete(&self, public_id: &str, resource_type: ResourceType) -> Result<DeletionOutcome, MediaError> {
        let form = self.signed_form(vec![
            ("public_id", public_id.to_string()),
            ("timestamp", timestamp()),
        ]);

        let response = self
            .client
            .post(self.endpoint(resource_type.as_str(), "destroy"))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                secure_log::secure_error!("Media delete request failed", e);
                MediaError::DeletionFailed(public_id.to_string())
            })?;

        if !response.status().is_success() {
            warn!("Media delete rejected with status {}", response.status());
            return Err(MediaError::DeletionFailed(public_id.to_string()));
        }

        let body: DestroyResponse = response.json().await.map_err(|e| {
            secure_log::secure_error!("Media delete response unreadable", e);
            MediaError::DeletionFailed(public_id.to_string())
        })?;

        match body.result.as_str() {
            "ok" => {
                info!("Media asset deleted: {}", public_id);
                Ok(DeletionOutcome::Deleted)
            }
            "not found" => Ok(DeletionOutcome::NotFound),
            _ => Err(MediaError::DeletionFailed(public_id.to_string())),
        }
    }
}
