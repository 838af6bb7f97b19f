use crate::config::logging::secure_log;
use crate::dto::media_dto::{DeletionOutcome, UploadFile};
use crate::dto::user_dto::UserReadDto;
use crate::entity::user::AssetSlot;
use crate::error::api_error::ApiError;
use crate::error::media_error::MediaError;
use crate::error::user_error::UserError;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::media_service::{extract_public_id, extract_resource_type, MediaStore};
use std::sync::Arc;
use uuid::Uuid;

/// Replaces avatar and cover images. The record is switched to the new URL
/// before the old asset is deleted, so it never points at a removed file.
#[derive(Clone)]
pub struct AssetService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    media_store: Arc<dyn MediaStore>,
}

impl AssetService {
    pub fn new(user_repo: Arc<dyn UserRepositoryTrait>, media_store: Arc<dyn MediaStore>) -> Self {
        Self { user_repo, media_store }
    }

    pub async fn replace_avatar(&self, user_id: Uuid, file: Option<UploadFile>) -> Result<UserReadDto, ApiError> {
        self.replace_asset(user_id, AssetSlot::Avatar, file).await
    }

    pub async fn replace_cover_image(&self, user_id: Uuid, file: Option<UploadFile>) -> Result<UserReadDto, ApiError> {
        self.replace_asset(user_id, AssetSlot::CoverImage, file).await
    }

    async fn replace_asset(&self, user_id: Uuid, slot: AssetSlot, file: Option<UploadFile>) -> Result<UserReadDto, ApiError> {
        let user = self
            .user_repo
            .find(user_id)
            .await?
            .ok_or(UserError::UserNotFound)?;
        let old_url = slot.current(&user).map(str::to_string);

        let file = file.ok_or(MediaError::MissingFile(slot.label()))?;
        let uploaded = self.media_store.upload(&file).await?;

        let updated = self
            .user_repo
            .update_asset(user_id, slot, &uploaded.url)
            .await?
            .ok_or(UserError::UserNotFound)?;
        tracing::info!("{} replaced for user ID: {}", slot.label(), user_id);

        if let Some(old_url) = old_url {
            self.delete_old_asset(&old_url).await?;
        }

        Ok(UserReadDto::from(updated))
    }

    /// Runs after the swap is committed; an error here leaves the record as is
    async fn delete_old_asset(&self, old_url: &str) -> Result<(), MediaError> {
        let Some(public_id) = extract_public_id(old_url) else {
            tracing::warn!("Old asset left in media store, no public id in URL");
            return Err(MediaError::InvalidAssetUrl(old_url.to_string()));
        };

        match self.media_store.delete(&public_id, extract_resource_type(old_url)).await {
            Ok(DeletionOutcome::Deleted) => Ok(()),
            Ok(DeletionOutcome::NotFound) => {
                secure_log::sensitive_debug!("Old asset already gone: {}", public_id);
                Ok(())
            }
            Err(e) => {
                secure_log::secure_error!("Failed to delete old asset", e);
                Err(e)
            }
        }
    }
}
