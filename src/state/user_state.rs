use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::asset_service::AssetService;
use crate::service::media_service::MediaStore;
use crate::service::user_service::UserService;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserState {
    pub user_service: UserService,
    pub asset_service: AssetService,
}

impl UserState {
    pub fn new(user_repo: Arc<dyn UserRepositoryTrait>, media_store: Arc<dyn MediaStore>, user_service: UserService) -> Self {
        Self {
            user_service,
            asset_service: AssetService::new(user_repo, media_store),
        }
    }
}
