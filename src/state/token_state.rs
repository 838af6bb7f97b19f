use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::token_service::TokenService;
use std::sync::Arc;

/// What the authentication middleware needs to resolve a request's user
#[derive(Clone)]
pub struct TokenState {
    pub token_service: TokenService,
    pub user_repo: Arc<dyn UserRepositoryTrait>,
}

impl TokenState {
    pub fn new(token_service: TokenService, user_repo: Arc<dyn UserRepositoryTrait>) -> Self {
        Self {
            token_service,
            user_repo,
        }
    }
}
