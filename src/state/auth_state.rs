use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::cookie_service::CookieService;
use crate::service::session_service::SessionService;
use crate::service::token_service::TokenService;
use crate::service::user_service::UserService;
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthState {
    pub(crate) session_service: SessionService,
    pub(crate) cookie_service: CookieService,
}

impl AuthState {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        user_service: UserService,
        token_service: TokenService,
        cookie_service: CookieService,
    ) -> Self {
        Self {
            session_service: SessionService::new(user_repo, user_service, token_service),
            cookie_service,
        }
    }
}
