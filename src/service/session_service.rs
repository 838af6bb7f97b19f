use crate::config::logging::secure_log;
use crate::dto::token_dto::TokenPairDto;
use crate::dto::user_dto::{ChangePasswordDto, LoginResponseDto, UserLoginDto, UserReadDto};
use crate::error::api_error::ApiError;
use crate::error::token_error::TokenError;
use crate::error::user_error::UserError;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::token_service::{TokenKind, TokenService, TokenServiceTrait};
use crate::service::user_service::UserService;
use std::sync::Arc;
use uuid::Uuid;

/// Login, logout, refresh and password change. The stored refresh-token
/// digest is the only session state; overwriting it revokes the previous
/// refresh token.
#[derive(Clone)]
pub struct SessionService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    user_service: UserService,
    token_service: TokenService,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

impl SessionService {
    pub fn new(user_repo: Arc<dyn UserRepositoryTrait>, user_service: UserService, token_service: TokenService) -> Self {
        Self {
            user_repo,
            user_service,
            token_service,
        }
    }

    pub fn token_service(&self) -> &TokenService {
        &self.token_service
    }

    /// Both identifiers are required even though either one finds the account
    pub async fn login(&self, payload: UserLoginDto) -> Result<LoginResponseDto, ApiError> {
        let (username, email) = match (present(payload.username.as_deref()), present(payload.email.as_deref())) {
            (Some(username), Some(email)) => (username.to_lowercase(), email.to_string()),
            _ => return Err(UserError::MissingCredentials)?,
        };

        let user = self
            .user_repo
            .find_by_username_or_email(&username, &email)
            .await?
            .ok_or(UserError::UserNotFound)?;

        if !self.user_service.verify_password(&user, &payload.password) {
            return Err(UserError::InvalidPassword)?;
        }

        let tokens = self.token_service.generate_token_pair(&user)?;
        self.user_repo
            .store_refresh_token(user.id, &self.token_service.hash_refresh_token(&tokens.refresh_token))
            .await?;

        tracing::info!("SECURITY: Successful authentication for user ID: {}", user.id);
        Ok(LoginResponseDto {
            user: UserReadDto::from(user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), ApiError> {
        self.user_repo.clear_refresh_token(user_id).await?;
        tracing::info!("SECURITY: Session revoked for user ID: {}", user_id);
        Ok(())
    }

    /// Exchange a refresh token for a new pair. The presented token must
    /// still be the stored one, and the write only lands if nobody rotated
    /// it in between.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPairDto, ApiError> {
        let presented = present(presented).ok_or(TokenError::MissingRefreshToken)?;

        let user_id = self.token_service.verify(presented, TokenKind::Refresh)?;
        let user = self
            .user_repo
            .find(user_id)
            .await?
            .ok_or(TokenError::RefreshTokenUserNotFound)?;

        let presented_hash = self.token_service.hash_refresh_token(presented);
        if user.refresh_token_hash.as_deref() != Some(presented_hash.as_str()) {
            tracing::warn!("SECURITY: Stale refresh token presented for user ID: {}", user.id);
            return Err(TokenError::RefreshTokenMismatch)?;
        }

        let tokens = self.token_service.generate_token_pair(&user)?;
        let new_hash = self.token_service.hash_refresh_token(&tokens.refresh_token);

        if !self
            .user_repo
            .rotate_refresh_token(user.id, &presented_hash, &new_hash)
            .await?
        {
            tracing::warn!("SECURITY: Refresh token rotated concurrently for user ID: {}", user.id);
            return Err(TokenError::RefreshTokenMismatch)?;
        }

        secure_log::sensitive_debug!("Refresh token rotated for user ID: {}", user.id);
        Ok(tokens)
    }

    /// Outstanding refresh tokens stay valid after a password change
    pub async fn change_password(&self, user_id: Uuid, payload: ChangePasswordDto) -> Result<(), ApiError> {
        let user = self.user_service.find_by_id(user_id).await?;

        if !self.user_service.verify_password(&user, &payload.old_password) {
            return Err(UserError::InvalidOldPassword)?;
        }

        let password_hash = self.user_service.hash_password(&payload.new_password)?;
        self.user_repo.update_password(user.id, &password_hash).await?;

        tracing::info!("SECURITY: Password changed for user ID: {}", user.id);
        Ok(())
    }
}
