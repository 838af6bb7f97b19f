use crate::config::logging::secure_log;
use crate::entity::user::User;
use crate::error::{api_error::ApiError, token_error::TokenError};
use crate::service::cookie_service::{CookieService, ACCESS_TOKEN_COOKIE};
use crate::service::token_service::{TokenKind, TokenServiceTrait};
use crate::state::token_state::TokenState;
use axum::extract::State;
use axum::{http, http::HeaderMap, http::Request, middleware::Next, response::IntoResponse};
use tracing::info;
use uuid::Uuid;

/// Id of the caller on routes where signing in is optional
#[derive(Clone, Copy, Debug, Default)]
pub struct Viewer(pub Option<Uuid>);

/// Access token from the `accessToken` cookie, else the Bearer header
fn access_token(headers: &HeaderMap) -> Option<String> {
    CookieService::extract(headers, ACCESS_TOKEN_COOKIE).or_else(|| {
        headers
            .get(http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    })
}

async fn resolve_user(state: &TokenState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = access_token(headers).ok_or(TokenError::MissingToken)?;

    let user_id = state.token_service.verify(&token, TokenKind::Access).map_err(|e| {
        secure_log::sensitive_debug!("Access token rejected: {}", e);
        e
    })?;

    // A valid token for a user that no longer exists is still a bad token
    state.user_repo.find(user_id).await?.ok_or_else(|| {
        secure_log::secure_error!("SECURITY: Token subject not found");
        ApiError::Token(TokenError::InvalidToken)
    })
}

pub async fn auth(
    State(state): State<TokenState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let user = resolve_user(&state, req.headers()).await?;

    info!("SECURITY: Authenticated request for user ID: {}", user.id);
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Never rejects; inserts a `Viewer` that is empty unless a valid access
/// token identified the caller
pub async fn optional_auth(
    State(state): State<TokenState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> impl IntoResponse {
    let viewer = match resolve_user(&state, req.headers()).await {
        Ok(user) => Viewer(Some(user.id)),
        Err(_) => Viewer(None),
    };

    req.extensions_mut().insert(viewer);
    next.run(req).await
}
