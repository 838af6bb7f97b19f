use crate::config::logging::secure_log;
use crate::dto::token_dto::RefreshTokenRequestDto;
use crate::dto::user_dto::{ChangePasswordDto, UserLoginDto};
use crate::entity::user::User;
use crate::error::{api_error::ApiError, request_error::{RequestError, ValidatedRequest}};
use crate::response::app_response::SuccessResponse;
use crate::service::cookie_service::{CookieService, REFRESH_TOKEN_COOKIE};
use crate::state::auth_state::AuthState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Extension;
use serde_json::json;
use tracing::info;

pub async fn login(
    State(state): State<AuthState>,
    ValidatedRequest(payload): ValidatedRequest<UserLoginDto>,
) -> Result<impl IntoResponse, ApiError> {
    secure_log::sensitive_debug!("Login attempt for username: {:?}, email: {:?}", payload.username, payload.email);

    let login = state.session_service.login(payload).await?;
    let [access_cookie, refresh_cookie] = state
        .cookie_service
        .session_cookies(&login.access_token, &login.refresh_token);

    Ok((
        AppendHeaders([(header::SET_COOKIE, access_cookie), (header::SET_COOKIE, refresh_cookie)]),
        SuccessResponse::send(login).with_message("User logged in successfully"),
    ))
}

pub async fn logout(
    State(state): State<AuthState>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, ApiError> {
    state.session_service.logout(user.id).await?;
    let [access_cookie, refresh_cookie] = state.cookie_service.cleared_cookies();

    Ok((
        AppendHeaders([(header::SET_COOKIE, access_cookie), (header::SET_COOKIE, refresh_cookie)]),
        SuccessResponse::send(json!({})).with_message("User logged out"),
    ))
}

/// The refresh token comes from the cookie, or from an optional JSON body
pub async fn refresh_access_token(
    State(state): State<AuthState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let presented = match CookieService::extract(&headers, REFRESH_TOKEN_COOKIE) {
        Some(token) => Some(token),
        None if body.iter().all(u8::is_ascii_whitespace) => None,
        None => {
            serde_json::from_slice::<RefreshTokenRequestDto>(&body)
                .map_err(|e| RequestError::InvalidBody(e.to_string()))?
                .refresh_token
        }
    };

    let tokens = state.session_service.refresh(presented.as_deref()).await?;
    let [access_cookie, refresh_cookie] = state
        .cookie_service
        .session_cookies(&tokens.access_token, &tokens.refresh_token);

    info!("Access token refreshed");
    Ok((
        AppendHeaders([(header::SET_COOKIE, access_cookie), (header::SET_COOKIE, refresh_cookie)]),
        SuccessResponse::send(tokens).with_message("Access token refreshed"),
    ))
}

pub async fn change_password(
    State(state): State<AuthState>,
    Extension(user): Extension<User>,
    ValidatedRequest(payload): ValidatedRequest<ChangePasswordDto>,
) -> Result<impl IntoResponse, ApiError> {
    state.session_service.change_password(user.id, payload).await?;

    Ok(SuccessResponse::send(json!({})).with_message("Password changed successfully"))
}
