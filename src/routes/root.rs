use super::{auth, health, profile, register};
use crate::config::app_config::{AppConfig, ServerConfig};
use crate::error::token_error::TokenError;
use crate::middleware::auth as auth_middleware;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::cookie_service::CookieService;
use crate::service::media_service::MediaStore;
use crate::service::token_service::{TokenService, TokenServiceTrait};
use crate::service::user_service::UserService;
use crate::state::auth_state::AuthState;
use crate::state::token_state::TokenState;
use crate::state::user_state::UserState;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::{middleware, Router};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Credentialed CORS cannot use a literal `*`, so a wildcard mirrors the
/// request origin instead.
pub fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let allow_origin = if config.cors_origin.trim() == "*" {
        AllowOrigin::mirror_request()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origin
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

pub fn routes(
    user_repo: Arc<dyn UserRepositoryTrait>,
    media_store: Arc<dyn MediaStore>,
    config: &AppConfig,
) -> Result<Router, TokenError> {
    let token_service = TokenService::new(&config.token)?;
    let user_service = UserService::new(user_repo.clone(), media_store.clone(), config.bcrypt_cost);

    let auth_state = AuthState::new(
        user_repo.clone(),
        user_service.clone(),
        token_service.clone(),
        CookieService::new(config.cookie.clone()),
    );
    let user_state = UserState::new(user_repo.clone(), media_store, user_service);
    let token_state = TokenState::new(token_service, user_repo.clone());

    let require_auth = ServiceBuilder::new().layer(middleware::from_fn_with_state(
        token_state.clone(),
        auth_middleware::auth,
    ));

    let users_router = auth::routes()
        .merge(auth::protected_routes().layer(require_auth.clone()))
        .with_state(auth_state)
        .merge(register::routes().with_state(user_state.clone()))
        .merge(
            profile::routes()
                .layer(require_auth)
                .with_state(user_state.clone()),
        )
        .merge(
            profile::channel_routes()
                .layer(middleware::from_fn_with_state(token_state, auth_middleware::optional_auth))
                .with_state(user_state),
        );

    let app_router = Router::new()
        .nest("/api/v1/users", users_router)
        .merge(health::routes().with_state(user_repo))
        .layer(DefaultBodyLimit::max(config.server.max_upload_size_mb * 1024 * 1024))
        .layer(build_cors_layer(&config.server))
        .layer(TraceLayer::new_for_http());

    Ok(app_router)
}
