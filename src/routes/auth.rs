use crate::handler::auth_handler;
use crate::state::auth_state::AuthState;
use axum::{routing::{patch, post}, Router};

pub fn routes() -> Router<AuthState> {
    Router::<AuthState>::new()
        .route("/login", post(auth_handler::login))
        .route("/refresh-access-token", post(auth_handler::refresh_access_token))
}

/// Routes that sit behind the authentication middleware
pub fn protected_routes() -> Router<AuthState> {
    Router::<AuthState>::new()
        .route("/logout", post(auth_handler::logout))
        .route("/change-current-password", patch(auth_handler::change_password))
}
