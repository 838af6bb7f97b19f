use crate::handler::profile_handler;
use crate::state::user_state::UserState;
use axum::{routing::{get, patch, post}, Router};

pub fn routes() -> Router<UserState> {
    Router::<UserState>::new()
        .route("/get-current-user", get(profile_handler::current_user))
        .route("/update-account-details", post(profile_handler::update_account_details))
        .route("/update-avatar-image", patch(profile_handler::update_avatar))
        .route("/update-cover-image", patch(profile_handler::update_cover_image))
        .route("/get-user-watch-history", get(profile_handler::watch_history))
}

/// Readable by anyone; a signed-in caller also learns whether they subscribe
pub fn channel_routes() -> Router<UserState> {
    Router::<UserState>::new().route("/channel/{username}", get(profile_handler::channel_profile))
}
