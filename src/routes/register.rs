use crate::handler::register_handler;
use crate::state::user_state::UserState;
use axum::{routing::post, Router};

pub fn routes() -> Router<UserState> {
    Router::<UserState>::new().route("/register", post(register_handler::register))
}
