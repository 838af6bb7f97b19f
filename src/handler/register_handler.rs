use crate::config::logging::secure_log;
use crate::dto::user_dto::{UserReadDto, UserRegisterDto};
use crate::entity::user::AssetSlot;
use crate::error::{api_error::ApiError, request_error::MultipartForm};
use crate::response::app_response::SuccessResponse;
use crate::state::user_state::UserState;
use axum::extract::State;
use axum::http::StatusCode;

pub async fn register(
    State(state): State<UserState>,
    mut form: MultipartForm,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    let field = |name: &str| form.text(name).unwrap_or_default().to_string();
    let payload = UserRegisterDto {
        fullname: field("fullname"),
        email: field("email"),
        username: field("username"),
        password: field("password"),
    };
    secure_log::sensitive_debug!("User registration attempt for email: {}", payload.email);

    let avatar = form.take_file(AssetSlot::Avatar.field_name());
    let cover_image = form.take_file(AssetSlot::CoverImage.field_name());

    match state.user_service.register(payload, avatar, cover_image).await {
        Ok(user) => {
            secure_log::sensitive_debug!("User registration completed for email: {}", user.email);
            Ok(SuccessResponse::send(user)
                .with_status(StatusCode::CREATED)
                .with_message("User registered successfully"))
        }
        Err(e) => {
            secure_log::secure_error!("User registration failed", e);
            Err(e)
        }
    }
}
