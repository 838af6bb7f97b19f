use crate::config::logging::secure_log;
use crate::dto::user_dto::{ChannelProfileDto, UpdateAccountDto, UserReadDto, WatchHistoryItemDto};
use crate::entity::user::{AssetSlot, User};
use crate::error::{api_error::ApiError, request_error::{MultipartForm, ValidatedRequest}};
use crate::middleware::auth::Viewer;
use crate::response::app_response::SuccessResponse;
use crate::state::user_state::UserState;
use axum::extract::{Path, State};
use axum::Extension;

pub async fn current_user(
    Extension(current_user): Extension<User>,
) -> SuccessResponse<UserReadDto> {
    secure_log::sensitive_debug!("Profile accessed for email: {}", current_user.email);

    SuccessResponse::send(UserReadDto::from(current_user)).with_message("Current user fetched successfully")
}

pub async fn update_account_details(
    State(state): State<UserState>,
    Extension(current_user): Extension<User>,
    ValidatedRequest(payload): ValidatedRequest<UpdateAccountDto>,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    let user = state.user_service.update_account_details(current_user.id, payload).await?;

    Ok(SuccessResponse::send(user).with_message("Account details updated successfully"))
}

pub async fn update_avatar(
    State(state): State<UserState>,
    Extension(current_user): Extension<User>,
    mut form: MultipartForm,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    let file = form.take_file(AssetSlot::Avatar.field_name());
    let user = state.asset_service.replace_avatar(current_user.id, file).await?;

    Ok(SuccessResponse::send(user).with_message("Avatar image updated successfully"))
}

pub async fn update_cover_image(
    State(state): State<UserState>,
    Extension(current_user): Extension<User>,
    mut form: MultipartForm,
) -> Result<SuccessResponse<UserReadDto>, ApiError> {
    let file = form.take_file(AssetSlot::CoverImage.field_name());
    let user = state.asset_service.replace_cover_image(current_user.id, file).await?;

    Ok(SuccessResponse::send(user).with_message("Cover image updated successfully"))
}

pub async fn channel_profile(
    State(state): State<UserState>,
    Extension(Viewer(viewer)): Extension<Viewer>,
    Path(username): Path<String>,
) -> Result<SuccessResponse<ChannelProfileDto>, ApiError> {
    let channel = state.user_service.channel_profile(&username, viewer).await?;

    Ok(SuccessResponse::send(channel).with_message("User channel fetched successfully"))
}

pub async fn watch_history(
    State(state): State<UserState>,
    Extension(current_user): Extension<User>,
) -> Result<SuccessResponse<Vec<WatchHistoryItemDto>>, ApiError> {
    let history = state.user_service.watch_history(current_user.id).await?;

    Ok(SuccessResponse::send(history).with_message("Watch history fetched successfully"))
}
