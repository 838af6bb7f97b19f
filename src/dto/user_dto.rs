use crate::entity::channel::{ChannelProfile, WatchHistoryRow};
use crate::entity::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Both identifiers are optional at the JSON level; the login flow itself
/// decides what to do when one is missing.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct UserLoginDto {
    pub username: Option<String>,
    pub email: Option<String>,
    #[validate(length(
        min = 1,
        message = "Password is required"
    ))]
    pub password: String,
}

/// Text fields of the registration form
#[derive(Clone, Default)]
pub struct UserRegisterDto {
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct UpdateAccountDto {
    #[validate(length(
        min = 1,
        message = "Full name is required"
    ))]
    pub fullname: String,
    #[validate(
        email(message = "Email format is invalid"),
        length(max = 254, message = "Email must not exceed 254 characters")
    )]
    pub email: String,
    #[validate(length(
        min = 1,
        message = "Username is required"
    ))]
    pub username: String,
}

#[derive(Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordDto {
    #[validate(length(
        min = 1,
        message = "Old password is required"
    ))]
    pub old_password: String,
    #[validate(length(
        min = 1,
        max = 128,
        message = "New password must be between 1 and 128 characters"
    ))]
    pub new_password: String,
}

/// User record as it leaves the service: no password, no refresh token
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserReadDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserReadDto {
    fn from(model: User) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            fullname: model.fullname,
            avatar: model.avatar,
            cover_image: model.cover_image,
            watch_history: model.watch_history,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseDto {
    pub user: UserReadDto,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfileDto {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub subscribers_count: i64,
    pub channels_subscribed_to_count: i64,
    pub is_subscribed: bool,
}

impl From<ChannelProfile> for ChannelProfileDto {
    fn from(profile: ChannelProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            fullname: profile.fullname,
            email: profile.email,
            avatar: profile.avatar,
            cover_image: profile.cover_image,
            subscribers_count: profile.subscribers_count,
            channels_subscribed_to_count: profile.channels_subscribed_to_count,
            is_subscribed: profile.is_subscribed,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoOwnerDto {
    pub id: Uuid,
    pub username: String,
    pub fullname: String,
    pub avatar: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchHistoryItemDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail: String,
    pub video_file: String,
    pub duration: f64,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub owner: VideoOwnerDto,
}

impl From<WatchHistoryRow> for WatchHistoryItemDto {
    fn from(row: WatchHistoryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            thumbnail: row.thumbnail,
            video_file: row.video_file,
            duration: row.duration,
            views: row.views,
            created_at: row.created_at,
            owner: VideoOwnerDto {
                id: row.owner_id,
                username: row.owner_username,
                fullname: row.owner_fullname,
                avatar: row.owner_avatar,
            },
        }
    }
}

impl std::fmt::Debug for UserLoginDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLogin")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}

impl std::fmt::Debug for UserRegisterDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRegister")
            .field("fullname", &self.fullname)
            .field("username", &self.username)
            .field("email", &self.email)
            .finish()
    }
}
