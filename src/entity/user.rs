use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Full user row, including the password hash. Never serialized; responses
/// go through `UserReadDto`.
#[derive(Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub refresh_token_hash: Option<String>,
    pub watch_history: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .finish()
    }
}

/// Columns needed to insert a user row
#[derive(Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub password_hash: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

/// Which image reference on the user record an upload targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetSlot {
    Avatar,
    CoverImage,
}

impl AssetSlot {
    pub fn current(self, user: &User) -> Option<&str> {
        match self {
            AssetSlot::Avatar => Some(user.avatar.as_str()).filter(|url| !url.is_empty()),
            AssetSlot::CoverImage => user.cover_image.as_deref().filter(|url| !url.is_empty()),
        }
    }

    /// Multipart field name carrying the file
    pub fn field_name(self) -> &'static str {
        match self {
            AssetSlot::Avatar => "avatar",
            AssetSlot::CoverImage => "coverimage",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetSlot::Avatar => "Avatar",
            AssetSlot::CoverImage => "Cover image",
        }
    }
}
