use crate::entity::channel::{ChannelProfile, Subscription, Video, WatchHistoryRow};
use crate::entity::user::{AssetSlot, NewUser, User};
use crate::error::db_error::DbError;
use crate::repository::user_repository::UserRepositoryTrait;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory implementation of `UserRepositoryTrait` for tests and local runs.
/// Uniqueness is checked on insert but not across concurrent inserts.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<Uuid, User>,
    videos: DashMap<Uuid, Video>,
    subscriptions: DashMap<(Uuid, Uuid), Subscription>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new instance wrapped in Arc for sharing across threads
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn insert_video(&self, video: Video) {
        self.videos.insert(video.id, video);
    }

    pub fn subscribe(&self, subscriber_id: Uuid, channel_id: Uuid) {
        self.subscriptions.insert((subscriber_id, channel_id), Subscription {
            subscriber_id,
            channel_id,
            created_at: Utc::now(),
        });
    }

    pub fn record_watch(&self, user_id: Uuid, video_id: Uuid) {
        if let Some(mut user) = self.users.get_mut(&user_id) {
            user.watch_history.push(video_id);
        }
    }

    fn conflicts(&self, username: &str, email: &str, exclude: Option<Uuid>) -> bool {
        self.users.iter().any(|entry| {
            let user = entry.value();
            Some(user.id) != exclude && (user.username == username || user.email == email)
        })
    }

    fn update<F>(&self, id: Uuid, apply: F) -> Option<User>
    where
        F: FnOnce(&mut User),
    {
        self.users.get_mut(&id).map(|mut user| {
            apply(&mut user);
            user.updated_at = Utc::now();
            user.clone()
        })
    }
}

#[async_trait]
impl UserRepositoryTrait for InMemoryUserRepository {
    async fn find(&self, id: Uuid) -> Result<Option<User>, DbError> {
        Ok(self.users.get(&id).map(|user| user.clone()))
    }

    async fn find_by_username_or_email(&self, username: &str, email: &str) -> Result<Option<User>, DbError> {
        Ok(self
            .users
            .iter()
            .filter(|entry| entry.username == username || entry.email == email)
            .map(|entry| entry.value().clone())
            .min_by_key(|user| user.created_at))
    }

    async fn username_or_email_exists(&self, username: &str, email: &str, exclude: Option<Uuid>) -> Result<bool, DbError> {
        Ok(self.conflicts(username, email, exclude))
    }

    async fn create(&self, user: NewUser) -> Result<Uuid, DbError> {
        if self.conflicts(&user.username, &user.email, None) {
            return Err(DbError::Conflict);
        }

        let id = Uuid::now_v7();
        let now = Utc::now();
        self.users.insert(id, User {
            id,
            username: user.username,
            email: user.email,
            fullname: user.fullname,
            password: user.password_hash,
            avatar: user.avatar,
            cover_image: user.cover_image,
            refresh_token_hash: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        });

        Ok(id)
    }

    async fn store_refresh_token(&self, id: Uuid, refresh_token_hash: &str) -> Result<(), DbError> {
        self.update(id, |user| user.refresh_token_hash = Some(refresh_token_hash.to_string()));
        Ok(())
    }

    async fn rotate_refresh_token(&self, id: Uuid, expected_hash: &str, new_hash: &str) -> Result<bool, DbError> {
        // The entry guard makes compare and swap one step
        let Some(mut user) = self.users.get_mut(&id) else {
            return Ok(false);
        };

        if user.refresh_token_hash.as_deref() != Some(expected_hash) {
            return Ok(false);
        }

        user.refresh_token_hash = Some(new_hash.to_string());
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<(), DbError> {
        self.update(id, |user| user.refresh_token_hash = None);
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DbError> {
        self.update(id, |user| user.password = password_hash.to_string());
        Ok(())
    }

    async fn update_account_details(&self, id: Uuid, fullname: &str, email: &str, username: &str) -> Result<Option<User>, DbError> {
        if self.conflicts(username, email, Some(id)) {
            return Err(DbError::Conflict);
        }

        Ok(self.update(id, |user| {
            user.fullname = fullname.to_string();
            user.email = email.to_string();
            user.username = username.to_string();
        }))
    }

    async fn update_asset(&self, id: Uuid, slot: AssetSlot, url: &str) -> Result<Option<User>, DbError> {
        Ok(self.update(id, |user| match slot {
            AssetSlot::Avatar => user.avatar = url.to_string(),
            AssetSlot::CoverImage => user.cover_image = Some(url.to_string()),
        }))
    }

    async fn find_channel_profile(&self, username: &str, viewer: Option<Uuid>) -> Result<Option<ChannelProfile>, DbError> {
        let Some(channel) = self
            .users
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.value().clone())
        else {
            return Ok(None);
        };

        let subscribers_count = self
            .subscriptions
            .iter()
            .filter(|entry| entry.channel_id == channel.id)
            .count() as i64;
        let channels_subscribed_to_count = self
            .subscriptions
            .iter()
            .filter(|entry| entry.subscriber_id == channel.id)
            .count() as i64;
        let is_subscribed = viewer
            .map(|viewer_id| self.subscriptions.contains_key(&(viewer_id, channel.id)))
            .unwrap_or(false);

        Ok(Some(ChannelProfile {
            id: channel.id,
            username: channel.username,
            fullname: channel.fullname,
            email: channel.email,
            avatar: channel.avatar,
            cover_image: channel.cover_image,
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed,
        }))
    }

    async fn find_watch_history(&self, id: Uuid) -> Result<Vec<WatchHistoryRow>, DbError> {
        let history = match self.users.get(&id) {
            Some(user) => user.watch_history.clone(),
            None => return Ok(Vec::new()),
        };

        let rows = history
            .iter()
            .filter_map(|video_id| {
                let video = self.videos.get(video_id)?.clone();
                let owner = self.users.get(&video.owner_id)?.clone();
                Some(WatchHistoryRow {
                    id: video.id,
                    title: video.title,
                    description: video.description,
                    thumbnail: video.thumbnail,
                    video_file: video.video_file,
                    duration: video.duration,
                    views: video.views,
                    created_at: video.created_at,
                    owner_id: owner.id,
                    owner_username: owner.username,
                    owner_fullname: owner.fullname,
                    owner_avatar: owner.avatar,
                })
            })
            .collect();

        Ok(rows)
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}
