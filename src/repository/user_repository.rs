use crate::config::database::{Database, DatabaseTrait};
use crate::config::logging::secure_log;
use crate::entity::channel::{ChannelProfile, WatchHistoryRow};
use crate::entity::user::{AssetSlot, NewUser, User};
use crate::error::db_error::DbError;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, username, email, fullname, password, avatar, cover_image, refresh_token_hash, watch_history, created_at, updated_at";

/// Persistence seam for user records. Every mutation is a single-row
/// statement, which is the only atomicity the services rely on.
#[async_trait]
pub trait UserRepositoryTrait: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<User>, DbError>;
    async fn find_by_username_or_email(&self, username: &str, email: &str) -> Result<Option<User>, DbError>;
    /// `exclude` skips one user id, so an account can keep its own values
    async fn username_or_email_exists(&self, username: &str, email: &str, exclude: Option<Uuid>) -> Result<bool, DbError>;
    async fn create(&self, user: NewUser) -> Result<Uuid, DbError>;
    async fn store_refresh_token(&self, id: Uuid, refresh_token_hash: &str) -> Result<(), DbError>;
    /// Swap the stored refresh token only if it still equals `expected_hash`.
    /// Returns false when another request rotated or cleared it first.
    async fn rotate_refresh_token(&self, id: Uuid, expected_hash: &str, new_hash: &str) -> Result<bool, DbError>;
    async fn clear_refresh_token(&self, id: Uuid) -> Result<(), DbError>;
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DbError>;
    async fn update_account_details(&self, id: Uuid, fullname: &str, email: &str, username: &str) -> Result<Option<User>, DbError>;
    async fn update_asset(&self, id: Uuid, slot: AssetSlot, url: &str) -> Result<Option<User>, DbError>;
    async fn find_channel_profile(&self, username: &str, viewer: Option<Uuid>) -> Result<Option<ChannelProfile>, DbError>;
    async fn find_watch_history(&self, id: Uuid) -> Result<Vec<WatchHistoryRow>, DbError>;
    async fn ping(&self) -> Result<(), DbError>;
}

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct UserRepository {
    pub(crate) db_conn: Arc<Database>,
}

impl UserRepository {
    pub fn new(db_conn: &Arc<Database>) -> Self {
        Self {
            db_conn: Arc::clone(db_conn),
        }
    }
}

fn map_write_error(context: &str, e: sqlx::Error) -> DbError {
    let unique_violation = e
        .as_database_error()
        .map(|db_error| db_error.is_unique_violation())
        .unwrap_or(false);

    if unique_violation {
        secure_log::sensitive_debug!("{}: unique constraint violated", context);
        DbError::Conflict
    } else {
        secure_log::secure_error!(context, e);
        DbError::Sqlx(e)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find(&self, id: Uuid) -> Result<Option<User>, DbError> {
        let start = std::time::Instant::now();

        match sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await {
            Ok(user) => {
                let _duration = start.elapsed();
                secure_log::sensitive_debug!("User lookup by ID completed in {:?}", _duration);
                Ok(user)
            }
            Err(e) => {
                secure_log::secure_error!("User lookup by ID failed", e);
                Err(e.into())
            }
        }
    }

    async fn find_by_username_or_email(&self, username: &str, email: &str) -> Result<Option<User>, DbError> {
        let start = std::time::Instant::now();

        match sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 OR email = $2 ORDER BY created_at LIMIT 1"
        ))
            .bind(username)
            .bind(email)
            .fetch_optional(self.db_conn.get_pool())
            .await {
            Ok(user) => {
                let _duration = start.elapsed();
                secure_log::sensitive_debug!("User lookup by username/email completed in {:?}", _duration);
                Ok(user)
            }
            Err(e) => {
                secure_log::secure_error!("User lookup by username/email failed", e);
                Err(e.into())
            }
        }
    }

    async fn username_or_email_exists(&self, username: &str, email: &str, exclude: Option<Uuid>) -> Result<bool, DbError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE (username = $1 OR email = $2) AND ($3::uuid IS NULL OR id <> $3))"
        )
            .bind(username)
            .bind(email)
            .bind(exclude)
            .fetch_one(self.db_conn.get_pool())
            .await
            .map_err(|e| {
                secure_log::secure_error!("Username/email existence check failed", e);
                DbError::Sqlx(e)
            })
    }

    async fn create(&self, user: NewUser) -> Result<Uuid, DbError> {
        let user_id = Uuid::now_v7();

        sqlx::query(
            "INSERT INTO users (id, username, email, fullname, password, avatar, cover_image) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        )
            .bind(user_id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.fullname)
            .bind(&user.password_hash)
            .bind(&user.avatar)
            .bind(&user.cover_image)
            .execute(self.db_conn.get_pool())
            .await
            .map_err(|e| map_write_error("Failed to insert user", e))?;

        Ok(user_id)
    }

    async fn store_refresh_token(&self, id: Uuid, refresh_token_hash: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET refresh_token_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(refresh_token_hash)
            .bind(id)
            .execute(self.db_conn.get_pool())
            .await
            .map_err(|e| map_write_error("Failed to store refresh token for user", e))?;

        secure_log::sensitive_debug!("Refresh token stored for user ID: {}", id);
        Ok(())
    }

    async fn rotate_refresh_token(&self, id: Uuid, expected_hash: &str, new_hash: &str) -> Result<bool, DbError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $1, updated_at = NOW() WHERE id = $2 AND refresh_token_hash = $3"
        )
            .bind(new_hash)
            .bind(id)
            .bind(expected_hash)
            .execute(self.db_conn.get_pool())
            .await
            .map_err(|e| map_write_error("Failed to rotate refresh token", e))?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET refresh_token_hash = NULL, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(self.db_conn.get_pool())
            .await
            .map_err(|e| map_write_error("Failed to invalidate refresh token for user", e))?;

        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET password = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(self.db_conn.get_pool())
            .await
            .map_err(|e| map_write_error("Failed to update password", e))?;

        Ok(())
    }

    async fn update_account_details(&self, id: Uuid, fullname: &str, email: &str, username: &str) -> Result<Option<User>, DbError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET fullname = $1, email = $2, username = $3, updated_at = NOW() WHERE id = $4 RETURNING {USER_COLUMNS}"
        ))
            .bind(fullname)
            .bind(email)
            .bind(username)
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await
            .map_err(|e| map_write_error("Failed to update account details", e))
    }

    async fn update_asset(&self, id: Uuid, slot: AssetSlot, url: &str) -> Result<Option<User>, DbError> {
        let statement = match slot {
            AssetSlot::Avatar => format!(
                "UPDATE users SET avatar = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
            ),
            AssetSlot::CoverImage => format!(
                "UPDATE users SET cover_image = $1, updated_at = NOW() WHERE id = $2 RETURNING {USER_COLUMNS}"
            ),
        };

        sqlx::query_as::<_, User>(&statement)
            .bind(url)
            .bind(id)
            .fetch_optional(self.db_conn.get_pool())
            .await
            .map_err(|e| map_write_error("Failed to update asset reference", e))
    }

    async fn find_channel_profile(&self, username: &str, viewer: Option<Uuid>) -> Result<Option<ChannelProfile>, DbError> {
        let start = std::time::Instant::now();

        let result = sqlx::query_as::<_, ChannelProfile>(
            r#"
            SELECT
                u.id, u.username, u.fullname, u.email, u.avatar, u.cover_image,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id) AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id) AS channels_subscribed_to_count,
                EXISTS(
                    SELECT 1 FROM subscriptions s WHERE s.channel_id = u.id AND s.subscriber_id = $2
                ) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#
        )
            .bind(username)
            .bind(viewer)
            .fetch_optional(self.db_conn.get_pool())
            .await;

        match result {
            Ok(profile) => {
                let _duration = start.elapsed();
                secure_log::sensitive_debug!("Channel profile query completed in {:?}", _duration);
                Ok(profile)
            }
            Err(e) => {
                secure_log::secure_error!("Channel profile query failed", e);
                Err(e.into())
            }
        }
    }

    async fn find_watch_history(&self, id: Uuid) -> Result<Vec<WatchHistoryRow>, DbError> {
        let start = std::time::Instant::now();

        let result = sqlx::query_as::<_, WatchHistoryRow>(
            r#"
            SELECT
                v.id, v.title, v.description, v.thumbnail, v.video_file, v.duration, v.views, v.created_at,
                o.id AS owner_id, o.username AS owner_username, o.fullname AS owner_fullname, o.avatar AS owner_avatar
            FROM users u
            CROSS JOIN LATERAL unnest(u.watch_history) WITH ORDINALITY AS h(video_id, position)
            JOIN videos v ON v.id = h.video_id
            JOIN users o ON o.id = v.owner_id
            WHERE u.id = $1
            ORDER BY h.position
            "#
        )
            .bind(id)
            .fetch_all(self.db_conn.get_pool())
            .await;

        match result {
            Ok(rows) => {
                let _duration = start.elapsed();
                secure_log::sensitive_debug!("Watch history query returned {} rows in {:?}", rows.len(), _duration);
                Ok(rows)
            }
            Err(e) => {
                secure_log::secure_error!("Watch history query failed", e);
                Err(e.into())
            }
        }
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query("SELECT 1")
            .execute(self.db_conn.get_pool())
            .await
            .map(|_| ())
            .map_err(DbError::Sqlx)
    }
}
