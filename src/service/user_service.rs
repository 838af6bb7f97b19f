use crate::config::logging::secure_log;
use crate::dto::media_dto::UploadFile;
use crate::dto::user_dto::{ChannelProfileDto, UpdateAccountDto, UserReadDto, UserRegisterDto, WatchHistoryItemDto};
use crate::entity::user::{NewUser, User};
use crate::error::api_error::ApiError;
use crate::error::db_error::DbError;
use crate::error::media_error::MediaError;
use crate::error::user_error::UserError;
use crate::repository::user_repository::UserRepositoryTrait;
use crate::service::media_service::MediaStore;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    media_store: Arc<dyn MediaStore>,
    bcrypt_cost: u32,
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepositoryTrait>, media_store: Arc<dyn MediaStore>, bcrypt_cost: u32) -> Self {
        Self {
            user_repo,
            media_store,
            bcrypt_cost,
        }
    }

    /// Create an account from the registration form. Every check that needs
    /// no external call runs first; the record is only written once the
    /// images are stored.
    pub async fn register(
        &self,
        payload: UserRegisterDto,
        avatar: Option<UploadFile>,
        cover_image: Option<UploadFile>,
    ) -> Result<UserReadDto, ApiError> {
        if [&payload.fullname, &payload.email, &payload.username, &payload.password]
            .iter()
            .any(|field| is_blank(field))
        {
            return Err(UserError::MissingFields)?;
        }

        let avatar = avatar.ok_or(MediaError::MissingFile("Avatar"))?;

        let username = payload.username.trim().to_lowercase();
        let email = payload.email.trim().to_string();

        if self.user_repo.username_or_email_exists(&username, &email, None).await? {
            secure_log::sensitive_debug!("Registration rejected, identity taken: {} / {}", username, email);
            return Err(UserError::UserAlreadyExists)?;
        }

        let avatar = self.media_store.upload(&avatar).await?;
        // The avatar stays stored if the cover upload fails
        let cover_image = match cover_image {
            Some(file) => Some(self.media_store.upload(&file).await?),
            None => None,
        };

        let password_hash = self.hash_password(&payload.password)?;

        let user_id = self
            .user_repo
            .create(NewUser {
                username,
                email,
                fullname: payload.fullname.trim().to_string(),
                password_hash,
                avatar: avatar.url,
                cover_image: cover_image.map(|asset| asset.url),
            })
            .await
            .map_err(|e| match e {
                DbError::Conflict => ApiError::User(UserError::UserAlreadyExists),
                other => ApiError::Db(other),
            })?;

        let user = self.user_repo.find(user_id).await?.ok_or_else(|| {
            DbError::Persistence("Something went wrong while registering the user".to_string())
        })?;

        tracing::info!("User registered: {}", user.id);
        Ok(UserReadDto::from(user))
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<User, ApiError> {
        self.user_repo
            .find(id)
            .await?
            .ok_or_else(|| ApiError::User(UserError::UserNotFound))
    }

    pub fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(|e| {
            secure_log::secure_error!("Failed to hash password", e);
            ApiError::Db(DbError::SomethingWentWrong("Password hashing failed".to_string()))
        })
    }

    /// A verification error counts as a mismatch so callers cannot tell the
    /// two apart.
    pub fn verify_password(&self, user: &User, password: &str) -> bool {
        match bcrypt::verify(password, &user.password) {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("SECURITY: Invalid password attempt for user ID: {}", user.id);
                false
            }
            Err(e) => {
                secure_log::secure_error!("SECURITY: Password verification system error", e);
                false
            }
        }
    }

    pub async fn update_account_details(&self, user_id: Uuid, payload: UpdateAccountDto) -> Result<UserReadDto, ApiError> {
        if [&payload.fullname, &payload.email, &payload.username]
            .iter()
            .any(|field| is_blank(field))
        {
            return Err(UserError::MissingFields)?;
        }

        let username = payload.username.trim().to_lowercase();
        let email = payload.email.trim().to_string();

        if self
            .user_repo
            .username_or_email_exists(&username, &email, Some(user_id))
            .await?
        {
            return Err(UserError::UserAlreadyExists)?;
        }

        let user = self
            .user_repo
            .update_account_details(user_id, payload.fullname.trim(), &email, &username)
            .await
            .map_err(|e| match e {
                DbError::Conflict => ApiError::User(UserError::UserAlreadyExists),
                other => ApiError::Db(other),
            })?
            .ok_or(UserError::UserNotFound)?;

        Ok(UserReadDto::from(user))
    }

    pub async fn channel_profile(&self, username: &str, viewer: Option<Uuid>) -> Result<ChannelProfileDto, ApiError> {
        let username = username.trim().to_lowercase();
        if username.is_empty() {
            return Err(UserError::MissingField("Username"))?;
        }

        self.user_repo
            .find_channel_profile(&username, viewer)
            .await?
            .map(ChannelProfileDto::from)
            .ok_or_else(|| ApiError::User(UserError::ChannelNotFound))
    }

    pub async fn watch_history(&self, user_id: Uuid) -> Result<Vec<WatchHistoryItemDto>, ApiError> {
        let rows = self.user_repo.find_watch_history(user_id).await?;
        Ok(rows.into_iter().map(WatchHistoryItemDto::from).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::entity::channel::Video;
    use crate::repository::in_memory_user_repository::InMemoryUserRepository;
    use crate::service::media_service::InMemoryMediaStore;
    use chrono::Utc;

    pub(crate) const TEST_BCRYPT_COST: u32 = 4;

    pub(crate) fn image(name: &str) -> UploadFile {
        UploadFile {
            file_name: name.to_string(),
            content_type: Some("image/png".to_string()),
            bytes: vec![137, 80, 78, 71],
        }
    }

    pub(crate) fn registration(username: &str, email: &str) -> UserRegisterDto {
        UserRegisterDto {
            fullname: "Alice Liddell".to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password: "p@ss".to_string(),
        }
    }

    fn setup() -> (UserService, Arc<InMemoryUserRepository>, Arc<InMemoryMediaStore>) {
        let repo = InMemoryUserRepository::new_shared();
        let media = InMemoryMediaStore::new_shared();
        let service = UserService::new(repo.clone(), media.clone(), TEST_BCRYPT_COST);
        (service, repo, media)
    }

    #[tokio::test]
    async fn test_register_returns_sanitized_record() {
        let (service, _, media) = setup();

        let user = service
            .register(registration("Alice", " a@x.com "), Some(image("a.png")), None)
            .await
            .unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@x.com");
        assert!(user.avatar.starts_with("https://media.local/"));
        assert!(user.cover_image.is_none());
        assert_eq!(media.asset_count(), 1);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("refreshTokenHash").is_none());
        assert!(json.get("refreshToken").is_none());
    }

    #[tokio::test]
    async fn test_register_stores_bcrypt_hash() {
        let (service, repo, _) = setup();

        let created = service
            .register(registration("alice", "a@x.com"), Some(image("a.png")), Some(image("c.png")))
            .await
            .unwrap();
        let stored = repo.find(created.id).await.unwrap().unwrap();

        assert_ne!(stored.password, "p@ss");
        assert!(service.verify_password(&stored, "p@ss"));
        assert!(!service.verify_password(&stored, "wrong"));
        assert!(stored.cover_image.is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_blank_fields_before_upload() {
        let (service, _, media) = setup();
        let mut payload = registration("alice", "a@x.com");
        payload.fullname = "   ".to_string();

        let err = service.register(payload, Some(image("a.png")), None).await.unwrap_err();

        assert!(matches!(err, ApiError::User(UserError::MissingFields)));
        assert_eq!(media.asset_count(), 0);
    }

    #[tokio::test]
    async fn test_register_requires_avatar() {
        let (service, _, _) = setup();

        let err = service
            .register(registration("alice", "a@x.com"), None, Some(image("c.png")))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Media(MediaError::MissingFile("Avatar"))));
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_register_conflicts_on_username_or_email() {
        let (service, _, media) = setup();
        service
            .register(registration("alice", "a@x.com"), Some(image("a.png")), None)
            .await
            .unwrap();

        let same_email = service
            .register(registration("bob", "a@x.com"), Some(image("b.png")), None)
            .await
            .unwrap_err();
        let same_username = service
            .register(registration("ALICE", "other@x.com"), Some(image("b.png")), None)
            .await
            .unwrap_err();

        assert!(matches!(same_email, ApiError::User(UserError::UserAlreadyExists)));
        assert!(matches!(same_username, ApiError::User(UserError::UserAlreadyExists)));
        assert_eq!(media.asset_count(), 1);
    }

    #[tokio::test]
    async fn test_register_upload_failure_creates_nothing() {
        let (service, repo, media) = setup();
        media.set_fail_uploads(true);

        let err = service
            .register(registration("alice", "a@x.com"), Some(image("a.png")), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Media(MediaError::UploadFailed(_))));
        assert!(!repo.username_or_email_exists("alice", "a@x.com", None).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_account_details() {
        let (service, _, _) = setup();
        let alice = service
            .register(registration("alice", "a@x.com"), Some(image("a.png")), None)
            .await
            .unwrap();
        service
            .register(registration("bob", "b@x.com"), Some(image("b.png")), None)
            .await
            .unwrap();

        let keep_own = service
            .update_account_details(alice.id, UpdateAccountDto {
                fullname: "Alice L".to_string(),
                email: "a@x.com".to_string(),
                username: "Alice2".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(keep_own.username, "alice2");
        assert_eq!(keep_own.fullname, "Alice L");

        let taken = service
            .update_account_details(alice.id, UpdateAccountDto {
                fullname: "Alice L".to_string(),
                email: "b@x.com".to_string(),
                username: "alice2".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(taken, ApiError::User(UserError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn test_update_account_details_for_unknown_user() {
        let (service, _, _) = setup();

        let err = service
            .update_account_details(Uuid::now_v7(), UpdateAccountDto {
                fullname: "Ghost".to_string(),
                email: "g@x.com".to_string(),
                username: "ghost".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::User(UserError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_channel_profile_counts_and_viewer_flag() {
        let (service, repo, _) = setup();
        let alice = service
            .register(registration("alice", "a@x.com"), Some(image("a.png")), None)
            .await
            .unwrap();
        let bob = service
            .register(registration("bob", "b@x.com"), Some(image("b.png")), None)
            .await
            .unwrap();
        repo.subscribe(bob.id, alice.id);

        let as_bob = service.channel_profile(" ALICE ", Some(bob.id)).await.unwrap();
        let anonymous = service.channel_profile("alice", None).await.unwrap();

        assert_eq!(as_bob.subscribers_count, 1);
        assert_eq!(as_bob.channels_subscribed_to_count, 0);
        assert!(as_bob.is_subscribed);
        assert!(!anonymous.is_subscribed);

        assert!(matches!(
            service.channel_profile("nobody", None).await.unwrap_err(),
            ApiError::User(UserError::ChannelNotFound)
        ));
        assert!(matches!(
            service.channel_profile("  ", None).await.unwrap_err(),
            ApiError::User(UserError::MissingField(_))
        ));
    }

    #[tokio::test]
    async fn test_watch_history_keeps_order_and_owner() {
        let (service, repo, _) = setup();
        let alice = service
            .register(registration("alice", "a@x.com"), Some(image("a.png")), None)
            .await
            .unwrap();

        let mut ids = Vec::new();
        for title in ["first", "second"] {
            let video = Video {
                id: Uuid::now_v7(),
                owner_id: alice.id,
                title: title.to_string(),
                description: String::new(),
                thumbnail: "https://media.local/t.png".to_string(),
                video_file: "https://media.local/v.mp4".to_string(),
                duration: 12.5,
                views: 0,
                is_published: true,
                created_at: Utc::now(),
            };
            ids.push(video.id);
            repo.insert_video(video);
        }
        repo.record_watch(alice.id, ids[1]);
        repo.record_watch(alice.id, ids[0]);

        let history = service.watch_history(alice.id).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].title, "second");
        assert_eq!(history[1].title, "first");
        assert_eq!(history[0].owner.username, "alice");
    }
}
