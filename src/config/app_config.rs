use crate::config::parameter;
use crate::error::config_error::ConfigError;

/// HTTP server settings
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub cors_origin: String,
    pub max_upload_size_mb: usize,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub name: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_seconds: u64,
}

/// Secrets and lifetimes for the two token kinds
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_secret: String,
    pub refresh_ttl_days: i64,
}

/// One year of access-token lifetime
pub const MAX_ACCESS_TTL_MINUTES: i64 = 525_600;
pub const MAX_REFRESH_TTL_DAYS: i64 = 3_650;

impl TokenConfig {
    /// Lifetimes must be positive and small enough for expiry and cookie
    /// arithmetic to stay in range.
    pub fn check_ttls(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ACCESS_TTL_MINUTES).contains(&self.access_ttl_minutes) {
            return Err(ConfigError::Invalid("ACCESS_TOKEN_TTL_IN_MINUTES".to_string()));
        }
        if !(1..=MAX_REFRESH_TTL_DAYS).contains(&self.refresh_ttl_days) {
            return Err(ConfigError::Invalid("REFRESH_TOKEN_TTL_IN_DAYS".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct CookieConfig {
    pub secure: bool,
    pub access_max_age_seconds: i64,
    pub refresh_max_age_seconds: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaBackend {
    Cloudinary,
    Memory,
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: Option<String>,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("folder", &self.folder)
            .finish()
    }
}

#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub backend: MediaBackend,
    pub cloudinary: Option<CloudinaryConfig>,
}

/// Application configuration, built once at startup and handed to the
/// services that need it.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub token: TokenConfig,
    pub cookie: CookieConfig,
    pub media: MediaConfig,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_parameters() -> Result<Self, ConfigError> {
        let server = ServerConfig {
            address: parameter::get_optional("SERVER_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parameter::get_u64("SERVER_PORT")
                .and_then(|port| u16::try_from(port).ok())
                .ok_or_else(|| ConfigError::Invalid("SERVER_PORT".to_string()))?,
            cors_origin: parameter::get_optional("CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
            max_upload_size_mb: parameter::get_u64("MAX_UPLOAD_SIZE_MB").unwrap_or(10) as usize,
        };

        let database = DatabaseConfig {
            url: required("DATABASE_URL")?,
            name: parameter::get_optional("DB_NAME"),
            max_connections: parameter::get_u64("DB_MAX_CONNECTIONS").unwrap_or(20) as u32,
            min_connections: parameter::get_u64("DB_MIN_CONNECTIONS").unwrap_or(2) as u32,
            acquire_timeout_seconds: parameter::get_u64("DB_ACQUIRE_TIMEOUT_SECONDS").unwrap_or(30),
        };

        let token = TokenConfig {
            access_secret: required("ACCESS_TOKEN_SECRET")?,
            access_ttl_minutes: parameter::get_i64("ACCESS_TOKEN_TTL_IN_MINUTES").unwrap_or(15),
            refresh_secret: required("REFRESH_TOKEN_SECRET")?,
            refresh_ttl_days: parameter::get_i64("REFRESH_TOKEN_TTL_IN_DAYS").unwrap_or(10),
        };
        token.check_ttls()?;

        let cookie = CookieConfig::for_tokens(&token, parameter::get_bool("COOKIE_SECURE").unwrap_or(true));

        let backend = match parameter::get_optional("MEDIA_STORE")
            .unwrap_or_else(|| "cloudinary".to_string())
            .to_lowercase()
            .as_str()
        {
            "cloudinary" => MediaBackend::Cloudinary,
            "memory" => MediaBackend::Memory,
            _ => return Err(ConfigError::Invalid("MEDIA_STORE".to_string())),
        };

        let cloudinary = match backend {
            MediaBackend::Cloudinary => Some(CloudinaryConfig {
                cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
                api_key: required("CLOUDINARY_API_KEY")?,
                api_secret: required("CLOUDINARY_API_SECRET")?,
                folder: parameter::get_optional("CLOUDINARY_FOLDER"),
            }),
            MediaBackend::Memory => None,
        };

        let bcrypt_cost = parameter::get_u64("BCRYPT_COST").unwrap_or(12) as u32;

        Ok(Self {
            server,
            database,
            token,
            cookie,
            media: MediaConfig { backend, cloudinary },
            bcrypt_cost,
        })
    }
}

impl CookieConfig {
    /// Cookie lifetimes follow the token lifetimes
    pub fn for_tokens(token: &TokenConfig, secure: bool) -> Self {
        Self {
            secure,
            access_max_age_seconds: token.access_ttl_minutes.saturating_mul(60),
            refresh_max_age_seconds: token.refresh_ttl_days.saturating_mul(24 * 60 * 60),
        }
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    parameter::get_optional(key).ok_or_else(|| ConfigError::Missing(key.to_string()))
}
