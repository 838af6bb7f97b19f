use std::collections::HashMap;
use std::sync::OnceLock;
use tracing::{error, info, warn};

static CONFIG: OnceLock<HashMap<String, String>> = OnceLock::new();

/// Default configuration values
const DEFAULTS: &[(&str, &str)] = &[
    ("SERVER_ADDRESS", "127.0.0.1"),
    ("SERVER_PORT", "8000"),
    ("CORS_ORIGIN", "*"),
    ("MAX_UPLOAD_SIZE_MB", "10"),
    ("DB_MAX_CONNECTIONS", "20"),
    ("DB_MIN_CONNECTIONS", "2"),
    ("DB_ACQUIRE_TIMEOUT_SECONDS", "30"),
    ("ACCESS_TOKEN_TTL_IN_MINUTES", "15"),
    ("REFRESH_TOKEN_TTL_IN_DAYS", "10"),
    ("COOKIE_SECURE", "true"),
    ("BCRYPT_COST", "12"),
    ("MEDIA_STORE", "cloudinary"),
    ("ENV", "development"),
    ("LOG_LEVEL", "info"),
];

/// Keys without a default; present only when set in the environment
const REQUIRED_OR_SECRET: &[&str] = &[
    "DATABASE_URL",
    "DB_NAME",
    "ACCESS_TOKEN_SECRET",
    "REFRESH_TOKEN_SECRET",
    "CLOUDINARY_CLOUD_NAME",
    "CLOUDINARY_API_KEY",
    "CLOUDINARY_API_SECRET",
    "CLOUDINARY_FOLDER",
];

pub fn init() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment file: {:?}", path),
        Err(_) => warn!("No .env file found, using system environment variables"),
    }

    let config = load(|key| std::env::var(key).ok());

    if CONFIG.set(config).is_err() {
        error!("Configuration already initialized");
    } else {
        info!("Configuration initialized successfully");
    }
}

/// Build the parameter map from defaults overridden by `lookup`.
fn load(lookup: impl Fn(&str) -> Option<String>) -> HashMap<String, String> {
    let mut config = HashMap::new();

    for (key, value) in DEFAULTS {
        config.insert(key.to_string(), value.to_string());
    }

    let keys = DEFAULTS.iter().map(|(key, _)| *key).chain(REQUIRED_OR_SECRET.iter().copied());
    for key in keys {
        if let Some(value) = lookup(key) {
            config.insert(key.to_string(), value);
        }
    }

    config
}

pub fn get_optional(parameter: &str) -> Option<String> {
    CONFIG
        .get()
        .and_then(|config| config.get(parameter))
        .cloned()
        .filter(|value| !value.trim().is_empty())
}

pub fn get_i64(parameter: &str) -> Option<i64> {
    let value = get_optional(parameter)?;
    match value.trim().parse::<i64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            error!("Configuration parameter '{}' is not a valid i64: {}", parameter, value);
            None
        }
    }
}

pub fn get_u64(parameter: &str) -> Option<u64> {
    let value = get_optional(parameter)?;
    match value.trim().parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            error!("Configuration parameter '{}' is not a valid u64: {}", parameter, value);
            None
        }
    }
}

pub fn get_bool(parameter: &str) -> Option<bool> {
    get_optional(parameter).map(|value| parse_bool(&value))
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

/// Number of loaded parameters (for health reporting)
pub fn count() -> usize {
    CONFIG.get().map(|config| config.len()).unwrap_or_default()
}
