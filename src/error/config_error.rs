use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required configuration parameter '{0}' is missing")]
    Missing(String),
    #[error("Configuration parameter '{0}' is invalid")]
    Invalid(String),
}
