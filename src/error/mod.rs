pub mod api_error;
pub mod config_error;
pub mod db_error;
pub mod media_error;
pub mod request_error;
pub mod token_error;
pub mod user_error;
