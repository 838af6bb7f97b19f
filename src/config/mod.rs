pub mod app_config;
pub mod database;
pub mod logging;
pub mod parameter;
