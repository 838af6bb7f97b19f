use crate::config::app_config::DatabaseConfig;
use crate::config::logging;
use async_trait::async_trait;
use sqlx::{Error, Pool, Postgres, pool::PoolOptions};
use tracing::info;

pub struct Database {
    pool: Pool<Postgres>,
}

#[async_trait]
pub trait DatabaseTrait {
    async fn init(config: &DatabaseConfig) -> Result<Self, Error>
        where
            Self: Sized;
    async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError>;
    fn get_pool(&self) -> &Pool<Postgres>;
}

#[async_trait]
impl DatabaseTrait for Database {
    async fn init(config: &DatabaseConfig) -> Result<Self, Error> {
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(config.acquire_timeout_seconds))
            .connect(&config.url)
            .await?;

        // Pool sizing is only worth logging while developing
        if logging::get_config().allow_detailed_errors() {
            info!(
                "Database pool configured: db={}, max={}, min={}, acquire_timeout={}s",
                config.name.as_deref().unwrap_or("default"),
                config.max_connections,
                config.min_connections,
                config.acquire_timeout_seconds
            );
        } else {
            info!("Database pool configured successfully");
        }

        Ok(Self { pool })
    }

    async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    fn get_pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}
