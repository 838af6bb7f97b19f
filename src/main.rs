use std::sync::Arc;
use tracing::{error, info};
use vidhub::config::app_config::{AppConfig, MediaBackend};
use vidhub::config::database::{Database, DatabaseTrait};
use vidhub::config::{logging, parameter};
use vidhub::error::config_error::ConfigError;
use vidhub::handler::health_handler;
use vidhub::repository::user_repository::{UserRepository, UserRepositoryTrait};
use vidhub::routes;
use vidhub::service::cloudinary_service::CloudinaryMediaStore;
use vidhub::service::media_service::{InMemoryMediaStore, MediaStore};

fn media_store(config: &AppConfig) -> Result<Arc<dyn MediaStore>, ConfigError> {
    match config.media.backend {
        MediaBackend::Cloudinary => {
            let cloudinary = config
                .media
                .cloudinary
                .clone()
                .ok_or_else(|| ConfigError::Missing("CLOUDINARY_CLOUD_NAME".to_string()))?;
            info!("Media store: Cloudinary ({})", cloudinary.cloud_name);
            Ok(Arc::new(CloudinaryMediaStore::new(cloudinary)))
        }
        MediaBackend::Memory => {
            info!("Media store: in-memory, uploads are not persisted");
            Ok(InMemoryMediaStore::new_shared())
        }
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed the server keeps
/// running until killed.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal, initiating graceful shutdown...");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    parameter::init();
    logging::init_subscriber();
    info!("Starting vidhub user service...");

    let config = match AppConfig::from_parameters() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };
    info!("Configuration loaded: {} parameters", parameter::count());

    health_handler::init_start_time();

    let connection = match Database::init(&config.database).await {
        Ok(conn) => {
            info!("Database connection established successfully");
            conn
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e.into());
        }
    };

    if let Err(e) = connection.migrate().await {
        error!("Failed to apply database migrations: {}", e);
        return Err(e.into());
    }

    let user_repo: Arc<dyn UserRepositoryTrait> = Arc::new(UserRepository::new(&Arc::new(connection)));
    let media_store = media_store(&config)?;

    // Token secrets are validated here, before the socket is bound
    let app = match routes::root::routes(user_repo, media_store, &config) {
        Ok(router) => router,
        Err(e) => {
            error!("Failed to initialize routes: {}", e);
            return Err(e.into());
        }
    };

    let host = format!("{}:{}", config.server.address, config.server.port);
    let listener = match tokio::net::TcpListener::bind(&host).await {
        Ok(listener) => {
            info!("Server successfully bound to {}", host);
            listener
        }
        Err(e) => {
            error!("Failed to bind to {}: {}", host, e);
            return Err(e.into());
        }
    };

    match axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        Ok(_) => {
            info!("Server shutdown gracefully");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(e.into())
        }
    }
}
