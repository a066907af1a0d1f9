use std::net::TcpListener;
use std::sync::Arc;

use rbac_api::configuration::get_configuration;
use rbac_api::startup::run;
use rbac_api::store::PgStore;
use rbac_api::telemetry::{init_telemetry, DEFAULT_FILTER};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry(DEFAULT_FILTER);

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    if let Err(e) = configuration.jwt.validate() {
        tracing::error!("Invalid JWT configuration: {}", e);
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Configuration error",
        ));
    }

    tracing::info!(
        host = %configuration.database.host,
        database = %configuration.database.database_name,
        "Connecting to database"
    );
    let store = PgStore::connect(&configuration.database)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "Database connection error")
        })?;

    store.migrate().await.map_err(|e| {
        tracing::error!("Failed to run migrations: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
    })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(listener, Arc::new(store.clone()), configuration.jwt.clone())?;
    let result = server.await;

    tracing::info!("Server stopped, closing database pool");
    store.close().await;

    result
}
