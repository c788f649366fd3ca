use deploy_relay::api::router;
use deploy_relay::db::{self, AuditStore};
use deploy_relay::error::RelayError;
use deploy_relay::queue::AmqpGateway;
use deploy_relay::{AppState, RelayConfig, logging};
use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:9000";
const DEFAULT_CONFIG_PATH: &str = "relay_config.toml";

/// Load and parse the configuration file, then apply environment overrides
fn load_config(path: &str) -> Result<RelayConfig, RelayError> {
    let config_str = fs::read_to_string(path).map_err(|e| {
        RelayError::ConfigError(format!("Failed to read config file '{}': {}", path, e))
    })?;

    let mut config: RelayConfig = toml::from_str(&config_str).map_err(|e| {
        RelayError::ConfigError(format!("Failed to parse config file '{}': {}", path, e))
    })?;

    if let Ok(secret) = std::env::var("GITHUB_SECRET") {
        config.github_secret = secret;
    }
    if let Ok(url) = std::env::var("RABBITMQ_URL") {
        config.rabbitmq_url = url;
    }

    Ok(config)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    let bind_address =
        std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.to_string());
    let config_path =
        std::env::var("RELAY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let config: RelayConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let _log_guard = logging::init();

    let pool = match db::init_db(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Database error: {}", e);
            std::process::exit(1);
        }
    };
    let audit = AuditStore::new(pool);
    let queue = Arc::new(AmqpGateway::new(config.rabbitmq_url.clone()));

    let state = Arc::new(AppState {
        config,
        audit,
        queue,
    });

    let app = router(state);

    info!("Listening on {}", bind_address);
    info!("Using config at {:?}", config_path);
    let listener = tokio::net::TcpListener::bind(bind_address).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
