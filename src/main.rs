use std::sync::Arc;

use mako::{
    auth::jwt::JwtKeys,
    create_db_pool, create_router, init_tracing,
    remote::{GraphClient, OpenAiClient},
    shutdown_telemetry, AppState, Config,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    init_tracing(&config);

    info!(
        service = "mako",
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "Starting server"
    );

    let issues = config.validate_for_production();
    if !issues.is_empty() {
        for issue in &issues {
            warn!(issue = %issue, "Configuration warning");
        }
    }

    info!(
        database_url = %config.database.url.split('@').next_back().unwrap_or("***"),
        max_connections = config.database.max_connections,
        "Connecting to database"
    );

    let db_pool = create_db_pool(&config);

    info!("Database connection pool created");

    let jwt_keys = JwtKeys::from_env(
        config.jwt.access_token_expiry_secs,
        config.jwt.issuer.clone(),
        config.jwt.audience.clone(),
    );

    let openai = OpenAiClient::new(&config.openai).unwrap_or_else(|e| {
        error!(error = %e, "Failed to build OpenAI client");
        std::process::exit(1);
    });
    let graph = GraphClient::new(&config.facebook).unwrap_or_else(|e| {
        error!(error = %e, "Failed to build Graph client");
        std::process::exit(1);
    });

    let state = AppState::new(
        db_pool,
        jwt_keys,
        Arc::new(openai),
        Arc::new(graph),
        config.clone(),
    );
    let app = create_router(state, &config);

    let http_addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, address = %http_addr, "Failed to bind HTTP server");
            std::process::exit(1);
        });

    info!(
        http_address = %http_addr,
        docs_url = %format!("http://{}/swagger-ui", http_addr),
        "HTTP server ready"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install CTRL+C signal handler");
            return;
        }
        info!("Shutdown signal received");
    };

    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await;

    if let Err(e) = result {
        error!(error = %e, "HTTP server error");
    }

    shutdown_telemetry();

    info!("Server shutdown complete");
}
