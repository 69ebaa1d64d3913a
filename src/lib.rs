//! Mako - multi-tenant backend for OpenAI-style assistants with WhatsApp
//! Business onboarding.

pub mod auth;
pub mod config;
pub mod core;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod pagination;
pub mod remote;
pub mod schema;
pub mod telemetry;

use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};

use diesel::r2d2::{self, ConnectionManager};
use diesel::PgConnection;
use std::sync::Arc;
use std::time::Duration;

use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use auth::jwt::JwtKeys;
use middleware::request_id::request_id_middleware;
use remote::{GraphApi, OpenAiApi};

pub type DbPool = r2d2::Pool<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
    pub jwt_keys: Arc<JwtKeys>,
    pub openai: Arc<dyn OpenAiApi>,
    pub graph: Arc<dyn GraphApi>,
    pub config: Arc<config::Config>,
}

impl AppState {
    pub fn new(
        db_pool: DbPool,
        jwt_keys: JwtKeys,
        openai: Arc<dyn OpenAiApi>,
        graph: Arc<dyn GraphApi>,
        config: config::Config,
    ) -> Self {
        Self {
            db_pool,
            jwt_keys: Arc::new(jwt_keys),
            openai,
            graph,
            config: Arc::new(config),
        }
    }
}

pub fn create_router(state: AppState, config: &config::Config) -> Router {
    let cors = build_cors_layer(config);
    let body_limit = RequestBodyLimitLayer::new(config.server.max_body_size);

    #[allow(deprecated)]
    let timeout = TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check_simple))
        .route("/health/status", get(handlers::health::health_check))
        .route("/health/ready", get(handlers::health::ready_check))
        .route("/health/live", get(handlers::health::live_check))
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/facebook", get(handlers::auth::facebook_start))
        .route(
            "/auth/facebook/callback",
            get(handlers::auth::facebook_callback),
        )
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/client/profile", get(handlers::client::get_profile))
        .route("/client/stats", get(handlers::client::get_stats))
        .route("/assistants", post(handlers::assistants::create_assistant))
        .route("/assistants", get(handlers::assistants::list_assistants))
        .route("/assistants/{id}", get(handlers::assistants::get_assistant))
        .route(
            "/assistants/{id}",
            patch(handlers::assistants::update_assistant),
        )
        .route(
            "/assistants/{id}",
            delete(handlers::assistants::delete_assistant),
        )
        .route(
            "/assistants/{id}/files",
            post(handlers::files::upload_files),
        )
        .route("/assistants/{id}/files", get(handlers::files::list_files))
        .route(
            "/assistants/{id}/files/{file_id}",
            delete(handlers::files::delete_file),
        )
        .route("/assistants/{id}/runs", post(handlers::runs::start_run))
        .route(
            "/assistants/{id}/runs/{run_id}",
            get(handlers::runs::poll_run),
        )
        .route(
            "/assistants/{id}/runs/{run_id}/cancel",
            post(handlers::runs::cancel_run),
        )
        .route(
            "/assistants/{id}/threads/{thread_id}/messages",
            post(handlers::runs::post_thread_message),
        )
        .route("/facebook/profile", get(handlers::facebook::get_profile))
        .route(
            "/facebook/businesses",
            get(handlers::facebook::list_businesses),
        )
        .route(
            "/facebook/businesses/{business_id}/wabas",
            get(handlers::facebook::list_wabas),
        )
        .route(
            "/facebook/wabas/{waba_id}/numbers",
            get(handlers::facebook::list_waba_numbers),
        )
        .route("/whatsapp/numbers", get(handlers::whatsapp::list_numbers))
        .route(
            "/whatsapp/numbers",
            post(handlers::whatsapp::register_number),
        )
        .route(
            "/whatsapp/numbers/{id}/assistant",
            post(handlers::whatsapp::assign_assistant),
        )
        .route(
            "/whatsapp/numbers/{id}/assistant",
            delete(handlers::whatsapp::unassign_assistant),
        )
        .route(
            "/whatsapp/numbers/{id}",
            delete(handlers::whatsapp::delete_number),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_middleware,
        ))
        .with_state(state);

    let docs_routes = openapi::swagger_router();

    Router::new()
        .merge(docs_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(fallback_handler)
        .layer(axum_middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(timeout)
        .layer(body_limit)
        .layer(cors)
}

async fn fallback_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Not found", "code": "NOT_FOUND"})),
    )
}

fn build_cors_layer(config: &config::Config) -> CorsLayer {
    use axum::http::header::HeaderName;
    use axum::http::Method;
    use tower_http::cors::AllowOrigin;

    let cors = &config.cors;
    let wildcard = cors.allowed_origins.is_empty() || cors.allowed_origins.iter().any(|o| o == "*");

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    let headers: Vec<HeaderName> = cors
        .allowed_headers
        .iter()
        .filter_map(|h| h.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(cors.allow_credentials)
        .max_age(Duration::from_secs(cors.max_age_secs));

    // `Any` is incompatible with credentials; mirror the request origin
    // instead when both are asked for.
    match (wildcard, cors.allow_credentials) {
        (true, true) => layer.allow_origin(AllowOrigin::mirror_request()),
        (true, false) => layer.allow_origin(Any),
        (false, _) => {
            let origins: Vec<_> = cors
                .allowed_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            layer.allow_origin(origins)
        }
    }
}

fn build_pool(url: &str, db: &config::DatabaseConfig) -> DbPool {
    let manager = ConnectionManager::<PgConnection>::new(url);
    r2d2::Pool::builder()
        .max_size(db.max_connections)
        .min_idle(Some(db.min_connections))
        .connection_timeout(Duration::from_secs(db.connection_timeout_secs))
        .idle_timeout(Some(Duration::from_secs(db.idle_timeout_secs)))
        .build(manager)
        .expect("Failed to create database pool")
}

pub fn create_db_pool(config: &config::Config) -> DbPool {
    build_pool(&config.database.url, &config.database)
}

pub fn create_db_pool_with_url(database_url: &str) -> DbPool {
    build_pool(database_url, &config::Config::default_for_testing().database)
}

pub fn init_tracing(config: &config::Config) {
    telemetry::init_telemetry(config);
}

pub use telemetry::tracing::shutdown_telemetry;

pub use config::Config;
