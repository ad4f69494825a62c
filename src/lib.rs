//! Sentinel Site - bilingual marketing site and admin CMS backend

pub mod auth;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod logging;
pub mod mailer;
pub mod media;
pub mod newsletter;
pub mod routes;
pub mod site;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::{
    config::{Config, ConfigError},
    db::DbConfig,
    state::{AppState, SharedState, StateError},
    store::{StoreAccess, StoreSetupError},
};

/// Request body cap. Above the 5MB upload ceiling so oversized images reach
/// the upload handler and get a 400 instead of a bare 413.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreSetupError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("invalid HOST/PORT configuration: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local dev origins.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

fn api_routes() -> Router<SharedState> {
    use routes::{auth, blog, contact, messages, pages, services, upload};

    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/session", get(auth::session))
        .route(
            "/api/admin/blog-posts",
            get(blog::list_posts).post(blog::create_post),
        )
        .route(
            "/api/admin/blog-posts/{id}",
            get(blog::get_post)
                .patch(blog::update_post)
                .delete(blog::delete_post),
        )
        .route(
            "/api/admin/blog-posts/{id}/toggle-publish",
            post(blog::toggle_publish),
        )
        .route(
            "/api/admin/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/api/admin/services/{id}",
            get(services::get_service)
                .patch(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/api/admin/messages",
            get(messages::get_messages)
                .patch(messages::update_message)
                .delete(messages::delete_message),
        )
        .route("/api/admin/messages/reply", post(messages::reply_to_message))
        .route("/api/contact", post(contact::submit_contact))
        .route("/api/newsletter", post(contact::subscribe_newsletter))
        .route(
            "/api/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(BODY_LIMIT)),
        )
        .route("/api/image/{*path}", get(upload::serve_image))
        .route("/api/blog-image/{*path}", get(upload::serve_blog_image))
        .route("/api/revalidate", post(pages::revalidate))
}

/// Create and configure the application router.
pub fn create_app(state: SharedState) -> Router {
    let cors = configure_cors();
    let uploads = ServeDir::new(state.config.upload_dir.clone());

    Router::new()
        .merge(api_routes())
        .route("/", get(routes::pages::home))
        .route("/blog", get(routes::pages::blog_index))
        .route("/blog/{slug}", get(routes::pages::blog_post))
        .route("/services", get(routes::pages::services))
        .route("/rss.xml", get(routes::rss::rss_feed))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/ready", get(routes::health::health_ready))
        .nest_service("/uploads", uploads)
        .fallback(routes::pages::fallback)
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(cors)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Run the server (used by main).
pub async fn run() -> Result<(), StartupError> {
    dotenvy::dotenv().ok();

    // Guards must live for the whole process or buffered log lines are lost.
    let _log_guards = logging::init();

    let config = Config::from_env()?;
    let store = StoreAccess::connect(&config, &DbConfig::default()).await?;
    tracing::info!(mode = %store.mode(), "Store access mode");

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let state = AppState::new(config, store)?;
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
