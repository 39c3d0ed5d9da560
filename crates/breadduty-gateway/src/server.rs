//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use breadduty_core::config::GatewayConfig;
use breadduty_mailer::Outbox;
use breadduty_store::Store;

/// Shared state for the gateway server.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub outbox: Outbox,
    pub start_time: std::time::Instant,
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(super::routes::health_check))
        // User directory
        .route("/users/", get(super::routes::list_users))
        .route("/users/", post(super::routes::create_user))
        .route("/users/duty-days", get(super::routes::list_duty_days))
        .route("/users/{id}", get(super::routes::get_user))
        .route("/users/{id}", put(super::routes::update_user))
        .route("/users/{id}", delete(super::routes::delete_user))
        // Duty roster
        .route("/dates/", get(super::routes::list_dates))
        .route("/dates/", post(super::routes::create_date))
        .route("/dates/", delete(super::routes::delete_all_dates))
        .route("/dates/generate", post(super::routes::generate_roster))
        .route("/dates/{id}", get(super::routes::get_date))
        .route("/dates/{id}", delete(super::routes::delete_date))
        .route("/dates/{id}/notified", put(super::routes::mark_date_notified))
        // Mail triggers
        .route("/mails/send-reminders", post(super::routes::send_reminders))
        .route("/mails/broadcast", post(super::routes::broadcast))
        .layer({
            let cors = CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any)
                .max_age(std::time::Duration::from_secs(3600));

            // Restrict CORS origins in production via env var
            // Example: BREADDUTY_CORS_ORIGINS=https://intranet.office.example
            if let Ok(origins_str) = std::env::var("BREADDUTY_CORS_ORIGINS") {
                let origins: Vec<_> = origins_str
                    .split(',')
                    .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
                    .collect();
                cors.allow_origin(origins)
            } else {
                cors.allow_origin(Any)
            }
        })
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Start the HTTP server.
pub async fn start(config: &GatewayConfig, store: Arc<Store>, outbox: Outbox) -> anyhow::Result<()> {
    let state = AppState {
        store,
        outbox,
        start_time: std::time::Instant::now(),
    };

    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Gateway server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
