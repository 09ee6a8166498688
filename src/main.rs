use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use beefirst::config::AppConfig;
use beefirst::db;
use beefirst::handlers;
use beefirst::services::payments::midtrans::MidtransProvider;
use beefirst::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    if config.midtrans_server_key.is_empty() {
        tracing::warn!("MIDTRANS_SERVER_KEY not set, webhook signature checks disabled");
    }

    let payments = MidtransProvider::new(
        config.midtrans_server_key.clone(),
        config.midtrans_snap_url.clone(),
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        payments: Box::new(payments),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/site", get(handlers::booking::get_site))
        .route("/api/services", get(handlers::booking::get_services))
        .route("/api/slots", get(handlers::booking::get_slots))
        .route("/api/bookings", post(handlers::booking::create_booking))
        .route(
            "/api/bookings/:id/pay",
            post(handlers::booking::pay_booking),
        )
        .route(
            "/api/payments/result",
            post(handlers::booking::payment_result),
        )
        .route("/webhook/payment", post(handlers::webhook::payment_webhook))
        .route("/api/admin/overview", get(handlers::admin::get_overview))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id",
            delete(handlers::admin::delete_booking),
        )
        .route(
            "/api/admin/services",
            get(handlers::admin::get_services).post(handlers::admin::create_service),
        )
        .route(
            "/api/admin/services/:id",
            put(handlers::admin::update_service).delete(handlers::admin::delete_service),
        )
        .route(
            "/api/admin/settings",
            get(handlers::admin::get_settings).post(handlers::admin::update_settings),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
