use axum::extract::State;
use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

mod config;
mod database;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;

use config::AppConfig;
use database::connection::get_db_client;
use services::mailer::Mailer;
use services::notifier::Notifier;
use services::verification::ShapeCheckVerifier;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let app_config = AppConfig::from_env();

    create_directories(&app_config).await;

    let (client, db) = get_db_client(&app_config).await;
    let app_state = initialize_app_state(client, db, app_config);

    let app = build_router(app_state.clone());
    start_server(app, &app_state.config).await;
}

async fn create_directories(config: &AppConfig) {
    if let Err(e) = tokio::fs::create_dir_all(&config.upload_dir).await {
        tracing::warn!("Failed to create {}: {}", config.upload_dir, e);
    }
}

fn initialize_app_state(client: mongodb::Client, db: mongodb::Database, config: AppConfig) -> AppState {
    let mailer = if config.mail_configured() {
        tracing::info!("Mail API configured, notifications enabled");
        Some(Arc::new(Mailer::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        )))
    } else {
        tracing::warn!("MAIL_API_URL/MAIL_API_KEY not set, notifications will be logged and dropped");
        None
    };

    let notifier = Notifier::new(mailer, config.admin_email.clone());

    AppState::new(client, db, config, notifier, Arc::new(ShapeCheckVerifier))
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .nest("/api/auth", routes::auth::routes())
        .nest("/api/payments", routes::payments::payment_routes(app_state.clone()))
        .nest("/api/receipts", routes::payments::receipt_routes(app_state.clone()))
        .nest("/api/admin", routes::admin::admin_routes(app_state.clone()))
        .layer(cors)
        .with_state(app_state)
}

async fn start_server(app: Router, config: &AppConfig) {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], config.port)));

    tracing::info!("Server starting on {}", addr);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("Server error: {}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}

async fn root_handler() -> &'static str {
    "LoanFlow Payment API"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    use mongodb::bson::doc;

    let db_status = match state.db.run_command(doc! {"ping": 1}).await {
        Ok(_) => "connected",
        Err(_) => "disconnected",
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "mail": state.config.mail_configured(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
