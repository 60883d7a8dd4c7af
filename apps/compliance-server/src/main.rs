//! Compliance analytics server
//!
//! REST API behind the compliance dashboard:
//!
//! - KPI catalog and dashboard widget grids
//! - Dataset loading from uploaded files and MySQL/SQLite tables
//! - Chart series from loaded datasets
//! - PDF report generation, kept in the session for download
//!
//! All state lives in memory for the lifetime of the process.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod handlers;
mod models;
mod state;

use handlers::SharedState;
use state::AppState;

/// Command-line arguments for the compliance server
#[derive(Parser, Debug)]
#[command(name = "compliance-server")]
#[command(about = "Compliance analytics API: KPI dashboards, data sources and PDF reports")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Request body limit in megabytes (uploads are base64 inside JSON)
    #[arg(long, env = "MAX_UPLOAD_MB", default_value = "25")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Every endpoint, sharing one session
pub fn router(state: SharedState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // KPI catalog
        .route("/api/pillars", get(handlers::list_pillars))
        .route("/api/pillars/:number/cards", get(handlers::pillar_kpi_cards))
        // Dashboard
        .route("/api/dashboard", get(handlers::dashboard))
        .route("/api/dashboard/templates", get(handlers::list_templates))
        .route(
            "/api/dashboard/layouts",
            get(handlers::list_layouts).post(handlers::save_layout),
        )
        // Data sources
        .route("/api/connections/test", post(handlers::connection_test))
        .route("/api/connections/tables", post(handlers::connection_tables))
        .route("/api/connections/load", post(handlers::connection_load))
        .route("/api/datasets", get(handlers::list_datasets))
        .route("/api/datasets/upload", post(handlers::upload_datasets))
        .route("/api/datasets/:label/preview", get(handlers::preview_dataset))
        .route("/api/visualizations", post(handlers::visualize))
        // Reports
        .route(
            "/api/reports",
            get(handlers::list_reports).post(handlers::generate_report),
        )
        .route("/api/reports/management", post(handlers::generate_management_report))
        .route("/api/reports/:id", delete(handlers::delete_report))
        .route("/api/reports/:id/pdf", get(handlers::download_report))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting compliance server on {}:{}", args.host, args.port);

    let state = Arc::new(AppState::new());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(DefaultBodyLimit::max(args.max_upload_mb * 1024 * 1024)),
    );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Upload limit: {} MB", args.max_upload_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
