use crate::config::ServeConfig;
use crate::db::Database;
use crate::error::Result;
use axum::{
    Router,
    routing::{get, patch},
};
use rust_embed::Embed;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod docs;
mod errors;
mod handlers;

pub use errors::AppError;

/// Shared application state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState {
            db: Arc::new(Mutex::new(db)),
        }
    }
}

/// Embedded static assets (the OpenAPI document) compiled into the binary.
#[derive(Embed)]
#[folder = "static/"]
struct StaticAssets;

/// Build the axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/tasks", get(handlers::tasks::list).post(handlers::tasks::create))
        .route("/tasks/search", get(handlers::tasks::search))
        .route(
            "/tasks/{id}",
            get(handlers::tasks::show)
                .put(handlers::tasks::update)
                .delete(handlers::tasks::delete),
        )
        .route("/tasks/{id}/status", patch(handlers::tasks::change_status))
        .route("/tasks/{id}/assign", patch(handlers::tasks::assign))
        .route("/users", get(handlers::users::list).post(handlers::users::create))
        .route(
            "/users/{id}",
            get(handlers::users::show)
                .put(handlers::users::update)
                .delete(handlers::users::delete),
        )
        .route("/users/{id}/tasks", get(handlers::users::tasks))
        .route("/docs", get(docs::page))
        .route("/docs/", get(docs::page))
        .route(docs::SPEC_ROUTE, get(docs::api_spec))
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the API server and run until Ctrl-C.
pub async fn serve(db_path: &Path, config: &ServeConfig) -> Result<()> {
    let db = Database::open_and_migrate(db_path)?;
    let app = create_router(AppState::new(db));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        db = %db_path.display(),
        "server listening"
    );
    println!("taskdesk API: http://{addr} (docs at http://{addr}/docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => {
            tracing::error!(error = %e, "cannot listen for Ctrl-C; running until killed");
            std::future::pending::<()>().await;
        }
    }
}
