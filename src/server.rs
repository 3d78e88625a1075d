use crate::config::AppConfig;
use crate::data::load_data;
use crate::processing::{describe, ColumnSummary};
use crate::report::render_dashboard;
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{error, info};

pub struct AppState {
    pub config: AppConfig,
}

/// Session failure surfaced to the browser as a plain 500.
pub struct SessionError(anyhow::Error);

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        error!("Session failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Dashboard failed to render: {:#}", self.0),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for SessionError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub fn router(config: AppConfig) -> Router {
    let output_dir = config
        .output
        .html
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    let state = Arc::new(AppState { config });

    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/summary", get(summary_handler))
        .nest_service("/output", ServeDir::new(output_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    // Warm the dataset cache so a bad input fails before binding.
    load_data(&config.input.data_csv)?;

    let port = config.server.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    info!("Starting server on http://{}", addr);

    let app = router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// Every page view re-runs the whole pipeline against the cached dataset.
async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, SessionError> {
    let page = tokio::task::spawn_blocking(move || render_dashboard(&state.config)).await??;
    Ok(Html(page))
}

async fn summary_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ColumnSummary>>, SessionError> {
    let summaries = tokio::task::spawn_blocking(move || {
        load_data(&state.config.input.data_csv).map(|dataset| describe(&dataset))
    })
    .await??;
    Ok(Json(summaries))
}
