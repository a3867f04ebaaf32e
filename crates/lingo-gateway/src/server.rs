//! Axum server setup.

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;

/// Start the gateway HTTP server.
///
/// When `ui_enabled` is true, the embedded chat UI is served at `/`.
/// API routes are registered first so they take priority over the UI
/// catch-all.
pub async fn start_server(state: AppState, port: u16, ui_enabled: bool) -> anyhow::Result<()> {
    let bind_addr = state
        .config
        .gateway
        .as_ref()
        .and_then(|g| g.bind.clone())
        .unwrap_or_else(|| "0.0.0.0".to_string());

    let mut app: Router = crate::routes::api_router(state);

    if ui_enabled {
        app = app.merge(lingo_web::ui_router());
        info!("Chat UI available at http://{bind_addr}:{port}/");
    }

    let app = app.layer(TraceLayer::new_for_http());

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    info!("Shutdown signal received");
}
