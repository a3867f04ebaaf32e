//! Chat UI — embedded static assets served by the gateway.
//!
//! Uses `rust-embed` to bake the `ui/` directory into the binary, so the
//! gateway ships as a single file with no asset directory to deploy.

use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "ui/"]
struct UiAssets;

/// Build an axum `Router` serving the embedded chat UI.
///
/// Register this after the `/api` and `/health` routes so they take
/// priority over the catch-all.
pub fn ui_router() -> Router {
    Router::new()
        .route("/", get(|| async { asset_response("index.html") }))
        .route("/{*path}", get(asset_handler))
}

async fn asset_handler(Path(path): Path<String>) -> Response {
    asset_response(&path)
}

fn asset_response(path: &str) -> Response {
    match UiAssets::get(path) {
        Some(asset) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                asset.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, Html("<h1>404</h1>")).into_response(),
    }
}
