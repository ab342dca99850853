use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

/// Build the HTTP router: health endpoint plus any channel webhook routers.
pub fn build_router(channel_routers: Vec<Router>) -> Router {
    let mut app = Router::new().route("/api/health", get(health));
    for router in channel_routers {
        app = app.merge(router);
    }
    app
}

/// Health check endpoint.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "fetchbot",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
