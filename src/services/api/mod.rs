pub mod extractor;
pub mod handlers;
pub mod response;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::services::registry::RegistryService;

pub use extractor::{JsonBody, MalformedRequest};
pub use response::{ServerView, StatusMessage};

// GET 列表，POST 注册，PUT 心跳；其余方法由 axum 返回 405 并带 Allow 头
pub fn router(service: RegistryService) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_servers)
                .post(handlers::register_server)
                .put(handlers::heartbeat_server),
        )
        .route("/healthz", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
