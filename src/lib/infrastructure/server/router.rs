use super::docs::ApiDoc;
use super::error::ServerError;
use super::routes;
use super::state::ServerState;
use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Assemble the REST surface around `state`.
pub fn build_router(state: Arc<ServerState>, cors_origins: &[String]) -> Router {
    let api = ApiDoc::openapi();

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(origin = origin.as_str(), %err, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", api))
        .route(
            "/settings",
            get(routes::settings::settings_get_handler)
                .post(routes::settings::settings_post_handler),
        )
        .route("/prompt", post(routes::prompt::prompt_handler))
        .route("/health", get(routes::health::health_handler))
        .layer(cors)
        .with_state(state)
}

pub(super) async fn serve(
    state: Arc<ServerState>,
    addr: SocketAddr,
    cors_origins: &[String],
) -> Result<(), ServerError> {
    info!(%addr, "Binding REST server");
    let app = build_router(state, cors_origins);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "REST server ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}
