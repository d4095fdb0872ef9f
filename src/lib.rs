//! xPressBoat backend: users, products, orders and reviews over MongoDB.

#![forbid(unsafe_code)]
pub mod config;
pub mod database;
pub mod error;
pub mod model;
mod router;
pub mod telemetry;

use std::time::Duration;

use axum::Router;
use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use axum::routing::{delete, get, post, put};
use error::ServerError;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use axum::http::header;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ORIGIN, "https://xpressboat.example")
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub db: database::Database,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().latency_unit(LatencyUnit::Micros)),
        )
        // Add CORS preflight support, outside the layers below so their
        // responses carry the headers too.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any),
        )
        // Turn handler panics into 500.
        .layer(CatchPanicLayer::new())
        // A store that does not answer in time is a gateway failure.
        .layer(TimeoutLayer::with_status_code(StatusCode::GATEWAY_TIMEOUT, REQUEST_TIMEOUT));

    Router::new()
        // `GET /` goes to `status`.
        .route("/", get(router::status::status))
        .route("/users", post(router::users::create).put(router::users::upsert))
        .route(
            "/users/admin",
            get(router::users::is_admin_at_admin_path).put(router::users::make_admin),
        )
        .route("/users/{email}", get(router::users::is_admin))
        .route("/products", get(router::products::list).post(router::products::create))
        .route(
            "/products/{id}",
            get(router::products::get).delete(router::products::delete),
        )
        .route("/orders", get(router::orders::list).post(router::orders::create))
        .route("/orders/{id}", delete(router::orders::delete))
        .route("/orders/status/{id}", put(router::orders::ship))
        .route("/myOrders", post(router::orders::mine))
        .route("/reviews", get(router::reviews::list).post(router::reviews::create))
        .fallback(router::fallback)
        .with_state(state)
        .layer(middleware)
}

/// Initialize the application state.
///
/// The store connects in the background, so the server can answer before
/// MongoDB does.
pub fn initialize_state(config: &config::Configuration) -> Result<AppState, ServerError> {
    let uri = config.store.connection_string().map_err(|err| ServerError::Internal {
        details: "cannot build MongoDB connection string".into(),
        source: Some(Box::new(err)),
    })?;

    let db = database::Database::pending();
    db.connect_in_background(uri);

    Ok(AppState { db })
}
