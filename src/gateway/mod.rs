//! HTTP surface: route wiring, middleware, server bootstrap.

pub mod handlers;

use crate::{
    cli::globals::GlobalArgs,
    events::EventLog,
    provider::{adapter::AuthService, rest::RestProvider},
};
use anyhow::Result;
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderName, HeaderValue, Method, Request},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{debug_span, info, Span};
use ulid::Ulid;

/// Build the application router around an auth service and event log.
///
/// Separate from [`new`] so tests can drive the full middleware stack with a
/// substitutable provider.
#[must_use]
pub fn router(auth: Arc<AuthService>, events: EventLog) -> Router {
    let cors = CorsLayer::new()
        // allow `GET` and `POST` when accessing the resource
        .allow_methods([Method::GET, Method::POST])
        // allow requests from any origin
        .allow_origin(Any);

    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/verify-email", post(handlers::verify_email))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(auth))
                .layer(Extension(events)),
        )
}

/// Start the gateway.
///
/// # Errors
/// Returns an error if the provider client cannot be built or the server
/// fails to start.
pub async fn new(port: u16, globals: GlobalArgs) -> Result<()> {
    let events = EventLog::new();

    let provider = RestProvider::new(
        crate::APP_USER_AGENT,
        &globals.provider_url,
        globals.api_key.clone(),
        globals.service_account_secret.clone(),
        globals.verify_redirect_url.clone(),
    )?;

    let auth = Arc::new(AuthService::new(
        Arc::new(provider),
        events.clone(),
        &globals.project_id,
    ));

    let app = router(auth, events.clone());

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);
    events.startup(port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(events))
        .await?;

    Ok(())
}

async fn shutdown_signal(events: EventLog) {
    let _ = tokio::signal::ctrl_c().await;
    events.shutdown();
    info!("Gracefully shutdown");
}

// span
fn make_span(request: &Request<Body>) -> Span {
    let headers = request.headers();
    let path = request.uri().path();
    let request_id = headers
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    debug_span!("http-request", path, request_id)
}
