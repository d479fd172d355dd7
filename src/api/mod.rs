pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::TraceLayer,
};
use std::sync::Arc;

use crate::{
    config::Settings,
    error::Result,
    service::ServiceContext,
};
use state::AppState;

pub fn create_app(
    service_context: Arc<ServiceContext>,
    settings: Arc<Settings>,
) -> Result<Router> {
    let cors = cors_layer(&settings);
    let app_state = AppState::new(service_context, settings)?;

    Ok(Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))

        .nest("/api", api_routes(app_state.clone()))

        .with_state(app_state)

        // Middleware
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

fn cors_layer(settings: &Settings) -> CorsLayer {
    let Some(origin) = settings.server.client_url.as_deref() else {
        return CorsLayer::permissive();
    };

    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!("Invalid server.client_url {:?}; falling back to permissive CORS", origin);
            CorsLayer::permissive()
        }
    }
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/properties", property_routes(state.clone()))
        .nest("/bookings", booking_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        .nest("/admin", admin_routes(state))
        .route("/identity/webhook", post(handlers::identity::webhook))
}

fn property_routes(state: AppState) -> Router<AppState> {
    // Browsing is public; submitting and editing require a session
    let public = Router::new()
        .route("/", get(handlers::properties::search))
        .route("/:id", get(handlers::properties::get))
        .route("/:id/availability", get(handlers::properties::availability));

    let protected = Router::new()
        .route("/", post(handlers::properties::create))
        .route("/mine", get(handlers::properties::mine))
        .route("/:id", put(handlers::properties::update))
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    public.merge(protected)
}

fn booking_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::bookings::create))
        .route("/mine", get(handlers::bookings::mine))
        .route("/owner", get(handlers::bookings::owner))
        .route("/:id", get(handlers::bookings::get))
        .route("/:id/cancel", post(handlers::bookings::cancel))
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth))
}

fn payment_routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/webhook", post(handlers::payments::webhook));

    let protected = Router::new()
        .route("/create-invoice", post(handlers::payments::create_invoice))
        .route("/:reference/sync", post(handlers::payments::sync))
        .route_layer(from_fn_with_state(state, middleware::auth::require_auth));

    public.merge(protected)
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/bookings", get(handlers::admin::bookings))
        .route("/users", get(handlers::admin::users))
        .route_layer(from_fn_with_state(state, middleware::auth::require_admin))
}
