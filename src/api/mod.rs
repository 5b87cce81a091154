pub mod handlers;
pub mod middleware;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::root::health_check))
        // Auth routes
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        // API routes
        .nest("/api", api_routes(app_state.clone()))
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/otp", otp_routes())
        .nest("/payments", payment_routes(state))
}

fn otp_routes() -> Router<AppState> {
    Router::new()
        .route("/send", post(handlers::otp::send))
        .route("/verify", post(handlers::otp::verify))
        .route("/remaining", get(handlers::otp::remaining))
}

fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::payments::list))
        .route("/initialize", post(handlers::payments::initialize))
        .route("/:id", get(handlers::payments::get))
        .route("/:id/process", post(handlers::payments::process))
        .route("/:id/cancel", post(handlers::payments::cancel))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}
