pub mod auth;
pub mod events;
pub mod health;
pub mod orders;
pub mod response;
pub mod uploads;
pub mod users;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::services::ServeDir;

use crate::middleware::auth::auth_middleware;
use crate::services::{ImageStore, JwtConfig};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt: JwtConfig,
    pub images: ImageStore,
}

pub fn build_router(pool: PgPool, jwt: JwtConfig, images: ImageStore) -> Router {
    let state = AppState {
        pool,
        jwt,
        images: images.clone(),
    };

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/users/me", get(users::me))
        .route("/api/v1/events", post(events::create_event))
        .route("/api/v1/events/me", get(events::list_my_events))
        .route("/api/v1/events/{id}", put(events::update_event))
        .route("/api/v1/events/{id}", delete(events::delete_event))
        .route(
            "/api/v1/events/{id}/statistics",
            get(events::event_statistics),
        )
        .route(
            "/api/v1/events/s/{short_link}",
            get(events::get_event_by_short_link),
        )
        .route("/api/v1/orders/create", post(orders::create_order))
        .route("/api/v1/orders/scan/{qr_code}", post(orders::scan_ticket))
        .route("/api/v1/upload/image", post(uploads::upload_image))
        .nest_service("/uploads", ServeDir::new(images.root()))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
