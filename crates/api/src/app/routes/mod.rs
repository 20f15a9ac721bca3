use axum::Router;

pub mod bookings;
pub mod golfers;
pub mod system;
pub mod tee_times;

/// Router for the `/api` resources.
pub fn router() -> Router {
    Router::new()
        .nest("/golfers", golfers::router())
        .nest("/teetimes", tee_times::router())
        .nest("/bookings", bookings::router())
}
