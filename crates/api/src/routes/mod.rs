pub mod health;
pub mod reservation;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /reservations                            create, list (requires auth)
/// /reservations/payment                    confirm payment (requires auth)
/// /reservations/{merchant_uid}             get (requires auth)
/// /reservations/{merchant_uid}/cancel      cancel (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/reservations", reservation::router())
}
