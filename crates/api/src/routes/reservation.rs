//! Route definitions for the `/reservations` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reservation;
use crate::state::AppState;

/// Routes mounted at `/reservations`.
///
/// ```text
/// GET    /                        -> list (by role)
/// POST   /                        -> create
/// POST   /payment                 -> confirm_payment
/// GET    /{merchant_uid}          -> get_by_merchant_uid
/// POST   /{merchant_uid}/cancel   -> cancel
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(reservation::list).post(reservation::create))
        .route("/payment", post(reservation::confirm_payment))
        .route("/{merchant_uid}", get(reservation::get_by_merchant_uid))
        .route("/{merchant_uid}/cancel", post(reservation::cancel))
}
