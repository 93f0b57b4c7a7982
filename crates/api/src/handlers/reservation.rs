//! Handlers for the `/reservations` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use guidely_core::booking::{ConfirmPayment, CreateReservation, PartyRole};
use guidely_core::state::ReservationState;
use guidely_db::models::reservation::Reservation;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// A reservation snapshot with the merged lifecycle state decoded from
/// the raw status columns.
#[derive(Debug, Serialize)]
pub struct ReservationView {
    #[serde(flatten)]
    pub reservation: Reservation,
    pub state: ReservationState,
}

impl ReservationView {
    fn build(reservation: Reservation) -> AppResult<Self> {
        let state = reservation.state()?;
        Ok(Self { reservation, state })
    }
}

/// Query parameters for `GET /reservations`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Which side of the booking the caller wants: `client` or `guide`.
    pub role: PartyRole,
}

/// POST /api/v1/reservations
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateReservation>,
) -> AppResult<(StatusCode, Json<DataResponse<ReservationView>>)> {
    let reservation = state.ledger.create(user.user_id, &input).await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: ReservationView::build(reservation)?,
        }),
    ))
}

/// POST /api/v1/reservations/payment
///
/// Reconciles an out-of-band payment with its reservation. Retried
/// provider callbacks receive the settled snapshot with 200.
pub async fn confirm_payment(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<ConfirmPayment>,
) -> AppResult<Json<DataResponse<ReservationView>>> {
    let reservation = state.ledger.confirm_payment(&input).await?;
    Ok(Json(DataResponse {
        data: ReservationView::build(reservation)?,
    }))
}

/// POST /api/v1/reservations/{merchant_uid}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    user: AuthUser,
    Path(merchant_uid): Path<String>,
) -> AppResult<Json<DataResponse<ReservationView>>> {
    let reservation = state.ledger.cancel(&merchant_uid, user.user_id).await?;
    Ok(Json(DataResponse {
        data: ReservationView::build(reservation)?,
    }))
}

/// GET /api/v1/reservations/{merchant_uid}
pub async fn get_by_merchant_uid(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(merchant_uid): Path<String>,
) -> AppResult<Json<DataResponse<ReservationView>>> {
    let reservation = state.ledger.get(&merchant_uid).await?;
    Ok(Json(DataResponse {
        data: ReservationView::build(reservation)?,
    }))
}

/// GET /api/v1/reservations?role=client|guide
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<DataResponse<Vec<ReservationView>>>> {
    let reservations = state.ledger.list_for_party(user.user_id, query.role).await?;
    let data = reservations
        .into_iter()
        .map(ReservationView::build)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Json(DataResponse { data }))
}
