//! Reservation ledger rows.

use serde::Serialize;
use sqlx::FromRow;

use guidely_core::error::CoreError;
use guidely_core::state::ReservationState;
use guidely_core::status::{PayStatus, ReservationStatus, StatusId};
use guidely_core::types::{DbId, Timestamp};

/// A row from the `reservations` table.
///
/// The serialized form is the snapshot the ledger hands to the API
/// surface; the raw status columns are kept alongside for clients that
/// consume the two axes separately.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: DbId,
    /// Idempotency/correlation token shared with the payment provider.
    /// Unique, immutable after insert.
    pub merchant_uid: String,
    pub client_id: DbId,
    pub guide_id: DbId,
    pub product_id: DbId,
    pub guide_start: Timestamp,
    pub guide_end: Timestamp,
    pub personnel: i32,
    /// Agreed price in currency minor units.
    pub price: i32,
    pub message: Option<String>,
    /// Provider-side transaction id, set once payment is verified.
    pub imp_uid: Option<String>,
    pub paid_at: Option<Timestamp>,
    pub pay_status_id: StatusId,
    pub reservation_status_id: StatusId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Reservation {
    /// Decode the stored status pair into the merged state machine.
    ///
    /// Fails with `CoreError::Internal` if the row carries an illegal
    /// pair, which can only mean the columns were mutated outside the
    /// ledger.
    pub fn state(&self) -> Result<ReservationState, CoreError> {
        let pay = PayStatus::try_from(self.pay_status_id)?;
        let booking = ReservationStatus::try_from(self.reservation_status_id)?;
        ReservationState::from_pair(pay, booking)
    }

    /// The reserved `[guide_start, guide_end)` window.
    pub fn window(&self) -> (Timestamp, Timestamp) {
        (self.guide_start, self.guide_end)
    }
}
