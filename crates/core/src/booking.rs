//! Request inputs for the reservation ledger.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Input for creating a reservation against a guide product.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReservation {
    pub product_id: DbId,
    /// Start of the reserved `[guide_start, guide_end)` window.
    pub guide_start: Timestamp,
    /// End of the reserved window (exclusive).
    pub guide_end: Timestamp,
    #[validate(range(min = 1, message = "personnel must be at least 1"))]
    pub personnel: i32,
    pub message: Option<String>,
    /// Agreed price in currency minor units.
    #[validate(range(min = 0, message = "price must not be negative"))]
    pub price: i32,
}

impl CreateReservation {
    /// Run field validation plus the window-ordering check.
    pub fn check(&self) -> Result<(), CoreError> {
        self.validate()
            .map_err(|e| CoreError::Validation(e.to_string()))?;
        if self.guide_start >= self.guide_end {
            return Err(CoreError::Validation(
                "guide_start must be before guide_end".into(),
            ));
        }
        Ok(())
    }
}

/// Input for reconciling an out-of-band payment with its reservation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmPayment {
    /// The reservation's merchant uid, echoed back by the provider.
    pub merchant_uid: String,
    /// The provider-side transaction id to verify.
    pub imp_uid: String,
}

/// Which side of a reservation a party is on when listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Client,
    Guide,
}

/// Generate a fresh merchant uid.
///
/// A v4 UUID in simple form: 32 hex chars, safe in URLs and in the
/// payment provider's metadata fields, with negligible collision odds.
/// The database's unique constraint backstops the impossible case.
pub fn new_merchant_uid() -> String {
    Uuid::new_v4().simple().to_string()
}
