//! The merged reservation state machine.
//!
//! A reservation row stores two status columns (payment and booking).
//! Only five of the fifteen possible pairs are legal, so all reads and
//! writes go through [`ReservationState`]: rows decode via [`from_pair`]
//! and every mutation picks its target statuses from a transition method
//! here. An inconsistent pair can therefore only mean corrupt data, and
//! it surfaces as [`CoreError::Internal`] instead of propagating.
//!
//! ```text
//! Pending --confirm--> Confirmed --refund--> CancelledRefunded
//!    |    \--fail----> Failed
//!    \-----cancel----> Cancelled
//! ```
//!
//! Failed, Cancelled, and CancelledRefunded are terminal.
//!
//! [`from_pair`]: ReservationState::from_pair

use serde::Serialize;

use crate::error::CoreError;
use crate::status::{PayStatus, ReservationStatus};

/// Combined lifecycle state of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationState {
    /// Created, awaiting out-of-band payment and confirmation.
    Pending,
    /// Payment verified and the slot claimed.
    Confirmed,
    /// Payment rejected or the slot lost to a competing confirmation.
    Failed,
    /// Cancelled before any payment completed; no refund was owed.
    Cancelled,
    /// Cancelled after payment, with the refund issued.
    CancelledRefunded,
}

impl ReservationState {
    /// Decode the stored status pair. Rejects the ten illegal pairs.
    pub fn from_pair(pay: PayStatus, booking: ReservationStatus) -> Result<Self, CoreError> {
        match (pay, booking) {
            (PayStatus::Pending, ReservationStatus::PendingConfirmation) => Ok(Self::Pending),
            (PayStatus::Complete, ReservationStatus::Reserved) => Ok(Self::Confirmed),
            (PayStatus::Failed, ReservationStatus::Cancelled) => Ok(Self::Failed),
            (PayStatus::Pending, ReservationStatus::Cancelled) => Ok(Self::Cancelled),
            (PayStatus::Refunded, ReservationStatus::Cancelled) => Ok(Self::CancelledRefunded),
            (pay, booking) => Err(CoreError::Internal(format!(
                "inconsistent reservation status pair: {pay:?}/{booking:?}"
            ))),
        }
    }

    /// The payment status column value for this state.
    pub fn pay_status(self) -> PayStatus {
        match self {
            Self::Pending => PayStatus::Pending,
            Self::Confirmed => PayStatus::Complete,
            Self::Failed => PayStatus::Failed,
            Self::Cancelled => PayStatus::Pending,
            Self::CancelledRefunded => PayStatus::Refunded,
        }
    }

    /// The booking status column value for this state.
    pub fn reservation_status(self) -> ReservationStatus {
        match self {
            Self::Pending => ReservationStatus::PendingConfirmation,
            Self::Confirmed => ReservationStatus::Reserved,
            Self::Failed | Self::Cancelled | Self::CancelledRefunded => {
                ReservationStatus::Cancelled
            }
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Failed | Self::Cancelled | Self::CancelledRefunded)
    }

    /// Successful payment verification with the slot still free.
    pub fn confirm(self) -> Result<Self, CoreError> {
        self.step("confirm", Self::Pending, Self::Confirmed)
    }

    /// Payment rejection or a lost slot race. Terminal.
    pub fn fail(self) -> Result<Self, CoreError> {
        self.step("fail", Self::Pending, Self::Failed)
    }

    /// Cancellation before payment completed. No refund owed.
    pub fn cancel(self) -> Result<Self, CoreError> {
        self.step("cancel", Self::Pending, Self::Cancelled)
    }

    /// Cancellation after payment, once the refund has succeeded.
    pub fn refund(self) -> Result<Self, CoreError> {
        self.step("refund", Self::Confirmed, Self::CancelledRefunded)
    }

    fn step(self, event: &str, from: Self, to: Self) -> Result<Self, CoreError> {
        if self == from {
            Ok(to)
        } else {
            Err(CoreError::Internal(format!(
                "illegal transition: {event} from {self:?}"
            )))
        }
    }
}
