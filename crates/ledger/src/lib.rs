//! The reservation ledger: lifecycle state machine, slot-conflict
//! checking, and payment reconciliation.
//!
//! [`ReservationLedger`] is the single writer of reservation rows. It
//! reconciles two independent event sources — user actions and the
//! asynchronous payment provider — without double-charging or
//! double-booking:
//!
//! - creation inserts a PENDING record and claims no capacity
//!   (optimistic pay-to-win policy: confirmation is the arbiter);
//! - confirmation verifies the payment with the gateway first, with no
//!   lock held, then applies the conflict check and transition in one
//!   short transaction;
//! - cancellation refunds before it transitions, so money is never kept
//!   for a cancelled booking.
//!
//! Duplicate confirm/cancel calls return the current snapshot instead
//! of erroring, which makes provider callback retries harmless.

use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;

use guidely_core::booking::{new_merchant_uid, ConfirmPayment, CreateReservation, PartyRole};
use guidely_core::error::CoreError;
use guidely_core::schedule;
use guidely_core::state::ReservationState;
use guidely_core::types::DbId;
use guidely_db::models::reservation::Reservation;
use guidely_db::repositories::{ConfirmOutcome, GuideProductRepo, ReservationRepo};
use guidely_payments::{GatewayError, PaymentGateway, PaymentState};

/// Errors surfaced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A domain-level error (not found, validation, authorization,
    /// conflict).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The payment provider could not be reached. Retryable; the
    /// reservation was not modified.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    /// The payment provider definitively rejected the payment, or the
    /// captured amount does not match the reservation. The reservation
    /// has been marked failed.
    #[error("Payment rejected: {0}")]
    GatewayRejected(String),

    /// The provider refused or failed the refund. The reservation is
    /// still confirmed; nothing was changed.
    #[error("Refund failed: {0}")]
    RefundFailed(String),
}

/// Convenience alias for ledger results.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The reservation core. Owns the pool and the payment gateway; every
/// reservation mutation in the system goes through here.
pub struct ReservationLedger {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
}

impl ReservationLedger {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    /// Create a PENDING reservation for a listing.
    ///
    /// Validates the input and the window against the listing's
    /// published availability, resolves the guide from the listing
    /// owner, and persists with a fresh merchant uid. No capacity is
    /// claimed yet.
    pub async fn create(
        &self,
        client_id: DbId,
        input: &CreateReservation,
    ) -> LedgerResult<Reservation> {
        input.check()?;

        let listing = GuideProductRepo::find_by_id(&self.pool, input.product_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "GuideProduct",
                key: input.product_id.to_string(),
            })?;

        if !schedule::contained_in(
            input.guide_start,
            input.guide_end,
            listing.guide_start,
            listing.guide_end,
        ) {
            return Err(CoreError::Validation(
                "requested window is outside the listing's availability".into(),
            )
            .into());
        }

        if listing.user_id == client_id {
            return Err(
                CoreError::Validation("cannot reserve your own listing".into()).into(),
            );
        }

        let merchant_uid = new_merchant_uid();
        let reservation =
            ReservationRepo::insert(&self.pool, client_id, listing.user_id, &merchant_uid, input)
                .await?;

        tracing::info!(
            reservation_id = reservation.id,
            merchant_uid = %reservation.merchant_uid,
            product_id = reservation.product_id,
            client_id,
            "Reservation created",
        );
        Ok(reservation)
    }

    /// Reconcile an out-of-band payment with its reservation.
    ///
    /// Verification happens before any lock is taken; the conflict check
    /// and status transition happen together in a short transaction.
    /// Calls for an already-settled reservation return the current
    /// snapshot unchanged.
    pub async fn confirm_payment(&self, input: &ConfirmPayment) -> LedgerResult<Reservation> {
        let reservation = self.require(&input.merchant_uid).await?;
        if reservation.state()? != ReservationState::Pending {
            // Duplicate provider callback or user retry.
            return Ok(reservation);
        }

        let verification = match self.gateway.verify(&input.imp_uid).await {
            Ok(v) => v,
            Err(GatewayError::Unavailable(msg)) => {
                return Err(LedgerError::GatewayUnavailable(msg));
            }
            Err(GatewayError::Rejected(msg)) => {
                return self
                    .reject(&input.merchant_uid, Some(&input.imp_uid), msg)
                    .await;
            }
        };

        if verification.state != PaymentState::Paid {
            return self
                .reject(
                    &input.merchant_uid,
                    Some(&input.imp_uid),
                    format!("payment not captured (provider state {:?})", verification.state),
                )
                .await;
        }
        if verification.amount != reservation.price {
            return self
                .reject(
                    &input.merchant_uid,
                    Some(&input.imp_uid),
                    format!(
                        "amount mismatch: paid {} but reserved for {}",
                        verification.amount, reservation.price,
                    ),
                )
                .await;
        }

        let paid_at = verification.paid_at.unwrap_or_else(Utc::now);
        match ReservationRepo::confirm(&self.pool, &input.merchant_uid, &input.imp_uid, paid_at)
            .await?
        {
            ConfirmOutcome::Confirmed(r) => {
                tracing::info!(
                    reservation_id = r.id,
                    merchant_uid = %r.merchant_uid,
                    imp_uid = %input.imp_uid,
                    "Reservation confirmed",
                );
                Ok(r)
            }
            ConfirmOutcome::Conflict(r) => {
                tracing::warn!(
                    reservation_id = r.id,
                    merchant_uid = %r.merchant_uid,
                    product_id = r.product_id,
                    "Slot no longer available at confirmation; reservation failed",
                );
                Err(CoreError::Conflict(
                    "the requested window is no longer available; the payment must be refunded"
                        .into(),
                )
                .into())
            }
            // A concurrent call settled the reservation between our read
            // and the transaction; return what it decided.
            ConfirmOutcome::AlreadyTransitioned(r) => Ok(r),
        }
    }

    /// Cancel a reservation on behalf of its client or guide.
    ///
    /// A confirmed reservation is refunded through the gateway first;
    /// if the refund fails the reservation is left untouched. Cancelling
    /// an already-terminal reservation returns the current snapshot.
    pub async fn cancel(
        &self,
        merchant_uid: &str,
        requester_id: DbId,
    ) -> LedgerResult<Reservation> {
        let reservation = self.require(merchant_uid).await?;

        if requester_id != reservation.client_id && requester_id != reservation.guide_id {
            return Err(CoreError::Forbidden(
                "only the reservation's client or guide may cancel it".into(),
            )
            .into());
        }

        match reservation.state()? {
            state if state.is_terminal() => Ok(reservation),
            ReservationState::Confirmed => {
                let imp_uid = reservation.imp_uid.clone().ok_or_else(|| {
                    CoreError::Internal(format!(
                        "confirmed reservation {merchant_uid} has no payment reference"
                    ))
                })?;

                self.gateway
                    .refund(&imp_uid, "reservation cancelled")
                    .await
                    .map_err(|e| LedgerError::RefundFailed(e.to_string()))?;

                match ReservationRepo::mark_refunded(&self.pool, merchant_uid).await? {
                    Some(r) => {
                        tracing::info!(
                            reservation_id = r.id,
                            merchant_uid = %r.merchant_uid,
                            imp_uid = %imp_uid,
                            "Reservation cancelled and refunded",
                        );
                        Ok(r)
                    }
                    None => self.settle_lost_race(merchant_uid).await,
                }
            }
            ReservationState::Pending => {
                match ReservationRepo::cancel_pending(&self.pool, merchant_uid).await? {
                    Some(r) => {
                        tracing::info!(
                            reservation_id = r.id,
                            merchant_uid = %r.merchant_uid,
                            "Pending reservation cancelled",
                        );
                        Ok(r)
                    }
                    None => self.settle_lost_race(merchant_uid).await,
                }
            }
            // state()? returned a non-terminal state not matched above;
            // unreachable, but the compiler cannot know that.
            _ => Err(CoreError::Internal("unexpected reservation state".into()).into()),
        }
    }

    /// Point lookup by merchant uid.
    pub async fn get(&self, merchant_uid: &str) -> LedgerResult<Reservation> {
        self.require(merchant_uid).await
    }

    /// All reservations where the party plays `role`, newest first.
    pub async fn list_for_party(
        &self,
        party_id: DbId,
        role: PartyRole,
    ) -> LedgerResult<Vec<Reservation>> {
        Ok(ReservationRepo::list_for_party(&self.pool, party_id, role).await?)
    }

    async fn require(&self, merchant_uid: &str) -> LedgerResult<Reservation> {
        ReservationRepo::find_by_merchant_uid(&self.pool, merchant_uid)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "Reservation",
                    key: merchant_uid.to_string(),
                }
                .into()
            })
    }

    /// Persist the FAILED transition for a rejected payment, then
    /// surface the rejection. Persisting first means a retried call
    /// finds a terminal record and cannot resurrect it.
    async fn reject(
        &self,
        merchant_uid: &str,
        imp_uid: Option<&str>,
        reason: String,
    ) -> LedgerResult<Reservation> {
        match ReservationRepo::mark_failed(&self.pool, merchant_uid, imp_uid).await? {
            Some(r) => {
                tracing::warn!(
                    reservation_id = r.id,
                    merchant_uid = %r.merchant_uid,
                    %reason,
                    "Payment rejected; reservation failed",
                );
                Err(LedgerError::GatewayRejected(reason))
            }
            // Lost a race against another transition; report what won.
            None => {
                let current = self.require(merchant_uid).await?;
                Ok(current)
            }
        }
    }

    /// A status-guarded cancel matched no row: another request
    /// transitioned the reservation first. If it landed somewhere
    /// terminal the cancel is idempotently done; otherwise ask the
    /// caller to retry against the new state.
    async fn settle_lost_race(&self, merchant_uid: &str) -> LedgerResult<Reservation> {
        let current = self.require(merchant_uid).await?;
        if current.state()?.is_terminal() {
            Ok(current)
        } else {
            Err(CoreError::Conflict(
                "reservation changed concurrently; retry the cancellation".into(),
            )
            .into())
        }
    }
}
