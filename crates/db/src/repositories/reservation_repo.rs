//! Repository for the `reservations` table.
//!
//! All status writes go through state pairs taken from
//! `ReservationState`, so the columns can never hold an illegal
//! combination. The confirm path is the ledger's critical section: it
//! locks the reservation row and the listing row in one transaction,
//! runs the overlap check against committed RESERVED rows, and applies
//! the transition before releasing either lock.

use sqlx::{PgPool, Postgres, Transaction};

use guidely_core::booking::{CreateReservation, PartyRole};
use guidely_core::schedule;
use guidely_core::state::ReservationState;
use guidely_core::status::ReservationStatus;
use guidely_core::types::Timestamp;

use crate::models::reservation::Reservation;

/// Column list for `reservations` queries.
const COLUMNS: &str = "\
    id, merchant_uid, client_id, guide_id, product_id, \
    guide_start, guide_end, personnel, price, message, \
    imp_uid, paid_at, pay_status_id, reservation_status_id, \
    created_at, updated_at";

/// Result of the transactional confirm step.
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// The reservation won the slot and is now RESERVED/COMPLETE.
    Confirmed(Reservation),
    /// The slot was already at capacity; the reservation was marked
    /// failed in the same transaction. The verified `imp_uid` is stored
    /// on the row so the payment can be reversed.
    Conflict(Reservation),
    /// Another request transitioned the reservation first; the row is
    /// returned as found.
    AlreadyTransitioned(Reservation),
}

pub struct ReservationRepo;

impl ReservationRepo {
    /// Insert a new PENDING/PENDING_CONFIRMATION reservation.
    pub async fn insert(
        pool: &PgPool,
        client_id: i64,
        guide_id: i64,
        merchant_uid: &str,
        input: &CreateReservation,
    ) -> Result<Reservation, sqlx::Error> {
        let pending = ReservationState::Pending;
        let query = format!(
            "INSERT INTO reservations \
                 (merchant_uid, client_id, guide_id, product_id, guide_start, guide_end, \
                  personnel, price, message, pay_status_id, reservation_status_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(merchant_uid)
            .bind(client_id)
            .bind(guide_id)
            .bind(input.product_id)
            .bind(input.guide_start)
            .bind(input.guide_end)
            .bind(input.personnel)
            .bind(input.price)
            .bind(&input.message)
            .bind(pending.pay_status().id())
            .bind(pending.reservation_status().id())
            .fetch_one(pool)
            .await
    }

    /// Find a reservation by its merchant uid.
    pub async fn find_by_merchant_uid(
        pool: &PgPool,
        merchant_uid: &str,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reservations WHERE merchant_uid = $1");
        sqlx::query_as::<_, Reservation>(&query)
            .bind(merchant_uid)
            .fetch_optional(pool)
            .await
    }

    /// List all reservations where the party plays `role`, newest first.
    pub async fn list_for_party(
        pool: &PgPool,
        party_id: i64,
        role: PartyRole,
    ) -> Result<Vec<Reservation>, sqlx::Error> {
        let column = match role {
            PartyRole::Client => "client_id",
            PartyRole::Guide => "guide_id",
        };
        let query = format!(
            "SELECT {COLUMNS} FROM reservations \
             WHERE {column} = $1 \
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(party_id)
            .fetch_all(pool)
            .await
    }

    /// Apply the confirm-time conflict check and transition atomically.
    ///
    /// Locks the reservation row, then the listing row. The listing lock
    /// is what serializes confirmations for the same product: the
    /// overlap query alone cannot lock rows that competing transactions
    /// have not committed yet. The gateway has already been consulted by
    /// the caller; no network I/O happens while the locks are held.
    pub async fn confirm(
        pool: &PgPool,
        merchant_uid: &str,
        imp_uid: &str,
        paid_at: Timestamp,
    ) -> Result<ConfirmOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let reservation = Self::lock_by_merchant_uid(&mut tx, merchant_uid).await?;
        if !is_pending(&reservation) {
            tx.rollback().await?;
            return Ok(ConfirmOutcome::AlreadyTransitioned(reservation));
        }

        // Per-product serialization point.
        let (capacity,): (i32,) =
            sqlx::query_as("SELECT capacity FROM guide_products WHERE id = $1 FOR UPDATE")
                .bind(reservation.product_id)
                .fetch_one(&mut *tx)
                .await?;

        // Committed RESERVED windows overlapping the requested one.
        let windows: Vec<(Timestamp, Timestamp)> = sqlx::query_as(
            "SELECT guide_start, guide_end FROM reservations \
             WHERE product_id = $1 AND reservation_status_id = $2 \
               AND guide_start < $3 AND guide_end > $4",
        )
        .bind(reservation.product_id)
        .bind(ReservationStatus::Reserved.id())
        .bind(reservation.guide_end)
        .bind(reservation.guide_start)
        .fetch_all(&mut *tx)
        .await?;

        let peak =
            schedule::peak_concurrency(&windows, reservation.guide_start, reservation.guide_end);
        if peak as i64 + 1 > capacity as i64 {
            let failed = Self::transition(
                &mut tx,
                merchant_uid,
                ReservationState::Failed,
                Some(imp_uid),
                None,
            )
            .await?;
            tx.commit().await?;
            return Ok(ConfirmOutcome::Conflict(failed));
        }

        let confirmed = Self::transition(
            &mut tx,
            merchant_uid,
            ReservationState::Confirmed,
            Some(imp_uid),
            Some(paid_at),
        )
        .await?;
        tx.commit().await?;
        Ok(ConfirmOutcome::Confirmed(confirmed))
    }

    /// Mark a still-pending reservation as failed (gateway rejection).
    ///
    /// Returns `None` if the reservation has already left PENDING, in
    /// which case nothing was changed.
    pub async fn mark_failed(
        pool: &PgPool,
        merchant_uid: &str,
        imp_uid: Option<&str>,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let pending = ReservationState::Pending;
        let failed = ReservationState::Failed;
        let query = format!(
            "UPDATE reservations \
             SET pay_status_id = $2, reservation_status_id = $3, \
                 imp_uid = COALESCE($4, imp_uid) \
             WHERE merchant_uid = $1 \
               AND pay_status_id = $5 AND reservation_status_id = $6 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(merchant_uid)
            .bind(failed.pay_status().id())
            .bind(failed.reservation_status().id())
            .bind(imp_uid)
            .bind(pending.pay_status().id())
            .bind(pending.reservation_status().id())
            .fetch_optional(pool)
            .await
    }

    /// Cancel a still-pending reservation (no refund owed).
    ///
    /// Returns `None` if the reservation has already left PENDING.
    pub async fn cancel_pending(
        pool: &PgPool,
        merchant_uid: &str,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        Self::guarded_transition(pool, merchant_uid, ReservationState::Pending, ReservationState::Cancelled)
            .await
    }

    /// Move a confirmed reservation to CANCELLED/REFUNDED after the
    /// provider accepted the refund.
    ///
    /// Returns `None` if the reservation is no longer CONFIRMED, so a
    /// racing cancel cannot record a second refund.
    pub async fn mark_refunded(
        pool: &PgPool,
        merchant_uid: &str,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        Self::guarded_transition(
            pool,
            merchant_uid,
            ReservationState::Confirmed,
            ReservationState::CancelledRefunded,
        )
        .await
    }

    async fn guarded_transition(
        pool: &PgPool,
        merchant_uid: &str,
        from: ReservationState,
        to: ReservationState,
    ) -> Result<Option<Reservation>, sqlx::Error> {
        let query = format!(
            "UPDATE reservations \
             SET pay_status_id = $2, reservation_status_id = $3 \
             WHERE merchant_uid = $1 \
               AND pay_status_id = $4 AND reservation_status_id = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(merchant_uid)
            .bind(to.pay_status().id())
            .bind(to.reservation_status().id())
            .bind(from.pay_status().id())
            .bind(from.reservation_status().id())
            .fetch_optional(pool)
            .await
    }

    async fn lock_by_merchant_uid(
        tx: &mut Transaction<'_, Postgres>,
        merchant_uid: &str,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reservations WHERE merchant_uid = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(merchant_uid)
            .fetch_one(&mut **tx)
            .await
    }

    async fn transition(
        tx: &mut Transaction<'_, Postgres>,
        merchant_uid: &str,
        to: ReservationState,
        imp_uid: Option<&str>,
        paid_at: Option<Timestamp>,
    ) -> Result<Reservation, sqlx::Error> {
        let query = format!(
            "UPDATE reservations \
             SET pay_status_id = $2, reservation_status_id = $3, \
                 imp_uid = COALESCE($4, imp_uid), \
                 paid_at = COALESCE($5, paid_at) \
             WHERE merchant_uid = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Reservation>(&query)
            .bind(merchant_uid)
            .bind(to.pay_status().id())
            .bind(to.reservation_status().id())
            .bind(imp_uid)
            .bind(paid_at)
            .fetch_one(&mut **tx)
            .await
    }
}

/// Raw status-id check for the PENDING pair, avoiding a fallible decode
/// inside the repository layer.
fn is_pending(reservation: &Reservation) -> bool {
    let pending = ReservationState::Pending;
    reservation.pay_status_id == pending.pay_status().id()
        && reservation.reservation_status_id == pending.reservation_status().id()
}
