//! Shared fixtures for ledger integration tests: seed helpers and an
//! in-process mock payment gateway with call counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use guidely_core::booking::CreateReservation;
use guidely_core::types::{DbId, Timestamp};
use guidely_db::models::guide_product::CreateGuideProduct;
use guidely_db::models::user::CreateUser;
use guidely_db::repositories::{GuideProductRepo, UserRepo};
use guidely_payments::{GatewayError, PaymentGateway, PaymentState, PaymentVerification};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn at(hour: u32) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

pub async fn seed_user(pool: &PgPool, email: &str) -> DbId {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            nickname: email.split('@').next().unwrap().to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

/// Listing available 08:00-20:00 on 2024-05-01 at 10,000 minor units.
pub async fn seed_product(pool: &PgPool, guide_id: DbId, capacity: i32) -> DbId {
    GuideProductRepo::create(
        pool,
        &CreateGuideProduct {
            user_id: guide_id,
            title: "Seoul old town walking tour".to_string(),
            description: None,
            price: 10_000,
            capacity,
            guide_start: at(8),
            guide_end: at(20),
        },
    )
    .await
    .unwrap()
    .id
}

pub fn reservation_input(product_id: DbId, start_hour: u32, end_hour: u32) -> CreateReservation {
    CreateReservation {
        product_id,
        guide_start: at(start_hour),
        guide_end: at(end_hour),
        personnel: 1,
        message: Some("looking forward to it".to_string()),
        price: 10_000,
    }
}

// ---------------------------------------------------------------------------
// Mock gateway
// ---------------------------------------------------------------------------

/// In-memory payment provider double. Transactions are registered up
/// front; counters expose how often the ledger actually called out.
#[derive(Default)]
pub struct MockGateway {
    payments: Mutex<HashMap<String, PaymentVerification>>,
    pub verify_calls: AtomicUsize,
    pub refund_calls: AtomicUsize,
    verify_unavailable: AtomicBool,
    refund_unavailable: AtomicBool,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a captured (paid) transaction.
    pub fn paid(&self, imp_uid: &str, amount: i32) {
        self.payments.lock().unwrap().insert(
            imp_uid.to_string(),
            PaymentVerification {
                imp_uid: imp_uid.to_string(),
                amount,
                state: PaymentState::Paid,
                paid_at: Some(at(11)),
            },
        );
    }

    /// Register a transaction still awaiting capture.
    pub fn unpaid(&self, imp_uid: &str, amount: i32) {
        self.payments.lock().unwrap().insert(
            imp_uid.to_string(),
            PaymentVerification {
                imp_uid: imp_uid.to_string(),
                amount,
                state: PaymentState::Ready,
                paid_at: None,
            },
        );
    }

    pub fn set_verify_unavailable(&self, outage: bool) {
        self.verify_unavailable.store(outage, Ordering::SeqCst);
    }

    pub fn set_refund_unavailable(&self, outage: bool) {
        self.refund_unavailable.store(outage, Ordering::SeqCst);
    }

    pub fn verify_count(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn refund_count(&self) -> usize {
        self.refund_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn verify(&self, imp_uid: &str) -> Result<PaymentVerification, GatewayError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.verify_unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("mock outage".into()));
        }
        self.payments
            .lock()
            .unwrap()
            .get(imp_uid)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected(format!("unknown transaction {imp_uid}")))
    }

    async fn refund(&self, imp_uid: &str, _reason: &str) -> Result<(), GatewayError> {
        self.refund_calls.fetch_add(1, Ordering::SeqCst);
        if self.refund_unavailable.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable("mock outage".into()));
        }
        if self.payments.lock().unwrap().contains_key(imp_uid) {
            Ok(())
        } else {
            Err(GatewayError::Rejected(format!("unknown transaction {imp_uid}")))
        }
    }
}
