//! The payment gateway seam.
//!
//! The ledger never talks HTTP directly; it holds an `Arc<dyn
//! PaymentGateway>` and the distinction it cares about is retryable
//! versus terminal: [`GatewayError::Unavailable`] leaves the reservation
//! untouched for the caller to retry, [`GatewayError::Rejected`] is a
//! definitive provider answer.

use async_trait::async_trait;

use guidely_core::types::Timestamp;

/// Provider-side state of a payment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    /// Payment window opened, not yet paid.
    Ready,
    /// Captured successfully.
    Paid,
    /// Cancelled/refunded at the provider.
    Cancelled,
    /// Failed at the provider.
    Failed,
}

/// What the provider knows about a transaction.
#[derive(Debug, Clone)]
pub struct PaymentVerification {
    /// The provider transaction id that was verified.
    pub imp_uid: String,
    /// Captured amount in currency minor units.
    pub amount: i32,
    pub state: PaymentState,
    pub paid_at: Option<Timestamp>,
}

/// Errors from the payment gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The provider could not be reached or answered abnormally.
    /// Retryable; implies nothing about the payment itself.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),

    /// The provider answered and said no (unknown transaction, cancel
    /// refused). Terminal for the operation that asked.
    #[error("payment gateway rejected the request: {0}")]
    Rejected(String),
}

/// External payment provider operations the ledger depends on.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Look up a transaction by its provider id.
    async fn verify(&self, imp_uid: &str) -> Result<PaymentVerification, GatewayError>;

    /// Refund a previously captured transaction in full.
    async fn refund(&self, imp_uid: &str, reason: &str) -> Result<(), GatewayError>;
}
