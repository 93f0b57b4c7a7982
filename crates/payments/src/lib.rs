//! Payment gateway adapter for the guidely reservation ledger.
//!
//! - [`PaymentGateway`] — the async trait the ledger consumes.
//! - [`PortOneClient`] — the production implementation over the
//!   PortOne (Iamport) REST API.

pub mod gateway;
pub mod portone;

pub use gateway::{GatewayError, PaymentGateway, PaymentState, PaymentVerification};
pub use portone::{PortOneClient, PortOneConfig};
