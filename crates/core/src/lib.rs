//! Domain logic for the guidely reservation ledger.
//!
//! Pure types and functions with no I/O:
//!
//! - [`state::ReservationState`] — the merged payment x reservation state
//!   machine with its legal transitions.
//! - [`schedule`] — half-open window overlap and capacity math.
//! - [`booking`] — validated request inputs and merchant-uid generation.
//! - [`error::CoreError`] — the domain error taxonomy.

pub mod booking;
pub mod error;
pub mod schedule;
pub mod state;
pub mod status;
pub mod types;
