//! Guide product listing rows (the Listing Directory).
//!
//! Read-only from the reservation core's perspective: listing CRUD and
//! search live in a different part of the system.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use guidely_core::types::{DbId, Timestamp};

/// A row from the `guide_products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GuideProduct {
    pub id: DbId,
    /// The guide who owns and runs this listing.
    pub user_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub price: i32,
    /// Maximum concurrently reserved bookings at any instant.
    pub capacity: i32,
    /// Published availability window start.
    pub guide_start: Timestamp,
    /// Published availability window end (exclusive).
    pub guide_end: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a listing (fixtures and the listing service).
#[derive(Debug, Deserialize)]
pub struct CreateGuideProduct {
    pub user_id: DbId,
    pub title: String,
    pub description: Option<String>,
    pub price: i32,
    pub capacity: i32,
    pub guide_start: Timestamp,
    pub guide_end: Timestamp,
}
