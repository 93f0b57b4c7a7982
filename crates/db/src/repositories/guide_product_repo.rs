//! Repository for the `guide_products` table (the Listing Directory).
//!
//! The reservation core reads listings to resolve the owning guide, the
//! published availability window, and the capacity. Listing CRUD/search
//! belongs to a different subsystem; `create` exists for that service
//! and for test fixtures.

use sqlx::PgPool;

use guidely_core::types::DbId;

use crate::models::guide_product::{CreateGuideProduct, GuideProduct};

/// Column list for `guide_products` queries.
const COLUMNS: &str = "\
    id, user_id, title, description, price, capacity, \
    guide_start, guide_end, created_at, updated_at";

pub struct GuideProductRepo;

impl GuideProductRepo {
    /// Insert a listing row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateGuideProduct,
    ) -> Result<GuideProduct, sqlx::Error> {
        let query = format!(
            "INSERT INTO guide_products \
                 (user_id, title, description, price, capacity, guide_start, guide_end) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, GuideProduct>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.capacity)
            .bind(input.guide_start)
            .bind(input.guide_end)
            .fetch_one(pool)
            .await
    }

    /// Find a listing by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<GuideProduct>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM guide_products WHERE id = $1");
        sqlx::query_as::<_, GuideProduct>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
