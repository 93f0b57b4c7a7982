//! User directory rows. Account lifecycle is owned elsewhere; the
//! reservation core only references these.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use guidely_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub nickname: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a user (fixtures and the external account service).
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub nickname: String,
}
