/// Primary key type for all entity tables (BIGINT).
pub type DbId = i64;

/// Timestamp type used across the schema (timestamptz).
pub type Timestamp = chrono::DateTime<chrono::Utc>;
