//! `FromRow` entity models and request DTOs.

pub mod guide_product;
pub mod reservation;
pub mod user;
