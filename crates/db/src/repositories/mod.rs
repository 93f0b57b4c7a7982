//! Repositories over the reservation schema.

mod guide_product_repo;
mod reservation_repo;
mod user_repo;

pub use guide_product_repo::GuideProductRepo;
pub use reservation_repo::{ConfirmOutcome, ReservationRepo};
pub use user_repo::UserRepo;
