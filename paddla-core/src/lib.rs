pub mod models;
pub mod repository;
pub mod payment;

pub use models::{
    AdminUser, Availability, BookingId, ConfirmedBooking, PendingReservation, PendingStatus,
    ReservationId,
};
pub use repository::{AdminUserRepository, BookingStore, BookingUnit, RepoError, RepoResult, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Capacity exceeded: only {available} canoe(s) left")]
    CapacityExceeded { available: i64 },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Store failure: {0}")]
    Store(#[from] RepoError),
}

pub type CoreResult<T> = Result<T, CoreError>;
