use async_trait::async_trait;

use crate::models::{AdminUser, BookingId, ConfirmedBooking, PendingReservation, PendingStatus, ReservationId};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for confirmed bookings and pending reservations
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn count_confirmed(&self) -> RepoResult<i64>;

    /// All confirmed bookings, oldest first.
    async fn list_confirmed(&self) -> RepoResult<Vec<ConfirmedBooking>>;

    async fn get_confirmed(&self, id: BookingId) -> RepoResult<Option<ConfirmedBooking>>;

    async fn insert_confirmed(&self, name: &str, transaction_id: &str) -> RepoResult<ConfirmedBooking>;

    /// Returns `None` when no row has this id.
    async fn rename_confirmed(&self, id: BookingId, name: &str) -> RepoResult<Option<ConfirmedBooking>>;

    /// Returns `false` when no row has this id.
    async fn delete_confirmed(&self, id: BookingId) -> RepoResult<bool>;

    async fn count_pending(&self) -> RepoResult<i64>;

    /// Stores a new reservation with status `pending`.
    async fn insert_pending(&self, canoe_count: i32, participant_names: &[String]) -> RepoResult<ReservationId>;

    async fn get_pending(&self, id: ReservationId) -> RepoResult<Option<PendingReservation>>;

    /// Opens an atomic unit of work.
    ///
    /// Units are mutually exclusive: while one is open, no other unit can
    /// observe or change the bookings table. Dropping a unit without calling
    /// [`BookingUnit::commit`] discards everything done through it.
    async fn begin_unit(&self) -> RepoResult<Box<dyn BookingUnit>>;
}

#[async_trait]
pub trait BookingUnit: Send {
    async fn count_confirmed(&mut self) -> RepoResult<i64>;

    async fn get_pending(&mut self, id: ReservationId) -> RepoResult<Option<PendingReservation>>;

    async fn set_pending_status(&mut self, id: ReservationId, status: PendingStatus) -> RepoResult<()>;

    async fn insert_confirmed(&mut self, name: &str, transaction_id: &str) -> RepoResult<BookingId>;

    async fn delete_pending(&mut self, id: ReservationId) -> RepoResult<()>;

    async fn commit(self: Box<Self>) -> RepoResult<()>;
}

/// Per-visitor key/value storage, scoped by an opaque session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str, key: &str) -> RepoResult<Option<String>>;

    async fn set(&self, session_id: &str, key: &str, value: &str) -> RepoResult<()>;

    /// Reads and removes the value in one step; a second call sees nothing.
    async fn pop(&self, session_id: &str, key: &str) -> RepoResult<Option<String>>;
}

/// Repository trait for admin accounts
#[async_trait]
pub trait AdminUserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<AdminUser>>;

    async fn create_user(&self, username: &str, pw_hash: &str) -> RepoResult<AdminUser>;
}
