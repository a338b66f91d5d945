//! In-process implementations of the store traits, used by tests and local
//! runs without Postgres or Redis.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use paddla_core::{
    AdminUser, AdminUserRepository, BookingId, BookingStore, BookingUnit, ConfirmedBooking,
    PendingReservation, PendingStatus, RepoResult, ReservationId, SessionStore,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    next_booking_id: BookingId,
    next_pending_id: ReservationId,
    bookings: BTreeMap<BookingId, ConfirmedBooking>,
    pending: BTreeMap<ReservationId, PendingReservation>,
}

impl Tables {
    fn insert_confirmed(&mut self, name: &str, transaction_id: &str) -> ConfirmedBooking {
        self.next_booking_id += 1;
        let booking = ConfirmedBooking {
            id: self.next_booking_id,
            name: name.to_string(),
            transaction_id: transaction_id.to_string(),
        };
        self.bookings.insert(booking.id, booking.clone());
        booking
    }
}

/// Booking tables behind a single async mutex.
///
/// A unit of work holds the mutex until it commits or is dropped, so units
/// run one at a time exactly like the table lock taken by the Postgres store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBookingStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn count_confirmed(&self) -> RepoResult<i64> {
        Ok(self.tables.lock().await.bookings.len() as i64)
    }

    async fn list_confirmed(&self) -> RepoResult<Vec<ConfirmedBooking>> {
        Ok(self.tables.lock().await.bookings.values().cloned().collect())
    }

    async fn get_confirmed(&self, id: BookingId) -> RepoResult<Option<ConfirmedBooking>> {
        Ok(self.tables.lock().await.bookings.get(&id).cloned())
    }

    async fn insert_confirmed(&self, name: &str, transaction_id: &str) -> RepoResult<ConfirmedBooking> {
        Ok(self.tables.lock().await.insert_confirmed(name, transaction_id))
    }

    async fn rename_confirmed(&self, id: BookingId, name: &str) -> RepoResult<Option<ConfirmedBooking>> {
        let mut tables = self.tables.lock().await;
        Ok(tables.bookings.get_mut(&id).map(|booking| {
            booking.name = name.to_string();
            booking.clone()
        }))
    }

    async fn delete_confirmed(&self, id: BookingId) -> RepoResult<bool> {
        Ok(self.tables.lock().await.bookings.remove(&id).is_some())
    }

    async fn count_pending(&self) -> RepoResult<i64> {
        Ok(self.tables.lock().await.pending.len() as i64)
    }

    async fn insert_pending(&self, canoe_count: i32, participant_names: &[String]) -> RepoResult<ReservationId> {
        let mut tables = self.tables.lock().await;
        tables.next_pending_id += 1;
        let id = tables.next_pending_id;
        tables.pending.insert(
            id,
            PendingReservation {
                id,
                canoe_count,
                participant_names: participant_names.to_vec(),
                status: PendingStatus::Pending,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn get_pending(&self, id: ReservationId) -> RepoResult<Option<PendingReservation>> {
        Ok(self.tables.lock().await.pending.get(&id).cloned())
    }

    async fn begin_unit(&self) -> RepoResult<Box<dyn BookingUnit>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryUnit { guard, staged }))
    }
}

/// Works on a private copy of the tables; `commit` swaps it in.
struct InMemoryUnit {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait]
impl BookingUnit for InMemoryUnit {
    async fn count_confirmed(&mut self) -> RepoResult<i64> {
        Ok(self.staged.bookings.len() as i64)
    }

    async fn get_pending(&mut self, id: ReservationId) -> RepoResult<Option<PendingReservation>> {
        Ok(self.staged.pending.get(&id).cloned())
    }

    async fn set_pending_status(&mut self, id: ReservationId, status: PendingStatus) -> RepoResult<()> {
        let pending = self
            .staged
            .pending
            .get_mut(&id)
            .ok_or_else(|| format!("pending reservation {} not found", id))?;
        pending.status = status;
        Ok(())
    }

    async fn insert_confirmed(&mut self, name: &str, transaction_id: &str) -> RepoResult<BookingId> {
        Ok(self.staged.insert_confirmed(name, transaction_id).id)
    }

    async fn delete_pending(&mut self, id: ReservationId) -> RepoResult<()> {
        self.staged.pending.remove(&id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let InMemoryUnit { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    values: Arc<Mutex<HashMap<(String, String), String>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str, key: &str) -> RepoResult<Option<String>> {
        let values = self.values.lock().await;
        Ok(values.get(&(session_id.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, session_id: &str, key: &str, value: &str) -> RepoResult<()> {
        let mut values = self.values.lock().await;
        values.insert((session_id.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn pop(&self, session_id: &str, key: &str) -> RepoResult<Option<String>> {
        let mut values = self.values.lock().await;
        Ok(values.remove(&(session_id.to_string(), key.to_string())))
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<String, AdminUser>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminUserRepository for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<AdminUser>> {
        Ok(self.users.lock().await.get(username).cloned())
    }

    async fn create_user(&self, username: &str, pw_hash: &str) -> RepoResult<AdminUser> {
        let mut users = self.users.lock().await;
        if users.contains_key(username) {
            return Err(format!("user '{}' already exists", username).into());
        }
        let user = AdminUser {
            id: users.len() as i64 + 1,
            username: username.to_string(),
            pw_hash: pw_hash.to_string(),
        };
        users.insert(username.to_string(), user.clone());
        Ok(user)
    }
}
