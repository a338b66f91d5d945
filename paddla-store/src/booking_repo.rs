use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use paddla_core::{
    BookingId, BookingStore, BookingUnit, ConfirmedBooking, PendingReservation, PendingStatus,
    RepoError, RepoResult, ReservationId,
};

pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct BookingRow {
    id: i64,
    name: String,
    transaction_id: String,
}

impl From<BookingRow> for ConfirmedBooking {
    fn from(row: BookingRow) -> Self {
        ConfirmedBooking {
            id: row.id,
            name: row.name,
            transaction_id: row.transaction_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PendingRow {
    id: i64,
    canoe_count: i32,
    participant_names: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PendingRow> for PendingReservation {
    type Error = RepoError;

    fn try_from(row: PendingRow) -> Result<Self, Self::Error> {
        Ok(PendingReservation {
            id: row.id,
            canoe_count: row.canoe_count,
            participant_names: serde_json::from_str(&row.participant_names)?,
            status: row.status.parse::<PendingStatus>()?,
            created_at: row.created_at,
        })
    }
}

const SELECT_PENDING: &str =
    "SELECT id, canoe_count, participant_names, status, created_at FROM pending_bookings WHERE id = $1";
const SELECT_PENDING_FOR_UPDATE: &str =
    "SELECT id, canoe_count, participant_names, status, created_at FROM pending_bookings WHERE id = $1 FOR UPDATE";

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn count_confirmed(&self) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_confirmed(&self) -> RepoResult<Vec<ConfirmedBooking>> {
        let rows: Vec<BookingRow> = sqlx::query_as("SELECT id, name, transaction_id FROM bookings ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ConfirmedBooking::from).collect())
    }

    async fn get_confirmed(&self, id: BookingId) -> RepoResult<Option<ConfirmedBooking>> {
        let row: Option<BookingRow> = sqlx::query_as("SELECT id, name, transaction_id FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(ConfirmedBooking::from))
    }

    async fn insert_confirmed(&self, name: &str, transaction_id: &str) -> RepoResult<ConfirmedBooking> {
        let row: BookingRow = sqlx::query_as(
            "INSERT INTO bookings (name, transaction_id) VALUES ($1, $2) RETURNING id, name, transaction_id",
        )
        .bind(name)
        .bind(transaction_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn rename_confirmed(&self, id: BookingId, name: &str) -> RepoResult<Option<ConfirmedBooking>> {
        let row: Option<BookingRow> = sqlx::query_as(
            "UPDATE bookings SET name = $1 WHERE id = $2 RETURNING id, name, transaction_id",
        )
        .bind(name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ConfirmedBooking::from))
    }

    async fn delete_confirmed(&self, id: BookingId) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_pending(&self) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pending_bookings")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_pending(&self, canoe_count: i32, participant_names: &[String]) -> RepoResult<ReservationId> {
        let names = serde_json::to_string(participant_names)?;
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO pending_bookings (canoe_count, participant_names, status) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(canoe_count)
        .bind(names)
        .bind(PendingStatus::Pending.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn get_pending(&self, id: ReservationId) -> RepoResult<Option<PendingReservation>> {
        let row: Option<PendingRow> = sqlx::query_as(SELECT_PENDING)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(PendingReservation::try_from).transpose()
    }

    async fn begin_unit(&self) -> RepoResult<Box<dyn BookingUnit>> {
        let mut tx = self.pool.begin().await?;

        // Self-conflicting lock: concurrent units queue here, plain reads do not.
        sqlx::query("LOCK TABLE bookings IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PgBookingUnit { tx }))
    }
}

/// One Postgres transaction; dropping it without `commit` rolls back.
struct PgBookingUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl BookingUnit for PgBookingUnit {
    async fn count_confirmed(&mut self) -> RepoResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn get_pending(&mut self, id: ReservationId) -> RepoResult<Option<PendingReservation>> {
        let row: Option<PendingRow> = sqlx::query_as(SELECT_PENDING_FOR_UPDATE)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(PendingReservation::try_from).transpose()
    }

    async fn set_pending_status(&mut self, id: ReservationId, status: PendingStatus) -> RepoResult<()> {
        sqlx::query("UPDATE pending_bookings SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_confirmed(&mut self, name: &str, transaction_id: &str) -> RepoResult<BookingId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO bookings (name, transaction_id) VALUES ($1, $2) RETURNING id",
        )
        .bind(name)
        .bind(transaction_id)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(id)
    }

    async fn delete_pending(&mut self, id: ReservationId) -> RepoResult<()> {
        sqlx::query("DELETE FROM pending_bookings WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let unit = *self;
        unit.tx.commit().await?;
        Ok(())
    }
}
