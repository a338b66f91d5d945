use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type BookingId = i64;
pub type ReservationId = i64;

/// Longest participant name the bookings table accepts.
pub const MAX_NAME_LEN: usize = 120;

/// One row per participant in a paid reservation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfirmedBooking {
    pub id: BookingId,
    pub name: String,
    pub transaction_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PendingStatus {
    Pending,
    Paid,
}

impl PendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingStatus::Pending => "pending",
            PendingStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for PendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PendingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PendingStatus::Pending),
            "paid" => Ok(PendingStatus::Paid),
            other => Err(format!("unknown pending status '{}'", other)),
        }
    }
}

/// Server-held checkout attempt awaiting payment.
///
/// The visitor's session only ever stores `id`; the canoe count and the
/// participant names live here so they cannot be altered between checkout
/// and confirmation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingReservation {
    pub id: ReservationId,
    pub canoe_count: i32,
    pub participant_names: Vec<String>,
    pub status: PendingStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Availability {
    pub capacity: i64,
    pub booked: i64,
    pub available: i64,
}

impl Availability {
    pub fn new(capacity: i64, booked: i64) -> Self {
        Self {
            capacity,
            booked,
            available: (capacity - booked).max(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub pw_hash: String,
}
