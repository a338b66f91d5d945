use std::sync::Arc;

use tracing::info;

use paddla_core::models::MAX_NAME_LEN;
use paddla_core::{BookingId, BookingStore, ConfirmedBooking, CoreError, CoreResult};

/// Transaction reference stored on bookings an admin enters by hand.
pub const MANUAL_TRANSACTION: &str = "manual";

/// Direct edits of confirmed bookings from the admin views.
///
/// These bypass the reservation flow and its capacity checks.
pub struct BookingAdmin {
    bookings: Arc<dyn BookingStore>,
}

impl BookingAdmin {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }

    pub async fn list_bookings(&self) -> CoreResult<Vec<ConfirmedBooking>> {
        Ok(self.bookings.list_confirmed().await?)
    }

    pub async fn get_booking(&self, id: BookingId) -> CoreResult<ConfirmedBooking> {
        self.bookings
            .get_confirmed(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn add_booking(&self, name: &str) -> CoreResult<ConfirmedBooking> {
        let name = validate_name(name)?;
        let booking = self.bookings.insert_confirmed(name, MANUAL_TRANSACTION).await?;
        info!("Admin added booking {} ({})", booking.id, booking.name);
        Ok(booking)
    }

    pub async fn update_booking(&self, id: BookingId, name: &str) -> CoreResult<ConfirmedBooking> {
        let name = validate_name(name)?;
        let booking = self
            .bookings
            .rename_confirmed(id, name)
            .await?
            .ok_or_else(|| not_found(id))?;
        info!("Admin renamed booking {} to {}", id, booking.name);
        Ok(booking)
    }

    pub async fn delete_booking(&self, id: BookingId) -> CoreResult<()> {
        if !self.bookings.delete_confirmed(id).await? {
            return Err(not_found(id));
        }
        info!("Admin deleted booking {}", id);
        Ok(())
    }
}

fn validate_name(name: &str) -> CoreResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::InvalidInput("Name must not be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(CoreError::InvalidInput(format!(
            "Name must be at most {} characters",
            MAX_NAME_LEN
        )));
    }
    Ok(name)
}

fn not_found(id: BookingId) -> CoreError {
    CoreError::NotFound(format!("booking {}", id))
}
