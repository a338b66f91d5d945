use std::sync::Arc;

use tracing::{info, warn};

use paddla_core::{
    Availability, BookingStore, CoreError, CoreResult, PendingStatus, ReservationId, SessionStore,
};

use crate::participants::{derive_names, parse_canoe_count, validate_names, Participants};

/// Session key under which a visitor's pending reservation id is kept.
pub const PENDING_BOOKING_KEY: &str = "pending_booking";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The pending reservation was turned into `created` confirmed bookings.
    Confirmed {
        reservation_id: ReservationId,
        created: usize,
    },
    /// Nothing to confirm: no session reference, or it was already consumed.
    NoOp,
}

/// Turns checkout requests into pending reservations and pending
/// reservations into confirmed bookings without ever exceeding capacity.
///
/// The check in [`ReservationManager::begin_reservation`] is advisory. The
/// authoritative check runs inside the same store unit that writes the
/// confirmed rows, so two concurrent confirmations can never both see the
/// pre-write count.
pub struct ReservationManager {
    bookings: Arc<dyn BookingStore>,
    sessions: Arc<dyn SessionStore>,
    capacity: i64,
}

impl ReservationManager {
    pub fn new(bookings: Arc<dyn BookingStore>, sessions: Arc<dyn SessionStore>, capacity: i64) -> Self {
        Self {
            bookings,
            sessions,
            capacity,
        }
    }

    pub fn capacity(&self) -> i64 {
        self.capacity
    }

    pub async fn availability(&self) -> CoreResult<Availability> {
        let booked = self.bookings.count_confirmed().await?;
        Ok(Availability::new(self.capacity, booked))
    }

    /// Validates the request, stores a pending reservation and records its id
    /// in the visitor's session.
    pub async fn begin_reservation(
        &self,
        session_id: &str,
        requested_count: &str,
        participants: &Participants,
    ) -> CoreResult<ReservationId> {
        let requested = parse_canoe_count(requested_count)?;

        let availability = self.availability().await?;
        if requested > availability.available {
            warn!(
                "Rejected checkout for {} canoe(s): {} available",
                requested, availability.available
            );
            return Err(CoreError::CapacityExceeded {
                available: availability.available,
            });
        }

        // Bounded by capacity at this point.
        let canoe_count = i32::try_from(requested)
            .map_err(|_| CoreError::InvalidInput("Too many canoes requested".to_string()))?;
        let names = derive_names(canoe_count as usize, participants);
        validate_names(&names)?;

        let reservation_id = self.bookings.insert_pending(canoe_count, &names).await?;
        self.sessions
            .set(session_id, PENDING_BOOKING_KEY, &reservation_id.to_string())
            .await?;

        info!("Pending reservation {} created for {} canoe(s)", reservation_id, canoe_count);
        Ok(reservation_id)
    }

    /// Peeks at the visitor's session reference without consuming it.
    pub async fn current_reservation(&self, session_id: &str) -> CoreResult<Option<ReservationId>> {
        let value = self.sessions.get(session_id, PENDING_BOOKING_KEY).await?;
        Ok(value.and_then(|v| parse_reference(&v)))
    }

    /// Consumes the visitor's session reference and, if the reservation still
    /// fits, writes one confirmed booking per participant.
    ///
    /// The pending reservation is deleted whether it is confirmed or rejected.
    pub async fn confirm_reservation(&self, session_id: &str, transaction_id: &str) -> CoreResult<ConfirmOutcome> {
        let Some(reference) = self.sessions.pop(session_id, PENDING_BOOKING_KEY).await? else {
            return Ok(ConfirmOutcome::NoOp);
        };
        let Some(reservation_id) = parse_reference(&reference) else {
            warn!("Discarding malformed session reference '{}'", reference);
            return Ok(ConfirmOutcome::NoOp);
        };

        let mut unit = self.bookings.begin_unit().await?;

        let Some(pending) = unit.get_pending(reservation_id).await? else {
            return Ok(ConfirmOutcome::NoOp);
        };

        let booked = unit.count_confirmed().await?;
        let requested = i64::from(pending.canoe_count);
        if booked + requested > self.capacity {
            unit.delete_pending(reservation_id).await?;
            unit.commit().await?;

            let available = Availability::new(self.capacity, booked).available;
            warn!(
                "Reservation {} rejected at confirmation: {} requested, {} available",
                reservation_id, requested, available
            );
            return Err(CoreError::CapacityExceeded { available });
        }

        unit.set_pending_status(reservation_id, PendingStatus::Paid).await?;
        for name in &pending.participant_names {
            unit.insert_confirmed(name, transaction_id).await?;
        }
        unit.delete_pending(reservation_id).await?;
        unit.commit().await?;

        let created = pending.participant_names.len();
        info!(
            "Reservation {} confirmed: {} booking(s), transaction {}",
            reservation_id, created, transaction_id
        );
        Ok(ConfirmOutcome::Confirmed {
            reservation_id,
            created,
        })
    }
}

fn parse_reference(value: &str) -> Option<ReservationId> {
    value.parse::<ReservationId>().ok()
}
