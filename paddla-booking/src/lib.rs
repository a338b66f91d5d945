pub mod participants;
pub mod manager;
pub mod admin;
pub mod memory;

pub use participants::{ParticipantInput, Participants};
pub use manager::{ConfirmOutcome, ReservationManager, PENDING_BOOKING_KEY};
pub use admin::BookingAdmin;
pub use memory::{InMemoryBookingStore, InMemorySessionStore, InMemoryUserStore};
