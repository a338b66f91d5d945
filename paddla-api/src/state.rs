use std::sync::Arc;

use paddla_booking::{BookingAdmin, ReservationManager};
use paddla_core::payment::PaymentProvider;
use paddla_core::AdminUserRepository;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub reservations: Arc<ReservationManager>,
    pub booking_admin: Arc<BookingAdmin>,
    pub users: Arc<dyn AdminUserRepository>,
    pub payments: Arc<dyn PaymentProvider>,
    pub auth: AuthConfig,
    pub session_cookie: String,
}
