use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Serialize)]
pub struct BookingCountResponse {
    pub count: i64,
    pub capacity: i64,
    pub available: i64,
}

#[derive(Debug, Serialize)]
pub struct PublicBooking {
    pub name: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/booking-count", get(booking_count))
        .route("/api/bookings", get(list_bookings))
}

async fn booking_count(State(state): State<AppState>) -> Result<Json<BookingCountResponse>, AppError> {
    let availability = state.reservations.availability().await?;
    Ok(Json(BookingCountResponse {
        count: availability.booked,
        capacity: availability.capacity,
        available: availability.available,
    }))
}

/// Participant names only; ids and payment references stay admin-side.
async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<PublicBooking>>, AppError> {
    let bookings = state.booking_admin.list_bookings().await?;
    Ok(Json(
        bookings
            .into_iter()
            .map(|b| PublicBooking { name: b.name })
            .collect(),
    ))
}
