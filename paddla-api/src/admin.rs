use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use paddla_core::{BookingId, ConfirmedBooking};
use serde::Deserialize;

use crate::{error::AppError, middleware::admin_auth_middleware, state::AppState};

#[derive(Debug, Deserialize)]
pub struct BookingNameRequest {
    pub name: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/bookings", get(list_bookings).post(add_booking))
        .route(
            "/admin/bookings/{id}",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route_layer(from_fn_with_state(state, admin_auth_middleware))
}

async fn list_bookings(State(state): State<AppState>) -> Result<Json<Vec<ConfirmedBooking>>, AppError> {
    Ok(Json(state.booking_admin.list_bookings().await?))
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<Json<ConfirmedBooking>, AppError> {
    Ok(Json(state.booking_admin.get_booking(id).await?))
}

async fn add_booking(
    State(state): State<AppState>,
    Json(req): Json<BookingNameRequest>,
) -> Result<(StatusCode, Json<ConfirmedBooking>), AppError> {
    let booking = state.booking_admin.add_booking(&req.name).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn update_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
    Json(req): Json<BookingNameRequest>,
) -> Result<Json<ConfirmedBooking>, AppError> {
    Ok(Json(state.booking_admin.update_booking(id, &req.name).await?))
}

async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<BookingId>,
) -> Result<StatusCode, AppError> {
    state.booking_admin.delete_booking(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
