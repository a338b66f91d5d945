use std::collections::HashMap;

use axum::{
    extract::State,
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use paddla_booking::{ConfirmOutcome, Participants};
use paddla_core::payment::PaymentStatus;
use serde::Serialize;
use tracing::{info, warn};

use crate::{error::AppError, session::visitor_session, state::AppState};

pub const PAYMENT_SUCCESS_PATH: &str = "/payment-success";

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConfirmResponse {
    Confirmed {
        reservation_id: i64,
        created: usize,
        transaction_id: String,
    },
    Noop,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/create-checkout-session", post(create_checkout_session))
        .route(PAYMENT_SUCCESS_PATH, get(payment_success))
}

/// Form fields: `canoeCount` plus `canoe{N}_fname` / `canoe{N}_lname` for
/// each slot starting at 1.
async fn create_checkout_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<HashMap<String, String>>,
) -> Result<(CookieJar, Redirect), AppError> {
    let (jar, session_id) = visitor_session(jar, &state.session_cookie);

    let requested = form.get("canoeCount").map(String::as_str).unwrap_or("");
    let participants = Participants::from_form(&form);

    let reservation_id = state
        .reservations
        .begin_reservation(&session_id, requested, &participants)
        .await?;

    info!("Checkout started for reservation {}", reservation_id);
    Ok((jar, Redirect::to(PAYMENT_SUCCESS_PATH)))
}

async fn payment_success(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ConfirmResponse>), AppError> {
    let (jar, session_id) = visitor_session(jar, &state.session_cookie);

    // Peek, not pop: a declined charge must leave the reference for a retry.
    // Concurrent reloads may both charge; `charge` is idempotent per
    // reservation and only one of them gets past `confirm_reservation`.
    let Some(reservation_id) = state.reservations.current_reservation(&session_id).await? else {
        return Ok((jar, Json(ConfirmResponse::Noop)));
    };

    let receipt = state
        .payments
        .charge(reservation_id)
        .await
        .map_err(|e| AppError::InternalServerError(format!("Payment provider failed: {}", e)))?;

    if receipt.status == PaymentStatus::Failed {
        warn!("Payment failed for reservation {}", reservation_id);
        return Err(AppError::PaymentFailed("Payment was not completed".to_string()));
    }

    let response = match state
        .reservations
        .confirm_reservation(&session_id, &receipt.transaction_id)
        .await?
    {
        ConfirmOutcome::Confirmed { reservation_id, created } => ConfirmResponse::Confirmed {
            reservation_id,
            created,
            transaction_id: receipt.transaction_id,
        },
        ConfirmOutcome::NoOp => ConfirmResponse::Noop,
    };

    Ok((jar, Json(response)))
}
