use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ReservationId;
use crate::repository::RepoResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub reservation_id: ReservationId,
    pub status: PaymentStatus,
    pub processed_at: DateTime<Utc>,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Charge the visitor for a pending reservation.
    ///
    /// Idempotent per reservation: charging the same id again returns the
    /// original receipt instead of billing twice.
    async fn charge(&self, reservation_id: ReservationId) -> RepoResult<PaymentReceipt>;
}

/// Stand-in for the external checkout page: every charge succeeds.
#[derive(Debug, Default)]
pub struct SimulatedPaymentProvider {
    receipts: Mutex<HashMap<ReservationId, PaymentReceipt>>,
}

impl SimulatedPaymentProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentProvider for SimulatedPaymentProvider {
    async fn charge(&self, reservation_id: ReservationId) -> RepoResult<PaymentReceipt> {
        let mut receipts = self
            .receipts
            .lock()
            .map_err(|_| "simulated payment ledger poisoned")?;

        if let Some(receipt) = receipts.get(&reservation_id) {
            tracing::debug!("Reusing payment {} for reservation {}", receipt.transaction_id, reservation_id);
            return Ok(receipt.clone());
        }

        let transaction_id = format!("sim_{}", Uuid::new_v4().simple());
        tracing::debug!("Simulated payment {} for reservation {}", transaction_id, reservation_id);

        let receipt = PaymentReceipt {
            transaction_id,
            reservation_id,
            status: PaymentStatus::Succeeded,
            processed_at: Utc::now(),
        };
        receipts.insert(reservation_id, receipt.clone());
        Ok(receipt)
    }
}
