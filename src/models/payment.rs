// src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Lifecycle of a claimed payment. PENDING is the only creatable state;
/// VERIFIED and REJECTED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[serde(rename = "VERIFIED")]
    Verified,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Verified => "VERIFIED",
            PaymentStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PaymentStatus::Pending),
            "VERIFIED" => Some(PaymentStatus::Verified),
            "REJECTED" => Some(PaymentStatus::Rejected),
            _ => None,
        }
    }

    /// The only legal transitions are PENDING -> VERIFIED and
    /// PENDING -> REJECTED.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Pending, PaymentStatus::Verified)
                | (PaymentStatus::Pending, PaymentStatus::Rejected)
        )
    }
}

/// Represents the 'payments' table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub note: String,
    pub method: String,
    pub transaction_id: Option<String>,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// DTO for a student claiming a payment.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    #[validate(range(min = 1, message = "Amount must be positive."))]
    pub amount: i64,
    #[validate(length(min = 1, max = 500, message = "A note is required."))]
    pub note: String,
    #[validate(length(min = 1, max = 50, message = "A payment method is required."))]
    pub method: String,
    #[validate(length(max = 100))]
    pub transaction_id: Option<String>,
}

/// DTO for the admin review decision.
#[derive(Debug, Deserialize)]
pub struct ReviewPaymentRequest {
    pub status: PaymentStatus,
}
