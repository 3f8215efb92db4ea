use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub user_id: ObjectId,
    pub application_id: ObjectId,
    pub method: PaymentMethod,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub due_date: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Payment rails. Method-specific branching is enum dispatch, not string
/// comparison, so field sets stay exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    WireTransfer,
    ETransfer,
    Crypto,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::WireTransfer => "wire_transfer",
            PaymentMethod::ETransfer => "e_transfer",
            PaymentMethod::Crypto => "crypto",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wire_transfer" => Ok(PaymentMethod::WireTransfer),
            "e_transfer" => Ok(PaymentMethod::ETransfer),
            "crypto" => Ok(PaymentMethod::Crypto),
            _ => Err(()),
        }
    }
}

/// `none -> pending -> pending_review -> {completed | rejected}`.
/// The last transition is admin-only. `failed` also marks payments
/// superseded by a newer method selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    PendingReview,
    Completed,
    Failed,
    Rejected,
    Refunded,
}

impl PaymentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PaymentStatus::Completed
                | PaymentStatus::Failed
                | PaymentStatus::Rejected
                | PaymentStatus::Refunded
        )
    }

    pub fn accepts_confirmation(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Processing)
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectMethodRequest {
    pub method: PaymentMethod,
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub method: PaymentMethod,
    pub amount: f64,
    pub currency: String,
    pub status: PaymentStatus,
    pub due_date: String,
    pub created_at: String,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        PaymentResponse {
            id: payment._id.map(|id| id.to_hex()).unwrap_or_default(),
            method: payment.method,
            amount: payment.amount,
            currency: payment.currency.clone(),
            status: payment.status,
            due_date: payment.due_date.to_rfc3339(),
            created_at: payment.created_at.to_rfc3339(),
        }
    }
}
