use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

/// Loan application, read-only from the payment workflow's perspective.
/// Created and advanced by the origination flow; the payment step only
/// reads the principal and bumps `current_step` on admin approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplication {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub loan_amount: f64,
    pub reference_number: String,
    pub current_step: i32,
    pub status: ApplicationStatus,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
}
