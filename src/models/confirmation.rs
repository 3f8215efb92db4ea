use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;
use validator::Validate;

use crate::errors::{AppError, Result};

/// Borrower-submitted proof of payment. Immutable once written; admins
/// read it during manual review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    pub payment_id: ObjectId,
    pub user_id: ObjectId,
    pub reference_number: String,
    /// ISO date (YYYY-MM-DD) as submitted by the borrower.
    pub transaction_date: NaiveDate,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_file: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub submitted_at: DateTime<Utc>,
}

/// Text fields gathered from the multipart form before any storage happens.
#[derive(Debug, Default, Validate)]
pub struct ConfirmationFields {
    #[validate(length(min = 3, message = "reference number must be at least 3 characters"))]
    pub reference_number: String,
    pub transaction_date: String,
    #[validate(length(max = 500, message = "details must be at most 500 characters"))]
    pub notes: Option<String>,
}

impl ConfirmationFields {
    /// Field-level validation, independent of payment method. Returns the
    /// parsed transaction date on success so the caller stores a typed value.
    pub fn validate_against(&self, today: NaiveDate) -> Result<NaiveDate> {
        self.validate()?;

        let date = NaiveDate::parse_from_str(self.transaction_date.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::invalid_data("transaction date must be an ISO date (YYYY-MM-DD)"))?;

        if date > today {
            return Err(AppError::invalid_data("transaction date cannot be in the future"));
        }

        Ok(date)
    }
}

#[derive(Debug, Serialize)]
pub struct ConfirmationResponse {
    pub id: String,
    pub payment_id: String,
    pub reference_number: String,
    pub transaction_date: String,
    pub receipt_file: Option<String>,
    pub submitted_at: String,
}

impl From<&PaymentConfirmation> for ConfirmationResponse {
    fn from(c: &PaymentConfirmation) -> Self {
        ConfirmationResponse {
            id: c._id.map(|id| id.to_hex()).unwrap_or_default(),
            payment_id: c.payment_id.to_hex(),
            reference_number: c.reference_number.clone(),
            transaction_date: c.transaction_date.to_string(),
            receipt_file: c.receipt_file.clone(),
            submitted_at: c.submitted_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    fn fields(reference: &str, date: &str) -> ConfirmationFields {
        ConfirmationFields {
            reference_number: reference.to_string(),
            transaction_date: date.to_string(),
            notes: None,
        }
    }

    #[test]
    fn accepts_valid_submission() {
        let parsed = fields("TX-1002", "2025-06-14").validate_against(today()).unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2025, 6, 14).unwrap());
    }

    #[test]
    fn accepts_transaction_dated_today() {
        assert!(fields("TX-1002", "2025-06-15").validate_against(today()).is_ok());
    }

    #[test]
    fn rejects_future_transaction_date() {
        let err = fields("TX-1002", "2025-06-16").validate_against(today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_short_reference_number() {
        let err = fields("AB", "2025-06-14").validate_against(today()).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(fields("TX-1002", "14/06/2025").validate_against(today()).is_err());
        assert!(fields("TX-1002", "").validate_against(today()).is_err());
    }

    #[test]
    fn rejects_oversized_notes() {
        let mut f = fields("TX-1002", "2025-06-14");
        f.notes = Some("x".repeat(501));
        assert!(f.validate_against(today()).is_err());

        f.notes = Some("x".repeat(500));
        assert!(f.validate_against(today()).is_ok());
    }
}
