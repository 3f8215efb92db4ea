use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use mongodb::bson::oid::ObjectId;
use mongodb::bson;

/// Admin-assigned fee policy for a borrower. `user_id = None` marks the
/// global default scheme used when no per-borrower assignment exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentScheme {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<ObjectId>,

    pub scheme_type: SchemeType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_fee: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_fee: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_min_fee: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_max_fee: Option<f64>,

    pub refund_policy_percentage: f64,

    pub requires_2fa: bool,
    #[serde(default)]
    pub two_fa_verified: bool,

    /// Six-digit code issued when the admin assigned the scheme; cleared
    /// once the borrower verifies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_code: Option<String>,

    pub is_active: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeType {
    Subscription,
    Percentage,
}

impl PaymentScheme {
    /// The 2FA gate: subscription schemes flagged by the admin must be
    /// verified before the method selection UI is offered.
    pub fn verification_pending(&self) -> bool {
        self.requires_2fa && !self.two_fa_verified
    }
}

#[derive(Debug, Serialize)]
pub struct SchemeQuote {
    pub scheme_type: SchemeType,
    pub amount: f64,
    pub currency: String,
    pub refund_policy_percentage: f64,
    pub requires_2fa: bool,
    pub two_fa_verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheme(requires_2fa: bool, two_fa_verified: bool) -> PaymentScheme {
        PaymentScheme {
            _id: None,
            user_id: None,
            scheme_type: SchemeType::Subscription,
            subscription_fee: Some(99.0),
            percentage_fee: None,
            percentage_min_fee: None,
            percentage_max_fee: None,
            refund_policy_percentage: 80.0,
            requires_2fa,
            two_fa_verified,
            verification_code: None,
            is_active: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    // method selection is gated on this; the ordering (verify first, then
    // offer rails) is deliberate
    #[test]
    fn unverified_subscription_scheme_blocks_payment() {
        assert!(scheme(true, false).verification_pending());
    }

    #[test]
    fn verified_or_exempt_schemes_do_not_block() {
        assert!(!scheme(true, true).verification_pending());
        assert!(!scheme(false, false).verification_pending());
        assert!(!scheme(false, true).verification_pending());
    }
}
