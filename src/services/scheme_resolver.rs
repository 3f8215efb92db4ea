//! Fee resolution: turns an admin-assigned scheme plus a loan principal
//! into the amount the borrower owes.

use crate::errors::{AppError, Result};
use crate::models::scheme::{PaymentScheme, SchemeType};

/// Round-half-up to 2 decimal places. Applied at computation time so the
/// stored amount matches the displayed amount.
pub fn round_currency(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Resolve the fee amount for a scheme.
///
/// Subscription schemes charge the flat fee regardless of principal.
/// Percentage schemes charge `principal * rate / 100`, clamped to the
/// configured `[min_fee, max_fee]` bounds when present.
pub fn resolve_amount(scheme: &PaymentScheme, loan_principal: f64) -> Result<f64> {
    match scheme.scheme_type {
        SchemeType::Subscription => {
            let fee = scheme
                .subscription_fee
                .ok_or(AppError::NoSchemeAssigned)?;
            Ok(round_currency(fee))
        }
        SchemeType::Percentage => {
            let rate = scheme.percentage_fee.ok_or(AppError::NoSchemeAssigned)?;
            let mut amount = round_currency(loan_principal * rate / 100.0);

            if let Some(min_fee) = scheme.percentage_min_fee {
                if amount < min_fee {
                    amount = min_fee;
                }
            }
            if let Some(max_fee) = scheme.percentage_max_fee {
                if amount > max_fee {
                    amount = max_fee;
                }
            }

            Ok(amount)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn percentage_scheme(rate: f64, min_fee: Option<f64>, max_fee: Option<f64>) -> PaymentScheme {
        PaymentScheme {
            _id: None,
            user_id: None,
            scheme_type: SchemeType::Percentage,
            subscription_fee: None,
            percentage_fee: Some(rate),
            percentage_min_fee: min_fee,
            percentage_max_fee: max_fee,
            refund_policy_percentage: 80.0,
            requires_2fa: false,
            two_fa_verified: false,
            verification_code: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn subscription_scheme(fee: f64) -> PaymentScheme {
        PaymentScheme {
            scheme_type: SchemeType::Subscription,
            subscription_fee: Some(fee),
            percentage_fee: None,
            requires_2fa: true,
            ..percentage_scheme(0.0, None, None)
        }
    }

    #[test]
    fn percentage_within_bounds_is_unclamped() {
        let scheme = percentage_scheme(2.0, Some(150.0), Some(500.0));
        assert_eq!(resolve_amount(&scheme, 10_000.0).unwrap(), 200.0);
    }

    #[test]
    fn percentage_below_min_clamps_up() {
        let scheme = percentage_scheme(2.0, Some(150.0), None);
        assert_eq!(resolve_amount(&scheme, 5_000.0).unwrap(), 150.0);
    }

    #[test]
    fn percentage_above_max_clamps_down() {
        let scheme = percentage_scheme(2.0, None, Some(500.0));
        assert_eq!(resolve_amount(&scheme, 50_000.0).unwrap(), 500.0);
    }

    #[test]
    fn percentage_always_lands_within_bounds() {
        let scheme = percentage_scheme(2.0, Some(150.0), Some(500.0));
        for principal in [0.0, 1.0, 4_999.99, 7_500.0, 25_000.0, 1_000_000.0, 1e12] {
            let amount = resolve_amount(&scheme, principal).unwrap();
            assert!((150.0..=500.0).contains(&amount), "principal {principal} -> {amount}");
        }
    }

    #[test]
    fn subscription_is_constant_across_principals() {
        let scheme = subscription_scheme(99.0);
        for principal in [0.0, 5_000.0, 50_000.0, 1e9] {
            assert_eq!(resolve_amount(&scheme, principal).unwrap(), 99.0);
        }
    }

    #[test]
    fn amounts_round_half_up_to_cents() {
        // 1234.5 * 1.25% = 15.43125 -> 15.43
        let scheme = percentage_scheme(1.25, None, None);
        assert_eq!(resolve_amount(&scheme, 1_234.5).unwrap(), 15.43);

        // exact binary midpoints round up, not to even
        assert_eq!(round_currency(0.125), 0.13);
        assert_eq!(round_currency(0.375), 0.38);
        assert_eq!(round_currency(0.124), 0.12);
    }

    #[test]
    fn missing_rate_or_fee_signals_no_scheme() {
        let mut scheme = percentage_scheme(2.0, None, None);
        scheme.percentage_fee = None;
        assert!(matches!(resolve_amount(&scheme, 1_000.0), Err(AppError::NoSchemeAssigned)));

        let mut scheme = subscription_scheme(99.0);
        scheme.subscription_fee = None;
        assert!(matches!(resolve_amount(&scheme, 1_000.0), Err(AppError::NoSchemeAssigned)));
    }
}
