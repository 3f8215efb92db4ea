use std::str::FromStr;

use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use chrono::{Duration, Utc};
use mongodb::Collection;
use mongodb::bson::{doc, oid::ObjectId, Bson};
use futures_util::TryStreamExt;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::models::application::LoanApplication;
use crate::models::payment::{
    Payment, PaymentMethod, PaymentResponse, PaymentStatus, SelectMethodRequest,
};
use crate::models::scheme::{PaymentScheme, SchemeQuote};
use crate::models::user::{Borrower, Claims};
use crate::services::method_gateway;
use crate::services::notifier::PaymentEvent;
use crate::services::scheme_resolver;
use crate::state::AppState;

pub(crate) fn claims_object_id(claims: &Claims) -> Result<ObjectId> {
    ObjectId::parse_str(&claims.sub).map_err(AppError::from)
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    use mongodb::error::{ErrorKind, WriteFailure};
    match &*err.kind {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == 11000,
        ErrorKind::Command(command_error) => command_error.code == 11000,
        _ => false,
    }
}

pub(crate) async fn find_borrower(state: &AppState, user_id: ObjectId) -> Result<Borrower> {
    let borrowers: Collection<Borrower> = state.db.collection("borrowers");
    borrowers
        .find_one(doc! { "_id": user_id })
        .await?
        .ok_or(AppError::AuthError)
}

pub(crate) async fn find_application(state: &AppState, user_id: ObjectId) -> Result<LoanApplication> {
    let applications: Collection<LoanApplication> = state.db.collection("applications");
    applications
        .find_one(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await?
        .ok_or(AppError::ApplicationNotFound)
}

/// Per-borrower scheme first, then the global default percentage scheme.
/// A borrower with neither is terminal until an admin assigns one.
pub(crate) async fn find_scheme(state: &AppState, user_id: ObjectId) -> Result<PaymentScheme> {
    let schemes: Collection<PaymentScheme> = state.db.collection("payment_schemes");

    if let Some(scheme) = schemes
        .find_one(doc! { "user_id": user_id, "is_active": true })
        .await?
    {
        return Ok(scheme);
    }

    schemes
        .find_one(doc! {
            "user_id": Bson::Null,
            "scheme_type": "percentage",
            "is_active": true,
        })
        .await?
        .ok_or(AppError::NoSchemeAssigned)
}

/// Resolve the borrower's fee against their loan principal.
pub async fn get_quote(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<SchemeQuote>> {
    let user_id = claims_object_id(&claims)?;
    let borrower = find_borrower(&state, user_id).await?;
    let application = find_application(&state, user_id).await?;
    let scheme = find_scheme(&state, user_id).await?;

    let amount = scheme_resolver::resolve_amount(&scheme, application.loan_amount)?;

    Ok(Json(SchemeQuote {
        scheme_type: scheme.scheme_type,
        amount,
        currency: method_gateway::currency_for(&borrower.country).to_string(),
        refund_policy_percentage: scheme.refund_policy_percentage,
        requires_2fa: scheme.requires_2fa,
        two_fa_verified: scheme.two_fa_verified,
    }))
}

#[derive(Debug, Deserialize)]
pub struct VerifyTwoFaRequest {
    pub code: String,
}

/// Confirm the 6-digit code issued when the admin assigned a subscription
/// scheme. Must succeed before payment methods are offered.
pub async fn verify_two_fa(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<VerifyTwoFaRequest>,
) -> Result<Json<Value>> {
    let user_id = claims_object_id(&claims)?;
    let scheme = find_scheme(&state, user_id).await?;

    if !scheme.requires_2fa {
        return Err(AppError::invalid_data("this payment scheme does not require verification"));
    }
    if scheme.two_fa_verified {
        return Ok(Json(json!({ "success": true, "message": "already verified" })));
    }

    let expected = scheme
        .verification_code
        .as_deref()
        .ok_or_else(|| AppError::invalid_data("no verification code on file, contact support"))?;

    if payload.code.trim() != expected {
        return Err(AppError::invalid_data("invalid verification code"));
    }

    let scheme_id = scheme._id.ok_or(AppError::NoSchemeAssigned)?;
    let schemes: Collection<PaymentScheme> = state.db.collection("payment_schemes");
    schemes
        .update_one(
            doc! { "_id": scheme_id },
            doc! {
                "$set": {
                    "two_fa_verified": true,
                    "updated_at": mongodb::bson::DateTime::now(),
                },
                "$unset": { "verification_code": "" },
            },
        )
        .await?;

    Ok(Json(json!({ "success": true, "message": "verification complete" })))
}

/// Rails available for the borrower's country. Refused until the scheme's
/// 2FA gate has been passed; that ordering is deliberate.
pub async fn list_methods(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Value>> {
    let user_id = claims_object_id(&claims)?;
    let borrower = find_borrower(&state, user_id).await?;
    let scheme = find_scheme(&state, user_id).await?;

    if scheme.verification_pending() {
        return Err(AppError::VerificationRequired);
    }

    let methods: Vec<Value> = method_gateway::available_methods(&borrower.country)
        .into_iter()
        .map(|method| {
            let config = method_gateway::method_config(method, &borrower.country);
            json!({
                "method": method,
                "name": config.name,
                "processing_time": config.processing_time,
            })
        })
        .collect();

    Ok(Json(json!({
        "country": method_gateway::normalize_country(&borrower.country),
        "methods": methods,
    })))
}

/// Static instructions for one rail. Pure lookup, safe to re-fetch.
pub async fn get_method_config(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(method): Path<String>,
) -> Result<Json<method_gateway::MethodConfig>> {
    let method = PaymentMethod::from_str(&method)
        .map_err(|_| AppError::UnknownPaymentMethod(method.clone()))?;

    let user_id = claims_object_id(&claims)?;
    let borrower = find_borrower(&state, user_id).await?;

    Ok(Json(method_gateway::method_config(method, &borrower.country)))
}

/// Create a pending payment for the chosen rail. Any prior non-terminal
/// payment on the application is superseded in the same transaction, so at
/// most one payment is ever awaiting action.
pub async fn select_method(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SelectMethodRequest>,
) -> Result<Json<Value>> {
    let user_id = claims_object_id(&claims)?;
    let borrower = find_borrower(&state, user_id).await?;
    let application = find_application(&state, user_id).await?;
    let scheme = find_scheme(&state, user_id).await?;

    if scheme.verification_pending() {
        return Err(AppError::VerificationRequired);
    }

    if !method_gateway::available_methods(&borrower.country).contains(&payload.method) {
        return Err(AppError::invalid_data(format!(
            "payment method {} is not available in {}",
            payload.method, borrower.country
        )));
    }

    let amount = scheme_resolver::resolve_amount(&scheme, application.loan_amount)?;
    let currency = method_gateway::currency_for(&borrower.country).to_string();
    let application_id = application._id.ok_or(AppError::ApplicationNotFound)?;

    let now = Utc::now();
    let payment = Payment {
        _id: Some(ObjectId::new()),
        user_id,
        application_id,
        method: payload.method,
        amount,
        currency: currency.clone(),
        status: PaymentStatus::Pending,
        due_date: now + Duration::days(7),
        notes: None,
        created_at: now,
        updated_at: now,
    };

    let payments: Collection<Payment> = state.db.collection("payments");
    let mut session = state.client.start_session().await?;
    session.start_transaction().await?;

    let tx_result = async {
        payments
            .update_many(
                doc! {
                    "application_id": application_id,
                    "status": { "$in": ["pending", "processing", "pending_review"] },
                },
                doc! {
                    "$set": {
                        "status": "failed",
                        "notes": "superseded by a new method selection",
                        "updated_at": mongodb::bson::DateTime::now(),
                    },
                },
            )
            .session(&mut session)
            .await?;

        payments.insert_one(&payment).session(&mut session).await?;
        Ok::<(), AppError>(())
    }
    .await;

    match tx_result {
        Ok(()) => session.commit_transaction().await?,
        Err(e) => {
            session.abort_transaction().await.ok();
            // a racing selection got its pending payment in first; the
            // unique active-payment index rejects ours
            if let AppError::MongoDB(mongo_err) = &e {
                if is_duplicate_key(mongo_err) {
                    return Err(AppError::invalid_data(
                        "a payment for this application is already in progress",
                    ));
                }
            }
            return Err(e);
        }
    }

    state.notifier.dispatch(PaymentEvent::PaymentCreated {
        borrower_email: borrower.email.clone(),
        method: payload.method.to_string(),
        amount,
        currency,
        reference_number: application.reference_number.clone(),
    });

    let instructions = method_gateway::method_config(payload.method, &borrower.country);

    Ok(Json(json!({
        "payment": PaymentResponse::from(&payment),
        "reference_number": application.reference_number,
        "instructions": instructions,
    })))
}

/// Borrower's payment history, newest first.
pub async fn list_payments(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<PaymentResponse>>> {
    let user_id = claims_object_id(&claims)?;
    let payments: Collection<Payment> = state.db.collection("payments");

    let cursor = payments
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await?;
    let payments: Vec<Payment> = cursor.try_collect().await?;

    Ok(Json(payments.iter().map(PaymentResponse::from).collect()))
}
