use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use mongodb::Collection;
use mongodb::bson::{doc, oid::ObjectId};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{AppError, Result};
use crate::handlers::payments::find_borrower;
use crate::models::application::LoanApplication;
use crate::models::payment::{Payment, PaymentStatus};
use crate::models::user::{Claims, Role};
use crate::services::notifier::PaymentEvent;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Completed,
    Rejected,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
    pub notes: Option<String>,
}

/// Human-in-the-loop review: the only way a payment leaves pending_review.
/// Completing the payment also advances the loan application past the fee
/// step and emails the borrower.
pub async fn review_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<String>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<Value>> {
    if claims.role != Role::Admin {
        return Err(AppError::Unauthorized);
    }

    let payment_oid = ObjectId::parse_str(&payment_id)?;
    let payments: Collection<Payment> = state.db.collection("payments");

    let payment = payments
        .find_one(doc! { "_id": payment_oid })
        .await?
        .ok_or(AppError::PaymentNotFound)?;

    if payment.status != PaymentStatus::PendingReview {
        return Err(AppError::invalid_data("payment is not pending review"));
    }

    let new_status = match payload.decision {
        ReviewDecision::Completed => "completed",
        ReviewDecision::Rejected => "rejected",
    };

    let applications: Collection<LoanApplication> = state.db.collection("applications");

    let mut session = state.client.start_session().await?;
    session.start_transaction().await?;

    let tx_result = async {
        let mut update = doc! {
            "status": new_status,
            "updated_at": mongodb::bson::DateTime::now(),
        };
        if let Some(notes) = &payload.notes {
            update.insert("notes", notes.clone());
        }

        payments
            .update_one(doc! { "_id": payment_oid }, doc! { "$set": update })
            .session(&mut session)
            .await?;

        if payload.decision == ReviewDecision::Completed {
            // Fee step is step 5; don't move applications that are further along
            applications
                .update_one(
                    doc! {
                        "_id": payment.application_id,
                        "current_step": { "$lte": 5 },
                    },
                    doc! {
                        "$set": {
                            "current_step": 6,
                            "status": "approved",
                        },
                    },
                )
                .session(&mut session)
                .await?;
        }

        Ok::<(), AppError>(())
    }
    .await;

    match tx_result {
        Ok(()) => session.commit_transaction().await?,
        Err(e) => {
            session.abort_transaction().await.ok();
            return Err(e);
        }
    }

    let borrower = find_borrower(&state, payment.user_id).await?;
    let application = applications
        .find_one(doc! { "_id": payment.application_id })
        .await?;
    let reference_number = application
        .map(|a| a.reference_number)
        .unwrap_or_default();

    state.notifier.dispatch(PaymentEvent::PaymentReviewed {
        borrower_email: borrower.email,
        approved: payload.decision == ReviewDecision::Completed,
        amount: payment.amount,
        currency: payment.currency.clone(),
        reference_number,
    });

    Ok(Json(json!({
        "success": true,
        "payment_id": payment_oid.to_hex(),
        "status": new_status,
    })))
}
