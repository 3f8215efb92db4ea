use axum::{
    extract::{Extension, Multipart, Path, State},
    response::Json,
};
use bytes::Bytes;
use chrono::Utc;
use mongodb::Collection;
use mongodb::bson::{doc, oid::ObjectId};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config::MAX_RECEIPT_BYTES;
use crate::errors::{AppError, Result};
use crate::handlers::payments::{claims_object_id, find_borrower};
use crate::models::confirmation::{ConfirmationFields, ConfirmationResponse, PaymentConfirmation};
use crate::models::payment::Payment;
use crate::models::user::Claims;
use crate::services::notifier::PaymentEvent;
use crate::state::AppState;

/// Receipt uploads are limited to formats admins can open during review.
const ALLOWED_RECEIPT_EXTENSIONS: [&str; 4] = ["jpg", "png", "gif", "pdf"];

/// Borrower submits proof of payment. Field validation failures come back
/// inline for the borrower to correct; a storage failure is generic and the
/// submission is not retried. On success the payment moves to pending
/// review and the admin inbox is notified.
pub async fn submit_confirmation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(payment_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let user_id = claims_object_id(&claims)?;
    let payment_oid = ObjectId::parse_str(&payment_id)?;

    let payments: Collection<Payment> = state.db.collection("payments");
    let payment = payments
        .find_one(doc! { "_id": payment_oid, "user_id": user_id })
        .await?
        .ok_or(AppError::PaymentNotFound)?;

    if !payment.status.accepts_confirmation() {
        return Err(AppError::invalid_data(
            "this payment is not awaiting a confirmation",
        ));
    }

    // fetched up front so nothing after the commit can fail except the
    // fire-and-forget dispatch
    let borrower = find_borrower(&state, user_id).await?;

    let mut fields = ConfirmationFields::default();
    let mut receipt: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Multipart(e.to_string()))?
    {
        match field.name().unwrap_or("") {
            "reference_number" => {
                fields.reference_number = field.text().await?.trim().to_string();
            }
            "transaction_date" => {
                fields.transaction_date = field.text().await?.trim().to_string();
            }
            "confirmation_details" => {
                let text = field.text().await?.trim().to_string();
                if !text.is_empty() {
                    fields.notes = Some(text);
                }
            }
            "confirmation_image" => {
                let file_name = field.file_name().unwrap_or("receipt").to_string();
                let data = field.bytes().await?;
                if !data.is_empty() {
                    receipt = Some((sanitize_filename::sanitize(&file_name), data));
                }
            }
            _ => {}
        }
    }

    let transaction_date = fields.validate_against(Utc::now().date_naive())?;

    // Pluggable verification hook; the default is a shape check only.
    let outcome = state
        .verifier
        .verify(payment.method, &fields.reference_number)
        .await;
    if !outcome.valid {
        return Err(AppError::invalid_data(
            outcome.reason.unwrap_or_else(|| "transaction reference failed verification".to_string()),
        ));
    }

    let receipt_file = match receipt {
        Some((name, data)) => Some(store_receipt(&state, &name, data).await?),
        None => None,
    };

    let confirmation = PaymentConfirmation {
        _id: Some(ObjectId::new()),
        payment_id: payment_oid,
        user_id,
        reference_number: fields.reference_number.clone(),
        transaction_date,
        receipt_file: receipt_file.clone(),
        notes: fields.notes.clone(),
        submitted_at: Utc::now(),
    };

    let confirmations: Collection<PaymentConfirmation> =
        state.db.collection("payment_confirmations");

    let mut session = state.client.start_session().await?;
    session.start_transaction().await?;

    let tx_result = async {
        confirmations
            .insert_one(&confirmation)
            .session(&mut session)
            .await?;

        payments
            .update_one(
                doc! { "_id": payment_oid },
                doc! {
                    "$set": {
                        "status": "pending_review",
                        "updated_at": mongodb::bson::DateTime::now(),
                    },
                },
            )
            .session(&mut session)
            .await?;

        Ok::<(), AppError>(())
    }
    .await;

    match tx_result {
        Ok(()) => session.commit_transaction().await?,
        Err(e) => {
            session.abort_transaction().await.ok();
            // best effort: don't leave an orphaned receipt behind
            if let Some(file) = &receipt_file {
                let path = format!("{}/{}", state.config.upload_dir, file);
                tokio::fs::remove_file(path).await.ok();
            }
            return Err(e);
        }
    }

    state.notifier.dispatch(PaymentEvent::ConfirmationSubmitted {
        borrower_name: format!("{} {}", borrower.first_name, borrower.last_name),
        payment_id: payment_oid.to_hex(),
        reference_number: fields.reference_number,
        transaction_date: transaction_date.to_string(),
    });

    Ok(Json(json!({
        "success": true,
        "message": "confirmation submitted, pending admin review",
        "confirmation": ConfirmationResponse::from(&confirmation),
    })))
}

/// Size and type gate for uploaded receipts. Type is sniffed from the file
/// content, not the client-supplied name; returns the canonical extension.
fn validate_receipt(data: &[u8]) -> Result<&'static str> {
    if data.len() > MAX_RECEIPT_BYTES {
        return Err(AppError::ReceiptTooLarge);
    }

    infer::get(data)
        .map(|kind| kind.extension())
        .filter(|ext| ALLOWED_RECEIPT_EXTENSIONS.contains(ext))
        .ok_or(AppError::UnsupportedReceiptType)
}

/// Persist an uploaded receipt under a uuid name.
async fn store_receipt(state: &AppState, original_name: &str, data: Bytes) -> Result<String> {
    let extension = validate_receipt(&data)?;

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    let path = format!("{}/{}", state.config.upload_dir, file_name);

    tokio::fs::write(&path, &data).await?;
    tracing::info!("stored receipt {} ({} bytes, from {})", file_name, data.len(), original_name);

    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_HEADER: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
    const GIF_HEADER: &[u8] = b"GIF89a";
    const PDF_HEADER: &[u8] = b"%PDF-1.4";
    const ZIP_HEADER: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

    fn padded(header: &[u8]) -> Vec<u8> {
        let mut data = header.to_vec();
        data.resize(64, 0);
        data
    }

    #[test]
    fn accepts_the_allowed_receipt_formats() {
        assert_eq!(validate_receipt(&padded(&PNG_HEADER)).unwrap(), "png");
        assert_eq!(validate_receipt(&padded(&JPEG_HEADER)).unwrap(), "jpg");
        assert_eq!(validate_receipt(&padded(GIF_HEADER)).unwrap(), "gif");
        assert_eq!(validate_receipt(&padded(PDF_HEADER)).unwrap(), "pdf");
    }

    #[test]
    fn rejects_disallowed_file_types() {
        let err = validate_receipt(&padded(&ZIP_HEADER)).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedReceiptType));

        // unidentifiable bytes are rejected too
        let err = validate_receipt(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, AppError::UnsupportedReceiptType));
    }

    #[test]
    fn rejects_receipts_over_the_size_limit() {
        let mut data = padded(&PNG_HEADER);
        data.resize(MAX_RECEIPT_BYTES + 1, 0);
        let err = validate_receipt(&data).unwrap_err();
        assert!(matches!(err, AppError::ReceiptTooLarge));

        // exactly at the limit is fine
        data.truncate(MAX_RECEIPT_BYTES);
        assert_eq!(validate_receipt(&data).unwrap(), "png");
    }
}
