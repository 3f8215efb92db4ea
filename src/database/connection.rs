use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::{Client, Database, IndexModel};

use crate::config::AppConfig;

pub async fn get_db_client(config: &AppConfig) -> (Client, Database) {
    let client = Client::with_uri_str(&config.database_url)
        .await
        .expect("Failed to connect to MongoDB");

    let db = client.database(&config.database_name);

    // Verify database is reachable by listing collections
    match db.list_collection_names().await {
        Ok(collections) => {
            tracing::info!("Connected to database: {}", config.database_name);
            tracing::debug!("Collections found: {:?}", collections);

            if !collections.contains(&"payment_schemes".to_string()) {
                tracing::warn!("'payment_schemes' collection not found; borrowers will see NoSchemeAssigned");
            }
        }
        Err(e) => {
            tracing::error!(
                "Database '{}' may not exist or is inaccessible: {}",
                config.database_name,
                e
            );
        }
    }

    ensure_indexes(&db).await;

    (client, db)
}

async fn ensure_indexes(db: &Database) {
    let payments = db.collection::<mongodb::bson::Document>("payments");
    match payments.create_index(active_payment_index()).await {
        Ok(_) => tracing::info!("Ensured unique active-payment index on payments"),
        Err(e) => tracing::warn!("Failed to create active-payment index: {}", e),
    }
}

/// Partial unique index: at most one payment per application may sit in a
/// non-terminal status. Two racing method selections insert distinct
/// documents, so a transaction alone cannot exclude them; the index makes
/// the second insert fail inside its transaction.
pub fn active_payment_index() -> IndexModel {
    let options = IndexOptions::builder()
        .unique(true)
        .partial_filter_expression(doc! {
            "status": { "$in": ["pending", "processing", "pending_review"] },
        })
        .build();

    IndexModel::builder()
        .keys(doc! { "application_id": 1 })
        .options(options)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payment::PaymentStatus;

    #[test]
    fn active_payment_index_is_unique_per_application() {
        let index = active_payment_index();
        assert_eq!(index.keys, doc! { "application_id": 1 });

        let options = index.options.expect("index options");
        assert_eq!(options.unique, Some(true));
    }

    #[test]
    fn active_payment_index_filters_exactly_the_non_terminal_statuses() {
        let index = active_payment_index();
        let filter = index
            .options
            .expect("index options")
            .partial_filter_expression
            .expect("partial filter");

        let listed: Vec<String> = filter
            .get_document("status")
            .unwrap()
            .get_array("$in")
            .unwrap()
            .iter()
            .map(|s| s.as_str().unwrap().to_string())
            .collect();

        // the filter must track the state machine: every listed status is
        // non-terminal, and every non-terminal status is listed
        for status in &listed {
            let parsed: PaymentStatus = serde_json::from_str(&format!("\"{}\"", status)).unwrap();
            assert!(!parsed.is_terminal(), "{} is terminal but indexed", status);
        }
        for status in ["pending", "processing", "pending_review"] {
            assert!(listed.contains(&status.to_string()), "{} missing from filter", status);
        }
        for status in ["completed", "failed", "rejected", "refunded"] {
            assert!(!listed.contains(&status.to_string()), "{} wrongly in filter", status);
        }
    }
}
