use std::sync::Arc;
use mongodb::{Client, Database};

use crate::config::AppConfig;
use crate::services::notifier::Notifier;
use crate::services::verification::ReceiptVerifier;

#[derive(Clone)]
pub struct AppState {
    /// Kept alongside `db` because multi-document transactions start
    /// sessions on the client.
    pub client: Client,
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub notifier: Notifier,
    pub verifier: Arc<dyn ReceiptVerifier>,
}

impl AppState {
    pub fn new(
        client: Client,
        db: Database,
        config: AppConfig,
        notifier: Notifier,
        verifier: Arc<dyn ReceiptVerifier>,
    ) -> Self {
        AppState {
            client,
            db,
            config: Arc::new(config),
            notifier,
            verifier,
        }
    }
}
