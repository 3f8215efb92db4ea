use reqwest::Client;

use crate::errors::{AppError, Result};

/// Transactional mail client. Posts to an HTTP mail API (Mailgun-style
/// form endpoint); credentials come from the environment.
#[derive(Clone)]
pub struct Mailer {
    api_url: String,
    api_key: String,
    from: String,
    client: Client,
}

impl Mailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: Client::new(),
        }
    }

    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let response = self.client
            .post(&self.api_url)
            .basic_auth("api", Some(&self.api_key))
            .form(&[
                ("from", self.from.as_str()),
                ("to", to),
                ("subject", subject),
                ("text", body),
            ])
            .send()
            .await
            .map_err(|e| AppError::mail(format!("Mail API error: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::mail(format!(
                "Mail sending failed with status: {}",
                response.status()
            )))
        }
    }
}
