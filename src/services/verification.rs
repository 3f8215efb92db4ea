//! Pluggable verification hook for borrower-submitted transaction
//! references. The default implementation is a shape check only; it does
//! not talk to any chain or bank. Swap in a real verifier behind the same
//! trait without touching the intake handler.

use async_trait::async_trait;

use crate::models::payment::PaymentMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationOutcome {
    pub valid: bool,
    pub reason: Option<String>,
}

impl VerificationOutcome {
    pub fn valid() -> Self {
        VerificationOutcome { valid: true, reason: None }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        VerificationOutcome { valid: false, reason: Some(reason.into()) }
    }
}

#[async_trait]
pub trait ReceiptVerifier: Send + Sync {
    async fn verify(&self, method: PaymentMethod, reference: &str) -> VerificationOutcome;
}

/// Default verifier: crypto references must look like a transaction hash
/// (hex, at least 40 characters, optional 0x prefix). Other rails pass
/// through; their references are reconciled manually by admins.
pub struct ShapeCheckVerifier;

impl ShapeCheckVerifier {
    fn is_hash_like(reference: &str) -> bool {
        let trimmed = reference.trim();
        let hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        hex.len() >= 40 && hex.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[async_trait]
impl ReceiptVerifier for ShapeCheckVerifier {
    async fn verify(&self, method: PaymentMethod, reference: &str) -> VerificationOutcome {
        match method {
            PaymentMethod::Crypto => {
                if Self::is_hash_like(reference) {
                    VerificationOutcome::valid()
                } else {
                    VerificationOutcome::invalid(
                        "transaction hash must be a hex string of at least 40 characters",
                    )
                }
            }
            PaymentMethod::WireTransfer | PaymentMethod::ETransfer => VerificationOutcome::valid(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BTC_TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";
    const ETH_TXID: &str = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";

    #[tokio::test]
    async fn accepts_plausible_transaction_hashes() {
        let verifier = ShapeCheckVerifier;
        assert!(verifier.verify(PaymentMethod::Crypto, BTC_TXID).await.valid);
        assert!(verifier.verify(PaymentMethod::Crypto, ETH_TXID).await.valid);
    }

    #[tokio::test]
    async fn rejects_short_or_non_hex_references() {
        let verifier = ShapeCheckVerifier;

        let short = verifier.verify(PaymentMethod::Crypto, "0xabc123").await;
        assert!(!short.valid);
        assert!(short.reason.is_some());

        let non_hex = verifier
            .verify(PaymentMethod::Crypto, "zzzz1e4baab89f3a32518a88c31bc87f618f76673e2cc77a")
            .await;
        assert!(!non_hex.valid);
    }

    #[tokio::test]
    async fn non_crypto_rails_pass_through() {
        let verifier = ShapeCheckVerifier;
        assert!(verifier.verify(PaymentMethod::WireTransfer, "WT-1").await.valid);
        assert!(verifier.verify(PaymentMethod::ETransfer, "ET-1").await.valid);
    }
}
