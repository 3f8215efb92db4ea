//! Fire-and-forget email notifications for payment state changes. A send
//! failure is logged and never surfaced to the borrower; there is no queue
//! and no retry in this workflow.

use std::sync::Arc;

use tracing::warn;

use crate::services::mailer::Mailer;

#[derive(Debug, Clone)]
pub enum PaymentEvent {
    /// Borrower selected a rail; a pending payment now exists.
    PaymentCreated {
        borrower_email: String,
        method: String,
        amount: f64,
        currency: String,
        reference_number: String,
    },
    /// Borrower submitted proof of payment; admin review is needed.
    ConfirmationSubmitted {
        borrower_name: String,
        payment_id: String,
        reference_number: String,
        transaction_date: String,
    },
    /// Admin completed or rejected a payment under review.
    PaymentReviewed {
        borrower_email: String,
        approved: bool,
        amount: f64,
        currency: String,
        reference_number: String,
    },
}

impl PaymentEvent {
    fn subject(&self) -> String {
        match self {
            PaymentEvent::PaymentCreated { .. } => "LoanFlow: payment instructions".to_string(),
            PaymentEvent::ConfirmationSubmitted { payment_id, .. } => {
                format!("Payment confirmation submitted ({})", payment_id)
            }
            PaymentEvent::PaymentReviewed { approved: true, .. } => {
                "LoanFlow: payment confirmed".to_string()
            }
            PaymentEvent::PaymentReviewed { approved: false, .. } => {
                "LoanFlow: payment could not be confirmed".to_string()
            }
        }
    }

    fn body(&self) -> String {
        match self {
            PaymentEvent::PaymentCreated { method, amount, currency, reference_number, .. } => {
                format!(
                    "Your processing fee of {:.2} {} is ready to pay by {}.\n\
                     Quote reference {} when sending the payment, then submit \
                     your confirmation from the payments page.",
                    amount, currency, method, reference_number
                )
            }
            PaymentEvent::ConfirmationSubmitted {
                borrower_name,
                payment_id,
                reference_number,
                transaction_date,
            } => {
                format!(
                    "{} submitted a payment confirmation.\n\
                     Payment: {}\nReference: {}\nTransaction date: {}\n\n\
                     Review it in the admin panel.",
                    borrower_name, payment_id, reference_number, transaction_date
                )
            }
            PaymentEvent::PaymentReviewed { approved, amount, currency, reference_number, .. } => {
                if *approved {
                    format!(
                        "Your payment of {:.2} {} (reference {}) has been confirmed. \
                         Your application is moving to the next step.",
                        amount, currency, reference_number
                    )
                } else {
                    format!(
                        "We could not confirm your payment (reference {}). \
                         Please contact support or submit a new confirmation.",
                        reference_number
                    )
                }
            }
        }
    }

    /// Admin events go to the configured admin inbox; borrower events go to
    /// the borrower.
    fn recipient<'a>(&'a self, admin_email: &'a str) -> &'a str {
        match self {
            PaymentEvent::PaymentCreated { borrower_email, .. } => borrower_email,
            PaymentEvent::ConfirmationSubmitted { .. } => admin_email,
            PaymentEvent::PaymentReviewed { borrower_email, .. } => borrower_email,
        }
    }
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Option<Arc<Mailer>>,
    admin_email: String,
}

impl Notifier {
    pub fn new(mailer: Option<Arc<Mailer>>, admin_email: String) -> Self {
        Self { mailer, admin_email }
    }

    /// Dispatch an event without blocking the request. Errors are logged
    /// only; the caller has already committed its state change.
    pub fn dispatch(&self, event: PaymentEvent) {
        let Some(mailer) = self.mailer.clone() else {
            warn!("mailer disabled, dropping notification: {}", event.subject());
            return;
        };
        let admin_email = self.admin_email.clone();

        tokio::spawn(async move {
            let to = event.recipient(&admin_email).to_string();
            if let Err(e) = mailer.send(&to, &event.subject(), &event.body()).await {
                warn!("failed to send {} to {}: {}", event.subject(), to, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_events_route_to_admin_inbox() {
        let event = PaymentEvent::ConfirmationSubmitted {
            borrower_name: "Jane Doe".to_string(),
            payment_id: "665f1c2e9b1d8c3a4e5f6a7b".to_string(),
            reference_number: "TX-1002".to_string(),
            transaction_date: "2025-06-14".to_string(),
        };
        assert_eq!(event.recipient("ops@loanflow.example"), "ops@loanflow.example");
    }

    #[test]
    fn borrower_events_route_to_borrower() {
        let event = PaymentEvent::PaymentCreated {
            borrower_email: "jane@example.com".to_string(),
            method: "wire_transfer".to_string(),
            amount: 200.0,
            currency: "USD".to_string(),
            reference_number: "LF-2025-0001".to_string(),
        };
        assert_eq!(event.recipient("ops@loanflow.example"), "jane@example.com");
        assert!(event.body().contains("200.00 USD"));
    }
}
