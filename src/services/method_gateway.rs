//! Static per-country payment rail configuration. Pure lookups, no I/O.

use serde::Serialize;

use crate::models::payment::PaymentMethod;

/// Normalize a country code to the two-letter form the config table is
/// keyed by. The legacy system stored both alpha-2 and alpha-3 codes, and
/// UK for Great Britain.
pub fn normalize_country(code: &str) -> String {
    let upper = code.trim().to_ascii_uppercase();
    match upper.as_str() {
        "USA" => "US".to_string(),
        "CAN" => "CA".to_string(),
        "AUS" => "AU".to_string(),
        "GBR" | "UK" => "GB".to_string(),
        _ => upper,
    }
}

/// Rails offered in a country. e-transfer is an Interac product and only
/// exists for Canada; unknown countries fall back to wire + crypto.
pub fn available_methods(country_code: &str) -> Vec<PaymentMethod> {
    match normalize_country(country_code).as_str() {
        "CA" => vec![
            PaymentMethod::WireTransfer,
            PaymentMethod::ETransfer,
            PaymentMethod::Crypto,
        ],
        "US" | "AU" | "GB" => vec![PaymentMethod::WireTransfer, PaymentMethod::Crypto],
        _ => vec![PaymentMethod::WireTransfer, PaymentMethod::Crypto],
    }
}

/// Settlement currency for a country; unknown countries bill in USD.
pub fn currency_for(country_code: &str) -> &'static str {
    match normalize_country(country_code).as_str() {
        "CA" => "CAD",
        "AU" => "AUD",
        "GB" => "GBP",
        _ => "USD",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodConfig {
    pub method: PaymentMethod,
    pub name: &'static str,
    pub processing_time: &'static str,
    pub instructions: &'static str,
    /// Display fields rendered as a key/value table on the payment page.
    pub fields: Vec<(&'static str, &'static str)>,
}

/// Instruction template for one rail. Wire transfer details differ per
/// country; the other rails are global.
pub fn method_config(method: PaymentMethod, country_code: &str) -> MethodConfig {
    match method {
        PaymentMethod::WireTransfer => wire_transfer_config(country_code),
        PaymentMethod::ETransfer => MethodConfig {
            method,
            name: "E-Transfer",
            processing_time: "15-30 minutes",
            instructions: "Send an Interac e-Transfer to the address below and \
                           include your reference number in the message field.",
            fields: vec![
                ("email", "payments@loanflow.example"),
                ("security_question", "What is the name of our company?"),
                ("security_answer", "LoanFlow"),
            ],
        },
        PaymentMethod::Crypto => MethodConfig {
            method,
            name: "Cryptocurrency",
            processing_time: "1-2 hours",
            instructions: "Send the exact amount to one of the wallet addresses \
                           below, then submit the transaction hash with your \
                           payment confirmation.",
            fields: vec![
                ("bitcoin_address", "1LoanFlowBitcoinAddressExample123456"),
                ("ethereum_address", "0xLoanFlowEthereumAddressExample123456789"),
                ("usdt_address", "0xLoanFlowUSDTAddressExample123456789"),
                ("usdt_network", "Ethereum Network (ERC-20)"),
            ],
        },
    }
}

fn wire_transfer_config(country_code: &str) -> MethodConfig {
    let fields = match normalize_country(country_code).as_str() {
        "CA" => vec![
            ("bank_name", "LoanFlow Bank Canada"),
            ("account_name", "LoanFlow Inc."),
            ("account_number", "9876543210"),
            ("institution_number", "001"),
            ("transit_number", "12345"),
            ("swift_code", "LOANFLCA33"),
        ],
        "GB" => vec![
            ("bank_name", "LoanFlow Bank UK"),
            ("account_name", "LoanFlow Ltd."),
            ("account_number", "12345678"),
            ("sort_code", "12-34-56"),
            ("swift_code", "LOANFLGB33"),
        ],
        "AU" => vec![
            ("bank_name", "LoanFlow Bank Australia"),
            ("account_name", "LoanFlow Pty Ltd."),
            ("account_number", "987654321"),
            ("bsb", "123-456"),
            ("swift_code", "LOANFLAU33"),
        ],
        // US details double as the fallback for unknown countries
        _ => vec![
            ("bank_name", "LoanFlow Bank USA"),
            ("account_name", "LoanFlow Inc."),
            ("account_number", "1234567890"),
            ("routing_number", "021000021"),
            ("swift_code", "LOANFLUS33"),
        ],
    };

    MethodConfig {
        method: PaymentMethod::WireTransfer,
        name: "Wire Transfer",
        processing_time: "1-3 business days",
        instructions: "Wire the exact amount to the account below and quote \
                       your reference number in the wire memo.",
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canada_gets_e_transfer() {
        assert!(available_methods("CA").contains(&PaymentMethod::ETransfer));
        assert!(available_methods("CAN").contains(&PaymentMethod::ETransfer));
        assert!(available_methods("ca").contains(&PaymentMethod::ETransfer));
    }

    #[test]
    fn us_never_gets_e_transfer() {
        for code in ["US", "USA", "us"] {
            assert!(!available_methods(code).contains(&PaymentMethod::ETransfer));
        }
    }

    #[test]
    fn great_britain_gets_wire_and_crypto_only() {
        for code in ["GB", "UK", "GBR"] {
            assert_eq!(
                available_methods(code),
                vec![PaymentMethod::WireTransfer, PaymentMethod::Crypto]
            );
        }
    }

    #[test]
    fn unknown_country_falls_back_to_wire_and_crypto() {
        assert_eq!(
            available_methods("DE"),
            vec![PaymentMethod::WireTransfer, PaymentMethod::Crypto]
        );
        assert_eq!(
            available_methods(""),
            vec![PaymentMethod::WireTransfer, PaymentMethod::Crypto]
        );
    }

    #[test]
    fn method_config_is_idempotent() {
        for method in [
            PaymentMethod::WireTransfer,
            PaymentMethod::ETransfer,
            PaymentMethod::Crypto,
        ] {
            assert_eq!(method_config(method, "CA"), method_config(method, "CA"));
        }
    }

    #[test]
    fn wire_details_vary_by_country() {
        let us = method_config(PaymentMethod::WireTransfer, "US");
        let ca = method_config(PaymentMethod::WireTransfer, "CA");
        assert_ne!(us.fields, ca.fields);

        // unknown countries reuse the US account
        let fallback = method_config(PaymentMethod::WireTransfer, "FR");
        assert_eq!(us.fields, fallback.fields);
    }

    #[test]
    fn currencies_follow_country() {
        assert_eq!(currency_for("CA"), "CAD");
        assert_eq!(currency_for("UK"), "GBP");
        assert_eq!(currency_for("NZ"), "USD");
    }

    #[test]
    fn country_normalization() {
        assert_eq!(normalize_country(" uk "), "GB");
        assert_eq!(normalize_country("usa"), "US");
        assert_eq!(normalize_country("JP"), "JP");
    }
}
