use serde::de::{Deserializer, Error as _};
use serde::Deserialize;
use serde_json::Value;

/// Account holdings as reported by the exchange.
///
/// The exchange answers with one flat JSON object: a `success` flag next to
/// one decimal string per currency code. Holdings keep the document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawBalance {
    pub success: bool,
    pub holdings: Vec<(String, String)>,
}

impl RawBalance {
    pub fn new(success: bool) -> Self {
        Self {
            success,
            holdings: Vec::new(),
        }
    }

    pub fn with_holding(mut self, code: impl Into<String>, amount: impl Into<String>) -> Self {
        self.holdings.push((code.into(), amount.into()));
        self
    }

    /// Raw amount string for a currency code (case-insensitive).
    pub fn amount_of(&self, code: &str) -> Option<&str> {
        self.holdings
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(code))
            .map(|(_, amount)| amount.as_str())
    }
}

impl<'de> Deserialize<'de> for RawBalance {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Value::Object(map) = Value::deserialize(deserializer)? else {
            return Err(D::Error::custom("balance response must be a JSON object"));
        };

        let mut balance = RawBalance::default();
        for (key, value) in map {
            match (key.as_str(), value) {
                ("success", Value::Bool(flag)) => balance.success = flag,
                ("success", _) => {}
                (_, Value::String(amount)) => balance.holdings.push((key, amount)),
                (_, Value::Number(amount)) => balance.holdings.push((key, amount.to_string())),
                // Nested objects and nulls are not holdings.
                _ => {}
            }
        }
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exchange_response_in_document_order() {
        let json = r#"{
            "success": true,
            "jpy": "100000",
            "eth": "2.0",
            "btc": "0.5",
            "btc_reserved": "0.0"
        }"#;

        let balance: RawBalance = serde_json::from_str(json).unwrap();
        assert!(balance.success);
        let codes: Vec<&str> = balance.holdings.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(codes, vec!["jpy", "eth", "btc", "btc_reserved"]);
        assert_eq!(balance.amount_of("BTC"), Some("0.5"));
    }

    #[test]
    fn numeric_amounts_become_strings_and_other_values_are_ignored() {
        let json = r#"{"success": false, "btc": 0.25, "meta": {"x": 1}, "eth": null}"#;
        let balance: RawBalance = serde_json::from_str(json).unwrap();
        assert!(!balance.success);
        assert_eq!(balance.holdings, vec![("btc".to_string(), "0.25".to_string())]);
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(serde_json::from_str::<RawBalance>("[1, 2]").is_err());
    }
}
