use std::collections::BTreeMap;

/// Maps exchange currency codes (e.g. "btc") to market data ids (e.g. "bitcoin").
///
/// Codes are stored lowercase and looked up case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMapping {
    codes: BTreeMap<String, String>,
}

const DEFAULT_ASSETS: &[(&str, &str)] = &[
    ("btc", "bitcoin"),
    ("eth", "ethereum"),
    ("ada", "cardano"),
    ("dot", "polkadot"),
    ("link", "chainlink"),
];

impl Default for AssetMapping {
    fn default() -> Self {
        Self::from_table(
            DEFAULT_ASSETS
                .iter()
                .map(|(code, id)| (code.to_string(), id.to_string())),
        )
    }
}

impl AssetMapping {
    pub fn from_table(table: impl IntoIterator<Item = (String, String)>) -> Self {
        let codes = table
            .into_iter()
            .map(|(code, id)| (code.trim().to_lowercase(), id.trim().to_string()))
            .filter(|(code, id)| !code.is_empty() && !id.is_empty())
            .collect();
        Self { codes }
    }

    pub fn with_asset(mut self, code: &str, market_id: &str) -> Self {
        self.codes
            .insert(code.trim().to_lowercase(), market_id.trim().to_string());
        self
    }

    pub fn market_id(&self, code: &str) -> Option<&str> {
        self.codes.get(&code.trim().to_lowercase()).map(String::as_str)
    }

    /// Every mapped market id, deduplicated, in code order.
    pub fn market_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::with_capacity(self.codes.len());
        for id in self.codes.values() {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.codes.iter().map(|(c, id)| (c.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let mapping = AssetMapping::default();
        assert_eq!(mapping.len(), 5);
        assert_eq!(mapping.market_id("BTC"), Some("bitcoin"));
        assert_eq!(mapping.market_id("link"), Some("chainlink"));
        assert_eq!(mapping.market_id("xrp"), None);
    }

    #[test]
    fn market_ids_are_deduplicated() {
        let mapping = AssetMapping::from_table([
            ("btc".to_string(), "bitcoin".to_string()),
            ("xbt".to_string(), "bitcoin".to_string()),
            ("sol".to_string(), "solana".to_string()),
        ]);
        assert_eq!(mapping.market_ids(), vec!["bitcoin", "solana"]);
    }

    #[test]
    fn blank_entries_are_ignored() {
        let mapping = AssetMapping::from_table([
            (" ".to_string(), "bitcoin".to_string()),
            ("eth".to_string(), "".to_string()),
        ]);
        assert!(mapping.is_empty());

        let mapping = mapping.with_asset(" SOL ", "solana");
        assert_eq!(mapping.market_id("sol"), Some("solana"));
    }
}
