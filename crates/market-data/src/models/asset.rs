//! Normalized market data record for a single asset.

use serde::{Deserialize, Serialize};

/// One row of market data for a tradable asset.
///
/// `symbol` is canonicalized to uppercase and is the primary key wherever
/// records are stored. Every numeric field is optional: `None` means the
/// value is unknown, which is not the same as `0.0`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Opaque identifier assigned by the upstream source (e.g. "bitcoin").
    pub id: String,
    /// Uppercase ticker (e.g. "BTC").
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Logo URL.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub market_cap_rank: Option<i64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub high_24h: Option<f64>,
    #[serde(default)]
    pub low_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default, alias = "price_change_percentage_7d_in_currency")]
    pub price_change_percentage_7d: Option<f64>,
    /// All-time high.
    #[serde(default)]
    pub ath: Option<f64>,
    /// All-time low.
    #[serde(default)]
    pub atl: Option<f64>,
    /// Upstream timestamp, passed through unmodified.
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl AssetRecord {
    /// Create a record with only the identifying fields set.
    pub fn new(id: impl Into<String>, symbol: impl AsRef<str>) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.as_ref().to_uppercase(),
            ..Self::default()
        }
    }

    /// Builder-style setter for the 24h trading volume.
    pub fn with_volume(mut self, total_volume: f64) -> Self {
        self.total_volume = Some(total_volume);
        self
    }

    /// Builder-style setter for the current price.
    pub fn with_price(mut self, current_price: f64) -> Self {
        self.current_price = Some(current_price);
        self
    }

    /// Builder-style setter for the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Trading volume used for ranking; unknown volume ranks as zero.
    pub fn volume_or_zero(&self) -> f64 {
        self.total_volume.unwrap_or(0.0)
    }

    /// A record can be stored only if both identifying fields are present.
    pub fn is_valid(&self) -> bool {
        !self.id.trim().is_empty() && !self.symbol.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uppercases_symbol() {
        let record = AssetRecord::new("bitcoin", "btc");
        assert_eq!(record.symbol, "BTC");
        assert_eq!(record.id, "bitcoin");
        assert!(record.is_valid());
    }

    #[test]
    fn test_volume_or_zero() {
        let record = AssetRecord::new("bitcoin", "BTC");
        assert_eq!(record.volume_or_zero(), 0.0);
        assert_eq!(record.with_volume(12.5).volume_or_zero(), 12.5);
    }

    #[test]
    fn test_is_valid_requires_id_and_symbol() {
        assert!(!AssetRecord::new("", "BTC").is_valid());
        assert!(!AssetRecord::new("bitcoin", "").is_valid());
    }

    #[test]
    fn test_serializes_unknown_values_as_null() {
        let record = AssetRecord::new("bitcoin", "BTC").with_price(50000.0);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["current_price"], serde_json::json!(50000.0));
        assert!(json["total_volume"].is_null());
        assert!(json.get("price_change_percentage_7d").is_some());
    }

    #[test]
    fn test_deserializes_upstream_7d_field_name() {
        let json = serde_json::json!({
            "id": "ethereum",
            "symbol": "ETH",
            "price_change_percentage_7d_in_currency": -3.5
        });
        let record: AssetRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.price_change_percentage_7d, Some(-3.5));
        assert_eq!(record.name, None);
    }
}
