//! Receipt parse results as returned over the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mobile-payment service a receipt originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// GCash (G-Xchange, Inc.).
    Gcash,
    /// Maya, formerly PayMaya.
    Paymaya,
    /// BDO Pay.
    Bdo,
}

impl Provider {
    /// All known providers.
    pub const ALL: [Provider; 3] = [Provider::Gcash, Provider::Paymaya, Provider::Bdo];

    /// Wire name of the provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Gcash => "gcash",
            Provider::Paymaya => "paymaya",
            Provider::Bdo => "bdo",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three extractable receipt fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptFields {
    /// Reference / transaction number.
    pub transaction_id: Option<String>,
    /// Amount with exactly two decimals, e.g. `"320.00"`.
    pub amount: Option<String>,
    /// Free-text timestamp, e.g. `"Feb 5, 2026 7:23 PM"`.
    pub time: Option<String>,
}

/// Outcome of parsing one receipt image.
///
/// Failures are reported in-band through `success` and `error`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseResult {
    pub success: bool,
    pub provider: Option<Provider>,
    pub transaction_id: Option<String>,
    pub amount: Option<String>,
    pub time: Option<String>,
    /// Mean OCR confidence of the lines used as evidence (0.0 - 1.0).
    pub confidence: f64,
    pub filename: String,
    /// Every OCR line, top to bottom.
    pub raw_text: Vec<String>,
    pub error: Option<String>,
}

impl ParseResult {
    /// A failed result carrying only a filename and an error message.
    pub fn failure(filename: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            filename: filename.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The extracted fields of this result.
    pub fn fields(&self) -> ReceiptFields {
        ReceiptFields {
            transaction_id: self.transaction_id.clone(),
            amount: self.amount.clone(),
            time: self.time.clone(),
        }
    }
}

/// Outcome of parsing a batch of images.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    /// One entry per input, in input order.
    pub results: Vec<ParseResult>,
}

impl BatchResult {
    /// Tally a list of per-image results.
    pub fn from_results(results: Vec<ParseResult>) -> Self {
        let successful = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            results,
        }
    }
}

impl FromIterator<ParseResult> for BatchResult {
    fn from_iter<I: IntoIterator<Item = ParseResult>>(iter: I) -> Self {
        Self::from_results(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_provider_wire_names() {
        assert_eq!(serde_json::to_string(&Provider::Gcash).unwrap(), "\"gcash\"");
        assert_eq!(serde_json::to_string(&Provider::Paymaya).unwrap(), "\"paymaya\"");
        assert_eq!(serde_json::to_string(&Provider::Bdo).unwrap(), "\"bdo\"");
    }

    #[test]
    fn test_parse_result_json_shape() {
        let result = ParseResult::failure("a.png", "Could not identify provider.");
        let value = serde_json::to_value(&result).unwrap();

        for key in [
            "success",
            "provider",
            "transaction_id",
            "amount",
            "time",
            "confidence",
            "filename",
            "raw_text",
            "error",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert!(value["provider"].is_null());
        assert_eq!(value["confidence"], serde_json::json!(0.0));
    }

    #[test]
    fn test_batch_tally() {
        let ok = ParseResult {
            success: true,
            ..ParseResult::default()
        };
        let batch: BatchResult = vec![ok.clone(), ParseResult::failure("b", "x"), ok]
            .into_iter()
            .collect();

        assert_eq!(batch.total, 3);
        assert_eq!(batch.successful, 2);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.results.len(), 3);
    }

    #[test]
    fn test_empty_batch() {
        let batch = BatchResult::from_results(Vec::new());
        assert_eq!(batch, BatchResult::default());
    }
}
