//! Builds the final [`ParseResult`] for one receipt.

use crate::error::ExtractionError;
use crate::models::receipt::{ParseResult, Provider, ReceiptFields};

/// Everything known about a receipt once extraction has run.
#[derive(Debug, Clone)]
pub struct Assembly<'a> {
    pub provider: Option<Provider>,
    pub fields: ReceiptFields,
    pub confidence: f64,
    pub filename: &'a str,
    pub raw_text: Vec<String>,
    /// Treat a missing timestamp as a missing field.
    pub require_time: bool,
}

impl Assembly<'_> {
    /// Decide success and produce the wire result.
    pub fn into_result(self) -> ParseResult {
        let error = self.check().err().map(|e| e.to_string());

        ParseResult {
            success: error.is_none(),
            provider: self.provider,
            transaction_id: self.fields.transaction_id,
            amount: self.fields.amount,
            time: self.fields.time,
            confidence: self.confidence,
            filename: self.filename.to_string(),
            raw_text: self.raw_text,
            error,
        }
    }

    fn check(&self) -> Result<(), ExtractionError> {
        if self.raw_text.is_empty() {
            return Err(ExtractionError::NoText);
        }
        if self.provider.is_none() {
            return Err(ExtractionError::UnknownProvider);
        }

        let mut missing = Vec::new();
        if self.fields.transaction_id.is_none() {
            missing.push("transaction_id");
        }
        if self.fields.amount.is_none() {
            missing.push("amount");
        }
        if self.require_time && self.fields.time.is_none() {
            missing.push("time");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ExtractionError::MissingFields(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assembly(provider: Option<Provider>, fields: ReceiptFields) -> Assembly<'static> {
        Assembly {
            provider,
            fields,
            confidence: 0.9,
            filename: "r.png",
            raw_text: vec!["GCash".to_string()],
            require_time: false,
        }
    }

    fn full_fields() -> ReceiptFields {
        ReceiptFields {
            transaction_id: Some("7037516197197".to_string()),
            amount: Some("320.00".to_string()),
            time: None,
        }
    }

    #[test]
    fn test_success_without_time() {
        let result = assembly(Some(Provider::Gcash), full_fields()).into_result();
        assert!(result.success);
        assert_eq!(result.error, None);
        assert_eq!(result.filename, "r.png");
    }

    #[test]
    fn test_require_time() {
        let mut a = assembly(Some(Provider::Gcash), full_fields());
        a.require_time = true;
        let result = a.into_result();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Could not extract required fields: time."));
    }

    #[test]
    fn test_unknown_provider_keeps_fields() {
        let result = assembly(None, full_fields()).into_result();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Could not identify provider."));
        assert_eq!(result.transaction_id.as_deref(), Some("7037516197197"));
    }

    #[test]
    fn test_missing_fields_listed() {
        let result = assembly(Some(Provider::Bdo), ReceiptFields::default()).into_result();
        assert_eq!(
            result.error.as_deref(),
            Some("Could not extract required fields: transaction_id, amount.")
        );
    }

    #[test]
    fn test_no_text() {
        let mut a = assembly(None, ReceiptFields::default());
        a.raw_text.clear();
        a.confidence = 0.0;
        let result = a.into_result();
        assert_eq!(result.error.as_deref(), Some("No text detected in image."));
        assert_eq!(result.confidence, 0.0);
    }
}
