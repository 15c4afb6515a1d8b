//! Transaction history verification.
//!
//! Receipts are cross-checked against the transaction history a user
//! exports from their e-wallet app as a PDF.

mod matcher;
mod statement;

pub use matcher::{parse_time, FieldSummary, HistoryMatcher, MatchResult, Verdict};
pub use statement::{parse_statement, parse_statement_text, Direction, HistoryTransaction};

use serde::{Deserialize, Serialize};

use crate::models::receipt::{ParseResult, ReceiptFields};

/// Verdict counts of a verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub matched: usize,
    pub mismatch: usize,
    pub not_found: usize,
    pub errors: usize,
}

/// Result of verifying a set of receipts against one statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub total_receipts: usize,
    pub history_transactions_found: usize,
    pub summary: VerificationSummary,
    pub results: Vec<MatchResult>,
}

impl VerificationReport {
    /// Tally match results.
    pub fn new(results: Vec<MatchResult>, history_transactions_found: usize) -> Self {
        let mut summary = VerificationSummary::default();
        for result in &results {
            match result.verdict {
                Verdict::Matched => summary.matched += 1,
                Verdict::Mismatch => summary.mismatch += 1,
                Verdict::NotFound => summary.not_found += 1,
                Verdict::Error => summary.errors += 1,
            }
        }

        Self {
            total_receipts: results.len(),
            history_transactions_found,
            summary,
            results,
        }
    }

    /// Verify already extracted receipt fields.
    pub fn from_receipts(
        matcher: &HistoryMatcher,
        receipts: &[(String, ReceiptFields)],
        history: &[HistoryTransaction],
    ) -> Self {
        Self::new(matcher.verify(receipts, history), history.len())
    }

    /// Verify parse results; failed parses are reported with verdict `error`.
    pub fn from_parse_results(
        matcher: &HistoryMatcher,
        parsed: &[ParseResult],
        history: &[HistoryTransaction],
    ) -> Self {
        let results = parsed
            .iter()
            .map(|p| {
                if p.success {
                    matcher.match_receipt(&p.filename, &p.fields(), history)
                } else {
                    MatchResult::error(
                        &p.filename,
                        p.error.as_deref().unwrap_or("OCR failed for this receipt."),
                    )
                }
            })
            .collect();

        Self::new(results, history.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::Provider;

    fn history() -> Vec<HistoryTransaction> {
        vec![HistoryTransaction {
            date_time: Some("Feb 5, 2026 7:23 PM".to_string()),
            ref_number: Some("7037516197197".to_string()),
            amount: Some("320.00".to_string()),
            direction: Direction::Debit,
            ..HistoryTransaction::default()
        }]
    }

    #[test]
    fn test_report_from_parse_results() {
        let ok = ParseResult {
            success: true,
            provider: Some(Provider::Gcash),
            transaction_id: Some("7037516197197".to_string()),
            amount: Some("320.00".to_string()),
            filename: "a.png".to_string(),
            ..ParseResult::default()
        };
        let unknown = ParseResult {
            success: true,
            transaction_id: Some("1234567890123".to_string()),
            amount: Some("77.00".to_string()),
            filename: "b.png".to_string(),
            ..ParseResult::default()
        };
        let failed = ParseResult::failure("c.png", "No text detected in image.");

        let report = VerificationReport::from_parse_results(
            &HistoryMatcher::default(),
            &[ok, unknown, failed],
            &history(),
        );

        assert_eq!(report.total_receipts, 3);
        assert_eq!(report.history_transactions_found, 1);
        assert_eq!(
            report.summary,
            VerificationSummary {
                matched: 1,
                mismatch: 0,
                not_found: 1,
                errors: 1,
            }
        );
        assert_eq!(report.results[2].verdict, Verdict::Error);
        assert_eq!(report.results[2].details, "No text detected in image.");
    }

    #[test]
    fn test_report_json_shape() {
        let report = VerificationReport::from_receipts(
            &HistoryMatcher::default(),
            &[("a.png".to_string(), ReceiptFields::default())],
            &history(),
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["summary"]["not_found"], 1);
        assert_eq!(value["results"][0]["verdict"], "not_found");
        assert!(value["results"][0]["history_match"].is_null());
    }
}
