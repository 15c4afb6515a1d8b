//! Receipt-to-history matching.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::models::receipt::ReceiptFields;

use super::statement::HistoryTransaction;

/// Date-time layouts seen on receipts and statements.
const DATE_TIME_FORMATS: &[&str] = &[
    "%b %d, %Y %I:%M %p",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y %H:%M",
    "%b %d %Y %I:%M %p",
    "%b %d, %Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%m/%d/%Y", "%Y-%m-%d"];

/// Outcome of checking one receipt against the history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Found in the history.
    Matched,
    /// Partially found: reference matches with another amount, or the
    /// amount is ambiguous.
    Mismatch,
    NotFound,
    /// The receipt itself could not be read.
    Error,
}

/// Reference, amount and time as shown in a verification result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub amount: Option<String>,
    pub time: Option<String>,
}

impl From<&ReceiptFields> for FieldSummary {
    fn from(fields: &ReceiptFields) -> Self {
        Self {
            reference: fields.transaction_id.clone(),
            amount: fields.amount.clone(),
            time: fields.time.clone(),
        }
    }
}

impl From<&HistoryTransaction> for FieldSummary {
    fn from(txn: &HistoryTransaction) -> Self {
        Self {
            reference: txn.ref_number.clone(),
            amount: txn.amount.clone(),
            time: txn.date_time.clone(),
        }
    }
}

/// Verification result for one receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub filename: String,
    pub verdict: Verdict,
    /// Human-readable explanation.
    pub details: String,
    pub receipt: Option<FieldSummary>,
    pub history_match: Option<FieldSummary>,
}

impl MatchResult {
    /// Result for a receipt whose OCR or parsing failed.
    pub fn error(filename: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            verdict: Verdict::Error,
            details: details.into(),
            receipt: None,
            history_match: None,
        }
    }
}

/// Largest accepted time tolerance: one week.
pub const MAX_TOLERANCE_MINUTES: i64 = 7 * 24 * 60;

/// Matches receipts against history transactions.
///
/// Strategies, in order: equal reference (then the amount decides between
/// matched and mismatch), equal amount with times within the tolerance,
/// and finally a unique equal amount.
#[derive(Debug, Clone)]
pub struct HistoryMatcher {
    tolerance: Duration,
}

impl HistoryMatcher {
    /// The tolerance is clamped to `0..=MAX_TOLERANCE_MINUTES`.
    pub fn new(tolerance_minutes: i64) -> Self {
        let clamped = tolerance_minutes.clamp(0, MAX_TOLERANCE_MINUTES);
        if clamped != tolerance_minutes {
            warn!(
                "Time tolerance of {} min is out of range, using {} min",
                tolerance_minutes, clamped
            );
        }
        Self {
            tolerance: Duration::minutes(clamped),
        }
    }

    pub fn tolerance_minutes(&self) -> i64 {
        self.tolerance.num_minutes()
    }

    /// Match one receipt.
    pub fn match_receipt(
        &self,
        filename: &str,
        receipt: &ReceiptFields,
        history: &[HistoryTransaction],
    ) -> MatchResult {
        let r_ref = receipt.transaction_id.as_deref().and_then(normalize_ref);
        let r_amount = receipt.amount.as_deref().and_then(parse_amount);
        let r_time = receipt.time.as_deref().and_then(parse_time);

        let result = |verdict: Verdict, details: String, txn: Option<&HistoryTransaction>| MatchResult {
            filename: filename.to_string(),
            verdict,
            details,
            receipt: Some(FieldSummary::from(receipt)),
            history_match: txn.map(FieldSummary::from),
        };

        if let Some(r_ref) = &r_ref {
            let by_ref = history
                .iter()
                .find(|txn| txn.ref_number.as_deref().and_then(normalize_ref).as_ref() == Some(r_ref));

            if let Some(txn) = by_ref {
                let h_amount = txn.amount.as_deref().and_then(parse_amount);
                return match (r_amount, h_amount) {
                    (Some(r), Some(h)) if amounts_equal(r, h) => result(
                        Verdict::Matched,
                        "Reference number and amount match.".to_string(),
                        Some(txn),
                    ),
                    _ => result(
                        Verdict::Mismatch,
                        format!(
                            "Reference number matches but amount differs: receipt={}, history={}",
                            receipt.amount.as_deref().unwrap_or("none"),
                            txn.amount.as_deref().unwrap_or("none"),
                        ),
                        Some(txn),
                    ),
                };
            }
        }

        let Some(r_amount) = r_amount else {
            return result(
                Verdict::NotFound,
                "No matching transaction found in history.".to_string(),
                None,
            );
        };

        let same_amount: Vec<&HistoryTransaction> = history
            .iter()
            .filter(|txn| {
                txn.amount
                    .as_deref()
                    .and_then(parse_amount)
                    .is_some_and(|h| amounts_equal(r_amount, h))
            })
            .collect();

        if let Some(r_time) = r_time {
            let within = same_amount.iter().find(|txn| {
                txn.date_time
                    .as_deref()
                    .and_then(parse_time)
                    .is_some_and(|h| (r_time - h).num_seconds().abs() <= self.tolerance.num_seconds())
            });
            if let Some(txn) = within {
                return result(
                    Verdict::Matched,
                    format!(
                        "Amount and time match (within {} min).",
                        self.tolerance.num_minutes()
                    ),
                    Some(*txn),
                );
            }
        }

        match same_amount.as_slice() {
            [txn] => result(
                Verdict::Matched,
                "Amount matches (unique match). Time/ref could not be verified.".to_string(),
                Some(*txn),
            ),
            [] => result(
                Verdict::NotFound,
                "No matching transaction found in history.".to_string(),
                None,
            ),
            many => result(
                Verdict::Mismatch,
                format!(
                    "Amount {} found {} times in history. Cannot determine unique match without ref number.",
                    receipt.amount.as_deref().unwrap_or_default(),
                    many.len()
                ),
                None,
            ),
        }
    }

    /// Match named receipts, keeping input order.
    pub fn verify(
        &self,
        receipts: &[(String, ReceiptFields)],
        history: &[HistoryTransaction],
    ) -> Vec<MatchResult> {
        receipts
            .iter()
            .map(|(filename, fields)| {
                let m = self.match_receipt(filename, fields, history);
                debug!("{}: {:?}", filename, m.verdict);
                m
            })
            .collect()
    }
}

impl Default for HistoryMatcher {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Strip spaces and dashes and lowercase.
fn normalize_ref(reference: &str) -> Option<String> {
    let normalized: String = reference
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();
    (!normalized.is_empty()).then_some(normalized)
}

fn parse_amount(amount: &str) -> Option<Decimal> {
    Decimal::from_str(&amount.replace(',', "")).ok()
}

fn amounts_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < Decimal::new(1, 2)
}

/// Parse a receipt or statement timestamp; date-only values get midnight.
pub fn parse_time(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Direction;
    use pretty_assertions::assert_eq;

    fn txn(reference: Option<&str>, amount: &str, time: &str) -> HistoryTransaction {
        HistoryTransaction {
            date_time: Some(time.to_string()),
            ref_number: reference.map(String::from),
            amount: Some(amount.to_string()),
            direction: Direction::Debit,
            ..HistoryTransaction::default()
        }
    }

    fn receipt(reference: Option<&str>, amount: Option<&str>, time: Option<&str>) -> ReceiptFields {
        ReceiptFields {
            transaction_id: reference.map(String::from),
            amount: amount.map(String::from),
            time: time.map(String::from),
        }
    }

    fn history() -> Vec<HistoryTransaction> {
        vec![
            txn(Some("7037247387681"), "420.00", "Jan 28, 2026 7:58 PM"),
            txn(Some("6037260329062"), "120.00", "Jan 29, 2026 10:19 AM"),
            txn(Some("BN-20260128-49830535"), "330.00", "2026-01-28 05:26"),
            txn(None, "50.00", "Feb 1, 2026 8:00 AM"),
            txn(None, "50.00", "Feb 2, 2026 8:00 AM"),
        ]
    }

    fn verdict(r: ReceiptFields) -> MatchResult {
        HistoryMatcher::default().match_receipt("r.png", &r, &history())
    }

    #[test]
    fn test_reference_and_amount_match() {
        let m = verdict(receipt(Some("7037 247 387681"), Some("420.00"), None));
        assert_eq!(m.verdict, Verdict::Matched);
        assert_eq!(m.details, "Reference number and amount match.");
        assert_eq!(m.history_match.unwrap().reference.as_deref(), Some("7037247387681"));
    }

    #[test]
    fn test_reference_normalization_ignores_dashes_and_case() {
        let m = verdict(receipt(Some("bn20260128-49830535"), Some("330.00"), None));
        assert_eq!(m.verdict, Verdict::Matched);
    }

    #[test]
    fn test_reference_with_other_amount() {
        let m = verdict(receipt(Some("7037247387681"), Some("400.00"), None));
        assert_eq!(m.verdict, Verdict::Mismatch);
        assert_eq!(
            m.details,
            "Reference number matches but amount differs: receipt=400.00, history=420.00"
        );
    }

    #[test]
    fn test_out_of_range_tolerance_is_clamped() {
        assert_eq!(HistoryMatcher::new(i64::MAX).tolerance_minutes(), MAX_TOLERANCE_MINUTES);
        assert_eq!(HistoryMatcher::new(i64::MIN).tolerance_minutes(), 0);
        assert_eq!(HistoryMatcher::new(-5).tolerance_minutes(), 0);
        assert_eq!(HistoryMatcher::new(10).tolerance_minutes(), 10);
    }

    #[test]
    fn test_amount_and_time_within_tolerance() {
        let m = verdict(receipt(None, Some("120.00"), Some("Jan 29, 2026 10:25 AM")));
        assert_eq!(m.verdict, Verdict::Matched);
        assert_eq!(m.details, "Amount and time match (within 10 min).");
    }

    #[test]
    fn test_time_mixed_formats() {
        let m = verdict(receipt(Some("999"), Some("330.00"), Some("Jan 28, 2026 05:30 AM")));
        assert_eq!(m.verdict, Verdict::Matched);
        assert_eq!(m.details, "Amount and time match (within 10 min).");
    }

    #[test]
    fn test_unique_amount_only() {
        let m = verdict(receipt(None, Some("420"), None));
        assert_eq!(m.verdict, Verdict::Matched);
        assert_eq!(m.details, "Amount matches (unique match). Time/ref could not be verified.");
    }

    #[test]
    fn test_ambiguous_amount() {
        let m = verdict(receipt(None, Some("50.00"), Some("Mar 1, 2026 8:00 AM")));
        assert_eq!(m.verdict, Verdict::Mismatch);
        assert!(m.details.starts_with("Amount 50.00 found 2 times in history."));
        assert_eq!(m.history_match, None);
    }

    #[test]
    fn test_not_found() {
        let m = verdict(receipt(Some("1111111111111"), Some("999.99"), None));
        assert_eq!(m.verdict, Verdict::NotFound);
        assert_eq!(m.details, "No matching transaction found in history.");
        assert_eq!(verdict(ReceiptFields::default()).verdict, Verdict::NotFound);
    }

    #[test]
    fn test_parse_time_formats() {
        let expected = NaiveDate::from_ymd_opt(2026, 1, 28)
            .unwrap()
            .and_hms_opt(19, 58, 0)
            .unwrap();
        for value in [
            "Jan 28, 2026 7:58 PM",
            "Jan 28, 2026 19:58",
            "January 28, 2026 7:58 PM",
            "Jan 28 2026 7:58 PM",
            "01/28/2026 7:58 PM",
            "2026-01-28 19:58",
        ] {
            assert_eq!(parse_time(value), Some(expected), "format {value:?}");
        }

        assert_eq!(
            parse_time("Feb 5, 2026"),
            NaiveDate::from_ymd_opt(2026, 2, 5).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_time("yesterday"), None);
    }

    #[test]
    fn test_verdict_wire_names() {
        assert_eq!(serde_json::to_string(&Verdict::NotFound).unwrap(), "\"not_found\"");
        let summary = serde_json::to_value(FieldSummary::default()).unwrap();
        assert!(summary.get("ref").is_some());
    }
}
