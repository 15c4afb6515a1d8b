//! Provider detection from receipt keywords.

use std::collections::BTreeSet;

use regex::Regex;

use crate::models::receipt::Provider;

use super::rules::JoinedLines;
use super::rules::patterns::{
    GCASH_DETAILS_HEADING, GCASH_TRANSFER_FROM, PROVIDER_BDO, PROVIDER_GCASH, PROVIDER_MAYA,
};

/// One keyword check, evaluated in priority order.
struct KeywordSet {
    provider: Provider,
    /// Every pattern must match somewhere in the text.
    patterns: Vec<&'static Regex>,
}

/// Priority order of keyword checks.
///
/// BDO Pay receipts name GCash as the recipient ("G-Xchange, Inc. / Gcash"),
/// so BDO is checked first. The last entry recognizes the GCash
/// "Transaction Details" screen, which never spells out the brand.
fn keyword_sets() -> [KeywordSet; 4] {
    [
        KeywordSet {
            provider: Provider::Bdo,
            patterns: vec![&*PROVIDER_BDO],
        },
        KeywordSet {
            provider: Provider::Gcash,
            patterns: vec![&*PROVIDER_GCASH],
        },
        KeywordSet {
            provider: Provider::Paymaya,
            patterns: vec![&*PROVIDER_MAYA],
        },
        KeywordSet {
            provider: Provider::Gcash,
            patterns: vec![&*GCASH_DETAILS_HEADING, &*GCASH_TRANSFER_FROM],
        },
    ]
}

/// A detected provider and the lines that named it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub provider: Provider,
    pub lines: BTreeSet<usize>,
}

/// Detects the payment provider from OCR lines.
///
/// Brand names only count as whole words, so a recipient such as
/// "ABDON CRUZ" or "Amaya" does not name a provider.
#[derive(Debug, Clone, Default)]
pub struct ProviderClassifier;

impl ProviderClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify the lines; `None` when no keyword set matches.
    pub fn classify(&self, lines: &[&str]) -> Option<Classification> {
        let joined = JoinedLines::new(lines);
        let text = joined.text();

        let set = keyword_sets()
            .into_iter()
            .find(|set| set.patterns.iter().all(|p| p.is_match(text)))?;

        let evidence = set
            .patterns
            .iter()
            .flat_map(|p| p.find_iter(text))
            .flat_map(|m| joined.lines_in(m.start(), m.end()))
            .collect();

        Some(Classification {
            provider: set.provider,
            lines: evidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(lines: &[&str]) -> Option<Provider> {
        ProviderClassifier::new().classify(lines).map(|c| c.provider)
    }

    #[test]
    fn test_detect_gcash() {
        assert_eq!(classify(&["Express Send", "Sent via GCash", "Amount 100.00"]), Some(Provider::Gcash));
        assert_eq!(classify(&["G-Xchange, Inc."]), Some(Provider::Gcash));
    }

    #[test]
    fn test_detect_paymaya() {
        assert_eq!(classify(&["Maya", "Transaction Successful", "Amount 200.00"]), Some(Provider::Paymaya));
        assert_eq!(classify(&["PayMaya Philippines"]), Some(Provider::Paymaya));
    }

    #[test]
    fn test_detect_bdo_before_gcash() {
        let lines = ["Sent!", "PHP 330.00", "G-Xchange, Inc. / Gcash", "Thank you for using", "BDO pay"];
        assert_eq!(classify(&lines), Some(Provider::Bdo));
    }

    #[test]
    fn test_transaction_details_screen() {
        let lines = ["Transaction Details", "Transfer from", "09171234567"];
        let classification = ProviderClassifier::new().classify(&lines).unwrap();
        assert_eq!(classification.provider, Provider::Gcash);
        assert_eq!(classification.lines.into_iter().collect::<Vec<_>>(), vec![0, 1]);

        assert_eq!(classify(&["Transaction Details"]), None);
    }

    #[test]
    fn test_brand_inside_a_name_is_ignored() {
        let lines = [
            "Express Send",
            "ABDON CRUZ",
            "Sent via GCash",
            "Amount 320.00",
            "Ref No. 7037516197197",
        ];
        assert_eq!(classify(&lines), Some(Provider::Gcash));

        assert_eq!(classify(&["Sent via GCash", "To AMAYA REYES"]), Some(Provider::Gcash));
        assert_eq!(classify(&["Cabdoy Store", "Thank you"]), None);
    }

    #[test]
    fn test_bdopay_token() {
        assert_eq!(classify(&["Paid with BDOPay"]), Some(Provider::Bdo));
    }

    #[test]
    fn test_unknown_provider() {
        assert_eq!(classify(&["Some random text", "No payment provider here"]), None);
        assert_eq!(classify(&["cats", "funny", "meme"]), None);
        assert_eq!(classify(&[]), None);
    }

    #[test]
    fn test_evidence_lines() {
        let classification = ProviderClassifier::new()
            .classify(&["GCash", "Ref No. 1", "Sent via GCash"])
            .unwrap();
        assert_eq!(classification.lines.into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }
}
