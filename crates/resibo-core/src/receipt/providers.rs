//! Per-provider extraction rules.
//!
//! Each provider maps to a static [`ProviderRules`] value; unrecognized
//! receipts fall back to the generic set.

use std::collections::BTreeSet;

use crate::models::receipt::{Provider, ReceiptFields};

use super::rules::{
    AmountExtractor, AmountRule, ExtractionMatch, FieldExtractor, ReferenceExtractor,
    ReferenceRule, TimeExtractor, TimeRule,
};

/// Ordered extraction strategies for one receipt layout.
#[derive(Debug)]
pub struct ProviderRules {
    pub reference: &'static [ReferenceRule],
    pub amount: &'static [AmountRule],
    pub time: &'static [TimeRule],
    /// Longest reference number; also the expected unlabeled length.
    pub max_reference_len: usize,
}

const DEFAULT_REFERENCE_RULES: &[ReferenceRule] = &[
    ReferenceRule::AlphanumericLabeled,
    ReferenceRule::NumericLabeled,
    ReferenceRule::AlphanumericAnywhere,
    ReferenceRule::StandaloneDigits,
    ReferenceRule::SpacedDigits,
];

const DEFAULT_AMOUNT_RULES: &[AmountRule] = &[
    AmountRule::TotalSent,
    AmountRule::Headline,
    AmountRule::Labeled,
    AmountRule::CurrencyPrefixed,
    AmountRule::PlainDecimal,
];

const DEFAULT_TIME_RULES: &[TimeRule] = &[TimeRule::MonthName, TimeRule::Numeric];

pub static GCASH_RULES: ProviderRules = ProviderRules {
    reference: &[
        ReferenceRule::NumericLabeled,
        ReferenceRule::StandaloneDigits,
        ReferenceRule::SpacedDigits,
        ReferenceRule::AlphanumericLabeled,
    ],
    amount: DEFAULT_AMOUNT_RULES,
    time: DEFAULT_TIME_RULES,
    max_reference_len: 13,
};

pub static PAYMAYA_RULES: ProviderRules = ProviderRules {
    reference: &[
        ReferenceRule::NumericLabeled,
        ReferenceRule::AlphanumericLabeled,
        ReferenceRule::StandaloneDigits,
        ReferenceRule::SpacedDigits,
    ],
    amount: &[
        AmountRule::TotalSent,
        AmountRule::Labeled,
        AmountRule::CurrencyPrefixed,
        AmountRule::PlainDecimal,
    ],
    time: DEFAULT_TIME_RULES,
    max_reference_len: 12,
};

pub static BDO_RULES: ProviderRules = ProviderRules {
    reference: &[
        ReferenceRule::AlphanumericLabeled,
        ReferenceRule::AlphanumericAnywhere,
        ReferenceRule::NumericLabeled,
        ReferenceRule::StandaloneDigits,
    ],
    amount: &[
        AmountRule::Headline,
        AmountRule::TotalSent,
        AmountRule::Labeled,
        AmountRule::CurrencyPrefixed,
        AmountRule::PlainDecimal,
    ],
    time: DEFAULT_TIME_RULES,
    max_reference_len: 13,
};

/// Used when no provider was recognized.
pub static GENERIC_RULES: ProviderRules = ProviderRules {
    reference: DEFAULT_REFERENCE_RULES,
    amount: DEFAULT_AMOUNT_RULES,
    time: DEFAULT_TIME_RULES,
    max_reference_len: 13,
};

impl ProviderRules {
    /// Rules for a provider, or the generic set.
    pub fn for_provider(provider: Option<Provider>) -> &'static ProviderRules {
        match provider {
            Some(Provider::Gcash) => &GCASH_RULES,
            Some(Provider::Paymaya) => &PAYMAYA_RULES,
            Some(Provider::Bdo) => &BDO_RULES,
            None => &GENERIC_RULES,
        }
    }

    /// Run every field extractor over the lines.
    pub fn extract(&self, lines: &[&str]) -> ExtractedFields {
        ExtractedFields {
            transaction_id: ReferenceExtractor::new(self.reference, self.max_reference_len)
                .extract(lines),
            amount: AmountExtractor::new(self.amount).extract(lines),
            time: TimeExtractor::new(self.time).extract(lines),
        }
    }
}

/// Field matches with their evidence lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFields {
    pub transaction_id: Option<ExtractionMatch<String>>,
    pub amount: Option<ExtractionMatch<String>>,
    pub time: Option<ExtractionMatch<String>>,
}

impl ExtractedFields {
    /// Plain field values.
    pub fn values(&self) -> ReceiptFields {
        ReceiptFields {
            transaction_id: self.transaction_id.as_ref().map(|m| m.value.clone()),
            amount: self.amount.as_ref().map(|m| m.value.clone()),
            time: self.time.as_ref().map(|m| m.value.clone()),
        }
    }

    /// Union of the lines that supplied any field.
    pub fn evidence(&self) -> BTreeSet<usize> {
        [&self.transaction_id, &self.amount, &self.time]
            .into_iter()
            .flatten()
            .flat_map(|m| m.lines.iter().copied())
            .collect()
    }
}
