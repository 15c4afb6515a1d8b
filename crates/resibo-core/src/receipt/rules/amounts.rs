//! Amount extraction and normalization.

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

use super::patterns::{
    AMOUNT_CURRENCY_PREFIX, AMOUNT_HEADLINE, AMOUNT_LABELED, AMOUNT_PLAIN, AMOUNT_SUB_LINE,
    AMOUNT_TOTAL_SENT,
};
use super::{ExtractionMatch, FieldExtractor, JoinedLines};

/// Strategies for locating the transaction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountRule {
    /// `Total Amount Sent P320.00`, possibly split across lines.
    TotalSent,
    /// A line reading only `PHP 330.00`, ignoring fee breakdown lines.
    Headline,
    /// `Amount 320.00` or `Amount Php320.00`.
    Labeled,
    /// Any `₱`, `P` or `PHP` prefixed number.
    CurrencyPrefixed,
    /// The first positive `n.nn` value.
    PlainDecimal,
}

impl AmountRule {
    pub fn name(&self) -> &'static str {
        match self {
            AmountRule::TotalSent => "amount.total_sent",
            AmountRule::Headline => "amount.headline",
            AmountRule::Labeled => "amount.labeled",
            AmountRule::CurrencyPrefixed => "amount.currency_prefixed",
            AmountRule::PlainDecimal => "amount.plain_decimal",
        }
    }

    fn apply(&self, lines: &[&str], joined: &JoinedLines) -> Option<ExtractionMatch<String>> {
        let rule = self.name();
        match self {
            AmountRule::TotalSent => {
                let caps = AMOUNT_TOTAL_SENT.captures(joined.text())?;
                let whole = caps.get(0)?;
                let value = normalize_amount(&caps[1])?;
                Some(
                    ExtractionMatch::new(value, rule, whole.as_str())
                        .with_lines(joined.lines_in(whole.start(), whole.end())),
                )
            }
            AmountRule::Headline => main_lines(lines).find_map(|(i, line)| {
                let caps = AMOUNT_HEADLINE.captures(line.trim())?;
                let value = normalize_amount(&caps[1])?;
                Some(ExtractionMatch::new(value, rule, line.trim()).with_line(i))
            }),
            AmountRule::Labeled => main_lines(lines).find_map(|(i, line)| {
                let caps = AMOUNT_LABELED.captures(line)?;
                let value = normalize_amount(&caps[1])?;
                Some(ExtractionMatch::new(value, rule, &caps[0]).with_line(i))
            }),
            AmountRule::CurrencyPrefixed => main_lines(lines)
                .find_map(|(i, line)| currency_prefixed(line, i, rule))
                .or_else(|| {
                    lines
                        .iter()
                        .enumerate()
                        .find_map(|(i, line)| currency_prefixed(line, i, rule))
                }),
            AmountRule::PlainDecimal => lines.iter().enumerate().find_map(|(i, line)| {
                AMOUNT_PLAIN.captures_iter(line).find_map(|caps| {
                    let value = normalize_amount(&caps[1])?;
                    let positive = Decimal::from_str(&value).ok()? > Decimal::ZERO;
                    positive.then(|| ExtractionMatch::new(value, rule, &caps[0]).with_line(i))
                })
            }),
        }
    }
}

/// Lines that are not part of a fee breakdown.
fn main_lines<'a>(lines: &'a [&'a str]) -> impl Iterator<Item = (usize, &'a str)> + 'a {
    lines
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, line)| !AMOUNT_SUB_LINE.is_match(line))
}

fn currency_prefixed(line: &str, index: usize, rule: &'static str) -> Option<ExtractionMatch<String>> {
    AMOUNT_CURRENCY_PREFIX.captures_iter(line).find_map(|caps| {
        let value = normalize_amount(&caps[1])?;
        Some(ExtractionMatch::new(value, rule, caps[0].trim()).with_line(index))
    })
}

/// Normalize an amount to a plain string with exactly two decimals.
///
/// Currency markers and thousands separators are dropped:
/// `"Php 1,320.5"` becomes `"1320.50"`.
pub fn normalize_amount(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let cleaned = cleaned.trim_end_matches('.');

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let amount = Decimal::from_str(cleaned).ok()?;
    Some(format!("{:.2}", amount.round_dp(2)))
}

/// Amount extractor driven by an ordered rule list.
pub struct AmountExtractor {
    rules: &'static [AmountRule],
}

impl AmountExtractor {
    pub fn new(rules: &'static [AmountRule]) -> Self {
        Self { rules }
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = String;

    fn extract(&self, lines: &[&str]) -> Option<ExtractionMatch<String>> {
        let joined = JoinedLines::new(lines);
        let found = self.rules.iter().find_map(|rule| rule.apply(lines, &joined));

        if let Some(m) = &found {
            debug!("{} matched {:?} -> {}", m.rule, m.source, m.value);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_RULES: &[AmountRule] = &[
        AmountRule::TotalSent,
        AmountRule::Headline,
        AmountRule::Labeled,
        AmountRule::CurrencyPrefixed,
        AmountRule::PlainDecimal,
    ];

    fn extract(lines: &[&str]) -> Option<ExtractionMatch<String>> {
        AmountExtractor::new(ALL_RULES).extract(lines)
    }

    #[test]
    fn test_normalize_amount() {
        for raw in ["320", "320.0", "320.00", "Php 320.00", "₱320.00", "P320", "PHP 320."] {
            assert_eq!(normalize_amount(raw).as_deref(), Some("320.00"), "input {raw:?}");
        }
        assert_eq!(normalize_amount("1,320.5").as_deref(), Some("1320.50"));
        assert_eq!(normalize_amount("12,345,678.90").as_deref(), Some("12345678.90"));
        assert_eq!(normalize_amount("0.5").as_deref(), Some("0.50"));
    }

    #[test]
    fn test_normalize_amount_rejects_garbage() {
        assert_eq!(normalize_amount(""), None);
        assert_eq!(normalize_amount(","), None);
        assert_eq!(normalize_amount("PHP"), None);
        assert_eq!(normalize_amount("1.2.3"), None);
    }

    #[test]
    fn test_total_amount_sent_across_lines() {
        let m = extract(&["Amount", "320.00", "Total Amount Sent", "P320.00"]).unwrap();
        assert_eq!(m.value, "320.00");
        assert_eq!(m.rule, "amount.total_sent");
        assert_eq!(m.lines.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_headline_skips_breakdown() {
        let m = extract(&[
            "Sent!",
            "Send Money Amount PHP 320.00",
            "PHP 330.00",
            "Service Fee PHP 10.00",
        ])
        .unwrap();
        assert_eq!(m.value, "330.00");
        assert_eq!(m.rule, "amount.headline");
    }

    #[test]
    fn test_labeled_with_currency() {
        let m = extract(&["GCash", "Amount Php320.00"]).unwrap();
        assert_eq!(m.value, "320.00");
        assert_eq!(m.rule, "amount.labeled");
    }

    #[test]
    fn test_labeled_with_thousands() {
        assert_eq!(extract(&["Amount: 1,250.75"]).unwrap().value, "1250.75");
    }

    #[test]
    fn test_currency_prefix() {
        let m = extract(&["Paid ₱1,500"]).unwrap();
        assert_eq!(m.value, "1500.00");
        assert_eq!(m.rule, "amount.currency_prefixed");
    }

    #[test]
    fn test_currency_prefix_ignores_words() {
        // "p" inside "Sep" is not a currency marker
        let m = extract(&["Sep 5", "P 45.50"]).unwrap();
        assert_eq!(m.value, "45.50");
        assert_eq!(m.lines.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_breakdown_as_last_resort() {
        let m = extract(&["Service Fee PHP 10.00"]).unwrap();
        assert_eq!(m.value, "10.00");
        assert_eq!(m.rule, "amount.currency_prefixed");
    }

    #[test]
    fn test_plain_decimal_skips_zero() {
        let m = extract(&["Balance 0.00", "Total due 99.90"]).unwrap();
        assert_eq!(m.value, "99.90");
        assert_eq!(m.rule, "amount.plain_decimal");
    }

    #[test]
    fn test_no_amount() {
        assert!(extract(&["cats", "funny", "meme"]).is_none());
    }
}
