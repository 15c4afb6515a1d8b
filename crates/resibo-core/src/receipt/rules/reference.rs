//! Transaction reference extraction.

use regex::Regex;
use tracing::debug;

use super::patterns::{
    DIGIT_RUN, REF_ALPHANUMERIC, REF_ALPHANUMERIC_LABELED, REF_NUMERIC_LABELED,
    REF_SPACED_DIGITS,
};
use super::{ExtractionMatch, FieldExtractor, JoinedLines};

/// Minimum digit count for an unlabeled spaced reference.
const MIN_SPACED_DIGITS: usize = 10;

/// Strategies for locating a reference number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceRule {
    /// Label followed by a dashed code, e.g. `Reference no. BN-20260128-49830535`.
    AlphanumericLabeled,
    /// Label followed by digits, spaces tolerated.
    NumericLabeled,
    /// Dashed code without a label.
    AlphanumericAnywhere,
    /// A digit run of exactly the expected length.
    StandaloneDigits,
    /// Digit groups totalling at least ten digits.
    SpacedDigits,
}

impl ReferenceRule {
    pub fn name(&self) -> &'static str {
        match self {
            ReferenceRule::AlphanumericLabeled => "reference.alphanumeric_labeled",
            ReferenceRule::NumericLabeled => "reference.numeric_labeled",
            ReferenceRule::AlphanumericAnywhere => "reference.alphanumeric",
            ReferenceRule::StandaloneDigits => "reference.standalone_digits",
            ReferenceRule::SpacedDigits => "reference.spaced_digits",
        }
    }

    fn apply(
        &self,
        lines: &[&str],
        joined: &JoinedLines,
        max_len: usize,
    ) -> Option<ExtractionMatch<String>> {
        let rule = self.name();
        match self {
            ReferenceRule::AlphanumericLabeled => {
                first_labeled(lines, joined, &REF_ALPHANUMERIC_LABELED, rule, |raw| {
                    Some(raw.trim().to_string())
                })
            }
            ReferenceRule::NumericLabeled => {
                first_labeled(lines, joined, &REF_NUMERIC_LABELED, rule, |raw| {
                    let digits = clean_digits(raw, max_len);
                    (!digits.is_empty()).then_some(digits)
                })
            }
            ReferenceRule::AlphanumericAnywhere => lines.iter().enumerate().find_map(|(i, line)| {
                REF_ALPHANUMERIC.captures(line).map(|caps| {
                    ExtractionMatch::new(caps[1].to_string(), rule, &caps[0]).with_line(i)
                })
            }),
            ReferenceRule::StandaloneDigits => lines.iter().enumerate().find_map(|(i, line)| {
                DIGIT_RUN
                    .captures_iter(line)
                    .find(|caps| caps[1].len() == max_len)
                    .map(|caps| {
                        ExtractionMatch::new(caps[1].to_string(), rule, &caps[0]).with_line(i)
                    })
            }),
            ReferenceRule::SpacedDigits => lines.iter().enumerate().find_map(|(i, line)| {
                REF_SPACED_DIGITS.captures_iter(line).find_map(|caps| {
                    let digits = clean_digits(&caps[1], max_len);
                    (caps[1].chars().filter(char::is_ascii_digit).count() >= MIN_SPACED_DIGITS)
                        .then(|| ExtractionMatch::new(digits, rule, &caps[0]).with_line(i))
                })
            }),
        }
    }
}

/// Search each line, then the joined text, for a labeled reference.
fn first_labeled(
    lines: &[&str],
    joined: &JoinedLines,
    pattern: &Regex,
    rule: &'static str,
    clean: impl Fn(&str) -> Option<String>,
) -> Option<ExtractionMatch<String>> {
    for (i, line) in lines.iter().enumerate() {
        if let Some(caps) = pattern.captures(line) {
            if let Some(value) = clean(&caps[1]) {
                return Some(ExtractionMatch::new(value, rule, &caps[0]).with_line(i));
            }
        }
    }

    let caps = pattern.captures(joined.text())?;
    let whole = caps.get(0)?;
    let value = clean(&caps[1])?;
    Some(
        ExtractionMatch::new(value, rule, whole.as_str())
            .with_lines(joined.lines_in(whole.start(), whole.end())),
    )
}

/// Remove whitespace and cap the result at `max_len` characters.
fn clean_digits(raw: &str, max_len: usize) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .take(max_len)
        .collect()
}

/// Reference number extractor driven by an ordered rule list.
pub struct ReferenceExtractor {
    rules: &'static [ReferenceRule],
    /// Longest plausible reference; also the expected standalone length.
    max_len: usize,
}

impl ReferenceExtractor {
    pub fn new(rules: &'static [ReferenceRule], max_len: usize) -> Self {
        Self { rules, max_len }
    }
}

impl FieldExtractor for ReferenceExtractor {
    type Output = String;

    fn extract(&self, lines: &[&str]) -> Option<ExtractionMatch<String>> {
        let joined = JoinedLines::new(lines);
        let found = self
            .rules
            .iter()
            .find_map(|rule| rule.apply(lines, &joined, self.max_len));

        if let Some(m) = &found {
            debug!("{} matched {:?} -> {}", m.rule, m.source, m.value);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_RULES: &[ReferenceRule] = &[
        ReferenceRule::AlphanumericLabeled,
        ReferenceRule::NumericLabeled,
        ReferenceRule::AlphanumericAnywhere,
        ReferenceRule::StandaloneDigits,
        ReferenceRule::SpacedDigits,
    ];

    fn extract(lines: &[&str]) -> Option<ExtractionMatch<String>> {
        ReferenceExtractor::new(ALL_RULES, 13).extract(lines)
    }

    #[test]
    fn test_labeled_reference() {
        let m = extract(&["Sent via GCash", "Ref No. 7037516197197"]).unwrap();
        assert_eq!(m.value, "7037516197197");
        assert_eq!(m.rule, "reference.numeric_labeled");
        assert_eq!(m.lines.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_spaced_labeled_reference() {
        assert_eq!(extract(&["Ref No. 7037 651 006674"]).unwrap().value, "7037651006674");
        assert_eq!(extract(&["Ref No. 2037 306 741072"]).unwrap().value, "2037306741072");
    }

    #[test]
    fn test_labeled_reference_is_capped() {
        let m = extract(&["Ref No. 7037516197197 55"]).unwrap();
        assert_eq!(m.value, "7037516197197");
    }

    #[test]
    fn test_label_and_value_on_separate_lines() {
        let m = extract(&["Reference No.", "7037516197197", "Done"]).unwrap();
        assert_eq!(m.value, "7037516197197");
        assert_eq!(m.lines.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_alphanumeric_reference_across_lines() {
        let m = extract(&[
            "Invoice number 012791",
            "Reference no.",
            "BN-20260128-49830535",
            "Thank you for using",
        ])
        .unwrap();
        assert_eq!(m.value, "BN-20260128-49830535");
        assert_eq!(m.rule, "reference.alphanumeric_labeled");
        assert_eq!(m.lines.iter().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_alphanumeric_without_label() {
        let m = extract(&["Code", "BN-20260128-49830535"]).unwrap();
        assert_eq!(m.value, "BN-20260128-49830535");
        assert_eq!(m.rule, "reference.alphanumeric");
    }

    #[test]
    fn test_standalone_digits() {
        let m = extract(&["+63 977 732 9406", "6037260329062"]).unwrap();
        assert_eq!(m.value, "6037260329062");
        assert_eq!(m.rule, "reference.standalone_digits");
    }

    #[test]
    fn test_spaced_digits_need_ten() {
        let m = extract(&["7037 651 0066"]).unwrap();
        assert_eq!(m.value, "70376510066");
        assert_eq!(m.rule, "reference.spaced_digits");

        assert!(extract(&["1234 567 89"]).is_none());
    }

    #[test]
    fn test_max_length_per_provider() {
        let maya = ReferenceExtractor::new(ALL_RULES, 12);
        let m = maya.extract(&["Reference ID 1234 5678 9012 3"]).unwrap();
        assert_eq!(m.value, "123456789012");

        let m = maya.extract(&["123456789012"]).unwrap();
        assert_eq!(m.rule, "reference.standalone_digits");
    }

    #[test]
    fn test_no_reference() {
        assert!(extract(&["cats", "funny", "meme"]).is_none());
        assert!(extract(&[]).is_none());
    }
}
