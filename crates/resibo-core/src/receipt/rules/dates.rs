//! Timestamp extraction for receipts.

use regex::Regex;
use tracing::debug;

use super::patterns::{MERGED_YEAR_TIME, TIME_MONTH_NAME, TIME_NUMERIC, WHITESPACE_RUN};
use super::{ExtractionMatch, FieldExtractor, JoinedLines};

/// Strategies for locating the transaction timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRule {
    /// `Feb 5, 2026 7:23 PM`
    MonthName,
    /// `01/28/2026 19:58` or `2026-01-28 7:58 PM`
    Numeric,
}

impl TimeRule {
    pub fn name(&self) -> &'static str {
        match self {
            TimeRule::MonthName => "time.month_name",
            TimeRule::Numeric => "time.numeric",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            TimeRule::MonthName => &TIME_MONTH_NAME,
            TimeRule::Numeric => &TIME_NUMERIC,
        }
    }

    fn apply(&self, joined: &JoinedLines) -> Option<ExtractionMatch<String>> {
        let caps = self.pattern().captures(joined.text())?;
        let found = caps.get(1)?;
        let value = normalize_time(found.as_str());
        if value.is_empty() {
            return None;
        }

        Some(
            ExtractionMatch::new(value, self.name(), found.as_str().trim())
                .with_lines(joined.lines_in(found.start(), found.end())),
        )
    }
}

/// Collapse whitespace and split a year glued to the time by OCR.
///
/// `"Feb 12,  202610:59PM"` becomes `"Feb 12, 2026 10:59PM"`.
pub fn normalize_time(raw: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(raw.trim(), " ");
    MERGED_YEAR_TIME.replace_all(&collapsed, "$1 $2").into_owned()
}

/// Timestamp extractor driven by an ordered rule list.
pub struct TimeExtractor {
    rules: &'static [TimeRule],
}

impl TimeExtractor {
    pub fn new(rules: &'static [TimeRule]) -> Self {
        Self { rules }
    }
}

impl FieldExtractor for TimeExtractor {
    type Output = String;

    fn extract(&self, lines: &[&str]) -> Option<ExtractionMatch<String>> {
        let joined = JoinedLines::new(lines);
        let found = self.rules.iter().find_map(|rule| rule.apply(&joined));

        if let Some(m) = &found {
            debug!("{} matched {:?} -> {}", m.rule, m.source, m.value);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_RULES: &[TimeRule] = &[TimeRule::MonthName, TimeRule::Numeric];

    fn extract(lines: &[&str]) -> Option<ExtractionMatch<String>> {
        TimeExtractor::new(ALL_RULES).extract(lines)
    }

    #[test]
    fn test_month_name_time() {
        let m = extract(&["Ref No. 7037516197197", "Feb 5, 2026 7:23 PM", "Done"]).unwrap();
        assert_eq!(m.value, "Feb 5, 2026 7:23 PM");
        assert_eq!(m.lines.iter().copied().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_merged_year_and_time() {
        assert_eq!(extract(&["Feb 12, 202610:59PM"]).unwrap().value, "Feb 12, 2026 10:59PM");
    }

    #[test]
    fn test_date_and_time_on_separate_lines() {
        let m = extract(&["Jan 28, 2026", "05:26 AM"]).unwrap();
        assert_eq!(m.value, "Jan 28, 2026 05:26 AM");
        assert_eq!(m.lines.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_full_month_name_and_24h() {
        assert_eq!(
            extract(&["September 30, 2025 18:05"]).unwrap().value,
            "September 30, 2025 18:05"
        );
    }

    #[test]
    fn test_numeric_formats() {
        let m = extract(&["Date 01/28/2026 19:58"]).unwrap();
        assert_eq!(m.value, "01/28/2026 19:58");
        assert_eq!(m.rule, "time.numeric");

        assert_eq!(extract(&["2026-01-28  7:58 PM"]).unwrap().value, "2026-01-28 7:58 PM");
    }

    #[test]
    fn test_month_name_preferred_over_numeric() {
        let m = extract(&["01/28/2026 19:58", "Jan 28, 2026 7:58 PM"]).unwrap();
        assert_eq!(m.rule, "time.month_name");
    }

    #[test]
    fn test_24h_time_stops_at_line_end() {
        let m = extract(&["Feb 5, 2026 19:23", "Amount 320.00"]).unwrap();
        assert_eq!(m.value, "Feb 5, 2026 19:23");
        assert_eq!(m.lines.iter().copied().collect::<Vec<_>>(), vec![0]);

        assert_eq!(extract(&["01/28/2026 19:58", "Amount 5.00"]).unwrap().value, "01/28/2026 19:58");
        assert_eq!(extract(&["2026-01-28 19:58 Amount"]).unwrap().value, "2026-01-28 19:58");
    }

    #[test]
    fn test_no_time() {
        assert!(extract(&["cats", "funny", "meme"]).is_none());
        assert!(extract(&["Mar 2026"]).is_none());
    }
}
