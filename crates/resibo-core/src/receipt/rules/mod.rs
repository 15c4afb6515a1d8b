//! Rule-based field extractors for mobile-payment receipts.

pub mod amounts;
pub mod dates;
pub mod patterns;
pub mod reference;

pub use amounts::{normalize_amount, AmountExtractor, AmountRule};
pub use dates::{normalize_time, TimeExtractor, TimeRule};
pub use reference::{ReferenceExtractor, ReferenceRule};

use std::collections::BTreeSet;

/// Trait for field extractors.
///
/// Extractors work on OCR lines rather than one text blob so that every
/// match can name the lines it came from.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the field from the lines, first matching rule wins.
    fn extract(&self, lines: &[&str]) -> Option<ExtractionMatch<Self::Output>>;
}

/// An extracted value with the lines it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Indices of the OCR lines that supplied the value.
    pub lines: BTreeSet<usize>,
    /// Source text that was matched.
    pub source: String,
    /// Name of the rule that fired.
    pub rule: &'static str,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, rule: &'static str, source: impl Into<String>) -> Self {
        Self {
            value,
            lines: BTreeSet::new(),
            source: source.into(),
            rule,
        }
    }

    pub fn with_line(mut self, index: usize) -> Self {
        self.lines.insert(index);
        self
    }

    pub fn with_lines(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.lines.extend(indices);
        self
    }
}

/// Lines joined with single spaces, keeping track of where each line starts.
///
/// Some receipt layouts put a label and its value on separate OCR lines,
/// so rules also search the joined text and map matches back to lines.
#[derive(Debug, Clone)]
pub struct JoinedLines {
    text: String,
    /// Byte offset of each line in `text`.
    starts: Vec<usize>,
}

impl JoinedLines {
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut text = String::new();
        let mut starts = Vec::with_capacity(lines.len());

        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                text.push(' ');
            }
            starts.push(text.len());
            text.push_str(line.as_ref());
        }

        Self { text, starts }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Indices of the lines overlapping the byte range `start..end`.
    pub fn lines_in(&self, start: usize, end: usize) -> Vec<usize> {
        let end = end.max(start + 1);
        (0..self.starts.len())
            .filter(|&i| {
                let line_start = self.starts[i];
                let line_end = self
                    .starts
                    .get(i + 1)
                    .map(|next| next - 1)
                    .unwrap_or(self.text.len());
                line_start < end && start < line_end.max(line_start + 1)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joined_lines_maps_spans() {
        let joined = JoinedLines::new(&["Ref No.", "7037516197197", "GCash"]);
        assert_eq!(joined.text(), "Ref No. 7037516197197 GCash");

        let start = joined.text().find("No.").unwrap();
        let end = joined.text().find("GCash").unwrap() - 1;
        assert_eq!(joined.lines_in(start, end), vec![0, 1]);

        let g = joined.text().find("GCash").unwrap();
        assert_eq!(joined.lines_in(g, g + 5), vec![2]);
    }

    #[test]
    fn test_joined_lines_empty_line() {
        let joined = JoinedLines::new(&["a", "", "b"]);
        assert_eq!(joined.text(), "a  b");
        assert_eq!(joined.lines_in(3, 4), vec![2]);
    }

    #[test]
    fn test_extraction_match_lines() {
        let m = ExtractionMatch::new("x".to_string(), "test", "x")
            .with_line(3)
            .with_lines([1, 3]);
        assert_eq!(m.lines.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }
}
