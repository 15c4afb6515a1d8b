//! Confidence aggregation over evidence lines.

use std::collections::BTreeSet;

use crate::ocr::TextLine;

/// Mean OCR confidence of the evidence lines, rounded to 4 decimals.
///
/// Returns 0.0 when no line contributed. Out-of-range indices are ignored.
pub fn aggregate_confidence(lines: &[TextLine], evidence: &BTreeSet<usize>) -> f64 {
    let scores: Vec<f64> = evidence
        .iter()
        .filter_map(|&i| lines.get(i))
        .map(|line| f64::from(line.confidence))
        .collect();

    if scores.is_empty() {
        return 0.0;
    }

    let mean = scores.iter().sum::<f64>() / scores.len() as f64;
    round4(mean.clamp(0.0, 1.0))
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(confidences: &[f32]) -> Vec<TextLine> {
        confidences
            .iter()
            .enumerate()
            .map(|(i, &c)| TextLine::new(format!("line {i}"), c))
            .collect()
    }

    #[test]
    fn test_mean_of_evidence() {
        let lines = lines(&[0.9, 0.5, 0.8, 0.1]);
        let evidence: BTreeSet<usize> = [0, 2].into_iter().collect();
        assert_eq!(aggregate_confidence(&lines, &evidence), 0.85);
    }

    #[test]
    fn test_uniform_confidence_is_exact() {
        let lines = lines(&[0.98, 0.98, 0.98, 0.98]);
        let evidence: BTreeSet<usize> = (0..4).collect();
        assert_eq!(aggregate_confidence(&lines, &evidence), 0.98);
    }

    #[test]
    fn test_no_evidence() {
        let lines = lines(&[0.9]);
        assert_eq!(aggregate_confidence(&lines, &BTreeSet::new()), 0.0);
        assert_eq!(aggregate_confidence(&[], &[3].into_iter().collect()), 0.0);
    }
}
