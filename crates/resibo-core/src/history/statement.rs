//! Transaction history statement parsing.
//!
//! Statements exported by the e-wallet apps are tables with columns such as
//! Date/Time, Description, Reference, Debit, Credit and Balance. After text
//! extraction the columns are separated by runs of spaces.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::HistoryError;
use crate::pdf::PdfExtractor;
use crate::receipt::normalize_amount;

lazy_static! {
    static ref CELL_SEPARATOR: Regex = Regex::new(r"\t+|\s{2,}").unwrap();

    static ref AMOUNT_CELL: Regex = Regex::new(r"^\d+(?:\.\d*)?$").unwrap();

    static ref REF_CELL: Regex = Regex::new(r"(?i)^[\dA-Z][\dA-Z\-]{5,}$").unwrap();

    static ref TEXT_DATE: Regex = Regex::new(
        r"(?i)\b((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\w*\s+\d{1,2},?\s+\d{4}(?:\s+\d{1,2}:\d{2}\s*(?:AM|PM)?)?)"
    ).unwrap();

    static ref TEXT_REF: Regex = Regex::new(
        r"(?i)(?:Reference\s*(?:No\.?|#)?|Ref\.?\s*(?:No\.?|#|Number)?)\s*:?\s*([A-Z0-9][\w\-]{5,})"
    ).unwrap();

    static ref TEXT_AMOUNT: Regex = Regex::new(
        r"(?i)(?:^|[^\p{L}])(?:PHP|₱|P)\s*([0-9,]+\.\d{2})"
    ).unwrap();
}

/// Money flow of a history entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Debit,
    Credit,
    #[default]
    Unknown,
}

/// One transaction from a history statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryTransaction {
    /// e.g. "Jan 28, 2026 7:58 PM"
    pub date_time: Option<String>,
    pub description: Option<String>,
    /// e.g. "7037516197197"
    pub ref_number: Option<String>,
    /// Always positive, two decimals.
    pub amount: Option<String>,
    pub direction: Direction,
    /// Running balance after the transaction.
    pub balance: Option<String>,
    /// Cells of the source row.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub raw_row: Vec<String>,
}

/// Statement column a header cell refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    DateTime,
    Description,
    Reference,
    Debit,
    Credit,
    Balance,
    Amount,
    Fee,
    Status,
}

/// Column positions detected from a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ColumnMap {
    columns: Vec<(Column, usize)>,
}

impl ColumnMap {
    fn detect(header: &[String]) -> Self {
        let mut map = Self::default();
        for (i, cell) in header.iter().enumerate() {
            if let Some(column) = classify_header(cell) {
                map.set(column, i);
            }
        }
        map
    }

    /// GCash layout: Date, Description, Reference, Debit, Credit, Balance.
    fn positional(cells: usize) -> Self {
        let mut map = Self::default();
        for (i, column) in [
            Column::DateTime,
            Column::Description,
            Column::Reference,
            Column::Debit,
            Column::Credit,
            Column::Balance,
        ]
        .into_iter()
        .enumerate()
        .take(cells)
        {
            map.set(column, i);
        }
        map
    }

    fn set(&mut self, column: Column, index: usize) {
        self.columns.retain(|(c, _)| *c != column);
        self.columns.push((column, index));
    }

    fn len(&self) -> usize {
        self.columns.len()
    }

    fn get<'a>(&self, column: Column, row: &'a [String]) -> Option<&'a str> {
        let index = self.columns.iter().find(|(c, _)| *c == column)?.1;
        row.get(index).map(String::as_str)
    }
}

fn classify_header(cell: &str) -> Option<Column> {
    let lower = cell.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }
    let has_word = |w: &str| lower.split(|c: char| !c.is_alphanumeric()).any(|part| part == w);
    let has_any = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));

    if has_any(&["date", "time", "timestamp"]) {
        Some(Column::DateTime)
    } else if has_any(&["description", "details", "transaction", "particulars"]) {
        Some(Column::Description)
    } else if has_any(&["ref", "reference"]) {
        Some(Column::Reference)
    } else if has_any(&["balance"]) {
        Some(Column::Balance)
    } else if has_any(&["debit"]) || has_word("out") {
        Some(Column::Debit)
    } else if has_any(&["credit"]) || has_word("in") {
        Some(Column::Credit)
    } else if has_any(&["amount"]) {
        Some(Column::Amount)
    } else if has_any(&["fee"]) {
        Some(Column::Fee)
    } else if has_any(&["status"]) {
        Some(Column::Status)
    } else {
        None
    }
}

/// Parse a history statement PDF.
///
/// Fails with [`HistoryError::Empty`] when no transaction could be read.
pub fn parse_statement(pdf: &[u8]) -> Result<Vec<HistoryTransaction>, HistoryError> {
    let text = PdfExtractor::text_from_bytes(pdf)?;
    let transactions = parse_statement_text(&text);

    if transactions.is_empty() {
        return Err(HistoryError::Empty);
    }

    info!("Parsed {} history transactions", transactions.len());
    Ok(transactions)
}

/// Parse statement text: table rows first, free text as a fallback.
pub fn parse_statement_text(text: &str) -> Vec<HistoryTransaction> {
    let rows: Vec<Vec<String>> = text
        .lines()
        .map(split_cells)
        .filter(|cells| !cells.is_empty())
        .collect();

    let tabular = parse_table(&rows);
    if !tabular.is_empty() {
        debug!("Read {} transactions from table rows", tabular.len());
        return tabular;
    }

    let free = parse_free_text(text);
    debug!("Read {} transactions from free text", free.len());
    free
}

fn split_cells(line: &str) -> Vec<String> {
    CELL_SEPARATOR
        .split(line.trim())
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

fn parse_table(rows: &[Vec<String>]) -> Vec<HistoryTransaction> {
    let header = rows
        .iter()
        .position(|row| row.len() >= 2 && ColumnMap::detect(row).len() >= 2);

    let (header_map, data_rows) = match header {
        Some(i) => (Some(ColumnMap::detect(&rows[i])), &rows[i + 1..]),
        None => (None, rows),
    };

    data_rows
        .iter()
        .filter(|row| !is_repeated_header(row))
        .filter_map(|row| {
            let map = match &header_map {
                Some(map) if row.len() >= 2 => map.clone(),
                Some(_) => return None,
                None if row.len() >= 5 => ColumnMap::positional(row.len()),
                None => return None,
            };
            let txn = row_to_transaction(row, &map);
            (txn.amount.is_some() || txn.ref_number.is_some()).then_some(txn)
        })
        .collect()
}

fn is_repeated_header(row: &[String]) -> bool {
    let text = row.join(" ").to_lowercase();
    text.contains("date") && text.contains("description")
}

fn row_to_transaction(row: &[String], map: &ColumnMap) -> HistoryTransaction {
    let debit = map.get(Column::Debit, row).and_then(clean_amount);
    let credit = map.get(Column::Credit, row).and_then(clean_amount);
    let plain = map.get(Column::Amount, row).and_then(clean_amount);

    let (amount, direction) = match (debit, credit, plain) {
        (Some(a), _, _) => (Some(a), Direction::Debit),
        (None, Some(a), _) => (Some(a), Direction::Credit),
        (None, None, Some(a)) => (Some(a), Direction::Unknown),
        (None, None, None) => (None, Direction::Unknown),
    };

    HistoryTransaction {
        date_time: map.get(Column::DateTime, row).and_then(clean_date),
        description: map
            .get(Column::Description, row)
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        ref_number: map.get(Column::Reference, row).and_then(clean_ref),
        amount,
        direction,
        balance: map.get(Column::Balance, row).and_then(clean_amount),
        raw_row: row.to_vec(),
    }
}

/// Positive amount from a cell such as `"-1,320.00"` or `"PHP 45"`.
fn clean_amount(cell: &str) -> Option<String> {
    let upper = cell.trim().to_uppercase().replace("PHP", "");
    let cleaned: String = upper
        .chars()
        .filter(|c| !matches!(c, '₱' | 'P' | ',' | '-' | '+') && !c.is_whitespace())
        .collect();

    if !AMOUNT_CELL.is_match(&cleaned) {
        return None;
    }
    let normalized = normalize_amount(&cleaned)?;
    (normalized.trim_start_matches(['0', '.']) != "").then_some(normalized)
}

fn clean_ref(cell: &str) -> Option<String> {
    let cleaned: String = cell.chars().filter(|c| !c.is_whitespace()).collect();
    REF_CELL.is_match(&cleaned).then_some(cleaned)
}

fn clean_date(cell: &str) -> Option<String> {
    let collapsed = cell.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Scan unstructured text; each new date closes the pending transaction.
fn parse_free_text(text: &str) -> Vec<HistoryTransaction> {
    let mut transactions = Vec::new();
    let mut date: Option<String> = None;
    let mut reference: Option<String> = None;
    let mut amount: Option<String> = None;

    let mut flush = |date: &Option<String>, reference: &mut Option<String>, amount: &mut Option<String>| {
        if reference.is_some() || amount.is_some() {
            transactions.push(HistoryTransaction {
                date_time: date.clone(),
                ref_number: reference.take(),
                amount: amount.take(),
                ..HistoryTransaction::default()
            });
        }
    };

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(caps) = TEXT_DATE.captures(line) {
            flush(&date, &mut reference, &mut amount);
            date = clean_date(&caps[1]);
        }
        if let Some(caps) = TEXT_REF.captures(line) {
            reference = Some(caps[1].to_string());
        }
        if let Some(caps) = TEXT_AMOUNT.captures(line) {
            amount = normalize_amount(&caps[1]);
        }
    }
    flush(&date, &mut reference, &mut amount);

    transactions
}
