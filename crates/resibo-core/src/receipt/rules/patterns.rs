//! Common regex patterns for mobile-payment receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Provider keywords
    pub static ref PROVIDER_BDO: Regex = Regex::new(r"(?i)\b(?:bdo\s?pay|bdo)\b").unwrap();

    /// "GCash", "G Cash", "G-Xchange, Inc."
    pub static ref PROVIDER_GCASH: Regex = Regex::new(r"(?i)\b(?:g\s?cash|g-xchange)\b").unwrap();

    pub static ref PROVIDER_MAYA: Regex = Regex::new(r"(?i)\b(?:paymaya|maya)\b").unwrap();

    /// The GCash transfer details screen carries both headings.
    pub static ref GCASH_DETAILS_HEADING: Regex = Regex::new(r"(?i)\btransaction\s+details\b").unwrap();
    pub static ref GCASH_TRANSFER_FROM: Regex = Regex::new(r"(?i)\btransfer\s+from\b").unwrap();

    // Reference numbers
    /// "Ref No. 7037 651 006674", "Transaction ID: 1234567890"
    pub static ref REF_NUMERIC_LABELED: Regex = Regex::new(
        r"(?i)(?:Ref\.?\s*(?:No\.?|Number)?|Reference\s*(?:No\.?|Number|ID)?|Transaction\s*(?:No\.?|Number|ID)?)[\s.:]*(\d[\d\s]{8,})"
    ).unwrap();

    /// "Reference no. BN-20260128-49830535"
    pub static ref REF_ALPHANUMERIC_LABELED: Regex = Regex::new(
        r"(?i)(?:Ref(?:erence)?\s*(?:No\.?|Number|ID)?|Transaction\s*(?:No\.?|Number|ID)?)[\s.:]*([A-Z]{2,}-[\w-]{8,})"
    ).unwrap();

    /// BDO style reference without a label.
    pub static ref REF_ALPHANUMERIC: Regex = Regex::new(
        r"(?i)\b([A-Z]{2,}-\d{8}-\d{6,})\b"
    ).unwrap();

    /// Unlabeled digit groups, e.g. "7037 651 006674".
    pub static ref REF_SPACED_DIGITS: Regex = Regex::new(
        r"\b(\d{4}\s?\d{3}\s?\d{3,6})\b"
    ).unwrap();

    /// Any run of digits; length is checked by the caller.
    pub static ref DIGIT_RUN: Regex = Regex::new(r"\b(\d+)\b").unwrap();

    // Amounts
    /// "Total Amount Sent P320.00"
    pub static ref AMOUNT_TOTAL_SENT: Regex = Regex::new(
        r"(?i)Total\s*Amount\s*Sent?\s*[₱P]?\s*([0-9,]+\.\d{2})"
    ).unwrap();

    /// A line holding nothing but "PHP 330.00".
    pub static ref AMOUNT_HEADLINE: Regex = Regex::new(
        r"(?i)^\s*PHP\s+([0-9,]+\.\d{2})\s*$"
    ).unwrap();

    /// "Amount 320.00", "Amount Php320.00", "Total: ₱1,200.00"
    pub static ref AMOUNT_LABELED: Regex = Regex::new(
        r"(?i)\b(?:Total\s*Amount\s*Sent?|Amount|Total)[\s.:]*(?:PHP|₱|P)?\s*([0-9,]+\.\d{2})"
    ).unwrap();

    /// "₱320.00", "P320", "PHP 1,200.50"
    pub static ref AMOUNT_CURRENCY_PREFIX: Regex = Regex::new(
        r"(?i)(?:^|[^\p{L}])(?:PHP|₱|P)\s*([0-9,]+\.?\d*)"
    ).unwrap();

    pub static ref AMOUNT_PLAIN: Regex = Regex::new(
        r"\b([0-9,]+\.\d{2})\b"
    ).unwrap();

    /// Breakdown lines that carry a partial amount.
    pub static ref AMOUNT_SUB_LINE: Regex = Regex::new(
        r"(?i)send\s*money|service\s*fee"
    ).unwrap();

    // Timestamps
    /// "Feb 5, 2026 7:23 PM", also OCR-merged "Feb 12, 202610:59PM"
    pub static ref TIME_MONTH_NAME: Regex = Regex::new(
        r"(?i)\b((?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\w*\s+\d{1,2},?\s+\d{4}\s*\d{1,2}:\d{2}(?::\d{2})?(?:\s*(?:AM|PM)\b)?)"
    ).unwrap();

    /// "01/28/2026 19:58", "2026-01-28 7:58 PM"
    pub static ref TIME_NUMERIC: Regex = Regex::new(
        r"(?i)(\d{1,2}/\d{1,2}/\d{4}\s+\d{1,2}:\d{2}(?::\d{2})?(?:\s*(?:AM|PM)\b)?|\d{4}-\d{2}-\d{2}\s+\d{1,2}:\d{2}(?::\d{2})?(?:\s*(?:AM|PM)\b)?)"
    ).unwrap();

    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    /// Year glued to the time by OCR: "202610:59".
    pub static ref MERGED_YEAR_TIME: Regex = Regex::new(
        r"(\d{4})(\d{1,2}:\d{2})"
    ).unwrap();
}
