//! Receipt field extraction module.
//!
//! Lines from the OCR stage flow through provider classification,
//! per-provider field rules, confidence aggregation and result assembly.

mod assembler;
pub mod classifier;
pub mod confidence;
mod parser;
mod pipeline;
pub mod providers;
pub mod rules;

pub use classifier::{Classification, ProviderClassifier};
pub use parser::ReceiptParser;
pub use pipeline::ReceiptPipeline;
pub use providers::{ExtractedFields, ProviderRules};
pub use rules::normalize_amount;
