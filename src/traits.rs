//! Traits for input/output abstraction and extensibility

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::*;

/// Source of raw records for one side of the reconciliation
///
/// This trait allows the engine to stay independent of how records are
/// obtained (CSV exports, a parsed regulatory feed, in-memory fixtures, etc.).
pub trait RecordSource {
    /// Which side of the reconciliation this source feeds
    fn side(&self) -> Side;

    /// Load the raw record set
    fn load(&self) -> ReconResult<RecordSet>;
}

/// Destination for named output record sets (result sheets)
pub trait ReportSink {
    /// Write one complete record set under the given name
    fn write(&mut self, name: &str, records: &RecordSet) -> ReconResult<()>;

    /// Complete the output once every record set has been written
    fn finish(&mut self) -> ReconResult<()> {
        Ok(())
    }
}

/// Kinds of data-quality problems detected on a transaction key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyIssue {
    /// Key rendered as a number with an exponent, e.g. `1.23E+11`
    ScientificNotation,
    /// Key carried a decimal point and was truncated
    DecimalPoint,
    /// Key contains characters other than letters and digits
    NonAlphanumeric,
}

impl fmt::Display for KeyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyIssue::ScientificNotation => f.write_str("Scientific notation detected"),
            KeyIssue::DecimalPoint => f.write_str("Decimal point detected"),
            KeyIssue::NonAlphanumeric => f.write_str("Non-alphanumeric characters detected"),
        }
    }
}

/// Informational flag raised while ingesting a record set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityFlag {
    /// Zero-based row index within the ingested record set
    pub row_index: usize,
    /// Field the issue was found in
    pub field: String,
    /// What is wrong with the value
    pub issue: KeyIssue,
    /// The offending value as it was received (trimmed)
    pub value: String,
    /// Originating file or feed, when known
    pub source: Option<String>,
}

impl DataQualityFlag {
    /// Spreadsheet-style line number: header is line 1, first data row is line 2
    pub fn line_number(&self) -> usize {
        self.row_index + 2
    }
}

impl fmt::Display for DataQualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}: {}", self.line_number(), self.issue, self.value)
    }
}

/// Trait for implementing transaction key validation rules
pub trait KeyValidator: Send + Sync {
    /// Inspect a trimmed, not yet truncated key and report every issue found
    fn validate_key(&self, key: &str) -> Vec<KeyIssue>;
}

/// Validator that accepts every key
pub struct PermissiveKeyValidator;

impl KeyValidator for PermissiveKeyValidator {
    fn validate_key(&self, _key: &str) -> Vec<KeyIssue> {
        Vec::new()
    }
}
