//! Record normalizer: trims every value and canonicalizes the transaction key

use tracing::{info, warn};

use crate::traits::*;
use crate::types::*;
use crate::utils::DefaultKeyValidator;

/// A record set after normalization, with the flags raised along the way
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub records: RecordSet,
    pub flags: Vec<DataQualityFlag>,
}

/// Canonical form of a transaction key
///
/// Surrounding whitespace is stripped. A key carrying a decimal point keeps
/// only the part before the first `.` (`"12345.0"` becomes `"12345"`).
pub fn canonical_key(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.split_once('.') {
        Some((integer, _)) => integer.to_string(),
        None => trimmed.to_string(),
    }
}

/// Ingestion step shared by both sides of the reconciliation
pub struct RecordNormalizer {
    side: Side,
    key_field: String,
    source: Option<String>,
    validator: Box<dyn KeyValidator>,
}

impl RecordNormalizer {
    /// Create a normalizer with the default key validator
    pub fn new(side: Side, key_field: impl Into<String>) -> Self {
        Self {
            side,
            key_field: key_field.into(),
            source: None,
            validator: Box::new(DefaultKeyValidator),
        }
    }

    /// Create a normalizer with a custom key validator
    pub fn with_validator(
        side: Side,
        key_field: impl Into<String>,
        validator: Box<dyn KeyValidator>,
    ) -> Self {
        Self {
            side,
            key_field: key_field.into(),
            source: None,
            validator,
        }
    }

    /// Attach the originating file name to every flag raised
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn key_field(&self) -> &str {
        &self.key_field
    }

    /// Normalize a raw record set
    ///
    /// Fails only when the key column is missing. Malformed keys are flagged
    /// and still pass through in canonical form.
    pub fn normalize(&self, raw: RecordSet) -> ReconResult<Normalized> {
        self.normalize_with_source(raw, self.source.as_deref())
    }

    /// Normalize one file of a multi-file input, tagging flags with its name
    pub fn normalize_from(&self, raw: RecordSet, source: &str) -> ReconResult<Normalized> {
        self.normalize_with_source(raw, Some(source))
    }

    fn normalize_with_source(
        &self,
        mut raw: RecordSet,
        source: Option<&str>,
    ) -> ReconResult<Normalized> {
        let key_position =
            raw.column_index(&self.key_field)
                .ok_or_else(|| ReconError::MissingColumn {
                    column: self.key_field.clone(),
                    side: self.side,
                })?;

        raw.map_values(Value::trimmed);

        let mut flags = Vec::new();
        raw.map_column(key_position, |row_index, value| {
            let Some(text) = value.as_text() else {
                return Value::Empty;
            };
            for issue in self.validator.validate_key(&text) {
                flags.push(DataQualityFlag {
                    row_index,
                    field: self.key_field.clone(),
                    issue,
                    value: text.to_string(),
                    source: source.map(str::to_string),
                });
            }
            Value::Text(canonical_key(&text))
        });

        if !flags.is_empty() {
            warn!(
                side = %self.side,
                source = source.unwrap_or("-"),
                count = flags.len(),
                "transaction key issues found"
            );
            for flag in &flags {
                warn!(
                    side = %self.side,
                    source = flag.source.as_deref().unwrap_or("-"),
                    "{}",
                    flag
                );
            }
        }

        info!(
            side = %self.side,
            source = source.unwrap_or("-"),
            rows = raw.len(),
            flagged = flags.len(),
            "normalized record set"
        );

        Ok(Normalized {
            records: raw,
            flags,
        })
    }
}
