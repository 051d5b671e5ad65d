//! Core types and data structures for the reconciliation engine

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

/// Canonical text format used when a date value is rendered for comparison
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A single cell of a record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Free text, the form every adapter-supplied cell arrives in
    Text(String),
    /// Decimal number
    Number(BigDecimal),
    /// Date or timestamp
    Date(NaiveDateTime),
    /// Boolean flag
    Boolean(bool),
    /// Absent value: a missing cell, or the FCA side of an unmatched join row
    Empty,
}

impl Value {
    /// Create a text value
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    /// Whether this value is absent (not the same as an empty string)
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Whether this value is absent or renders to whitespace only
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Canonical text rendering; `None` for absent values
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Date(d) => Some(Cow::Owned(d.format(DATE_TIME_FORMAT).to_string())),
            Value::Boolean(b) => Some(Cow::Borrowed(if *b { "true" } else { "false" })),
            Value::Empty => None,
        }
    }

    /// Return a copy with surrounding whitespace stripped from text values
    pub fn trimmed(&self) -> Self {
        match self {
            Value::Text(s) => Value::Text(s.trim().to_string()),
            other => other.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// Which of the two record families a record set belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Internal trading venue export
    Nex,
    /// Regulatory report extract
    Fca,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Nex => f.write_str("NEX"),
            Side::Fca => f.write_str("FCA"),
        }
    }
}

/// Outcome of comparing one field of one joined row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "CHECK")]
    Check,
}

impl Verdict {
    /// Map an equality test onto a verdict
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Verdict::Ok
        } else {
            Verdict::Check
        }
    }

    pub fn is_check(&self) -> bool {
        matches!(self, Verdict::Check)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Ok => f.write_str("OK"),
            Verdict::Check => f.write_str("CHECK"),
        }
    }
}

/// Ordered, tabular collection of records sharing one column list
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSet {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    /// Create an empty record set with the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut index = HashMap::with_capacity(columns.len());
        for (position, name) in columns.iter().enumerate() {
            // First occurrence wins for duplicated headers
            index.entry(name.clone()).or_insert(position);
        }
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Build a record set whose cells are all text
    pub fn from_text_rows<I, S, R, T>(columns: I, rows: R) -> ReconResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        R: IntoIterator<Item = Vec<T>>,
        T: Into<String>,
    {
        let mut set = Self::new(columns);
        for row in rows {
            set.push_row(row.into_iter().map(|v| Value::Text(v.into())).collect())?;
        }
        Ok(set)
    }

    /// Append a row; its width must match the column count
    pub fn push_row(&mut self, values: Vec<Value>) -> ReconResult<()> {
        if values.len() != self.columns.len() {
            return Err(ReconError::RowWidth {
                expected: self.columns.len(),
                actual: values.len(),
            });
        }
        self.rows.push(values);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow one row as a record
    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        self.rows.get(row).map(|values| Record { set: self, values })
    }

    /// Iterate over the rows in order
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.rows.iter().map(move |values| Record { set: self, values })
    }

    /// Value of `column` in `row`, if both exist
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let position = self.column_index(column)?;
        self.rows.get(row).and_then(|values| values.get(position))
    }

    /// All values of one column, in row order
    pub fn column_values<'a>(&'a self, column: &str) -> Option<impl Iterator<Item = &'a Value>> {
        let position = self.column_index(column)?;
        Some(self.rows.iter().map(move |values| &values[position]))
    }

    /// Apply `f` to every value of one column in place
    pub(crate) fn map_column<F>(&mut self, position: usize, mut f: F)
    where
        F: FnMut(usize, &Value) -> Value,
    {
        for (row, values) in self.rows.iter_mut().enumerate() {
            let updated = f(row, &values[position]);
            values[position] = updated;
        }
    }

    /// Apply `f` to every value of every row in place
    pub(crate) fn map_values<F>(&mut self, mut f: F)
    where
        F: FnMut(&Value) -> Value,
    {
        for values in &mut self.rows {
            for value in values.iter_mut() {
                *value = f(value);
            }
        }
    }

    /// Keep only the rows for which `keep` returns true
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Record<'_>) -> bool,
    {
        let rows = std::mem::take(&mut self.rows);
        let mut kept = Vec::with_capacity(rows.len());
        for values in rows {
            let record = Record {
                set: &*self,
                values: &values,
            };
            if keep(&record) {
                kept.push(values);
            }
        }
        self.rows = kept;
    }

    /// Concatenate record sets in order
    ///
    /// The resulting column list is the union of all inputs in first-seen
    /// order. Cells a source does not carry are filled with [`Value::Empty`].
    pub fn concat<I>(sets: I) -> Self
    where
        I: IntoIterator<Item = RecordSet>,
    {
        let sets: Vec<RecordSet> = sets.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for set in &sets {
            for column in &set.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let mut combined = RecordSet::new(columns);
        for set in sets {
            let positions: Vec<Option<usize>> = combined
                .columns
                .iter()
                .map(|column| set.column_index(column))
                .collect();
            for values in set.rows {
                let row = positions
                    .iter()
                    .map(|position| match position {
                        Some(p) => values[*p].clone(),
                        None => Value::Empty,
                    })
                    .collect();
                combined.rows.push(row);
            }
        }
        combined
    }
}

/// Borrowed view of one row of a [`RecordSet`]
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    set: &'a RecordSet,
    values: &'a [Value],
}

impl<'a> Record<'a> {
    /// Value of a named field; `None` if the set has no such column
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.set
            .column_index(field)
            .and_then(|position| self.values.get(position))
    }

    /// Value of a named field, treating an unknown column as absent
    pub fn value(&self, field: &str) -> &'a Value {
        const ABSENT: &Value = &Value::Empty;
        self.get(field).unwrap_or(ABSENT)
    }

    pub fn values(&self) -> &'a [Value] {
        self.values
    }
}

/// Errors that can occur while reconciling
#[derive(Debug, thiserror::Error)]
pub enum ReconError {
    #[error("'{column}' column not found in {side} data")]
    MissingColumn { column: String, side: Side },
    #[error("Row width mismatch: expected {expected} values, got {actual}")]
    RowWidth { expected: usize, actual: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("Workbook error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for reconciliation operations
pub type ReconResult<T> = Result<T, ReconError>;
