//! Summary aggregator: mismatch counts per check plus row counts and date ranges

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

use crate::reconciliation::engine::CheckResults;
use crate::reconciliation::mapping::MappingTable;
use crate::types::*;

/// Label column of the rendered summary
pub const SUMMARY_LABEL_COLUMN: &str = "Check";
/// Value column of the rendered summary
pub const SUMMARY_VALUE_COLUMN: &str = "CHECK Count";
/// Marker rendered for the range of a set without any row
pub const NO_ROWS_MARKER: &str = "no rows";
/// Marker rendered when rows exist but none carries a date
pub const NO_DATES_MARKER: &str = "no dates";

/// Textual min/max of a date column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateRange {
    Span { min: String, max: String },
    NoRows,
    NoDates,
}

impl DateRange {
    /// Lexical range over non-blank values
    ///
    /// Values are compared as normalized strings, not parsed dates, so mixed
    /// suffix conventions do not break the computation.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut range: Option<(String, String)> = None;
        let mut seen = false;
        for value in values {
            seen = true;
            let Some(text) = value.as_text() else {
                continue;
            };
            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            range = Some(match range {
                None => (text.to_string(), text.to_string()),
                Some((min, max)) => (
                    if text < min.as_str() { text.to_string() } else { min },
                    if text > max.as_str() { text.to_string() } else { max },
                ),
            });
        }
        match range {
            Some((min, max)) => DateRange::Span { min, max },
            None if seen => DateRange::NoDates,
            None => DateRange::NoRows,
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRange::Span { min, max } => write!(f, "{} to {}", min, max),
            DateRange::NoRows => f.write_str(NO_ROWS_MARKER),
            DateRange::NoDates => f.write_str(NO_DATES_MARKER),
        }
    }
}

/// Value cell of a summary row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryValue {
    Count(usize),
    Range(DateRange),
}

impl fmt::Display for SummaryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryValue::Count(count) => write!(f, "{}", count),
            SummaryValue::Range(range) => write!(f, "{}", range),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub label: String,
    pub value: SummaryValue,
}

impl SummaryRow {
    fn count(label: impl Into<String>, count: usize) -> Self {
        Self {
            label: label.into(),
            value: SummaryValue::Count(count),
        }
    }

    fn range(label: impl Into<String>, range: DateRange) -> Self {
        Self {
            label: label.into(),
            value: SummaryValue::Range(range),
        }
    }
}

/// Summary of one reconciliation
///
/// Rows are ordered: one per check, then total rows NEX, total rows FCA,
/// date range NEX, date range FCA.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub rows: Vec<SummaryRow>,
}

impl Summary {
    /// Look up a row by label
    pub fn get(&self, label: &str) -> Option<&SummaryValue> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| &row.value)
    }

    /// Render as a two-column record set
    pub fn to_record_set(&self) -> ReconResult<RecordSet> {
        let mut set = RecordSet::new([SUMMARY_LABEL_COLUMN, SUMMARY_VALUE_COLUMN]);
        for row in &self.rows {
            let value = match &row.value {
                SummaryValue::Count(count) => Value::Number((*count as u64).into()),
                SummaryValue::Range(range) => Value::Text(range.to_string()),
            };
            set.push_row(vec![Value::Text(row.label.clone()), value])?;
        }
        Ok(set)
    }
}

/// Aggregate check results into the summary; never fails
pub fn summarize(
    results: &CheckResults,
    nex: &RecordSet,
    fca: &RecordSet,
    mapping: &MappingTable,
) -> Summary {
    let mut rows = Vec::with_capacity(results.labels.len() + 4);

    for (column, label) in results.labels.iter().enumerate() {
        rows.push(SummaryRow::count(label.clone(), results.check_count(column)));
    }

    rows.push(SummaryRow::count("Total Rows in NEX", nex.len()));
    rows.push(SummaryRow::count("Total Rows in FCA", fca.len()));

    let (nex_range, fca_range) = match mapping.date_fields() {
        Some((nex_field, fca_field)) => (
            column_range(nex, nex_field),
            column_range(fca, fca_field),
        ),
        None => (DateRange::NoRows, DateRange::NoRows),
    };
    rows.push(SummaryRow::range("Date Range in NEX", nex_range));
    rows.push(SummaryRow::range("Date Range in FCA", fca_range));

    info!(
        checks = results.labels.len(),
        mismatched_rows = results.rows.iter().filter(|r| r.has_mismatch()).count(),
        "created summary"
    );

    Summary { rows }
}

fn column_range(set: &RecordSet, field: &str) -> DateRange {
    match set.column_values(field) {
        Some(values) => DateRange::from_values(values),
        None if set.is_empty() => DateRange::NoRows,
        None => DateRange::NoDates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::engine::CheckRow;

    fn results() -> CheckResults {
        CheckResults {
            labels: vec!["A Check".to_string(), "B Check".to_string()],
            instrument_column: None,
            rows: vec![
                CheckRow {
                    nex_row: 0,
                    fca_row: Some(0),
                    verdicts: vec![Verdict::Check, Verdict::Ok],
                    key: "1".to_string(),
                    instrument_name: None,
                },
                CheckRow {
                    nex_row: 1,
                    fca_row: None,
                    verdicts: vec![Verdict::Check, Verdict::Check],
                    key: "2".to_string(),
                    instrument_name: None,
                },
            ],
        }
    }

    #[test]
    fn test_date_range_is_lexical() {
        let values = [
            Value::text("2024-05-02T09:00:00Z"),
            Value::text("2024-05-01T10:00:00"),
            Value::text(""),
            Value::Empty,
            Value::text("2024-05-02T09:00:00"),
        ];
        let range = DateRange::from_values(values.iter());
        assert_eq!(
            range,
            DateRange::Span {
                min: "2024-05-01T10:00:00".to_string(),
                max: "2024-05-02T09:00:00Z".to_string(),
            }
        );
        assert_eq!(
            range.to_string(),
            "2024-05-01T10:00:00 to 2024-05-02T09:00:00Z"
        );
    }

    #[test]
    fn test_empty_range_marker() {
        let range = DateRange::from_values(std::iter::empty());
        assert_eq!(range, DateRange::NoRows);
        assert_eq!(range.to_string(), "no rows");
    }

    #[test]
    fn test_blank_dates_are_not_reported_as_no_rows() {
        let values = [Value::text(""), Value::Empty, Value::text("  ")];
        let range = DateRange::from_values(values.iter());
        assert_eq!(range, DateRange::NoDates);
        assert_eq!(range.to_string(), "no dates");

        let nex = RecordSet::from_text_rows(
            ["Trading Date Time"],
            vec![vec![""], vec![" "]],
        )
        .unwrap();
        let fca = RecordSet::from_text_rows(["x"], vec![vec!["1"]]).unwrap();
        let summary = summarize(&results(), &nex, &fca, &MappingTable::standard());
        assert_eq!(
            summary.get("Date Range in NEX"),
            Some(&SummaryValue::Range(DateRange::NoDates))
        );
        assert_eq!(
            summary.get("Date Range in FCA"),
            Some(&SummaryValue::Range(DateRange::NoDates))
        );
    }

    #[test]
    fn test_summary_row_order_and_counts() {
        let nex = RecordSet::from_text_rows(
            ["Trading Date Time"],
            vec![vec!["2024-01-02"], vec!["2024-01-01"]],
        )
        .unwrap();
        let fca = RecordSet::new(["TradDt"]);

        let summary = summarize(&results(), &nex, &fca, &MappingTable::standard());
        let labels: Vec<&str> = summary.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "A Check",
                "B Check",
                "Total Rows in NEX",
                "Total Rows in FCA",
                "Date Range in NEX",
                "Date Range in FCA",
            ]
        );
        assert_eq!(summary.get("A Check"), Some(&SummaryValue::Count(2)));
        assert_eq!(summary.get("B Check"), Some(&SummaryValue::Count(1)));
        assert_eq!(summary.get("Total Rows in FCA"), Some(&SummaryValue::Count(0)));
        assert_eq!(
            summary.get("Date Range in NEX").unwrap().to_string(),
            "2024-01-01 to 2024-01-02"
        );
        assert_eq!(
            summary.get("Date Range in FCA"),
            Some(&SummaryValue::Range(DateRange::NoRows))
        );
    }

    #[test]
    fn test_summary_missing_date_column_is_no_rows() {
        let empty = RecordSet::new(["x"]);
        let summary = summarize(&results(), &empty, &empty, &MappingTable::standard());
        assert_eq!(
            summary.get("Date Range in NEX"),
            Some(&SummaryValue::Range(DateRange::NoRows))
        );
    }

    #[test]
    fn test_summary_record_set() {
        let empty = RecordSet::new(["x"]);
        let summary = summarize(&results(), &empty, &empty, &MappingTable::standard());
        let set = summary.to_record_set().unwrap();
        assert_eq!(set.columns(), ["Check", "CHECK Count"]);
        assert_eq!(set.len(), 6);
        assert_eq!(set.get(0, "CHECK Count").unwrap().to_string(), "2");
        assert_eq!(set.get(5, "CHECK Count").unwrap().to_string(), "no rows");
    }
}
