//! Join & check engine: left-joins NEX records onto FCA records and applies every mapping

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::reconciliation::mapping::MappingTable;
use crate::types::*;

/// Passthrough column carrying the NEX key in the rendered results
pub const ACTUAL_KEY_COLUMN: &str = "Actual Transaction Reference Number";

/// Verdicts for one joined (NEX row, FCA match) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRow {
    /// Index of the NEX record this row was produced from
    pub nex_row: usize,
    /// Index of the matched FCA record, `None` when the key had no match
    pub fca_row: Option<usize>,
    /// One verdict per mapping, in mapping order
    pub verdicts: Vec<Verdict>,
    /// NEX transaction key
    pub key: String,
    /// NEX instrument name, when the NEX set carries that column
    pub instrument_name: Option<String>,
}

impl CheckRow {
    pub fn is_matched(&self) -> bool {
        self.fca_row.is_some()
    }

    pub fn has_mismatch(&self) -> bool {
        self.verdicts.iter().any(Verdict::is_check)
    }
}

/// Output of [`reconcile`]: one row per NEX record per FCA match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResults {
    /// Check column labels, in mapping order
    pub labels: Vec<String>,
    /// Name of the instrument passthrough column, when present in the NEX set
    pub instrument_column: Option<String>,
    pub rows: Vec<CheckRow>,
}

impl CheckResults {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of `CHECK` verdicts in one check column
    pub fn check_count(&self, column: usize) -> usize {
        self.rows
            .iter()
            .filter(|row| row.verdicts.get(column).is_some_and(Verdict::is_check))
            .count()
    }

    /// NEX rows whose key found no FCA counterpart
    pub fn unmatched(&self) -> impl Iterator<Item = &CheckRow> {
        self.rows.iter().filter(|row| !row.is_matched())
    }

    /// Render as a record set: check columns, then the passthrough columns
    pub fn to_record_set(&self) -> ReconResult<RecordSet> {
        let mut columns = self.labels.clone();
        columns.push(ACTUAL_KEY_COLUMN.to_string());
        if let Some(instrument) = &self.instrument_column {
            columns.push(instrument.clone());
        }

        let mut set = RecordSet::new(columns);
        for row in &self.rows {
            let mut values: Vec<Value> = row
                .verdicts
                .iter()
                .map(|v| Value::Text(v.to_string()))
                .collect();
            values.push(Value::Text(row.key.clone()));
            if self.instrument_column.is_some() {
                values.push(
                    row.instrument_name
                        .clone()
                        .map(Value::Text)
                        .unwrap_or(Value::Empty),
                );
            }
            set.push_row(values)?;
        }
        Ok(set)
    }
}

/// Fail fast when a column the mapping table needs is missing
pub fn ensure_columns(
    nex: &RecordSet,
    fca: &RecordSet,
    mapping: &MappingTable,
) -> ReconResult<()> {
    for column in mapping.required_nex_fields() {
        if !nex.has_column(column) {
            return Err(ReconError::MissingColumn {
                column: column.to_string(),
                side: Side::Nex,
            });
        }
    }
    for column in mapping.required_fca_fields() {
        if !fca.has_column(column) {
            return Err(ReconError::MissingColumn {
                column: column.to_string(),
                side: Side::Fca,
            });
        }
    }
    Ok(())
}

/// Left-join `nex` onto `fca` by transaction key and check every mapping
///
/// Output follows NEX row order, then FCA match order. A NEX record matching
/// several FCA records yields one row per match; an unmatched NEX record
/// yields one row compared against an all-absent FCA side.
pub fn reconcile(
    nex: &RecordSet,
    fca: &RecordSet,
    mapping: &MappingTable,
) -> ReconResult<CheckResults> {
    ensure_columns(nex, fca, mapping)?;

    let mut fca_index: HashMap<String, Vec<usize>> = HashMap::new();
    for (position, record) in fca.records().enumerate() {
        if let Some(key) = record.value(&mapping.key.fca_field).as_text() {
            fca_index.entry(key.into_owned()).or_default().push(position);
        }
    }
    debug!(keys = fca_index.len(), "indexed FCA records");

    let instrument_column = mapping
        .instrument_name_field
        .as_ref()
        .filter(|field| nex.has_column(field))
        .cloned();

    let absent = Value::Empty;
    let mut rows = Vec::with_capacity(nex.len());
    for (nex_row, nex_record) in nex.records().enumerate() {
        let key_value = nex_record.value(&mapping.key.nex_field);
        let key = key_value.as_text().map(|k| k.into_owned());
        let instrument_name = instrument_column
            .as_deref()
            .and_then(|field| nex_record.value(field).as_text())
            .map(|name| name.into_owned());

        let matches: &[usize] = key
            .as_deref()
            .and_then(|k| fca_index.get(k))
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let fca_rows: Vec<Option<usize>> = if matches.is_empty() {
            vec![None]
        } else {
            matches.iter().copied().map(Some).collect()
        };

        for fca_row in fca_rows {
            let fca_record = fca_row.and_then(|row| fca.record(row));
            let verdicts = mapping
                .mappings
                .iter()
                .map(|m| {
                    let nex_value = nex_record.value(&m.nex_field);
                    let (fca_value, fallback_value) = match &fca_record {
                        Some(record) => (
                            record.value(&m.fca_field),
                            m.fallback_fca_field
                                .as_deref()
                                .map(|f| record.value(f))
                                .unwrap_or(&absent),
                        ),
                        None => (&absent, &absent),
                    };
                    m.rule.compare(nex_value, fca_value, fallback_value)
                })
                .collect();

            rows.push(CheckRow {
                nex_row,
                fca_row,
                verdicts,
                key: key.clone().unwrap_or_default(),
                instrument_name: instrument_name.clone(),
            });
        }
    }

    let results = CheckResults {
        labels: mapping.check_labels(),
        instrument_column,
        rows,
    };

    info!(
        nex_rows = nex.len(),
        fca_rows = fca.len(),
        result_rows = results.len(),
        unmatched = results.unmatched().count(),
        "performed checks"
    );

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::comparator::ComparisonRule;
    use crate::reconciliation::mapping::FieldMapping;

    fn small_table() -> MappingTable {
        MappingTable::new(
            "id",
            "TxId",
            vec![
                FieldMapping::new("Id", "id", "TxId", ComparisonRule::Exact),
                FieldMapping::new(
                    "Qty",
                    "qty",
                    "QtyUnit",
                    ComparisonRule::NumericRounded { precision: 0 },
                )
                .with_fallback("NmnlVal"),
            ],
        )
    }

    fn nex(rows: Vec<Vec<&str>>) -> RecordSet {
        RecordSet::from_text_rows(["id", "qty"], rows).unwrap()
    }

    fn fca(rows: Vec<Vec<&str>>) -> RecordSet {
        RecordSet::from_text_rows(["TxId", "QtyUnit", "NmnlVal"], rows).unwrap()
    }

    #[test]
    fn test_matched_rows() {
        let results = reconcile(
            &nex(vec![vec!["1", "10"], vec!["2", "20"]]),
            &fca(vec![vec!["2", "", "20"], vec!["1", "10.0", ""]]),
            &small_table(),
        )
        .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results.rows[0].fca_row, Some(1));
        assert_eq!(results.rows[0].verdicts, vec![Verdict::Ok, Verdict::Ok]);
        assert_eq!(results.rows[1].fca_row, Some(0));
        assert_eq!(results.rows[1].verdicts, vec![Verdict::Ok, Verdict::Ok]);
    }

    #[test]
    fn test_fan_out_and_order() {
        let results = reconcile(
            &nex(vec![vec!["1", "10"], vec!["2", "5"]]),
            &fca(vec![
                vec!["1", "10", ""],
                vec!["2", "5", ""],
                vec!["1", "11", ""],
            ]),
            &small_table(),
        )
        .unwrap();

        let order: Vec<(usize, Option<usize>)> =
            results.rows.iter().map(|r| (r.nex_row, r.fca_row)).collect();
        assert_eq!(order, vec![(0, Some(0)), (0, Some(2)), (1, Some(1))]);
        assert_eq!(results.rows[1].verdicts[1], Verdict::Check);
    }

    #[test]
    fn test_unmatched_row_is_all_check() {
        let results = reconcile(
            &nex(vec![vec!["9", ""]]),
            &fca(vec![vec!["1", "", ""]]),
            &small_table(),
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert!(!results.rows[0].is_matched());
        assert_eq!(
            results.rows[0].verdicts,
            vec![Verdict::Check, Verdict::Check]
        );
        assert_eq!(results.unmatched().count(), 1);
    }

    #[test]
    fn test_missing_columns_fail_fast() {
        let bad_nex = RecordSet::from_text_rows(["id"], vec![vec!["1"]]).unwrap();
        let err = reconcile(&bad_nex, &fca(vec![]), &small_table()).unwrap_err();
        assert!(matches!(
            err,
            ReconError::MissingColumn { ref column, side: Side::Nex } if column == "qty"
        ));

        let bad_fca = RecordSet::from_text_rows(["TxId", "QtyUnit"], Vec::<Vec<&str>>::new())
            .unwrap();
        let err = reconcile(&nex(vec![]), &bad_fca, &small_table()).unwrap_err();
        assert!(matches!(
            err,
            ReconError::MissingColumn { ref column, side: Side::Fca } if column == "NmnlVal"
        ));
    }

    #[test]
    fn test_record_set_rendering() {
        let results = reconcile(
            &nex(vec![vec!["1", "10"]]),
            &fca(vec![vec!["1", "12", ""]]),
            &small_table(),
        )
        .unwrap();
        let set = results.to_record_set().unwrap();

        assert_eq!(
            set.columns(),
            ["Id Check", "Qty Check", "Actual Transaction Reference Number"]
        );
        assert_eq!(set.get(0, "Id Check"), Some(&Value::text("OK")));
        assert_eq!(set.get(0, "Qty Check"), Some(&Value::text("CHECK")));
        assert_eq!(
            set.get(0, "Actual Transaction Reference Number"),
            Some(&Value::text("1"))
        );
    }

    #[test]
    fn test_check_count() {
        let results = reconcile(
            &nex(vec![vec!["1", "10"], vec!["2", "3"], vec!["3", "4"]]),
            &fca(vec![vec!["1", "11", ""], vec!["2", "3", ""]]),
            &small_table(),
        )
        .unwrap();
        assert_eq!(results.check_count(0), 1);
        assert_eq!(results.check_count(1), 2);
        assert_eq!(results.check_count(7), 0);
    }
}
