//! Excel workbook report sink: one worksheet per record set

use bigdecimal::ToPrimitive;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::traits::*;
use crate::types::*;

/// Workbook written by the command-line driver unless configured otherwise
pub const DEFAULT_WORKBOOK: &str = "output_file_with_checks_and_summary.xlsx";

/// Report sink collecting every record set as a worksheet of one workbook
///
/// Sheets are kept in write order. Nothing reaches the disk until
/// [`ReportSink::finish`] saves the workbook.
pub struct XlsxReportSink {
    path: PathBuf,
    workbook: Workbook,
    sheets: usize,
}

impl XlsxReportSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            workbook: Workbook::new(),
            sheets: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, value: &Value) -> Result<(), XlsxError> {
    match value {
        Value::Empty => {}
        Value::Boolean(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.to_f64() {
            Some(number) => {
                sheet.write_number(row, col, number)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::Text(_) | Value::Date(_) => {
            sheet.write_string(row, col, value.to_string())?;
        }
    }
    Ok(())
}

/// Fill a worksheet: header row, then one row per record
fn fill_sheet(sheet: &mut Worksheet, records: &RecordSet) -> Result<(), XlsxError> {
    for (col, column) in records.columns().iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
        sheet.write_string(0, col, column.as_str())?;
    }

    for (row, record) in records.records().enumerate() {
        let row = u32::try_from(row + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, value) in record.values().iter().enumerate() {
            let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
            write_cell(sheet, row, col, value)?;
        }
    }
    Ok(())
}

impl ReportSink for XlsxReportSink {
    fn write(&mut self, name: &str, records: &RecordSet) -> ReconResult<()> {
        let sheet = self.workbook.add_worksheet();
        sheet.set_name(name)?;
        fill_sheet(sheet, records)?;
        self.sheets += 1;
        info!(sheet = name, rows = records.len(), "added worksheet");
        Ok(())
    }

    fn finish(&mut self) -> ReconResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        self.workbook.save(&self.path)?;
        info!(path = %self.path.display(), sheets = self.sheets, "saved workbook");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workbook_is_saved_on_finish() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("results.xlsx");
        let mut sink = XlsxReportSink::new(&path);

        let checks = RecordSet::from_text_rows(
            ["Price Check", "Actual Transaction Reference Number"],
            vec![vec!["OK", "1001"], vec!["CHECK", "1002"]],
        )
        .unwrap();
        let mut summary = RecordSet::new(["Check", "CHECK Count"]);
        summary
            .push_row(vec![
                Value::text("Price Check"),
                Value::Number(1u64.into()),
            ])
            .unwrap();

        sink.write("Check Results", &checks).unwrap();
        sink.write("Summary", &summary).unwrap();
        assert!(!path.exists());

        sink.finish().unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_invalid_sheet_name_is_an_error() {
        let mut sink = XlsxReportSink::new("unused.xlsx");
        let err = sink
            .write("Check/Results", &RecordSet::new(["a"]))
            .unwrap_err();
        assert!(matches!(err, ReconError::Xlsx(_)));
    }
}
