//! CSV record sources: the NEX export directory and the flat FCA extract

use csv::ReaderBuilder;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::reconciliation::{Normalized, RecordNormalizer};
use crate::traits::*;
use crate::types::*;

/// Read a CSV stream into a record set, every cell as text
///
/// Headers are trimmed. Short rows are padded with absent values and surplus
/// cells are dropped. Rows of blank cells are kept, so row indexes follow the
/// data lines of the file; only fully empty lines are skipped by the reader.
pub fn read_records<R: Read>(reader: R) -> ReconResult<RecordSet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let width = headers.len();
    let mut set = RecordSet::new(headers);

    for result in reader.records() {
        let record = result?;
        let mut values: Vec<Value> = record.iter().take(width).map(Value::text).collect();
        values.resize(width, Value::Empty);
        set.push_row(values)?;
    }

    Ok(set)
}

/// Read one CSV file into a record set
pub fn read_csv_file(path: &Path) -> ReconResult<RecordSet> {
    let set = read_records(File::open(path)?)?;
    debug!(path = %path.display(), rows = set.len(), "read csv file");
    Ok(set)
}

/// Every `*.csv` file directly inside `dir`, sorted by file name
pub fn csv_files_in(dir: &Path) -> ReconResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if path.is_file() && is_csv {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Directory of NEX trade export files
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
    side: Side,
}

impl CsvDirectorySource {
    /// Create a source over every CSV file in `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            side: Side::Nex,
        }
    }

    /// Override the side (defaults to NEX)
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Load and normalize each file separately, then concatenate
    ///
    /// Flags carry the file name they were raised in and row indexes relative
    /// to that file.
    pub fn load_normalized(&self, normalizer: &RecordNormalizer) -> ReconResult<Normalized> {
        let mut sets = Vec::new();
        let mut flags = Vec::new();
        for path in csv_files_in(&self.dir)? {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            let normalized = normalizer.normalize_from(read_csv_file(&path)?, &name)?;
            sets.push(normalized.records);
            flags.extend(normalized.flags);
        }

        let records = RecordSet::concat(sets);
        info!(dir = %self.dir.display(), rows = records.len(), "combined csv files");
        Ok(Normalized { records, flags })
    }
}

impl RecordSource for CsvDirectorySource {
    fn side(&self) -> Side {
        self.side
    }

    fn load(&self) -> ReconResult<RecordSet> {
        let sets = csv_files_in(&self.dir)?
            .iter()
            .map(|path| read_csv_file(path))
            .collect::<ReconResult<Vec<_>>>()?;
        let records = RecordSet::concat(sets);
        info!(dir = %self.dir.display(), rows = records.len(), "combined csv files");
        Ok(records)
    }
}

/// Single flat CSV file, typically the extracted FCA transaction report
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
    side: Side,
    required_key: Option<String>,
}

impl CsvFileSource {
    /// Create a source over one CSV file
    pub fn new(side: Side, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            side,
            required_key: None,
        }
    }

    /// Flat FCA extract: rows with a blank `key_field` are dropped on load
    pub fn fca(path: impl Into<PathBuf>, key_field: impl Into<String>) -> Self {
        Self::new(Side::Fca, path).skip_blank_keys(key_field)
    }

    /// Drop rows whose `key_field` is blank or absent
    pub fn skip_blank_keys(mut self, key_field: impl Into<String>) -> Self {
        self.required_key = Some(key_field.into());
        self
    }
}

impl RecordSource for CsvFileSource {
    fn side(&self) -> Side {
        self.side
    }

    fn load(&self) -> ReconResult<RecordSet> {
        let mut records = read_csv_file(&self.path)?;
        if let Some(key) = &self.required_key {
            if !records.has_column(key) {
                return Err(ReconError::MissingColumn {
                    column: key.clone(),
                    side: self.side,
                });
            }
            let before = records.len();
            records.retain(|record| !record.value(key).is_blank());
            let dropped = before - records.len();
            if dropped > 0 {
                debug!(path = %self.path.display(), dropped, "dropped rows with blank key");
            }
        }
        info!(side = %self.side, path = %self.path.display(), rows = records.len(), "parsed records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records_pads_and_keeps_blank_rows() {
        let data = " TxId , Amt\n1,10\n,\n2\n3,30,extra\n";
        let set = read_records(data.as_bytes()).unwrap();

        assert_eq!(set.columns(), ["TxId", "Amt"]);
        assert_eq!(set.len(), 4);
        assert_eq!(set.get(1, "TxId"), Some(&Value::text("")));
        assert_eq!(set.get(2, "Amt"), Some(&Value::Empty));
        assert_eq!(set.get(3, "Amt"), Some(&Value::text("30")));
    }

    #[test]
    fn test_flag_line_numbers_survive_blank_rows() {
        let data = "Transaction Reference Number,Price\n,\n,,\n1001.0,2\n";
        let set = read_records(data.as_bytes()).unwrap();
        let normalized = RecordNormalizer::new(Side::Nex, "Transaction Reference Number")
            .normalize(set)
            .unwrap();

        assert_eq!(normalized.records.len(), 3);
        let flag = normalized
            .flags
            .iter()
            .find(|f| f.issue == KeyIssue::DecimalPoint)
            .unwrap();
        assert_eq!(flag.row_index, 2);
        assert_eq!(flag.line_number(), 4);
        assert_eq!(flag.value, "1001.0");
    }

    #[test]
    fn test_read_records_keeps_cells_as_text() {
        let data = "Transaction Reference Number,Price\n00123,98.7600\n";
        let set = read_records(data.as_bytes()).unwrap();
        assert_eq!(
            set.get(0, "Transaction Reference Number"),
            Some(&Value::text("00123"))
        );
        assert_eq!(set.get(0, "Price"), Some(&Value::text("98.7600")));
    }
}
