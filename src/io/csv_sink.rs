//! Chunked CSV report writer

use csv::WriterBuilder;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::traits::*;
use crate::types::*;

/// Rows written between two flushes unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// File name a named record set is written to: `"Check Results"` becomes `check_results.csv`
pub fn file_name_for(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}.csv", stem)
}

/// Write a record set as CSV, flushing after every `chunk_size` rows
///
/// The header is written once, ahead of the first chunk. Returns the number
/// of data rows written.
pub fn write_records<W: Write>(
    writer: W,
    records: &RecordSet,
    chunk_size: usize,
) -> ReconResult<usize> {
    let chunk_size = chunk_size.max(1);
    let mut writer = WriterBuilder::new().from_writer(writer);
    writer.write_record(records.columns())?;

    let mut written = 0;
    for (chunk, rows) in records
        .records()
        .collect::<Vec<_>>()
        .chunks(chunk_size)
        .enumerate()
    {
        for record in rows {
            writer.write_record(record.values().iter().map(|v| v.to_string()))?;
        }
        writer.flush()?;
        written += rows.len();
        debug!(chunk, rows = rows.len(), written, "flushed chunk");
    }

    writer.flush()?;
    Ok(written)
}

/// Report sink writing one CSV file per record set into a directory
#[derive(Debug, Clone)]
pub struct CsvReportSink {
    dir: PathBuf,
    chunk_size: usize,
}

impl CsvReportSink {
    /// Create a sink writing into `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Path the record set called `name` is written to
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(file_name_for(name))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ReportSink for CsvReportSink {
    fn write(&mut self, name: &str, records: &RecordSet) -> ReconResult<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(name);
        let rows = write_records(File::create(&path)?, records, self.chunk_size)?;
        info!(sheet = name, path = %path.display(), rows, "wrote record set");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_for() {
        assert_eq!(file_name_for("Check Results"), "check_results.csv");
        assert_eq!(file_name_for("NEX data"), "nex_data.csv");
    }

    #[test]
    fn test_write_records_in_chunks() {
        let mut set = RecordSet::new(["Check", "CHECK Count"]);
        for i in 0..5 {
            set.push_row(vec![Value::text(format!("row {i}")), Value::Empty])
                .unwrap();
        }

        let mut buffer = Vec::new();
        let written = write_records(&mut buffer, &set, 2).unwrap();

        assert_eq!(written, 5);
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "Check,CHECK Count");
        assert_eq!(lines[1], "row 0,");
        assert_eq!(text.matches("Check,CHECK Count").count(), 1);
    }

    #[test]
    fn test_write_empty_set_writes_header_only() {
        let set = RecordSet::new(["a", "b"]);
        let mut buffer = Vec::new();
        assert_eq!(write_records(&mut buffer, &set, 0).unwrap(), 0);
        assert_eq!(String::from_utf8(buffer).unwrap(), "a,b\n");
    }
}
