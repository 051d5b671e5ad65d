//! In-memory source and sink implementations for testing

use std::sync::{Arc, PoisonError, RwLock};

use crate::traits::*;
use crate::types::*;

/// Record source serving a fixed, in-memory record set
#[derive(Debug, Clone)]
pub struct MemorySource {
    side: Side,
    records: RecordSet,
}

impl MemorySource {
    /// Create a new memory source
    pub fn new(side: Side, records: RecordSet) -> Self {
        Self { side, records }
    }
}

impl RecordSource for MemorySource {
    fn side(&self) -> Side {
        self.side
    }

    fn load(&self) -> ReconResult<RecordSet> {
        Ok(self.records.clone())
    }
}

/// In-memory report sink for testing and development
///
/// Clones share the same underlying storage, so a test can keep one handle
/// while the pipeline writes through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    sheets: Arc<RwLock<Vec<(String, RecordSet)>>>,
}

impl MemorySink {
    /// Create a new memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the written record sets, in write order
    pub fn names(&self) -> Vec<String> {
        self.sheets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Most recent record set written under `name`
    pub fn get(&self, name: &str) -> Option<RecordSet> {
        self.sheets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find(|(sheet, _)| sheet == name)
            .map(|(_, records)| records.clone())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ReportSink for MemorySink {
    fn write(&mut self, name: &str, records: &RecordSet) -> ReconResult<()> {
        self.sheets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), records.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_returns_copy() {
        let records = RecordSet::from_text_rows(["TxId"], vec![vec!["1"]]).unwrap();
        let source = MemorySource::new(Side::Fca, records.clone());
        assert_eq!(source.side(), Side::Fca);
        assert_eq!(source.load().unwrap(), records);
    }

    #[test]
    fn test_memory_sink_shares_storage_between_clones() {
        let sink = MemorySink::new();
        let mut writer = sink.clone();
        let records = RecordSet::new(["Check", "CHECK Count"]);

        writer.write("Summary", &records).unwrap();

        assert_eq!(sink.names(), vec!["Summary".to_string()]);
        assert_eq!(sink.get("Summary"), Some(records));
        assert!(sink.get("Check Results").is_none());

        sink.clear();
        assert!(sink.names().is_empty());
    }
}
