//! Reconciliation module for NEX trade exports against FCA transaction reports
//!
//! Data flows from the [`normalizer`] into the join & check [`engine`], which
//! applies the [`mapping`] table through the [`comparator`] rules; the
//! [`summary`] aggregator then counts mismatches.

pub mod comparator;
pub mod engine;
pub mod mapping;
pub mod normalizer;
pub mod summary;

pub use comparator::*;
pub use engine::*;
pub use mapping::*;
pub use normalizer::*;
pub use summary::*;

use serde::{Deserialize, Serialize};
use tracing::info_span;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// Output of one complete reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub run_id: Uuid,
    pub results: CheckResults,
    pub summary: Summary,
    /// Data-quality flags raised while ingesting both sides
    pub flags: Vec<DataQualityFlag>,
}

/// Stateless engine bound to one mapping table
///
/// Every call is independent; the engine can be shared across threads and
/// invoked concurrently on disjoint inputs.
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    mapping: MappingTable,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    /// Create an engine running the standard NEX/FCA checks
    pub fn new() -> Self {
        Self {
            mapping: MappingTable::standard(),
        }
    }

    /// Create an engine with a custom mapping table
    pub fn with_mapping(mapping: MappingTable) -> Self {
        Self { mapping }
    }

    pub fn mapping(&self) -> &MappingTable {
        &self.mapping
    }

    /// Normalizer for the NEX side, keyed on this table's NEX key
    pub fn nex_normalizer(&self) -> RecordNormalizer {
        RecordNormalizer::new(Side::Nex, self.mapping.key.nex_field.clone())
    }

    /// Normalizer for the FCA side, keyed on this table's FCA key
    pub fn fca_normalizer(&self) -> RecordNormalizer {
        RecordNormalizer::new(Side::Fca, self.mapping.key.fca_field.clone())
    }

    /// Join and check two normalized record sets
    pub fn reconcile(&self, nex: &RecordSet, fca: &RecordSet) -> ReconResult<CheckResults> {
        reconcile(nex, fca, &self.mapping)
    }

    /// Aggregate results into the summary
    pub fn summarize(&self, results: &CheckResults, nex: &RecordSet, fca: &RecordSet) -> Summary {
        summarize(results, nex, fca, &self.mapping)
    }

    /// Normalize both raw sets, reconcile them and summarize the outcome
    pub fn run(&self, nex: RecordSet, fca: RecordSet) -> ReconResult<ReconciliationReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("reconciliation", %run_id);
        let _guard = span.enter();

        let nex = self.nex_normalizer().normalize(nex)?;
        let fca = self.fca_normalizer().normalize(fca)?;
        let results = self.reconcile(&nex.records, &fca.records)?;
        let summary = self.summarize(&results, &nex.records, &fca.records);

        let mut flags = nex.flags;
        flags.extend(fca.flags);

        Ok(ReconciliationReport {
            run_id,
            results,
            summary,
            flags,
        })
    }

    /// Load both sides from their sources and run the reconciliation
    pub fn run_sources(
        &self,
        nex: &dyn RecordSource,
        fca: &dyn RecordSource,
    ) -> ReconResult<ReconciliationReport> {
        self.run(nex.load()?, fca.load()?)
    }
}
