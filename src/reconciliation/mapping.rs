//! Field mapping table: which NEX field is checked against which FCA field, and how

use serde::{Deserialize, Serialize};

use crate::reconciliation::comparator::ComparisonRule;

/// NEX column holding the transaction key
pub const NEX_KEY_FIELD: &str = "Transaction Reference Number";
/// FCA column holding the transaction key
pub const FCA_KEY_FIELD: &str = "TxId";
/// Optional NEX column passed through to the check results
pub const NEX_INSTRUMENT_NAME_FIELD: &str = "Instrument Full Name";

/// One logical check between a NEX field and an FCA field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Human-readable name of the check
    pub display_name: String,
    /// NEX column compared
    pub nex_field: String,
    /// FCA column compared
    pub fca_field: String,
    /// How the two values are compared
    pub rule: ComparisonRule,
    /// FCA column used when `fca_field` is blank (treasury bill reporting)
    pub fallback_fca_field: Option<String>,
}

impl FieldMapping {
    /// Create a mapping without a fallback field
    pub fn new(
        display_name: impl Into<String>,
        nex_field: impl Into<String>,
        fca_field: impl Into<String>,
        rule: ComparisonRule,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            nex_field: nex_field.into(),
            fca_field: fca_field.into(),
            rule,
            fallback_fca_field: None,
        }
    }

    /// Set the FCA field consulted when the primary FCA field is blank
    pub fn with_fallback(mut self, fallback_fca_field: impl Into<String>) -> Self {
        self.fallback_fca_field = Some(fallback_fca_field.into());
        self
    }

    /// Column label of this check in the result and summary record sets
    pub fn check_label(&self) -> String {
        format!("{} Check", self.display_name)
    }
}

/// Pair of columns the two record sets are joined on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKey {
    pub nex_field: String,
    pub fca_field: String,
}

/// Complete declaration of one reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingTable {
    /// Join key
    pub key: JoinKey,
    /// Checks, in output column order
    pub mappings: Vec<FieldMapping>,
    /// NEX column carried into the results when present
    pub instrument_name_field: Option<String>,
}

impl MappingTable {
    /// Create a table from a key and a list of mappings
    pub fn new(
        nex_key_field: impl Into<String>,
        fca_key_field: impl Into<String>,
        mappings: Vec<FieldMapping>,
    ) -> Self {
        Self {
            key: JoinKey {
                nex_field: nex_key_field.into(),
                fca_field: fca_key_field.into(),
            },
            mappings,
            instrument_name_field: None,
        }
    }

    /// Set the NEX column passed through as instrument name
    pub fn with_instrument_name(mut self, field: impl Into<String>) -> Self {
        self.instrument_name_field = Some(field.into());
        self
    }

    /// The ten checks of the NEX against FCA transaction report reconciliation
    pub fn standard() -> Self {
        let mappings = vec![
            FieldMapping::new(
                "Transaction Reference Number",
                NEX_KEY_FIELD,
                FCA_KEY_FIELD,
                ComparisonRule::Exact,
            ),
            FieldMapping::new(
                "Executing Entity Code",
                "Executing Entity Identification Code",
                "ExctgPty",
                ComparisonRule::Exact,
            ),
            FieldMapping::new(
                "Trading Date Time",
                "Trading Date Time",
                "TradDt",
                ComparisonRule::DateSuffixTolerant,
            ),
            FieldMapping::new(
                "Quantity",
                "Quantity",
                "QtyUnit",
                ComparisonRule::NumericRounded { precision: 0 },
            )
            .with_fallback("NmnlVal"),
            FieldMapping::new(
                "Price",
                "Price",
                "Amt",
                ComparisonRule::NumericRounded { precision: 2 },
            )
            .with_fallback("Pctg"),
            FieldMapping::new(
                "Instrument Id",
                "Instrument Identification Code",
                "FinInstrmId",
                ComparisonRule::Exact,
            ),
            FieldMapping::new(
                "Trading Venue",
                "Trading Venue",
                "TradVn",
                ComparisonRule::Exact,
            ),
            FieldMapping::new(
                "Transmission Indicator",
                "Transmission of Order Indicator",
                "TrnsmssnInd",
                ComparisonRule::BooleanNormalized,
            ),
            FieldMapping::new("Buyer Code", "Buyer Code", "LEI", ComparisonRule::Exact),
            FieldMapping::new("Seller Code", "Seller Code", "LEI3", ComparisonRule::Exact),
        ];

        Self::new(NEX_KEY_FIELD, FCA_KEY_FIELD, mappings)
            .with_instrument_name(NEX_INSTRUMENT_NAME_FIELD)
    }

    /// Labels of every check, in declaration order
    pub fn check_labels(&self) -> Vec<String> {
        self.mappings.iter().map(FieldMapping::check_label).collect()
    }

    /// NEX columns the engine cannot run without
    pub fn required_nex_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.key.nex_field.as_str()];
        for mapping in &self.mappings {
            push_unique(&mut fields, &mapping.nex_field);
        }
        fields
    }

    /// FCA columns the engine cannot run without, fallbacks included
    pub fn required_fca_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.key.fca_field.as_str()];
        for mapping in &self.mappings {
            push_unique(&mut fields, &mapping.fca_field);
            if let Some(fallback) = &mapping.fallback_fca_field {
                push_unique(&mut fields, fallback);
            }
        }
        fields
    }

    /// Columns whose textual range is reported in the summary
    ///
    /// The first date-tolerant mapping wins.
    pub fn date_fields(&self) -> Option<(&str, &str)> {
        self.mappings
            .iter()
            .find(|m| matches!(m.rule, ComparisonRule::DateSuffixTolerant))
            .map(|m| (m.nex_field.as_str(), m.fca_field.as_str()))
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self::standard()
    }
}

fn push_unique<'a>(fields: &mut Vec<&'a str>, field: &'a str) {
    if !fields.contains(&field) {
        fields.push(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_shape() {
        let table = MappingTable::standard();
        assert_eq!(table.mappings.len(), 10);
        assert_eq!(table.key.nex_field, "Transaction Reference Number");
        assert_eq!(table.key.fca_field, "TxId");
        assert_eq!(
            table.instrument_name_field.as_deref(),
            Some("Instrument Full Name")
        );
        assert_eq!(table.check_labels()[3], "Quantity Check");
    }

    #[test]
    fn test_treasury_bill_fallbacks() {
        let table = MappingTable::standard();
        let fallbacks: Vec<(&str, &str)> = table
            .mappings
            .iter()
            .filter_map(|m| {
                m.fallback_fca_field
                    .as_deref()
                    .map(|f| (m.fca_field.as_str(), f))
            })
            .collect();
        assert_eq!(fallbacks, vec![("QtyUnit", "NmnlVal"), ("Amt", "Pctg")]);
    }

    #[test]
    fn test_required_fields_include_fallbacks_once() {
        let table = MappingTable::standard();
        let fca = table.required_fca_fields();
        assert!(fca.contains(&"NmnlVal"));
        assert!(fca.contains(&"Pctg"));
        assert_eq!(fca.iter().filter(|f| **f == "TxId").count(), 1);
        assert_eq!(fca.len(), 12);

        let nex = table.required_nex_fields();
        assert_eq!(nex.len(), 10);
        assert!(!nex.contains(&"Instrument Full Name"));
    }

    #[test]
    fn test_date_fields() {
        assert_eq!(
            MappingTable::standard().date_fields(),
            Some(("Trading Date Time", "TradDt"))
        );
        let no_dates = MappingTable::new("id", "id", vec![]);
        assert_eq!(no_dates.date_fields(), None);
    }
}
