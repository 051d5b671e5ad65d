//! Run configuration loaded from TOML

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::{DEFAULT_CHUNK_SIZE, DEFAULT_WORKBOOK};
use crate::types::*;

/// Where NEX trade exports are read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NexConfig {
    /// Directory holding the NEX CSV exports
    pub dir: PathBuf,
}

impl Default for NexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("nex"),
        }
    }
}

/// Encoding of the FCA input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FcaFormat {
    /// The regulatory XML report
    Xml,
    /// A flat CSV holding the already extracted columns
    Csv,
}

/// Where the FCA transaction report is read from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FcaConfig {
    pub file: PathBuf,
}

impl Default for FcaConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("fca.xml"),
        }
    }
}

impl FcaConfig {
    /// Format inferred from the file extension; anything but `.csv` is XML
    pub fn format(&self) -> FcaFormat {
        let is_csv = self
            .file
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            FcaFormat::Csv
        } else {
            FcaFormat::Xml
        }
    }
}

/// How the result sheets are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One workbook with a worksheet per result sheet
    #[default]
    Xlsx,
    /// One CSV file per result sheet
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the result files are written to
    pub dir: PathBuf,
    pub format: OutputFormat,
    /// Workbook file name inside `dir` (xlsx output)
    pub workbook: String,
    /// Rows written between two flushes (csv output)
    pub chunk_size: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("recon-output"),
            format: OutputFormat::Xlsx,
            workbook: DEFAULT_WORKBOOK.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl OutputConfig {
    pub fn workbook_path(&self) -> PathBuf {
        self.dir.join(&self.workbook)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    /// File receiving warnings (key validation issues); none disables it
    pub validation_log: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            validation_log: Some(PathBuf::from("transaction_reference_validation.log")),
        }
    }
}

/// Complete configuration of one reconciliation run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    pub nex: NexConfig,
    pub fca: FcaConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl ReconConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> ReconResult<Self> {
        let config: ReconConfig =
            toml::from_str(text).map_err(|err| ReconError::Config(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> ReconResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> ReconResult<()> {
        if self.output.chunk_size == 0 {
            return Err(ReconError::Config(
                "output.chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.output.format == OutputFormat::Xlsx && self.output.workbook.trim().is_empty() {
            return Err(ReconError::Config(
                "output.workbook cannot be empty".to_string(),
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ReconError::Config(
                "logging.level cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ReconConfig::from_toml_str("").unwrap();
        assert_eq!(config, ReconConfig::default());
        assert_eq!(config.output.chunk_size, 10_000);
    }

    #[test]
    fn test_partial_document() {
        let config = ReconConfig::from_toml_str(
            r#"
            [nex]
            dir = "Abide CSV files"

            [output]
            chunk_size = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.nex.dir, PathBuf::from("Abide CSV files"));
        assert_eq!(config.output.chunk_size, 500);
        assert_eq!(config.output.dir, PathBuf::from("recon-output"));
        assert_eq!(config.fca.file, PathBuf::from("fca.xml"));
        assert_eq!(config.fca.format(), FcaFormat::Xml);
        assert_eq!(config.output.format, OutputFormat::Xlsx);
        assert_eq!(
            config.output.workbook_path(),
            PathBuf::from("recon-output/output_file_with_checks_and_summary.xlsx")
        );
    }

    #[test]
    fn test_csv_input_and_output() {
        let config = ReconConfig::from_toml_str(
            r#"
            [fca]
            file = "extract/FCA.CSV"

            [output]
            format = "csv"
            "#,
        )
        .unwrap();

        assert_eq!(config.fca.format(), FcaFormat::Csv);
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn test_unknown_output_format_rejected() {
        let err = ReconConfig::from_toml_str("[output]\nformat = \"pdf\"\n").unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = ReconConfig::from_toml_str("[output]\nchunk_size = 0\n").unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = ReconConfig::from_toml_str("[output\n").unwrap_err();
        assert!(matches!(err, ReconError::Config(_)));
    }
}
