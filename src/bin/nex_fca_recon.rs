use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::info;

use nex_fca_recon::config::{FcaFormat, OutputFormat};
use nex_fca_recon::io::{CsvDirectorySource, CsvFileSource, CsvReportSink, FcaXmlSource, XlsxReportSink};
use nex_fca_recon::{logging, RecordSource, ReconConfig, ReconciliationEngine, ReportSink};

#[derive(Parser)]
#[command(name = "nex-fca-recon")]
#[command(about = "Reconcile NEX trade exports against the FCA transaction report", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of NEX CSV exports (overrides [nex] dir)
    #[arg(long)]
    nex_dir: Option<PathBuf>,

    /// FCA transaction report, XML or flat CSV (overrides [fca] file)
    #[arg(long)]
    fca_file: Option<PathBuf>,

    /// Output directory (overrides [output] dir)
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Write one CSV file per sheet instead of a workbook
    #[arg(long)]
    csv: bool,

    /// Rows written per chunk (overrides [output] chunk_size)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Log level used when RUST_LOG is unset (overrides [logging] level)
    #[arg(long)]
    log_level: Option<String>,
}

fn load_config(cli: &Cli) -> Result<ReconConfig> {
    let mut config = match &cli.config {
        Some(path) => ReconConfig::load(path)
            .with_context(|| format!("load config: {}", path.display()))?,
        None => ReconConfig::default(),
    };

    if let Some(dir) = &cli.nex_dir {
        config.nex.dir = dir.clone();
    }
    if let Some(file) = &cli.fca_file {
        config.fca.file = file.clone();
    }
    if let Some(dir) = &cli.out_dir {
        config.output.dir = dir.clone();
    }
    if cli.csv {
        config.output.format = OutputFormat::Csv;
    }
    if let Some(chunk_size) = cli.chunk_size {
        config.output.chunk_size = chunk_size;
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let _guard = match &config.logging.validation_log {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let file = path.file_name().map(Path::new).unwrap_or(path.as_path());
            Some(logging::init_with_validation_log(
                dir,
                file,
                &config.logging.level,
            ))
        }
        None => {
            logging::init(&config.logging.level);
            None
        }
    };

    let engine = ReconciliationEngine::new();

    let nex = CsvDirectorySource::new(&config.nex.dir)
        .load_normalized(&engine.nex_normalizer())
        .with_context(|| format!("read NEX exports from {}", config.nex.dir.display()))?;
    info!(rows = nex.records.len(), flags = nex.flags.len(), "Combined CSV");

    let fca_source: Box<dyn RecordSource> = match config.fca.format() {
        FcaFormat::Xml => Box::new(FcaXmlSource::new(&config.fca.file)),
        FcaFormat::Csv => Box::new(CsvFileSource::fca(
            &config.fca.file,
            engine.mapping().key.fca_field.clone(),
        )),
    };
    let fca_raw = fca_source
        .load()
        .with_context(|| format!("read FCA report {}", config.fca.file.display()))?;
    let fca = engine.fca_normalizer().normalize(fca_raw)?;
    info!(rows = fca.records.len(), "Parsed FCA report");

    let results = engine
        .reconcile(&nex.records, &fca.records)
        .context("perform checks")?;
    let summary = engine.summarize(&results, &nex.records, &fca.records);

    let (mut sink, destination): (Box<dyn ReportSink>, PathBuf) = match config.output.format {
        OutputFormat::Xlsx => {
            let path = config.output.workbook_path();
            (Box::new(XlsxReportSink::new(&path)), path)
        }
        OutputFormat::Csv => (
            Box::new(
                CsvReportSink::new(&config.output.dir).chunk_size(config.output.chunk_size),
            ),
            config.output.dir.clone(),
        ),
    };
    sink.write("NEX data", &nex.records)?;
    sink.write("FCA data", &fca.records)?;
    sink.write("Check Results", &results.to_record_set()?)?;
    sink.write("Summary", &summary.to_record_set()?)?;
    sink.finish()
        .with_context(|| format!("write results to {}", destination.display()))?;

    println!(
        "Reconciliation written to '{}': {} check rows, {} data-quality flags.",
        destination.display(),
        results.len(),
        nex.flags.len() + fca.flags.len()
    );

    Ok(())
}
