//! Basic reconciliation example

use nex_fca_recon::utils::{MemorySink, MemorySource};
use nex_fca_recon::{RecordSet, ReconciliationEngine, ReportSink, Side};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("NEX/FCA Reconciliation - Basic Example\n");

    let nex = RecordSet::from_text_rows(
        [
            "Transaction Reference Number",
            "Executing Entity Identification Code",
            "Trading Date Time",
            "Quantity",
            "Price",
            "Instrument Identification Code",
            "Trading Venue",
            "Transmission of Order Indicator",
            "Buyer Code",
            "Seller Code",
            "Instrument Full Name",
        ],
        vec![
            // Equity trade, reported identically
            vec![
                "1001", "EXEC1", "2024-05-01T10:00:00", "100", "12.50", "GB0001", "XLON",
                "false", "BUYER1", "SELLER1", "Example Plc",
            ],
            // Treasury bill: FCA reports nominal value and percentage price
            vec![
                "1002.0", "EXEC1", "2024-05-01T11:30:00", "5000", "98.77", "GB0002", "XOFF",
                "false", "BUYER2", "SELLER2", "UK T-Bill",
            ],
            // Never reported
            vec![
                "1003", "EXEC1", "2024-05-02T09:00:00", "10", "1.00", "GB0003", "XLON",
                "true", "BUYER3", "SELLER3", "Missing Trade",
            ],
        ],
    )?;

    let fca = RecordSet::from_text_rows(
        [
            "TxId",
            "ExctgPty",
            "TradDt",
            "QtyUnit",
            "NmnlVal",
            "Amt",
            "Pctg",
            "FinInstrmId",
            "TradVn",
            "TrnsmssnInd",
            "LEI",
            "LEI3",
        ],
        vec![
            vec![
                "1001", "EXEC1", "2024-05-01T10:00:00Z", "100", "", "12.5", "", "GB0001",
                "XLON", "false", "BUYER1", "SELLER1",
            ],
            vec![
                "1002", "EXEC1", "2024-05-01T11:30:00Z", "", "5000", "", "98.765", "GB0002",
                "XOFF", "false", "BUYER2", "SELLER2",
            ],
        ],
    )?;

    let engine = ReconciliationEngine::new();
    let report = engine.run_sources(
        &MemorySource::new(Side::Nex, nex),
        &MemorySource::new(Side::Fca, fca),
    )?;

    println!("Run {}", report.run_id);
    for flag in &report.flags {
        println!("  ! {}", flag);
    }
    println!();

    for row in &report.results.rows {
        let failed: Vec<&str> = report
            .results
            .labels
            .iter()
            .zip(&row.verdicts)
            .filter(|(_, verdict)| verdict.is_check())
            .map(|(label, _)| label.as_str())
            .collect();
        println!(
            "  {} ({}): {}",
            row.key,
            row.instrument_name.as_deref().unwrap_or("-"),
            if failed.is_empty() {
                "all checks OK".to_string()
            } else {
                failed.join(", ")
            }
        );
    }
    println!();

    let mut sink = MemorySink::new();
    sink.write("Check Results", &report.results.to_record_set()?)?;
    sink.write("Summary", &report.summary.to_record_set()?)?;

    println!("Summary");
    for row in &report.summary.rows {
        println!("  {:<36} {}", row.label, row.value);
    }

    Ok(())
}
