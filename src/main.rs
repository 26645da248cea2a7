use anyhow::Result;
use chrono::Local;
use records::read_csv;
use std::env;
use tracing::warn;

mod analytics;
mod records;
mod report;

use report::SalesSummary;

const REPORT_PATH: &str = "reporte_ventas.txt";

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = parse_args();
    let records = read_csv(&args.extract_path)?;
    if records.is_empty() {
        warn!(
            "no sales records loaded from {}, nothing to report",
            args.extract_path
        );
        return Ok(());
    }

    let records = match &args.date_range {
        Some((start, end)) => analytics::sales_in_date_range(&records, start, end),
        None => records,
    };

    let report_date = Local::now().format("%d/%m/%Y").to_string();
    let summary = SalesSummary::compute(&records, report_date);

    report::write_report(&summary, REPORT_PATH)?;
    let summary_path = report::write_summary_csv(&summary, REPORT_PATH)?;

    println!("Reporte generado: {REPORT_PATH}");
    println!("Resumen CSV: {}", summary_path.display());

    Ok(())
}

struct Args {
    extract_path: String,
    date_range: Option<(String, String)>,
}

fn parse_args() -> Args {
    const CSV_EXTENSION: &str = ".csv";

    let args: Vec<String> = env::args().collect();
    if args.len() != 2 && args.len() != 4 {
        eprintln!("Usage: {} <ventas.csv> [FECHA_INICIO FECHA_FIN]", args[0]);
        std::process::exit(1);
    }

    let extract_path = &args[1];
    if !extract_path.ends_with(CSV_EXTENSION) {
        eprintln!("Error: The file must have a .csv extension");
        std::process::exit(1);
    }

    let date_range = (args.len() == 4).then(|| (args[2].clone(), args[3].clone()));

    Args {
        extract_path: extract_path.to_owned(),
        date_range,
    }
}
