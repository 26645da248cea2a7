use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analytics::{self, TOP_PRODUCTS_LIMIT};
use crate::records::SaleRecord;

const NO_PRODUCT: &str = "N/A";

/// Headline aggregates of one extract plus the date the report was
/// produced (dd/mm/YYYY, supplied by the caller so rendering stays
/// pure).
#[derive(Debug, PartialEq)]
pub struct SalesSummary {
    pub report_date: String,
    pub total_revenue: f64,
    pub total_units: i64,
    pub best_product: Option<(String, i64)>,
    pub top_products: Vec<(String, i64)>,
}

impl SalesSummary {
    /// Runs each aggregation independently over the same records.
    pub fn compute(records: &[SaleRecord], report_date: String) -> Self {
        SalesSummary {
            report_date,
            total_revenue: analytics::total_revenue(records),
            total_units: analytics::total_units(records),
            best_product: analytics::best_selling_product(records),
            top_products: analytics::top_products(records),
        }
    }
}

/// Operator-facing text report. The layout is fixed: five ranking lines
/// are always emitted, a rank with no product stays blank.
pub fn render_report(summary: &SalesSummary) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("--- Reporte de Ventas E-commerce ---".to_string());
    lines.push(String::new());
    lines.push(format!("Fecha del Reporte: {}", summary.report_date));
    lines.push(String::new());
    lines.push("--- Resumen General ---".to_string());
    lines.push(format!("Facturación Total: $ {:.2}", summary.total_revenue));
    lines.push(format!(
        "Cantidad Total de Unidades Vendidas: {}",
        summary.total_units
    ));
    let best = summary
        .best_product
        .as_ref()
        .map_or(NO_PRODUCT, |(product, _)| product.as_str());
    lines.push(format!("Producto Más Vendido: {best}"));
    lines.push(String::new());
    lines.push("--- Top 5 Productos Más Vendidos ---".to_string());
    for rank in 0..TOP_PRODUCTS_LIMIT {
        let product = summary
            .top_products
            .get(rank)
            .map_or("", |(product, _)| product.as_str());
        lines.push(format!("{}. {}", rank + 1, product));
    }
    lines.push(String::new());
    lines.push("---------------------------------------".to_string());

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

pub fn write_report<P: AsRef<Path>>(summary: &SalesSummary, path: P) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, render_report(summary))
        .with_context(|| format!("cannot write report {}", path.display()))
}

// One-row machine-readable counterpart of the text report.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    fecha: &'a str,
    #[serde(serialize_with = "serialize_f64_2dp")]
    facturacion_total: f64,
    cant_total_de_unid_vendidas: i64,
    prod_mas_vendido: &'a str,
    lista_top5_prod_mas_vendidos: String,
}

/// Writes the summary row next to the text report, swapping the
/// extension for `.csv`. Returns the derived path.
pub fn write_summary_csv<P: AsRef<Path>>(summary: &SalesSummary, report_path: P) -> Result<PathBuf> {
    let csv_path = report_path.as_ref().with_extension("csv");

    let top_names: Vec<&str> = summary
        .top_products
        .iter()
        .map(|(product, _)| product.as_str())
        .collect();
    let row = SummaryRow {
        fecha: &summary.report_date,
        facturacion_total: summary.total_revenue,
        cant_total_de_unid_vendidas: summary.total_units,
        prod_mas_vendido: summary
            .best_product
            .as_ref()
            .map_or(NO_PRODUCT, |(product, _)| product.as_str()),
        lista_top5_prod_mas_vendidos: format!("[{}]", top_names.join(", ")),
    };

    let mut wtr = csv::WriterBuilder::new()
        .from_path(&csv_path)
        .with_context(|| format!("cannot write summary {}", csv_path.display()))?;
    wtr.serialize(row)?;
    wtr.flush()?;

    Ok(csv_path)
}

fn serialize_f64_2dp<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{value:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> SalesSummary {
        SalesSummary {
            report_date: "05/08/2026".to_string(),
            total_revenue: 40.7,
            total_units: 9,
            best_product: Some(("C".to_string(), 7)),
            top_products: vec![
                ("C".to_string(), 7),
                ("B".to_string(), 6),
                ("E".to_string(), 6),
                ("A".to_string(), 5),
                ("D".to_string(), 4),
            ],
        }
    }

    #[test]
    fn render_full_report() {
        let expected = concat!(
            "--- Reporte de Ventas E-commerce ---\n",
            "\n",
            "Fecha del Reporte: 05/08/2026\n",
            "\n",
            "--- Resumen General ---\n",
            "Facturación Total: $ 40.70\n",
            "Cantidad Total de Unidades Vendidas: 9\n",
            "Producto Más Vendido: C\n",
            "\n",
            "--- Top 5 Productos Más Vendidos ---\n",
            "1. C\n",
            "2. B\n",
            "3. E\n",
            "4. A\n",
            "5. D\n",
            "\n",
            "---------------------------------------\n",
        );

        assert_eq!(render_report(&sample_summary()), expected);
    }

    #[test]
    fn render_pads_missing_ranks_and_best_product() {
        let summary = SalesSummary {
            report_date: "05/08/2026".to_string(),
            total_revenue: 0.0,
            total_units: 0,
            best_product: None,
            top_products: vec![("A".to_string(), 1)],
        };

        let report = render_report(&summary);

        assert!(report.contains("Producto Más Vendido: N/A\n"));
        assert!(report.contains("Facturación Total: $ 0.00\n"));
        assert!(report.contains("1. A\n"));
        // Empty ranks keep the numbering, with nothing after the dot.
        assert!(report.contains("2. \n"));
        assert!(report.contains("5. \n"));
    }

    #[test]
    fn write_report_and_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("reporte_ventas.txt");

        write_report(&sample_summary(), &report_path).unwrap();
        let csv_path = write_summary_csv(&sample_summary(), &report_path).unwrap();

        assert_eq!(csv_path, dir.path().join("reporte_ventas.csv"));
        let report = fs::read_to_string(&report_path).unwrap();
        assert!(report.starts_with("--- Reporte de Ventas E-commerce ---\n"));

        let summary_csv = fs::read_to_string(&csv_path).unwrap();
        let expected = concat!(
            "fecha,facturacion_total,cant_total_de_unid_vendidas,",
            "prod_mas_vendido,lista_top5_prod_mas_vendidos\n",
            "05/08/2026,40.70,9,C,\"[C, B, E, A, D]\"\n",
        );
        assert_eq!(summary_csv, expected);
    }

    #[test]
    fn summary_csv_without_sales() {
        let dir = tempfile::tempdir().unwrap();
        let report_path = dir.path().join("reporte_ventas.txt");
        let summary = SalesSummary {
            report_date: "05/08/2026".to_string(),
            total_revenue: 0.0,
            total_units: 0,
            best_product: None,
            top_products: Vec::new(),
        };

        let csv_path = write_summary_csv(&summary, &report_path).unwrap();

        let summary_csv = fs::read_to_string(&csv_path).unwrap();
        assert!(summary_csv.ends_with("05/08/2026,0.00,0,N/A,[]\n"));
    }

    #[test]
    fn compute_matches_individual_aggregations() {
        let records = vec![
            SaleRecord::from_pairs(&[
                ("producto", "A"),
                ("cantidad", "3"),
                ("precio_unitario", "2.50"),
            ]),
            SaleRecord::from_pairs(&[
                ("producto", "B"),
                ("cantidad", "1"),
                ("precio_unitario", "4.00"),
            ]),
        ];

        let summary = SalesSummary::compute(&records, "05/08/2026".to_string());

        assert_eq!(summary.total_revenue, analytics::total_revenue(&records));
        assert_eq!(summary.total_units, 4);
        assert_eq!(summary.best_product, Some(("A".to_string(), 3)));
        assert_eq!(summary.top_products.len(), 2);
    }
}
