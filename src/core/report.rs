//! Output tables and the run summary.
//!
//! All three tables are semicolon-delimited with a header row; monetary
//! columns are fixed to two decimals with a '.' separator, since the
//! files are imported downstream byte-for-byte.

use crate::domain::model::{
    AggregateResult, ConsolidatedRecord, EnrichedRecord, TransformResult,
};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer.into_inner().map_err(|e| EtlError::ProcessingError {
        message: format!("CSV writer flush failed: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| EtlError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

pub fn consolidated_table(records: &[ConsolidatedRecord]) -> Result<String> {
    let mut w = writer();
    w.write_record(["cnpj", "legal_name", "quarter", "year", "amount", "note"])?;
    for r in records {
        w.write_record([
            r.cnpj.clone(),
            r.legal_name.clone(),
            r.period.quarter.to_string(),
            r.period.year.to_string(),
            format!("{:.2}", r.amount),
            r.note.clone(),
        ])?;
    }
    finish(w)
}

pub fn enriched_table(records: &[EnrichedRecord]) -> Result<String> {
    let mut w = writer();
    w.write_record([
        "cnpj",
        "legal_name",
        "quarter",
        "year",
        "amount",
        "registration_number",
        "modality",
        "region",
        "status",
    ])?;
    for r in records {
        w.write_record([
            r.cnpj.clone(),
            r.legal_name.clone(),
            r.period.quarter.to_string(),
            r.period.year.to_string(),
            format!("{:.2}", r.amount),
            r.registration_number.clone(),
            r.modality.clone(),
            r.region.clone(),
            r.status.clone(),
        ])?;
    }
    finish(w)
}

pub fn aggregate_table(results: &[AggregateResult]) -> Result<String> {
    let mut w = writer();
    w.write_record([
        "legal_name",
        "region",
        "total_amount",
        "mean_per_period",
        "population_std_dev",
        "period_count",
    ])?;
    for r in results {
        w.write_record([
            r.legal_name.clone(),
            r.region.clone(),
            format!("{:.2}", r.total_amount),
            format!("{:.2}", r.mean_per_period),
            format!("{:.2}", r.population_std_dev),
            r.period_count.to_string(),
        ])?;
    }
    finish(w)
}

/// Logs the heaviest spenders after aggregation, as the operations side
/// expects to see in the run log.
pub fn log_top_totals(results: &[AggregateResult], n: usize) {
    for (i, r) in results.iter().take(n).enumerate() {
        tracing::info!(
            "  {}. {} ({}): {:.2}",
            i + 1,
            r.legal_name,
            r.region,
            r.total_amount
        );
    }
}

/// Machine-readable summary written next to the output tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub consolidated_records: usize,
    pub annotated_records: usize,
    pub registry_matched: usize,
    pub registry_unmatched: usize,
    pub aggregate_groups: usize,
}

impl RunSummary {
    pub fn from_result(result: &TransformResult) -> Self {
        Self {
            generated_at: Utc::now(),
            consolidated_records: result.consolidation_stats.total,
            annotated_records: result.consolidation_stats.annotated,
            registry_matched: result.join_stats.matched,
            registry_unmatched: result.join_stats.unmatched,
            aggregate_groups: result.aggregates.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Period;

    #[test]
    fn test_consolidated_table_format() {
        let records = vec![ConsolidatedRecord {
            cnpj: "12.345.678/0001-90".to_string(),
            legal_name: "Operadora A".to_string(),
            period: Period { year: 2024, quarter: 3 },
            amount: 1_500_000.5,
            note: String::new(),
        }];

        let table = consolidated_table(&records).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "cnpj;legal_name;quarter;year;amount;note");
        assert_eq!(lines[1], "12.345.678/0001-90;Operadora A;3;2024;1500000.50;");
    }

    #[test]
    fn test_amount_always_two_decimals() {
        let records = vec![ConsolidatedRecord {
            cnpj: "12345678000190".to_string(),
            legal_name: "X".to_string(),
            period: Period { year: 2024, quarter: 1 },
            amount: 100.0,
            note: String::new(),
        }];

        let table = consolidated_table(&records).unwrap();
        assert!(table.contains(";100.00;"), "table: {}", table);
    }

    #[test]
    fn test_aggregate_table_format() {
        let results = vec![AggregateResult {
            legal_name: "Operadora A".to_string(),
            region: "SP".to_string(),
            total_amount: 3_300_000.0,
            mean_per_period: 1_100_000.0,
            population_std_dev: 81_649.658,
            period_count: 3,
        }];

        let table = aggregate_table(&results).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(
            lines[0],
            "legal_name;region;total_amount;mean_per_period;population_std_dev;period_count"
        );
        assert_eq!(lines[1], "Operadora A;SP;3300000.00;1100000.00;81649.66;3");
    }

    #[test]
    fn test_enriched_table_header() {
        let table = enriched_table(&[]).unwrap();
        assert_eq!(
            table.trim_end(),
            "cnpj;legal_name;quarter;year;amount;registration_number;modality;region;status"
        );
    }
}
