use crate::core::validator::CheckDigitScheme;
use crate::core::{aggregate, consolidate, enrich, report, validator};
use crate::domain::model::{
    ExtractedData, Period, RawRecord, RegistryEntry, TransformResult,
};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::io::{Read, Write};
use zip::write::{FileOptions, ZipWriter};

pub const CONSOLIDATED_FILE: &str = "consolidated.csv";
pub const ENRICHED_FILE: &str = "enriched.csv";
pub const AGGREGATED_FILE: &str = "aggregated.csv";
pub const BUNDLE_FILE: &str = "disclosures.zip";
pub const SUMMARY_FILE: &str = "run_summary.json";

/// One row of a quarterly batch file, as published per reporting period.
#[derive(Debug, Deserialize)]
struct BatchRow {
    cnpj: String,
    legal_name: String,
    quarter: u8,
    year: u16,
    amount: f64,
    #[serde(default)]
    note: String,
}

/// One row of the operator registry dataset. The name column is present
/// in the published file but the join only carries the other fields.
#[derive(Debug, Deserialize)]
struct RegistryRow {
    cnpj: String,
    #[allow(dead_code)]
    name: String,
    registration_number: String,
    modality: String,
    region: String,
}

pub struct DisclosurePipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    client: Client,
    scheme: CheckDigitScheme,
}

impl<S: Storage, C: ConfigProvider> DisclosurePipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self {
            storage,
            config,
            client: Client::new(),
            scheme: CheckDigitScheme::default(),
        }
    }

    /// Downloads one quarter's archive from the portal and parses the
    /// CSV inside. A bad status, an archive with no CSV entry or an
    /// undecodable row is a hard error here: malformed upstream input
    /// is rejected at ingestion, unlike data-quality findings later.
    async fn fetch_quarter(&self, label: &str) -> Result<Vec<RawRecord>> {
        // Fails fast on a malformed label before touching the network.
        Period::from_label(label)?;

        let url = format!("{}/{}.zip", self.config.base_url().trim_end_matches('/'), label);
        tracing::debug!("Downloading quarter archive: {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(EtlError::ProcessingError {
                message: format!("ANS portal returned {} for {}", response.status(), url),
            });
        }

        let bytes = response.bytes().await?;
        let csv_bytes = extract_first_csv(&bytes)?;
        parse_batch_csv(&csv_bytes)
    }

    async fn load_registry(&self) -> Result<Vec<RegistryEntry>> {
        let source = self.config.registry_source();
        let bytes = if source.starts_with("http://") || source.starts_with("https://") {
            tracing::debug!("Downloading registry: {}", source);
            let response = self.client.get(source).send().await?;
            if !response.status().is_success() {
                return Err(EtlError::ProcessingError {
                    message: format!("registry download returned {} for {}", response.status(), source),
                });
            }
            response.bytes().await?.to_vec()
        } else {
            tracing::debug!("Reading registry from storage: {}", source);
            self.storage.read_file(source).await?
        };

        parse_registry_csv(&bytes)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for DisclosurePipeline<S, C> {
    async fn extract(&self) -> Result<ExtractedData> {
        let mut batches = Vec::new();

        if self.config.batch_files().is_empty() {
            for label in self.config.quarters() {
                let batch = self.fetch_quarter(label).await?;
                tracing::info!("Quarter {}: {} records", label, batch.len());
                batches.push(batch);
            }
        } else {
            for path in self.config.batch_files() {
                let bytes = self.storage.read_file(path).await?;
                let batch = parse_batch_csv(&bytes)?;
                tracing::info!("Batch file {}: {} records", path, batch.len());
                batches.push(batch);
            }
        }

        let registry = self.load_registry().await?;
        tracing::info!("Registry: {} entries", registry.len());

        Ok(ExtractedData { batches, registry })
    }

    async fn transform(&self, data: ExtractedData) -> Result<TransformResult> {
        let (consolidated, consolidation_stats) = consolidate::consolidate(data.batches);

        let validated = validator::flag_records(consolidated.clone(), &self.scheme);

        let (enriched, join_stats) = enrich::enrich(validated, &data.registry);

        let aggregates = aggregate::aggregate(&enriched);
        tracing::info!("Aggregation: {} (operator, region) groups", aggregates.len());
        report::log_top_totals(&aggregates, 5);

        Ok(TransformResult {
            consolidated,
            enriched,
            aggregates,
            consolidation_stats,
            join_stats,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let consolidated = report::consolidated_table(&result.consolidated)?;
        let enriched = report::enriched_table(&result.enriched)?;
        let aggregated = report::aggregate_table(&result.aggregates)?;

        self.storage
            .write_file(CONSOLIDATED_FILE, consolidated.as_bytes())
            .await?;
        self.storage.write_file(ENRICHED_FILE, enriched.as_bytes()).await?;
        self.storage.write_file(AGGREGATED_FILE, aggregated.as_bytes()).await?;

        // Bundle the three tables, as the portal-facing side ships one
        // compressed artifact downstream.
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (name, table) in [
                (CONSOLIDATED_FILE, &consolidated),
                (ENRICHED_FILE, &enriched),
                (AGGREGATED_FILE, &aggregated),
            ] {
                zip.start_file::<_, ()>(name, FileOptions::default())?;
                zip.write_all(table.as_bytes())?;
            }
            zip.finish()?.into_inner()
        };
        self.storage.write_file(BUNDLE_FILE, &zip_data).await?;

        let summary = report::RunSummary::from_result(&result);
        let summary_json = serde_json::to_string_pretty(&summary)?;
        self.storage.write_file(SUMMARY_FILE, summary_json.as_bytes()).await?;

        Ok(format!("{}/{}", self.config.output_path(), BUNDLE_FILE))
    }
}

/// Pulls the first *.csv entry out of a downloaded quarter archive.
fn extract_first_csv(zip_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zip_bytes))?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.name().to_ascii_lowercase().ends_with(".csv") {
            let mut bytes = Vec::with_capacity(entry.size() as usize);
            entry.read_to_end(&mut bytes)?;
            return Ok(bytes);
        }
    }

    Err(EtlError::ProcessingError {
        message: "quarter archive contains no CSV entry".to_string(),
    })
}

fn parse_batch_csv(bytes: &[u8]) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b';').from_reader(bytes);
    let mut records = Vec::new();

    for row in reader.deserialize::<BatchRow>() {
        let row = row?;
        records.push(RawRecord {
            cnpj: row.cnpj,
            legal_name: row.legal_name,
            period: Period::new(row.year, row.quarter)?,
            amount: row.amount,
            note: row.note,
        });
    }

    Ok(records)
}

fn parse_registry_csv(bytes: &[u8]) -> Result<Vec<RegistryEntry>> {
    let mut reader = csv::ReaderBuilder::new().delimiter(b';').from_reader(bytes);
    let mut entries = Vec::new();

    for row in reader.deserialize::<RegistryRow>() {
        let row = row?;
        entries.push(RegistryEntry {
            cnpj: row.cnpj,
            registration_number: row.registration_number,
            modality: row.modality,
            region: row.region,
        });
    }

    Ok(entries)
}
