use crate::utils::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One reporting period: a quarter of a calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: u16,
    pub quarter: u8,
}

impl Period {
    pub fn new(year: u16, quarter: u8) -> Result<Self> {
        if !(1..=4).contains(&quarter) {
            return Err(EtlError::ProcessingError {
                message: format!("quarter out of range 1-4: {}", quarter),
            });
        }
        Ok(Self { year, quarter })
    }

    /// Parses an ANS quarter label such as "2024/3T".
    pub fn from_label(label: &str) -> Result<Self> {
        let bad = || EtlError::ProcessingError {
            message: format!("malformed quarter label: {:?} (expected YYYY/NT)", label),
        };
        let (year_part, quarter_part) = label.split_once('/').ok_or_else(bad)?;
        let year: u16 = year_part.parse().map_err(|_| bad())?;
        let quarter: u8 = quarter_part
            .strip_suffix('T')
            .ok_or_else(bad)?
            .parse()
            .map_err(|_| bad())?;
        Self::new(year, quarter)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}T", self.year, self.quarter)
    }
}

/// A disclosure row as ingested, before any pipeline processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    pub cnpj: String,
    pub legal_name: String,
    pub period: Period,
    pub amount: f64,
    #[serde(default)]
    pub note: String,
}

/// A RawRecord after consolidation. Records colliding on (cnpj, period)
/// are retained and annotated, never merged or dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidatedRecord {
    pub cnpj: String,
    pub legal_name: String,
    pub period: Period,
    pub amount: f64,
    pub note: String,
}

impl ConsolidatedRecord {
    /// Appends an annotation to the note field, preserving whatever the
    /// ingestion side already wrote there.
    pub fn annotate(&mut self, marker: &str) {
        if self.note.is_empty() {
            self.note = marker.to_string();
        } else {
            self.note.push_str("; ");
            self.note.push_str(marker);
        }
    }
}

/// Independent data-quality flags. Every flag is evaluated for every
/// record regardless of the others.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFlags {
    pub invalid_cnpj: bool,
    pub empty_legal_name: bool,
    pub non_positive_amount: bool,
}

impl ValidationFlags {
    pub fn is_clean(&self) -> bool {
        !self.invalid_cnpj && !self.empty_legal_name && !self.non_positive_amount
    }

    /// Renders the flags as the status column value: "VALID" when clean,
    /// otherwise a semicolon-joined list of condition labels.
    pub fn status(&self) -> String {
        if self.is_clean() {
            return "VALID".to_string();
        }
        let mut labels = Vec::new();
        if self.invalid_cnpj {
            labels.push("INVALID_CNPJ");
        }
        if self.empty_legal_name {
            labels.push("EMPTY_LEGAL_NAME");
        }
        if self.non_positive_amount {
            labels.push("NON_POSITIVE_AMOUNT");
        }
        labels.join(";")
    }
}

/// A consolidated record plus its data-quality flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatedRecord {
    pub record: ConsolidatedRecord,
    pub flags: ValidationFlags,
}

/// One operator in the ANS registry. Immutable reference data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub cnpj: String,
    pub registration_number: String,
    pub modality: String,
    pub region: String,
}

/// A validated record joined against the registry. On a registry miss
/// the three registry fields carry the NOT_FOUND sentinel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub cnpj: String,
    pub legal_name: String,
    pub period: Period,
    pub amount: f64,
    pub registration_number: String,
    pub modality: String,
    pub region: String,
    pub status: String,
}

/// Grouped statistics for one (legal_name, region) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub legal_name: String,
    pub region: String,
    pub total_amount: f64,
    pub mean_per_period: f64,
    pub population_std_dev: f64,
    pub period_count: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConsolidationStats {
    pub total: usize,
    pub annotated: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct JoinStats {
    pub matched: usize,
    pub unmatched: usize,
}

/// Output of the extract phase: one batch per quarter plus the registry.
#[derive(Debug, Clone)]
pub struct ExtractedData {
    pub batches: Vec<Vec<RawRecord>>,
    pub registry: Vec<RegistryEntry>,
}

/// Output of the transform phase, carried whole into load.
#[derive(Debug, Clone)]
pub struct TransformResult {
    pub consolidated: Vec<ConsolidatedRecord>,
    pub enriched: Vec<EnrichedRecord>,
    pub aggregates: Vec<AggregateResult>,
    pub consolidation_stats: ConsolidationStats,
    pub join_stats: JoinStats,
}
