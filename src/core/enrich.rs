//! Registry join: augments validated records with operator metadata
//! from the ANS registry (cadastro de operadoras).
//!
//! The join is an in-memory hash lookup: one pass over the registry to
//! build the index, one pass over the records to join. A missing match
//! is data, not an error.

use crate::core::validator::canonical_digits;
use crate::domain::model::{EnrichedRecord, JoinStats, RegistryEntry, ValidatedRecord};
use std::collections::HashMap;

/// Sentinel stored in registration_number/modality/region when the
/// record's CNPJ has no registry entry.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// Status marker appended when the registry lookup misses.
pub const STATUS_NO_MATCH: &str = "NOT_IN_REGISTRY";

/// Builds the lookup index, keyed by canonical digits-only CNPJ.
/// Duplicate registry identifiers resolve last-write-wins.
fn build_index(registry: &[RegistryEntry]) -> HashMap<String, &RegistryEntry> {
    let mut index = HashMap::with_capacity(registry.len());
    for entry in registry {
        index.insert(canonical_digits(&entry.cnpj), entry);
    }
    index
}

/// Joins every record against the registry. Hits copy the registry's
/// three fields and leave the validation status untouched; misses fill
/// the sentinel and append the no-match marker to status.
pub fn enrich(
    records: Vec<ValidatedRecord>,
    registry: &[RegistryEntry],
) -> (Vec<EnrichedRecord>, JoinStats) {
    let index = build_index(registry);
    let mut stats = JoinStats::default();

    let enriched = records
        .into_iter()
        .map(|validated| {
            let ValidatedRecord { record, flags } = validated;
            let key = canonical_digits(&record.cnpj);

            match index.get(key.as_str()) {
                Some(entry) => {
                    stats.matched += 1;
                    EnrichedRecord {
                        cnpj: record.cnpj,
                        legal_name: record.legal_name,
                        period: record.period,
                        amount: record.amount,
                        registration_number: entry.registration_number.clone(),
                        modality: entry.modality.clone(),
                        region: entry.region.clone(),
                        status: flags.status(),
                    }
                }
                None => {
                    stats.unmatched += 1;
                    EnrichedRecord {
                        cnpj: record.cnpj,
                        legal_name: record.legal_name,
                        period: record.period,
                        amount: record.amount,
                        registration_number: NOT_FOUND.to_string(),
                        modality: NOT_FOUND.to_string(),
                        region: NOT_FOUND.to_string(),
                        status: format!("{};{}", flags.status(), STATUS_NO_MATCH),
                    }
                }
            }
        })
        .collect();

    tracing::info!(
        "Registry join: {} matched, {} unmatched",
        stats.matched,
        stats.unmatched
    );

    (enriched, stats)
}
