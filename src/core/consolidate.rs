//! Consolidation of quarterly disclosure batches.
//!
//! Policy: nothing is ever dropped. Suspect amounts and (cnpj, period)
//! collisions are annotated in the note column and left in place for
//! downstream review.

use crate::domain::model::{ConsolidatedRecord, ConsolidationStats, Period, RawRecord};
use std::collections::HashMap;

pub const NOTE_ZERO_AMOUNT: &str = "SUSPECT: zero amount";
pub const NOTE_NEGATIVE_AMOUNT: &str = "SUSPECT: negative amount";
pub const NOTE_DUPLICATE: &str = "REVIEW: duplicate cnpj/period";

/// Merges all batches into one ordered record set.
///
/// Output length always equals the sum of input batch lengths. Records
/// colliding on (cnpj, period) are each flagged for review, regardless
/// of whether their legal names agree. The result is sorted by cnpj
/// ascending with a stable sort, so batch-arrival order breaks ties and
/// colliding identifiers sit adjacent.
pub fn consolidate(batches: Vec<Vec<RawRecord>>) -> (Vec<ConsolidatedRecord>, ConsolidationStats) {
    let mut records: Vec<ConsolidatedRecord> = batches
        .into_iter()
        .flatten()
        .map(|raw| ConsolidatedRecord {
            cnpj: raw.cnpj,
            legal_name: raw.legal_name,
            period: raw.period,
            amount: raw.amount,
            note: raw.note,
        })
        .collect();

    for record in &mut records {
        if record.amount == 0.0 {
            record.annotate(NOTE_ZERO_AMOUNT);
        } else if record.amount < 0.0 {
            record.annotate(NOTE_NEGATIVE_AMOUNT);
        }
    }

    let mut key_counts: HashMap<(String, Period), usize> = HashMap::new();
    for record in &records {
        *key_counts
            .entry((record.cnpj.clone(), record.period))
            .or_insert(0) += 1;
    }
    for record in &mut records {
        let key = (record.cnpj.clone(), record.period);
        if key_counts.get(&key).copied().unwrap_or(0) > 1 {
            record.annotate(NOTE_DUPLICATE);
        }
    }

    // sort_by is stable: equal identifiers keep batch-arrival order.
    records.sort_by(|a, b| a.cnpj.cmp(&b.cnpj));

    let stats = ConsolidationStats {
        total: records.len(),
        annotated: records.iter().filter(|r| !r.note.is_empty()).count(),
    };

    tracing::info!(
        "Consolidation: {} records total, {} annotated for review",
        stats.total,
        stats.annotated
    );

    (records, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cnpj: &str, name: &str, year: u16, quarter: u8, amount: f64) -> RawRecord {
        RawRecord {
            cnpj: cnpj.to_string(),
            legal_name: name.to_string(),
            period: Period { year, quarter },
            amount,
            note: String::new(),
        }
    }

    #[test]
    fn test_no_record_is_ever_dropped() {
        let batches = vec![
            vec![
                raw("12.345.678/0001-90", "Operadora A", 2024, 1, 100.0),
                raw("12.345.678/0001-90", "Operadora A", 2024, 1, 100.0),
            ],
            vec![raw("98.765.432/0001-10", "Operadora B", 2024, 2, 200.0)],
            vec![],
        ];
        let input_len: usize = batches.iter().map(|b| b.len()).sum();

        let (records, stats) = consolidate(batches);

        assert_eq!(records.len(), input_len);
        assert_eq!(stats.total, input_len);
    }

    #[test]
    fn test_collision_retains_both_records_annotated() {
        let batches = vec![vec![
            raw("12.345.678/0001-90", "Operadora Bem Estar Ltda", 2024, 3, 1_500_000.50),
            raw("12.345.678/0001-90", "Operadora Bem Estar EIRELI", 2024, 3, 1_600_000.00),
        ]];

        let (records, _) = consolidate(batches);

        assert_eq!(records.len(), 2);
        for record in &records {
            assert!(record.note.contains(NOTE_DUPLICATE), "note: {:?}", record.note);
        }
        // Both names survive.
        assert_ne!(records[0].legal_name, records[1].legal_name);
    }

    #[test]
    fn test_collision_flagged_even_when_names_match() {
        let batches = vec![vec![
            raw("12.345.678/0001-90", "Operadora A", 2024, 3, 100.0),
            raw("12.345.678/0001-90", "Operadora A", 2024, 3, 100.0),
        ]];

        let (records, _) = consolidate(batches);

        assert!(records.iter().all(|r| r.note.contains(NOTE_DUPLICATE)));
    }

    #[test]
    fn test_same_cnpj_different_period_not_flagged() {
        let batches = vec![vec![
            raw("12.345.678/0001-90", "Operadora A", 2024, 1, 100.0),
            raw("12.345.678/0001-90", "Operadora A", 2024, 2, 100.0),
        ]];

        let (records, stats) = consolidate(batches);

        assert!(records.iter().all(|r| r.note.is_empty()));
        assert_eq!(stats.annotated, 0);
    }

    #[test]
    fn test_zero_and_negative_amounts_annotated_distinctly() {
        let batches = vec![vec![
            raw("11.222.333/0001-44", "Zeroed", 2024, 1, 0.0),
            raw("98.765.432/0001-10", "Negative", 2024, 1, -5000.0),
            raw("12.345.678/0001-90", "Fine", 2024, 1, 1000.0),
        ]];

        let (records, stats) = consolidate(batches);

        let by_name = |name: &str| {
            records
                .iter()
                .find(|r| r.legal_name == name)
                .map(|r| r.note.clone())
                .unwrap_or_default()
        };
        assert_eq!(by_name("Zeroed"), NOTE_ZERO_AMOUNT);
        assert_eq!(by_name("Negative"), NOTE_NEGATIVE_AMOUNT);
        assert_eq!(by_name("Fine"), "");
        assert_eq!(stats.annotated, 2);
    }

    #[test]
    fn test_ingestion_note_is_preserved() {
        let mut record = raw("11.222.333/0001-44", "Pre-noted", 2024, 1, 0.0);
        record.note = "flagged upstream".to_string();

        let (records, _) = consolidate(vec![vec![record]]);

        assert_eq!(records[0].note, format!("flagged upstream; {}", NOTE_ZERO_AMOUNT));
    }

    #[test]
    fn test_sorted_by_cnpj_with_stable_ties() {
        let batches = vec![
            vec![raw("98.765.432/0001-10", "B", 2024, 1, 1.0)],
            vec![
                raw("11.222.333/0001-44", "C first", 2024, 1, 1.0),
                raw("11.222.333/0001-44", "C second", 2024, 2, 2.0),
            ],
            vec![raw("12.345.678/0001-90", "A", 2024, 1, 1.0)],
        ];

        let (records, _) = consolidate(batches);

        let cnpjs: Vec<&str> = records.iter().map(|r| r.cnpj.as_str()).collect();
        assert_eq!(
            cnpjs,
            vec![
                "11.222.333/0001-44",
                "11.222.333/0001-44",
                "12.345.678/0001-90",
                "98.765.432/0001-10",
            ]
        );
        // Ties keep arrival order.
        assert_eq!(records[0].legal_name, "C first");
        assert_eq!(records[1].legal_name, "C second");
    }

    #[test]
    fn test_empty_input() {
        let (records, stats) = consolidate(vec![]);
        assert!(records.is_empty());
        assert_eq!(stats.total, 0);
    }
}
