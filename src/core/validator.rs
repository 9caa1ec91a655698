//! CNPJ check-digit validation (Receita Federal algorithm).
//!
//! The weight tables are carried as data in [`CheckDigitScheme`] rather
//! than inlined in the arithmetic, so alternative schemes can be tested
//! in isolation.

use crate::domain::model::{ConsolidatedRecord, ValidatedRecord, ValidationFlags};

/// Weight tables for the two CNPJ check digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckDigitScheme {
    pub first: [u32; 12],
    pub second: [u32; 13],
}

impl Default for CheckDigitScheme {
    fn default() -> Self {
        Self {
            first: [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2],
            second: [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2],
        }
    }
}

/// Strips everything but ASCII digits, e.g. "12.345.678/0001-90" ->
/// "12345678000190". The registry join keys on this canonical form.
pub fn canonical_digits(identifier: &str) -> String {
    identifier.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Validates a CNPJ. Pure; punctuation in the input is ignored.
///
/// Length and repeated-digit checks short-circuit before any checksum
/// arithmetic. A 14-digit run of a single digit (all zeros included)
/// is rejected outright even though some such sequences satisfy the
/// checksum.
pub fn validate(identifier: &str, scheme: &CheckDigitScheme) -> bool {
    let digits: Vec<u32> = identifier
        .chars()
        .filter(|c| c.is_ascii_digit())
        .filter_map(|c| c.to_digit(10))
        .collect();

    if digits.len() != 14 {
        return false;
    }

    if digits.iter().all(|&d| d == digits[0]) {
        return false;
    }

    let first = check_digit(&digits[..12], &scheme.first);
    if first != digits[12] {
        return false;
    }

    let second = check_digit(&digits[..13], &scheme.second);
    second == digits[13]
}

/// Evaluates the three data-quality flags for every consolidated record.
/// All flags are computed unconditionally; an invalid CNPJ does not stop
/// the name or amount checks.
pub fn flag_records(
    records: Vec<ConsolidatedRecord>,
    scheme: &CheckDigitScheme,
) -> Vec<ValidatedRecord> {
    records
        .into_iter()
        .map(|record| {
            let flags = ValidationFlags {
                invalid_cnpj: !validate(&record.cnpj, scheme),
                empty_legal_name: record.legal_name.trim().is_empty(),
                non_positive_amount: record.amount <= 0.0,
            };
            ValidatedRecord { record, flags }
        })
        .collect()
}

fn check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 12345678000195: DV1 over 1,2,3,4,5,6,7,8,0,0,0,1 sums to 222,
    // 222 % 11 = 2, digit 9; DV2 sums to 237, 237 % 11 = 6, digit 5.
    #[test]
    fn test_valid_cnpj_digits_only() {
        assert!(validate("12345678000195", &CheckDigitScheme::default()));
    }

    #[test]
    fn test_valid_cnpj_with_punctuation() {
        assert!(validate("12.345.678/0001-95", &CheckDigitScheme::default()));
    }

    #[test]
    fn test_flipped_last_digit_fails() {
        assert!(!validate("12345678000190", &CheckDigitScheme::default()));
        assert!(!validate("12345678000196", &CheckDigitScheme::default()));
    }

    #[test]
    fn test_flipped_first_check_digit_fails() {
        assert!(!validate("12345678000185", &CheckDigitScheme::default()));
    }

    #[test]
    fn test_wrong_length_fails() {
        let scheme = CheckDigitScheme::default();
        assert!(!validate("", &scheme));
        assert!(!validate("1234567800019", &scheme));
        assert!(!validate("123456780001901", &scheme));
        assert!(!validate("abc", &scheme));
    }

    #[test]
    fn test_repeated_digit_sequences_fail() {
        let scheme = CheckDigitScheme::default();
        for d in 0..=9 {
            let cnpj: String = std::iter::repeat(char::from(b'0' + d)).take(14).collect();
            assert!(!validate(&cnpj, &scheme), "accepted {}", cnpj);
        }
    }

    #[test]
    fn test_formatted_all_zeros_fails() {
        assert!(!validate("00.000.000/0000-00", &CheckDigitScheme::default()));
    }

    #[test]
    fn test_canonical_digits() {
        assert_eq!(canonical_digits("12.345.678/0001-90"), "12345678000190");
        assert_eq!(canonical_digits("no digits"), "");
    }

    #[test]
    fn test_flag_records_evaluates_all_flags_independently() {
        use crate::domain::model::Period;

        let record = ConsolidatedRecord {
            cnpj: "00.000.000/0000-00".to_string(),
            legal_name: "   ".to_string(),
            period: Period { year: 2024, quarter: 2 },
            amount: -1000.0,
            note: String::new(),
        };

        let validated = flag_records(vec![record], &CheckDigitScheme::default());

        let flags = validated[0].flags;
        assert!(flags.invalid_cnpj);
        assert!(flags.empty_legal_name);
        assert!(flags.non_positive_amount);
    }

    #[test]
    fn test_flag_records_clean_record() {
        use crate::domain::model::Period;

        let record = ConsolidatedRecord {
            cnpj: "12.345.678/0001-95".to_string(),
            legal_name: "Operadora Bem Estar Ltda".to_string(),
            period: Period { year: 2024, quarter: 3 },
            amount: 1_500_000.50,
            note: String::new(),
        };

        let validated = flag_records(vec![record], &CheckDigitScheme::default());

        assert!(validated[0].flags.is_clean());
        assert_eq!(validated[0].flags.status(), "VALID");
    }
}
