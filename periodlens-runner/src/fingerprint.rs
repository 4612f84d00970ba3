//! Dataset fingerprinting for workbook manifests.

use periodlens_core::domain::PeriodDataset;

/// Deterministic BLAKE3 hash over every period's label and records.
///
/// Periods are hashed in the order given; that order is part of the input.
pub fn dataset_fingerprint(periods: &[PeriodDataset]) -> String {
    let mut hasher = blake3::Hasher::new();

    for ds in periods {
        hasher.update(ds.label().as_str().as_bytes());
        hasher.update(&(ds.len() as u64).to_le_bytes());
        for r in ds.records() {
            for field in [&r.customer, &r.salesperson, &r.region, &r.category, &r.route] {
                hasher.update(field.as_bytes());
                hasher.update(&[0]);
            }
            hasher.update(r.shipped_at.to_string().as_bytes());
            hasher.update(&r.amount.to_le_bytes());
        }
    }

    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use periodlens_core::domain::RecordBuilder;

    fn dataset(label: &str, amount: f64) -> PeriodDataset {
        let at = NaiveDate::from_ymd_opt(2024, 10, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        PeriodDataset::with_all_columns(label, vec![RecordBuilder::new(label, "Acme", at, amount).build()])
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = [dataset("current", 10.0), dataset("compare", 5.0)];
        let b = [dataset("current", 10.0), dataset("compare", 5.0)];
        assert_eq!(dataset_fingerprint(&a), dataset_fingerprint(&b));
        assert_eq!(dataset_fingerprint(&a).len(), 64);
    }

    #[test]
    fn fingerprint_changes_with_data() {
        let a = [dataset("current", 10.0)];
        let b = [dataset("current", 10.5)];
        assert_ne!(dataset_fingerprint(&a), dataset_fingerprint(&b));
    }
}
