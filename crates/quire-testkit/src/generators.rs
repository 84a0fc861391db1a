//! Proptest generators for property-based testing.

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

use quire_core::ContentRecord;

/// Earliest instant generated: 0001-01-01T00:00:00Z.
const MIN_SECS: i64 = -62_135_596_800;
/// Latest instant generated: 9999-12-31T23:59:59Z.
const MAX_SECS: i64 = 253_402_300_799;

/// Generate a UTC timestamp with nanosecond precision in years 1..=9999.
pub fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (MIN_SECS..=MAX_SECS, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        Utc.timestamp_opt(secs, nanos)
            .single()
            .expect("in-range timestamp")
    })
}

/// Generate a record name.
pub fn record_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,31}".prop_map(String::from)
}

/// Generate a record with arbitrary printable title and body.
pub fn content_record() -> impl Strategy<Value = ContentRecord> {
    ("\\PC{0,40}", timestamp(), "\\PC{0,400}")
        .prop_map(|(title, ts, body)| ContentRecord::new(title, ts, body))
}

/// Generate a non-empty shared secret.
pub fn secret() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=2048)
}

/// Generate a challenge seed as the server would issue it.
pub fn seed() -> impl Strategy<Value = i64> {
    1i64..=i64::MAX
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_core::envelope;
    use quire_store::SortOrder;

    use crate::fixtures::memory_store;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn sealed_record_lands_in_store_unchanged(
            record in content_record(),
            name in record_name(),
            secret in secret(),
            seed in seed(),
        ) {
            let env = envelope::encode(seed, &secret, &record, &name).unwrap();
            let signed = envelope::decode(&env, seed, &secret).unwrap();

            let store = memory_store(SortOrder::default());
            store.add(&signed.name, signed.record).unwrap();

            prop_assert_eq!(store.get(&name).unwrap(), record.clone());
            prop_assert_eq!(store.latest().unwrap(), record);
        }

        #[test]
        fn index_is_sorted_newest_first(
            records in prop::collection::vec((record_name(), content_record()), 0..20),
        ) {
            let store = memory_store(SortOrder::NewestFirst);
            for (name, record) in &records {
                store.add(name, record.clone()).unwrap();
            }

            let list = store.list().unwrap();
            prop_assert_eq!(list.len(), store.len().unwrap());
            prop_assert!(list.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        }
    }
}
