/// Property tests for date normalization and streaks
use std::collections::BTreeSet;

use chrono::NaiveDate;
use habitflow::{current_streak, normalize, DateKey};
use proptest::prelude::*;

proptest! {
    #[test]
    fn valid_keys_normalize_to_themselves(year in 1970i32..2100, month in 1u32..=12, day in 1u32..=28) {
        let key = format!("{:04}-{:02}-{:02}", year, month, day);
        let normalized = normalize(key.as_str()).map(|k| k.to_string());
        prop_assert_eq!(normalized, Some(key));
    }

    #[test]
    fn epoch_seconds_and_millis_agree(seconds in 1_000_000_000i64..4_000_000_000i64) {
        prop_assert_eq!(normalize(seconds), normalize(seconds * 1000));
    }

    #[test]
    fn normalized_keys_are_idempotent(seconds in 0i64..4_000_000_000i64) {
        if let Some(key) = normalize(seconds) {
            prop_assert_eq!(normalize(key.to_string()), Some(key));
        }
    }

    #[test]
    fn streak_never_exceeds_set_size(offsets in proptest::collection::vec(0i64..60, 0..40)) {
        let anchor = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let set: BTreeSet<DateKey> = offsets
            .iter()
            .filter_map(|o| DateKey::new(anchor).add_days(-o))
            .collect();
        let streak = current_streak(&set, anchor);
        prop_assert!(streak as usize <= set.len());
        if streak > 0 {
            prop_assert!(DateKey::new(anchor).pred().map_or(false, |d| set.contains(&d)));
        }
    }
}

#[test]
fn junk_values_do_not_normalize() {
    assert_eq!(normalize(""), None);
    assert_eq!(normalize("not a date"), None);
    assert_eq!(normalize("2024-02-30"), None);
    assert_eq!(normalize(f64::NAN), None);
    assert_eq!(normalize(&serde_json::json!(true)), None);
    assert_eq!(normalize(&serde_json::json!({"date": "2024-01-01"})), None);
}
