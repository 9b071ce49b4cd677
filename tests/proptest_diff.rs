//! Property-based tests for the diff and patch engines.

use proptest::prelude::*;

use structdiff::{diff, patch, Record, Value};

fn arb_primitive() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        any::<u32>().prop_map(|u| Value::Uint(u64::from(u))),
        // Finite floats only: NaN is never equal to itself.
        any::<i32>().prop_map(|i| Value::Float(f64::from(i))),
        "[a-z]{0,8}".prop_map(Value::from),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_primitive().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::vec(("[a-z]{1,4}", inner.clone()), 0..4)
                .prop_map(|entries| Value::map(entries)),
            inner.clone().prop_map(Value::slot),
            inner.prop_map(Value::reference),
        ]
    })
}

fn arb_label_map() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z]{1,3}", any::<i64>(), 0..6).prop_map(|entries| {
        Value::map(entries.into_iter().map(|(k, v)| (k, Value::Int(v))))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_diff_against_self_is_empty(value in arb_value()) {
        let changelog = diff(&value, &value.clone()).expect("same-shape diff succeeds");
        prop_assert!(changelog.is_empty());
    }

    #[test]
    fn prop_scalar_record_round_trip(
        a_name in "[a-z]{1,8}",
        b_name in "[a-z]{1,8}",
        a_count in any::<i64>(),
        b_count in any::<i64>(),
        a_on in any::<bool>(),
        b_on in any::<bool>(),
    ) {
        let build = |name: &str, count: i64, on: bool| {
            Value::Record(
                Record::new("Config")
                    .with_field("name,create", Value::from(name))
                    .with_field("count,create", Value::Int(count))
                    .with_field("enabled,create", Value::Bool(on)),
            )
        };
        let a = build(&a_name, a_count, a_on);
        let b = build(&b_name, b_count, b_on);

        let changelog = diff(&a, &b).expect("diff succeeds");
        let mut target = a.clone();
        let log = patch(&changelog, &mut target);

        prop_assert!(!log.has_errors());
        prop_assert_eq!(target, b);
    }

    #[test]
    fn prop_map_round_trip(a in arb_label_map(), b in arb_label_map()) {
        let changelog = diff(&a, &b).expect("diff succeeds");
        let mut target = a.clone();
        let log = patch(&changelog, &mut target);

        prop_assert!(!log.has_errors());
        prop_assert_eq!(target, b);
    }

    #[test]
    fn prop_changelog_survives_json(a in arb_label_map(), b in arb_label_map()) {
        let changelog = diff(&a, &b).expect("diff succeeds");
        let encoded = serde_json::to_string(&changelog).expect("encode");
        let decoded: structdiff::Changelog = serde_json::from_str(&encoded).expect("decode");

        prop_assert_eq!(decoded.len(), changelog.len());
        for (d, c) in decoded.iter().zip(changelog.iter()) {
            prop_assert_eq!(d.kind, c.kind);
            prop_assert_eq!(&d.path, &c.path);
        }
    }
}
