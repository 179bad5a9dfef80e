//! End-to-end behaviour of typed values: equality, hashing, nulls, and the
//! block round trip, across every built-in type.

use std::sync::Arc;

use typedval_core::{Block, Error, NativeValue, Type, TypeRegistry, TypeSystemConfig};
use typedval_operators::OperatorRegistry;
use typedval_value::TypedValue;

fn registry() -> OperatorRegistry {
    let config = TypeSystemConfig {
        extra_types: vec![
            "array(bigint)".into(),
            "array(array(varchar))".into(),
            "row(boolean, double, varbinary)".into(),
            "array(hyperloglog)".into(),
        ],
        ..TypeSystemConfig::default()
    };
    OperatorRegistry::new(Arc::new(TypeRegistry::bootstrap(&config).expect("bootstrap")))
}

fn ty(ops: &OperatorRegistry, sig: &str) -> Type {
    ops.types().describe(sig).expect("registered type")
}

/// Representative non-null values per type.
fn samples(sig: &str) -> Vec<NativeValue> {
    let s = |items: Vec<Option<NativeValue>>| NativeValue::Structural(items);
    match sig {
        "boolean" => vec![true.into(), false.into(), true.into()],
        "tinyint" => vec![(-128i64).into(), 0i64.into(), 127i64.into()],
        "smallint" => vec![(-2i64).into(), 300i64.into(), 32_767i64.into()],
        "integer" => vec![i64::from(i32::MIN).into(), 1i64.into(), 99i64.into()],
        "bigint" => vec![i64::MIN.into(), 25i64.into(), i64::MAX.into()],
        "date" => vec![0i64.into(), (-1i64).into(), 19_000i64.into()],
        "real" => vec![1.5f64.into(), f64::NAN.into(), (-0.25f64).into()],
        "double" => vec![0.1f64.into(), f64::INFINITY.into(), f64::NAN.into()],
        "varchar" => vec!["".into(), "héllo".into(), "z".into()],
        "varbinary" => vec![vec![0u8].into(), vec![0xffu8, 0].into(), Vec::<u8>::new().into()],
        "array(bigint)" => vec![
            s(vec![]),
            s(vec![Some(1i64.into())]),
            s(vec![Some(1i64.into()), Some(2i64.into())]),
            s(vec![Some(1i64.into()), None]),
            s(vec![None]),
        ],
        "array(array(varchar))" => vec![
            s(vec![Some(s(vec![Some("a".into())]))]),
            s(vec![Some(s(vec![]))]),
            s(vec![]),
            s(vec![None, Some(s(vec![None, Some("b".into())]))]),
        ],
        "row(boolean, double, varbinary)" => vec![
            s(vec![Some(true.into()), Some(1.0f64.into()), Some(vec![1u8].into())]),
            s(vec![Some(false.into()), Some(1.0f64.into()), Some(vec![1u8].into())]),
            s(vec![Some(true.into()), Some(2.0f64.into()), Some(Vec::<u8>::new().into())]),
            s(vec![Some(true.into()), None, Some(vec![1u8].into())]),
            s(vec![None, None, None]),
        ],
        other => panic!("no samples for {other}"),
    }
}

const COMPARABLE: &[&str] = &[
    "boolean",
    "tinyint",
    "smallint",
    "integer",
    "bigint",
    "date",
    "real",
    "double",
    "varchar",
    "varbinary",
    "array(bigint)",
    "array(array(varchar))",
    "row(boolean, double, varbinary)",
];

#[test]
fn scenario_a_equal_bigints() {
    let ops = registry();
    let a = TypedValue::of(&ops, ty(&ops, "bigint"), 25i64).unwrap();
    let b = TypedValue::of(&ops, ty(&ops, "bigint"), 25i64).unwrap();
    assert!(a.equals(&b).unwrap());
    assert_eq!(a.hash_code().unwrap(), b.hash_code().unwrap());
}

#[test]
fn scenario_b_unequal_bigints() {
    let ops = registry();
    let a = TypedValue::of(&ops, ty(&ops, "bigint"), 25i64).unwrap();
    let b = TypedValue::of(&ops, ty(&ops, "bigint"), 26i64).unwrap();
    assert!(!a.equals(&b).unwrap());
}

#[test]
fn scenario_c_null_bigint() {
    let ops = registry();
    let null = TypedValue::as_null(&ops, ty(&ops, "bigint")).unwrap();
    assert!(null.is_null());
    assert!(null.native_value().is_none());
    let zero = TypedValue::of(&ops, ty(&ops, "bigint"), 0i64).unwrap();
    assert!(!null.equals(&zero).unwrap());
}

#[test]
fn scenario_d_block_round_trip() {
    let ops = registry();
    let v = TypedValue::of(&ops, ty(&ops, "bigint"), 25i64).unwrap();
    let block = v.as_block().unwrap();
    assert_eq!(block.position_count(), 1);
    assert!(!block.is_null(0).unwrap());
    let back = TypedValue::from_block(&ops, ty(&ops, "bigint"), &block, 0).unwrap();
    assert_eq!(back.native_value(), Some(&NativeValue::Integer(25)));
    assert!(back.equals(&v).unwrap());
}

#[test]
fn equality_is_reflexive_symmetric_and_transitive() {
    let ops = registry();
    for sig in COMPARABLE {
        let t = ty(&ops, sig);
        let values: Vec<TypedValue> = samples(sig)
            .into_iter()
            .map(|v| TypedValue::of(&ops, t.clone(), v).unwrap())
            .collect();
        for a in &values {
            assert!(a.equals(a).unwrap(), "{sig}: reflexive for {a}");
            for b in &values {
                assert_eq!(a.equals(b).unwrap(), b.equals(a).unwrap(), "{sig}: symmetric");
                for c in &values {
                    if a.equals(b).unwrap() && b.equals(c).unwrap() {
                        assert!(a.equals(c).unwrap(), "{sig}: transitive");
                    }
                }
            }
        }
    }
}

#[test]
fn equal_values_hash_equal_and_hashing_is_stable() {
    let ops = registry();
    for sig in COMPARABLE {
        let t = ty(&ops, sig);
        for v in samples(sig) {
            let a = TypedValue::of(&ops, t.clone(), v.clone()).unwrap();
            let b = TypedValue::of(&ops, t.clone(), v).unwrap();
            assert!(a.equals(&b).unwrap(), "{sig}");
            assert_eq!(a.hash_code().unwrap(), a.hash_code().unwrap(), "{sig}");
            assert_eq!(a.hash_code().unwrap(), b.hash_code().unwrap(), "{sig}");
        }
    }
}

#[test]
fn signed_zero_and_nan_agree_between_equality_and_hash() {
    let ops = registry();
    let double = ty(&ops, "double");
    let pz = TypedValue::of(&ops, double.clone(), 0.0f64).unwrap();
    let nz = TypedValue::of(&ops, double.clone(), -0.0f64).unwrap();
    assert!(pz.equals(&nz).unwrap());
    assert_eq!(pz.hash_code().unwrap(), nz.hash_code().unwrap());

    let nan = TypedValue::of(&ops, double.clone(), f64::NAN).unwrap();
    let other_nan = TypedValue::of(&ops, double, -f64::NAN).unwrap();
    assert!(nan.equals(&other_nan).unwrap());
    assert_eq!(nan.hash_code().unwrap(), other_nan.hash_code().unwrap());
}

#[test]
fn null_identity_and_null_hash() {
    let ops = registry();
    for sig in COMPARABLE {
        let t = ty(&ops, sig);
        let a = TypedValue::as_null(&ops, t.clone()).unwrap();
        let b = TypedValue::as_null(&ops, t.clone()).unwrap();
        assert!(a.equals(&b).unwrap(), "{sig}");
        assert_eq!(a.hash_code().unwrap(), t.identity_hash(), "{sig}");
    }
    let a = TypedValue::as_null(&ops, ty(&ops, "bigint")).unwrap();
    let b = TypedValue::as_null(&ops, ty(&ops, "integer")).unwrap();
    assert!(!a.equals(&b).unwrap());
    assert_ne!(a.hash_code().unwrap(), b.hash_code().unwrap());
}

#[test]
fn every_type_round_trips_through_a_block() {
    let ops = registry();
    for sig in COMPARABLE {
        let t = ty(&ops, sig);
        let mut values: Vec<Option<NativeValue>> = samples(sig).into_iter().map(Some).collect();
        values.push(None);
        for v in values {
            let tv = TypedValue::new(&ops, t.clone(), v).unwrap();
            let block = tv.as_block().unwrap();
            assert_eq!(block.position_count(), 1, "{sig}");
            let back = TypedValue::from_block(&ops, t.clone(), &block, 0).unwrap();
            assert!(back.equals(&tv).unwrap(), "{sig}: {tv}");
            // Binary transport keeps the block intact too.
            let decoded = Block::from_bytes(&block.to_bytes().unwrap()).unwrap();
            assert_eq!(decoded, block, "{sig}");
        }
    }
}

#[test]
fn representation_mismatch_is_rejected() {
    let ops = registry();
    let cases: Vec<(&str, NativeValue)> = vec![
        ("bigint", "25".into()),
        ("varchar", 25i64.into()),
        ("boolean", 1i64.into()),
        ("double", 1i64.into()),
        ("tinyint", 128i64.into()),
        ("real", 0.1f64.into()),
        ("array(bigint)", NativeValue::Structural(vec![Some("x".into())])),
        ("row(boolean, double, varbinary)", NativeValue::Structural(vec![Some(true.into())])),
        ("array(bigint)", 1i64.into()),
    ];
    for (sig, value) in cases {
        let err = TypedValue::of(&ops, ty(&ops, sig), value).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }), "{sig}: {err}");
    }
}

#[test]
fn non_comparable_types_reject_equality_and_hash() {
    let ops = registry();
    for sig in ["hyperloglog", "array(hyperloglog)"] {
        let t = ty(&ops, sig);
        let null = TypedValue::as_null(&ops, t).unwrap();
        assert!(matches!(null.equals(&null), Err(Error::UnsupportedOperator { .. })), "{sig}");
        assert!(matches!(null.hash_code(), Err(Error::UnsupportedOperator { .. })), "{sig}");
    }
    // Still constructible, displayable, and serializable.
    let hll = TypedValue::of(&ops, ty(&ops, "hyperloglog"), vec![1u8, 2]).unwrap();
    assert_eq!(hll.to_display_string().unwrap(), "<hyperloglog>");
    assert!(hll.as_block().is_ok());
}

#[test]
fn nested_nulls_match_only_nested_nulls() {
    let ops = registry();
    let t = ty(&ops, "array(bigint)");
    let with_null = NativeValue::Structural(vec![Some(1i64.into()), None]);
    let a = TypedValue::of(&ops, t.clone(), with_null.clone()).unwrap();
    let b = TypedValue::of(&ops, t.clone(), with_null).unwrap();
    assert!(a.equals(&a).unwrap());
    assert!(a.equals(&b).unwrap());
    assert_eq!(a.hash_code().unwrap(), b.hash_code().unwrap());

    let c = TypedValue::of(&ops, t.clone(), NativeValue::Structural(vec![Some(2i64.into()), None]))
        .unwrap();
    assert!(!a.equals(&c).unwrap());
    let d = TypedValue::of(&ops, t, NativeValue::Structural(vec![Some(1i64.into()), Some(0i64.into())]))
        .unwrap();
    assert!(!a.equals(&d).unwrap());

    let row_ty = ty(&ops, "row(boolean, double, varbinary)");
    let row = NativeValue::Structural(vec![Some(true.into()), None, Some(vec![7u8].into())]);
    let r = TypedValue::of(&ops, row_ty.clone(), row).unwrap();
    let back = TypedValue::from_block(&ops, row_ty, &r.as_block().unwrap(), 0).unwrap();
    assert!(back.equals(&r).unwrap());
    assert_eq!(back.hash_code().unwrap(), r.hash_code().unwrap());
}

#[test]
fn values_from_another_registry_are_unknown() {
    let ops = registry();
    let mut other = TypeRegistry::builder();
    let foreign = other
        .define(
            "money",
            typedval_core::RepresentationKind::Integer,
            Some(8),
            true,
            true,
            typedval_core::Formatter::Decimal,
        )
        .unwrap();
    assert!(matches!(
        TypedValue::of(&ops, foreign, 1i64),
        Err(Error::UnknownType(_))
    ));
}

#[test]
fn display_matches_the_type_formatter() {
    let ops = registry();
    let v = TypedValue::of(&ops, ty(&ops, "date"), 19_000i64).unwrap();
    assert_eq!(v.to_display_string().unwrap(), "2022-01-08");
    assert_eq!(v.to_string(), "TypedValue{type=date, value=2022-01-08}");
    let row = TypedValue::of(
        &ops,
        ty(&ops, "row(boolean, double, varbinary)"),
        NativeValue::Structural(vec![Some(true.into()), None, Some(vec![0xabu8].into())]),
    )
    .unwrap();
    assert_eq!(row.to_display_string().unwrap(), "(true, NULL, ab)");
}
