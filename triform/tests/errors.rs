use std::collections::BTreeMap;

use triform::{from_bytes, from_json, to_bytes, to_json, Error, JsonArchive, Reflect};

#[derive(Reflect, Debug, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Reflect, Debug, PartialEq)]
enum Number {
    I(i64),
    F(f64),
    S(String),
}

#[derive(Reflect, Debug, PartialEq)]
enum Never {}

#[derive(Reflect, Debug, PartialEq)]
struct Chain {
    #[reflect(omit_bounds)]
    next: Option<Box<Chain>>,
}

fn chain(depth: usize) -> Chain {
    let mut head = Chain { next: None };
    for _ in 0..depth {
        head = Chain {
            next: Some(Box::new(head)),
        };
    }
    head
}

#[test]
fn array_length_is_validated() {
    let text = to_json(&[1u32, 2, 3]).unwrap();
    let error = from_json::<[u32; 4]>(&text).unwrap_err();
    assert!(
        matches!(
            error,
            Error::SizeMismatch {
                expected: 4,
                found: 3
            }
        ),
        "unexpected error {error:?}"
    );
}

#[test]
fn maps_require_even_lengths() {
    let error = from_json::<BTreeMap<u32, u32>>("[1,1,2]").unwrap_err();
    assert!(matches!(error, Error::SizeMismatch { found: 3, .. }));
}

#[test]
fn variant_tags_are_bounded() {
    let error = from_json::<Number>(r#"{"Index":9,"Value":1}"#).unwrap_err();
    assert!(matches!(
        error,
        Error::InvalidIndex { index: 9, arity: 3 }
    ));
}

#[test]
fn options_need_their_flag() {
    let error = from_json::<Option<String>>("[]").unwrap_err();
    assert!(matches!(
        error,
        Error::SizeMismatch {
            expected: 1,
            found: 0
        }
    ));
}

#[test]
fn uninhabited_sums_cannot_load() {
    let error = from_json::<Never>("{}").unwrap_err();
    assert!(matches!(error, Error::InvalidVariant));
}

#[test]
fn deep_values_hit_the_default_depth_budget() {
    let error = to_json(&chain(600)).unwrap_err();
    assert!(matches!(error, Error::RecursionLimit { limit: 1000 }));
}

#[test]
fn depth_budgets_are_configurable() {
    let mut archive = JsonArchive::with_max_depth(8);
    let error = triform::save(&mut archive, &chain(20)).unwrap_err();
    assert!(matches!(error, Error::RecursionLimit { limit: 8 }));
}

#[test]
fn null_sentinel_is_rejected_for_values() {
    let error = from_json::<Point>(r#"{"Class":"null object!"}"#).unwrap_err();
    assert!(matches!(error, Error::NullPointer));
}

#[test]
fn missing_class_is_only_a_warning_for_values() {
    let point: Point = from_json(r#"{"x":1,"y":2}"#).unwrap();
    assert_eq!(point, Point { x: 1, y: 2 });
}

#[test]
fn mismatched_scalars_fail_to_decode() {
    assert!(matches!(from_json::<u32>("true"), Err(Error::Decode(_))));
    assert!(matches!(from_json::<bool>("3"), Err(Error::Decode(_))));
    assert!(matches!(from_json::<u8>("300"), Err(Error::Decode(_))));
    assert!(matches!(from_json::<i16>("-70000"), Err(Error::Decode(_))));
}

#[test]
fn malformed_documents_fail_to_decode() {
    assert!(matches!(
        from_json::<Point>("{not json"),
        Err(Error::Decode(_))
    ));
}

#[test]
fn truncated_streams_fail_to_decode() {
    let bytes = to_bytes(&vec![1u64, 2, 3]).unwrap();
    let error = from_bytes::<Vec<u64>>(&bytes[..bytes.len() - 2]).unwrap_err();
    assert!(matches!(error, Error::Decode(_)));
}

#[test]
fn unknown_enumeration_names_fail_to_decode() {
    #[derive(Reflect, Debug, PartialEq)]
    enum Side {
        Buy,
        Sell,
    }
    assert!(matches!(
        from_json::<Side>(r#""Hold""#),
        Err(Error::Decode(_))
    ));
}

#[test]
fn non_finite_floats_cannot_become_json() {
    assert!(matches!(to_json(&f64::NAN), Err(Error::Decode(_))));
    // The byte stream has no such restriction.
    let bytes = to_bytes(&f64::INFINITY).unwrap();
    assert_eq!(from_bytes::<f64>(&bytes).unwrap(), f64::INFINITY);
}
