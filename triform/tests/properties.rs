mod common;

use common::{roundtrip, roundtrip_canonical};
use proptest::prelude::*;
use triform::Reflect;

#[derive(Reflect, Debug, PartialEq, Clone)]
struct Snapshot {
    sequence: u64,
    symbol: String,
    levels: Vec<i16>,
    last: Option<f64>,
}

// Printable ASCII starting with a non-space character, or empty: the
// tagged tree cannot represent whitespace-only text content.
fn text() -> impl Strategy<Value = String> {
    proptest::string::string_regex("([!-~][ -~]{0,30})?").unwrap()
}

fn finite() -> impl Strategy<Value = f64> {
    -1.0e12..1.0e12
}

proptest! {
    #[test]
    fn unsigned_round_trip(value in any::<u64>()) {
        roundtrip_canonical(&value);
    }

    #[test]
    fn signed_round_trip(value in any::<i64>()) {
        roundtrip_canonical(&value);
    }

    #[test]
    fn float_round_trip(value in finite()) {
        roundtrip_canonical(&value);
    }

    #[test]
    fn string_round_trip(value in text()) {
        roundtrip_canonical(&value);
    }

    #[test]
    fn vector_round_trip(value in proptest::collection::vec(any::<i32>(), 0..20)) {
        roundtrip_canonical(&value);
    }

    #[test]
    fn map_round_trip(
        value in proptest::collection::btree_map(any::<u16>(), any::<u32>(), 0..12),
    ) {
        roundtrip_canonical(&value);
    }

    #[test]
    fn map_size_law(
        value in proptest::collection::btree_map(any::<u16>(), any::<u32>(), 0..12),
    ) {
        // Map-like containers record exactly 2n children; the flat
        // alternating layout reloads as a plain sequence.
        let text = triform::to_json(&value).unwrap();
        let flat: Vec<u64> = triform::from_json(&text).unwrap();
        prop_assert_eq!(flat.len(), 2 * value.len());
    }

    #[test]
    fn option_round_trip(value in proptest::option::of(any::<i32>())) {
        roundtrip_canonical(&value);
    }

    #[test]
    fn tuple_round_trip(value in (any::<u8>(), any::<bool>(), finite())) {
        roundtrip_canonical(&value);
    }

    #[test]
    fn set_round_trip(value in proptest::collection::hash_set(any::<u32>(), 0..16)) {
        roundtrip(&value);
    }

    #[test]
    fn aggregate_round_trip(
        sequence in any::<u64>(),
        symbol in text(),
        levels in proptest::collection::vec(any::<i16>(), 0..8),
        last in proptest::option::of(finite()),
    ) {
        roundtrip_canonical(&Snapshot { sequence, symbol, levels, last });
    }
}
