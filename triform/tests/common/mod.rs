#![allow(dead_code)]

use std::fmt::Debug;

use triform::{
    from_bytes, from_json, from_xml, to_bytes, to_json, to_xml, BinaryArchive, JsonArchive, Load,
    Save, XmlArchive,
};

/// Round-trips `value` through every backing and checks structural equality.
pub fn roundtrip<T>(value: &T)
where
    T: Save<JsonArchive>
        + Save<XmlArchive>
        + Save<BinaryArchive>
        + Load<JsonArchive>
        + Load<XmlArchive>
        + Load<BinaryArchive>
        + Debug
        + PartialEq,
{
    let text = to_json(value).unwrap();
    let back: T = from_json(&text).unwrap();
    assert_eq!(&back, value, "json round trip through {text}");

    let text = to_xml("Archive", value).unwrap();
    let back: T = from_xml(&text).unwrap();
    assert_eq!(&back, value, "xml round trip through {text}");

    let bytes = to_bytes(value).unwrap();
    let back: T = from_bytes(&bytes).unwrap();
    assert_eq!(&back, value, "binary round trip through {bytes:?}");
}

/// Round-trips plus byte-for-byte idempotence of `save ∘ load ∘ save`.
///
/// Only meaningful for types with deterministic iteration; hash containers
/// reorder between saves.
pub fn roundtrip_canonical<T>(value: &T)
where
    T: Save<JsonArchive>
        + Save<XmlArchive>
        + Save<BinaryArchive>
        + Load<JsonArchive>
        + Load<XmlArchive>
        + Load<BinaryArchive>
        + Debug
        + PartialEq,
{
    roundtrip(value);

    let bytes = to_bytes(value).unwrap();
    let back: T = from_bytes(&bytes).unwrap();
    assert_eq!(to_bytes(&back).unwrap(), bytes, "binary idempotence");

    let text = to_json(value).unwrap();
    let back: T = from_json(&text).unwrap();
    assert_eq!(to_json(&back).unwrap(), text, "json idempotence");

    let text = to_xml("Archive", value).unwrap();
    let back: T = from_xml(&text).unwrap();
    assert_eq!(to_xml("Archive", &back).unwrap(), text, "xml idempotence");
}
