use std::sync::Arc;

use triform::{
    from_bytes, from_json, from_xml, polymorphic, to_bytes, to_json, to_xml, Error, Reflect,
};

#[polymorphic]
trait Shape {
    fn kind(&self) -> &'static str;
}

#[derive(Reflect, Debug, PartialEq, Clone)]
struct Circle {
    d: f64,
    n: String,
}

#[polymorphic]
impl Shape for Circle {
    fn kind(&self) -> &'static str {
        "circle"
    }
}

#[derive(Reflect, Debug, PartialEq, Clone)]
struct Square {
    side: f64,
}

#[polymorphic]
impl Shape for Square {
    fn kind(&self) -> &'static str {
        "square"
    }
}

// Implements the trait but is deliberately never registered.
#[derive(Reflect, Debug, PartialEq, Clone)]
struct Blob {
    size: f64,
}

impl Shape for Blob {
    fn kind(&self) -> &'static str {
        "blob"
    }
}

fn sample() -> Arc<dyn Shape> {
    Arc::new(Circle {
        d: 6.7,
        n: "me".to_string(),
    })
}

fn assert_is_original_circle(handle: &Arc<dyn Shape>) {
    assert_eq!(handle.kind(), "circle");
    let circle = handle
        .as_any()
        .downcast_ref::<Circle>()
        .expect("concrete type survives the round trip");
    assert_eq!(circle.d, 6.7);
    assert_eq!(circle.n, "me");
}

#[test]
fn shared_handles_round_trip_as_json() {
    let text = to_json(&sample()).unwrap();
    assert_eq!(text, r#"{"Class":"Circle","d":6.7,"n":"me"}"#);
    let back: Arc<dyn Shape> = from_json(&text).unwrap();
    assert_is_original_circle(&back);
}

#[test]
fn shared_handles_round_trip_as_xml() {
    let text = to_xml("Shape", &sample()).unwrap();
    let back: Arc<dyn Shape> = from_xml(&text).unwrap();
    assert_is_original_circle(&back);
}

#[test]
fn shared_handles_round_trip_as_bytes() {
    let bytes = to_bytes(&sample()).unwrap();
    let back: Arc<dyn Shape> = from_bytes(&bytes).unwrap();
    assert_is_original_circle(&back);
}

#[test]
fn unique_handles_round_trip() {
    let boxed: Box<dyn Shape> = Box::new(Square { side: 3.5 });
    let bytes = to_bytes(&boxed).unwrap();
    let back: Box<dyn Shape> = from_bytes(&bytes).unwrap();
    assert_eq!(back.kind(), "square");
    let square = back.as_any().downcast_ref::<Square>().unwrap();
    assert_eq!(square.side, 3.5);
}

#[test]
fn mixed_concrete_types_in_one_container() {
    let shapes: Vec<Box<dyn Shape>> = vec![
        Box::new(Circle {
            d: 1.0,
            n: "a".to_string(),
        }),
        Box::new(Square { side: 2.0 }),
    ];
    let text = to_json(&shapes).unwrap();
    let back: Vec<Box<dyn Shape>> = from_json(&text).unwrap();
    assert_eq!(back.len(), 2);
    assert_eq!(back[0].kind(), "circle");
    assert_eq!(back[1].kind(), "square");
}

#[derive(Reflect)]
struct Drawing {
    name: String,
    shape: Arc<dyn Shape>,
}

#[test]
fn aggregates_may_hold_polymorphic_members() {
    let drawing = Drawing {
        name: "sketch".to_string(),
        shape: sample(),
    };
    let bytes = to_bytes(&drawing).unwrap();
    let back: Drawing = from_bytes(&bytes).unwrap();
    assert_eq!(back.name, "sketch");
    assert_is_original_circle(&back.shape);
}

#[test]
fn unregistered_types_save_but_refuse_to_load() {
    let blob: Arc<dyn Shape> = Arc::new(Blob { size: 0.5 });
    let text = to_json(&blob).unwrap();
    assert_eq!(text, r#"{"Class":"Blob","size":0.5}"#);
    let error = from_json::<Arc<dyn Shape>>(&text).unwrap_err();
    assert!(
        matches!(&error, Error::RegistryNotFound { tag } if tag == "Blob"),
        "unexpected error {error:?}"
    );
}

#[test]
fn unknown_class_names_are_reported() {
    let error = from_json::<Arc<dyn Shape>>(r#"{"Class":"Ghost","d":1.0}"#).unwrap_err();
    assert!(matches!(&error, Error::RegistryNotFound { tag } if tag == "Ghost"));
}

#[test]
fn null_sentinel_cannot_enter_a_handle() {
    let error = from_json::<Arc<dyn Shape>>(r#"{"Class":"null object!"}"#).unwrap_err();
    assert!(matches!(error, Error::NullPointer));
}

#[test]
fn missing_class_is_fatal_for_polymorphic_loads() {
    let error = from_json::<Arc<dyn Shape>>(r#"{"d":1.0,"n":"x"}"#).unwrap_err();
    assert!(matches!(&error, Error::MissingField { name } if name == "Class"));
}

#[test]
fn nullable_handles_compose_with_option() {
    let some: Option<Box<dyn Shape>> = Some(Box::new(Square { side: 9.0 }));
    let bytes = to_bytes(&some).unwrap();
    let back: Option<Box<dyn Shape>> = from_bytes(&bytes).unwrap();
    assert_eq!(back.map(|shape| shape.kind()), Some("square"));

    let none: Option<Box<dyn Shape>> = None;
    let bytes = to_bytes(&none).unwrap();
    let back: Option<Box<dyn Shape>> = from_bytes(&bytes).unwrap();
    assert!(back.is_none());
}
