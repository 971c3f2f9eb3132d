mod common;

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use common::{roundtrip, roundtrip_canonical};
use triform::{from_bytes, from_json, from_xml, member_names, to_bytes, to_json, to_xml, Reflect};

macro_rules! primitive_roundtrips {
    ($($name:ident: $ty:ty = $value:expr;)*) => {
        $(
            paste::paste! {
                #[test]
                fn [<roundtrip_ $name>]() {
                    let value: $ty = $value;
                    roundtrip_canonical(&value);
                }
            }
        )*
    };
}

primitive_roundtrips! {
    bool_true: bool = true;
    bool_false: bool = false;
    u8_max: u8 = u8::MAX;
    u16_value: u16 = 40_000;
    u32_value: u32 = 4_000_000_000;
    u64_max: u64 = u64::MAX;
    i8_min: i8 = i8::MIN;
    i32_negative: i32 = -123_456;
    i64_min: i64 = i64::MIN;
    usize_value: usize = 9_999;
    f32_quarter: f32 = 0.25;
    f64_pi: f64 = std::f64::consts::PI;
    char_ascii: char = 'q';
    char_accented: char = 'é';
    string_hello: String = "Hello, world!".to_string();
    string_escapes: String = "a < b && \"c\" > d".to_string();
    unit: () = ();
}

#[test]
fn integer_vector_round_trips() {
    let value = vec![1u32, 2, 4, 6, 8];
    assert_eq!(to_json(&value).unwrap(), "[1,2,4,6,8]");
    roundtrip_canonical(&value);
}

#[test]
fn integer_vector_as_xml() {
    let value = vec![1u32, 2, 4, 6, 8];
    assert_eq!(
        to_xml("Archive", &value).unwrap(),
        r#"<Archive Size="5"><Item>1</Item><Item>2</Item><Item>4</Item><Item>6</Item><Item>8</Item></Archive>"#
    );
}

#[test]
fn integer_map_stores_flat_pairs() {
    let value = BTreeMap::from([(1u32, 1u32), (2, 2)]);
    assert_eq!(to_json(&value).unwrap(), "[1,1,2,2]");
    roundtrip_canonical(&value);
}

#[test]
fn unordered_containers_round_trip() {
    let map: HashMap<String, u64> = HashMap::from([
        ("one".to_string(), 1),
        ("two".to_string(), 2),
        ("three".to_string(), 3),
    ]);
    roundtrip(&map);

    let set: HashSet<i32> = HashSet::from([3, 1, 4, 1, 5]);
    roundtrip(&set);
}

#[test]
fn ordered_collections_round_trip() {
    roundtrip_canonical(&VecDeque::from([1i16, -2, 3]));
    roundtrip_canonical(&BTreeSet::from(["ask".to_string(), "bid".to_string()]));
    roundtrip_canonical(&vec![vec![1u8], vec![], vec![2, 3]]);
}

#[test]
fn tuples_and_arrays_round_trip() {
    roundtrip_canonical(&(1u8, "x".to_string(), true));
    assert_eq!(to_json(&(1u8, "x".to_string(), true)).unwrap(), r#"[1,"x",true]"#);
    roundtrip_canonical(&[10u16, 20, 30, 40]);
    roundtrip_canonical(&[0u8; 0]);
}

#[test]
fn options_match_the_flag_layout() {
    let some = Some("Hello".to_string());
    assert_eq!(to_json(&some).unwrap(), r#"[true,"Hello"]"#);
    roundtrip_canonical(&some);

    let none: Option<String> = None;
    assert_eq!(to_json(&none).unwrap(), "[false]");
    roundtrip_canonical(&none);

    roundtrip_canonical(&Some(Some(7u32)));
    roundtrip_canonical(&vec![Some(1u8), None, Some(3)]);
}

#[test]
fn results_are_two_way_sums() {
    let ok: Result<i32, String> = Ok(5);
    assert_eq!(to_json(&ok).unwrap(), r#"{"Index":0,"Value":5}"#);
    roundtrip_canonical(&ok);

    let err: Result<i32, String> = Err("boom".to_string());
    assert_eq!(to_json(&err).unwrap(), r#"{"Index":1,"Value":"boom"}"#);
    roundtrip_canonical(&err);
}

#[derive(Reflect, Debug, PartialEq, Clone)]
enum Number {
    I(i64),
    F(f64),
    S(String),
}

#[test]
fn variants_store_index_and_value() {
    let value = Number::F(6.5);
    assert_eq!(to_json(&value).unwrap(), r#"{"Index":1,"Value":6.5}"#);
    roundtrip_canonical(&value);
    roundtrip_canonical(&Number::I(-3));
    roundtrip_canonical(&Number::S("six".to_string()));
}

#[derive(Reflect, Debug, PartialEq)]
enum Event {
    Ping,
    Fill { price: f64, quantity: u32 },
    Batch(Vec<Number>, bool),
}

#[test]
fn variant_payload_shapes_round_trip() {
    roundtrip_canonical(&Event::Ping);
    roundtrip_canonical(&Event::Fill {
        price: 101.5,
        quantity: 400,
    });
    roundtrip_canonical(&Event::Batch(vec![Number::I(1), Number::F(2.5)], true));
}

#[derive(Reflect, Debug, PartialEq, Clone, Copy)]
enum Side {
    Buy,
    Sell,
}

#[test]
fn fieldless_enums_archive_by_name() {
    assert_eq!(to_json(&Side::Sell).unwrap(), r#""Sell""#);
    roundtrip_canonical(&Side::Buy);
    roundtrip_canonical(&Side::Sell);
    // The byte stream keeps the declaration-order ordinal instead.
    assert_eq!(to_bytes(&Side::Sell).unwrap(), [1, 0, 0, 0]);
}

#[test]
fn owned_handles_round_trip() {
    roundtrip_canonical(&Box::new(42u64));
    let shared = Arc::new(vec![1i32, 2, 3]);
    assert_eq!(
        to_json(&shared).unwrap(),
        r#"{"Class":"Vec<i32>","Value":[1,2,3]}"#
    );
    roundtrip_canonical(&shared);
    roundtrip_canonical(&std::rc::Rc::new("shared".to_string()));
}

#[test]
fn references_save_as_their_referents() {
    let value = vec![5u8, 6];
    let via_ref = to_json(&&value).unwrap();
    assert_eq!(via_ref, to_json(&value).unwrap());
}

#[derive(Reflect, Debug, PartialEq, Clone)]
struct MessageId {
    id: String,
    scheme: String,
}

#[derive(Reflect, Debug, PartialEq, Clone)]
struct Header {
    message_id: MessageId,
    sent_by: String,
    send_to: String,
    creation_timestamp: String,
}

fn sample_header() -> Header {
    Header {
        message_id: MessageId {
            id: "MSG12345".to_string(),
            scheme: "https://example.com/messageId".to_string(),
        },
        sent_by: "BANKXYZ".to_string(),
        send_to: "CLIENTABC".to_string(),
        creation_timestamp: "2024-12-15T10:30:00Z".to_string(),
    }
}

#[test]
fn nested_aggregates_round_trip() {
    let header = sample_header();
    roundtrip_canonical(&header);
    assert_eq!(
        to_json(&header).unwrap(),
        r#"{"Class":"Header","message_id":{"Class":"MessageId","id":"MSG12345","scheme":"https://example.com/messageId"},"sent_by":"BANKXYZ","send_to":"CLIENTABC","creation_timestamp":"2024-12-15T10:30:00Z"}"#
    );
}

#[test]
fn aggregates_keep_member_order_in_xml() {
    let text = to_xml("Header", &sample_header()).unwrap();
    assert_eq!(
        text,
        r#"<Header Class="Header"><message_id Class="MessageId"><id>MSG12345</id><scheme>https://example.com/messageId</scheme></message_id><sent_by>BANKXYZ</sent_by><send_to>CLIENTABC</send_to><creation_timestamp>2024-12-15T10:30:00Z</creation_timestamp></Header>"#
    );
}

#[test]
fn aggregates_survive_the_byte_stream() {
    let header = sample_header();
    let bytes = to_bytes(&header).unwrap();
    let back: Header = from_bytes(&bytes).unwrap();
    assert_eq!(back, header);
    assert_eq!(to_bytes(&back).unwrap(), bytes);
}

#[derive(Reflect, Debug, PartialEq)]
struct Identified {
    id: u32,
    label: String,
}

#[derive(Reflect, Debug, PartialEq)]
struct Order {
    #[reflect(flatten)]
    base: Identified,
    amount: f64,
}

#[test]
fn flattened_parents_come_first() {
    assert_eq!(member_names::<Order>(), ["id", "label", "amount"]);
    let order = Order {
        base: Identified {
            id: 9,
            label: "first".to_string(),
        },
        amount: 2.5,
    };
    assert_eq!(
        to_json(&order).unwrap(),
        r#"{"Class":"Order","id":9,"label":"first","amount":2.5}"#
    );
    roundtrip_canonical(&order);
}

#[derive(Reflect, Debug, PartialEq)]
#[reflect(init)]
struct Curve {
    points: Vec<f64>,
    #[reflect(skip)]
    mean: f64,
}

impl Curve {
    fn initialize(&mut self) -> Result<(), triform::Error> {
        self.mean = self.points.iter().sum::<f64>() / self.points.len() as f64;
        Ok(())
    }
}

#[test]
fn transients_are_rebuilt_by_the_load_hook() {
    assert_eq!(member_names::<Curve>(), ["points"]);
    let curve = Curve {
        points: vec![1.0, 2.0, 6.0],
        mean: 3.0,
    };
    // The transient never reaches the archive.
    assert_eq!(to_json(&curve).unwrap(), r#"{"Class":"Curve","points":[1.0,2.0,6.0]}"#);
    let back: Curve = from_json(&to_json(&curve).unwrap()).unwrap();
    assert_eq!(back, curve);
    let back: Curve = from_bytes(&to_bytes(&curve).unwrap()).unwrap();
    assert_eq!(back, curve);
}

#[derive(Reflect, Debug, PartialEq)]
struct Empty;

#[test]
fn placeholder_aggregates_round_trip() {
    assert!(member_names::<Empty>().is_empty());
    assert_eq!(to_json(&Empty).unwrap(), r#"{"Class":"Empty"}"#);
    roundtrip_canonical(&Empty);
}

#[derive(Reflect, Debug, PartialEq)]
struct Ratio(u32, u32);

#[test]
fn unnamed_members_get_positional_names() {
    let value = Ratio(3, 4);
    assert_eq!(
        to_json(&value).unwrap(),
        r#"{"Class":"Ratio","Field0":3,"Field1":4}"#
    );
    roundtrip_canonical(&value);
}

#[derive(Reflect, Debug, PartialEq)]
struct Pairing<T> {
    left: T,
    right: T,
}

#[test]
fn generic_aggregates_compose_their_tags() {
    let value = Pairing {
        left: 1u32,
        right: 2u32,
    };
    assert_eq!(
        to_json(&value).unwrap(),
        r#"{"Class":"Pairing<u32>","left":1,"right":2}"#
    );
    roundtrip_canonical(&value);
}

#[derive(Debug, PartialEq, Clone)]
struct Tenor {
    months: u32,
}

impl fmt::Display for Tenor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}M", self.months)
    }
}

impl FromStr for Tenor {
    type Err = String;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let months = text
            .strip_suffix('M')
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| format!("bad tenor `{text}`"))?;
        Ok(Tenor { months })
    }
}

triform::archive_via_string!(Tenor, "Tenor");

#[test]
fn domain_types_archive_as_their_string_form() {
    let tenor = Tenor { months: 18 };
    assert_eq!(to_json(&tenor).unwrap(), r#""18M""#);
    roundtrip_canonical(&tenor);
    roundtrip_canonical(&vec![Tenor { months: 3 }, Tenor { months: 240 }]);
}

#[test]
fn deep_compositions_round_trip() {
    let value: BTreeMap<String, Vec<Option<(u8, Side)>>> = BTreeMap::from([
        ("a".to_string(), vec![Some((1, Side::Buy)), None]),
        ("b".to_string(), vec![]),
    ]);
    roundtrip_canonical(&value);
}

#[test]
fn file_helpers_round_trip_whole_archives() {
    let dir = std::env::temp_dir().join("triform-test-archives");
    std::fs::create_dir_all(&dir).unwrap();

    let header = sample_header();

    let mut archive = triform::JsonArchive::new();
    triform::save(&mut archive, &header).unwrap();
    let path = dir.join("header.json");
    triform::write_json(&path, &archive).unwrap();
    let mut archive = triform::read_json(&path).unwrap();
    let back: Header = triform::load(&mut archive).unwrap();
    assert_eq!(back, header);

    let mut archive = triform::XmlArchive::new("Header");
    triform::save(&mut archive, &header).unwrap();
    let path = dir.join("header.xml");
    triform::write_xml(&path, &archive).unwrap();
    let mut archive = triform::read_xml(&path).unwrap();
    assert_eq!(archive.root_tag(), "Header");
    let back: Header = triform::load(&mut archive).unwrap();
    assert_eq!(back, header);

    let mut archive = triform::BinaryArchive::new();
    triform::save(&mut archive, &header).unwrap();
    let path = dir.join("header.bin");
    triform::write_bin(&path, &archive).unwrap();
    let mut archive = triform::read_bin(&path).unwrap();
    let back: Header = triform::load(&mut archive).unwrap();
    assert_eq!(back, header);
}

#[test]
fn cross_format_layouts_agree() {
    // The same value, through all three backings, lands on the same member
    // names and the same declared sizes.
    let value = from_json::<Header>(&to_json(&sample_header()).unwrap()).unwrap();
    let via_xml = from_xml::<Header>(&to_xml("Header", &value).unwrap()).unwrap();
    let via_bytes = from_bytes::<Header>(&to_bytes(&via_xml).unwrap()).unwrap();
    assert_eq!(via_bytes, sample_header());
}
