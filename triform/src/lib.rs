//! # triform
//!
//! triform converts in-memory object graphs to and from three
//! interchangeable archive formats — an ordered JSON tree, an XML tagged
//! tree, and a compact positional byte stream — driven by one compile-time
//! description per user type.
//!
//! ## Design
//!
//! Like serde, triform uses the trait system to serialize without runtime
//! reflection: the set of [`Save`]/[`Load`] implementations selects a
//! strategy for every supported value shape at compile time, and a type
//! outside that set fails to build rather than failing to run. Unlike
//! serde, all three formats address one tree model — named members,
//! positional children, declared sizes, and type-identity attributes — so
//! the same value round-trips through JSON, XML, and bytes with the same
//! layout decisions.
//!
//! Aggregates are described by `#[derive(Reflect)]`, which records an
//! ordered member list, writes each member beneath its name, and attaches
//! the type's identity string as a class attribute. A `flatten` field
//! splices a parent's members ahead of the child's own, and an optional
//! `initialize` hook runs after every load.
//!
//! Trait objects round-trip through the per-format registries: mark a base
//! trait and its impls with [`polymorphic`] and owned handles like
//! `Arc<dyn Base>` save the concrete type's identity and restore the
//! concrete type on load.
//!
//! ## Example
//!
//! ```
//! use triform::{from_bytes, from_json, to_bytes, to_json, Reflect};
//!
//! #[derive(Reflect, Debug, PartialEq)]
//! struct Quote {
//!     symbol: String,
//!     bid: f64,
//!     ask: f64,
//! }
//!
//! let quote = Quote {
//!     symbol: "XYZ".to_string(),
//!     bid: 101.25,
//!     ask: 101.75,
//! };
//!
//! let text = to_json(&quote).unwrap();
//! let back: Quote = from_json(&text).unwrap();
//! assert_eq!(back, quote);
//!
//! let bytes = to_bytes(&quote).unwrap();
//! let back: Quote = from_bytes(&bytes).unwrap();
//! assert_eq!(back, quote);
//! ```

#![deny(
    rustdoc::broken_intra_doc_links,
    missing_docs,
    rustdoc::missing_crate_level_docs
)]

// Re-exports used by derive-generated code.
pub use ::inventory;
pub use ::lazy_static;
pub use ::log;
pub use ::triform_derive::{polymorphic, Reflect};

pub mod archive;
mod error;
mod impls;
mod macros;
pub mod poly;
mod tag;
mod traits;
mod util;

pub use crate::archive::{
    Archive, BinaryArchive, JsonArchive, NodeRef, XmlArchive, CLASS_ATTR, DEFAULT_MAX_DEPTH,
    INDEX_ATTR, NULL_CLASS, SIZE_ATTR, VALUE_MEMBER,
};
pub use crate::error::Error;
pub use crate::tag::Tag;
pub use crate::traits::{member_names, Load, Reflect, ReflectFields, Save};
pub use crate::util::{
    from_bytes, from_json, from_xml, load, read_bin, read_json, read_xml, save, to_bytes, to_json,
    to_xml, write_bin, write_json, write_xml,
};
