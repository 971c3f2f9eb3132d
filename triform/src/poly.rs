//! Trait-object support: erased saving and the per-format load registries.
//!
//! Saving through `Box<dyn Base>` or `Arc<dyn Base>` needs no registry: the
//! value knows its own concrete type, so [`SaveErased`] carries a statically
//! dispatched save for each backing behind an object-safe surface. Loading
//! is the hard direction — only the class string read from the archive says
//! what to construct — and that is what the registries answer: one table
//! per (base trait, format) mapping type-identity strings to callbacks that
//! build the concrete type and hand it back behind the base.
//!
//! Registrations are submitted at link time through [`inventory`] by
//! `#[polymorphic]` on each impl block, and collected into lazy tables on
//! first use. Registering the same type-identity twice for one base is a
//! program error: the table refuses to build and panics naming the tag.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;

use crate::archive::{Archive, BinaryArchive, JsonArchive, NodeRef, XmlArchive};
use crate::archive::{CLASS_ATTR, NULL_CLASS};
use crate::error::Error;
use crate::tag::Tag;
use crate::traits::Save;

/// Object-safe save bridge, implemented for every concrete archivable type.
///
/// `#[polymorphic]` adds this as a supertrait of the base trait, which is
/// what lets a trait object save itself into any backing and recover its
/// concrete type after a load (via [`SaveErased::as_any`]).
pub trait SaveErased: Any {
    /// The concrete type-identity string of the erased value.
    fn erased_tag(&self) -> Cow<'static, str>;

    /// Saves into the key-value backing.
    fn save_tree(&self, archive: &mut JsonArchive, node: NodeRef) -> Result<(), Error>;

    /// Saves into the tagged-tree backing.
    fn save_tagged(&self, archive: &mut XmlArchive, node: NodeRef) -> Result<(), Error>;

    /// Saves into the byte-stream backing.
    fn save_stream(&self, archive: &mut BinaryArchive, node: NodeRef) -> Result<(), Error>;

    /// Upcast used to downcast back to the concrete type.
    fn as_any(&self) -> &dyn Any;
}

impl<T> SaveErased for T
where
    T: Any + Tag + Save<JsonArchive> + Save<XmlArchive> + Save<BinaryArchive>,
{
    fn erased_tag(&self) -> Cow<'static, str> {
        T::tag()
    }

    fn save_tree(&self, archive: &mut JsonArchive, node: NodeRef) -> Result<(), Error> {
        self.save(archive, node)
    }

    fn save_tagged(&self, archive: &mut XmlArchive, node: NodeRef) -> Result<(), Error> {
        self.save(archive, node)
    }

    fn save_stream(&self, archive: &mut BinaryArchive, node: NodeRef) -> Result<(), Error> {
        self.save(archive, node)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Load callback: builds a concrete value and returns it behind the base.
pub type LoadDynFn<A, B> = fn(&mut A, NodeRef) -> Result<Box<B>, Error>;

/// One registration record: a concrete type's callbacks for all three
/// formats, keyed by its type identity.
///
/// `#[polymorphic]` wraps this in a per-trait collectable type and submits
/// one per registered impl. The tag is a function so records can be built
/// in constant context.
pub struct Registration<B: ?Sized> {
    /// Returns the concrete type's identity string.
    pub tag: fn() -> Cow<'static, str>,
    /// Callback for the key-value backing.
    pub tree: LoadDynFn<JsonArchive, B>,
    /// Callback for the tagged-tree backing.
    pub tagged: LoadDynFn<XmlArchive, B>,
    /// Callback for the byte-stream backing.
    pub stream: LoadDynFn<BinaryArchive, B>,
}

/// A per-format name→callback table for one base trait.
pub struct PolyRegistry<A, B: ?Sized> {
    entries: HashMap<String, LoadDynFn<A, B>>,
}

impl<A, B: ?Sized> PolyRegistry<A, B> {
    /// Builds the table from submitted registrations.
    ///
    /// Panics if one tag was registered twice: a duplicated registration is
    /// a program error, surfaced at the registry's first use.
    pub fn collect(
        entries: impl IntoIterator<Item = (Cow<'static, str>, LoadDynFn<A, B>)>,
    ) -> Self {
        let mut map = HashMap::new();
        for (tag, callback) in entries {
            let tag = tag.into_owned();
            if map.insert(tag.clone(), callback).is_some() {
                panic!("type `{tag}` registered twice for one format");
            }
        }
        PolyRegistry { entries: map }
    }

    /// Constant-time membership test.
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Runs the load callback registered for `tag`.
    pub fn load(&self, tag: &str, archive: &mut A, node: NodeRef) -> Result<Box<B>, Error> {
        match self.entries.get(tag) {
            Some(callback) => callback(archive, node),
            None => Err(Error::RegistryNotFound {
                tag: tag.to_string(),
            }),
        }
    }
}

/// Reads the concrete class of a polymorphic node.
///
/// A missing class is fatal here — without it there is nothing to construct
/// — and the null sentinel cannot be loaded into a non-nullable handle.
pub fn erased_class<A: Archive>(archive: &mut A, node: NodeRef) -> Result<String, Error> {
    match archive.get_class(node)? {
        Some(class) if class == NULL_CLASS => Err(Error::NullPointer),
        Some(class) => Ok(class),
        None => Err(Error::MissingField {
            name: CLASS_ATTR.to_string(),
        }),
    }
}
