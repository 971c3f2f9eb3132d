//! The core traversal traits.
//!
//! `Save` and `Load` are the two directions of the engine; together with the
//! implementations in `impls` and the ones `#[derive(Reflect)]` generates,
//! they form the compile-time classifier: a type is archivable exactly when
//! the impls exist, and an unsupported type is a build error.

use crate::archive::{Archive, NodeRef};
use crate::error::Error;
use crate::tag::Tag;

/// Writes a value beneath an archive node.
///
/// Implementations must mirror [`Load`] operation-for-operation so the
/// positional backing stays coherent: whatever sequence of adapter calls
/// `save` performs, `load` must perform the same sequence.
pub trait Save<A: Archive> {
    /// Saves `self` beneath `node`.
    fn save(&self, archive: &mut A, node: NodeRef) -> Result<(), Error>;
}

/// Rebuilds a value from an archive node.
pub trait Load<A: Archive>: Sized {
    /// Loads a value from `node`.
    fn load(archive: &mut A, node: NodeRef) -> Result<Self, Error>;
}

/// The format-independent half of a reflection descriptor.
///
/// Implemented by `#[derive(Reflect)]` for aggregates: the ordered member
/// walk and the post-load hook. The format-facing member traversal lives in
/// [`ReflectFields`], which is parameterized over the backing.
pub trait Reflect: Tag {
    /// Calls `f` once per member name: flattened parents first, then own
    /// members, all in declaration order.
    fn visit_members(f: &mut dyn FnMut(&'static str));

    /// Post-load hook, invoked after every member has been loaded and never
    /// on save. Recompute transients here, or re-validate invariants and
    /// fail the load.
    ///
    /// `#[reflect(init)]` routes this to an inherent `initialize` method on
    /// the deriving type; without the attribute it is a no-op.
    fn initialize(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// The format-facing half of a reflection descriptor: saving and loading
/// the members of an aggregate, without the class attribute handling that
/// wraps them.
///
/// Split from [`Reflect`] so each member only needs its `Save`/`Load`
/// bounds for the backing actually in use. Flattened parents are reached
/// through their own `ReflectFields` implementation, which is what gives
/// derived descriptors their parent-first concatenation.
pub trait ReflectFields<A: Archive>: Sized {
    /// Saves each member beneath its name, in descriptor order.
    fn save_fields(&self, archive: &mut A, node: NodeRef) -> Result<(), Error>;

    /// Loads each member from beneath its name, in descriptor order.
    fn load_fields(archive: &mut A, node: NodeRef) -> Result<Self, Error>;
}

/// Collects the member names of a reflectable aggregate.
///
/// Convenience over [`Reflect::visit_members`] for diagnostics and tests;
/// two descriptors are equivalent exactly when these sequences match.
pub fn member_names<T: Reflect>() -> Vec<&'static str> {
    let mut names = Vec::new();
    T::visit_members(&mut |name| names.push(name));
    names
}
