//! Procedural macros for `triform`.

#![deny(
    rustdoc::broken_intra_doc_links,
    missing_docs,
    rustdoc::missing_crate_level_docs
)]

mod attributes;
mod polymorphic;
mod reflect;
mod util;
mod variant;

extern crate proc_macro;

use syn::{parse_macro_input, DeriveInput};

/// Derives `Tag`, `Reflect`, `ReflectFields`, `Save`, and `Load` for the
/// labeled type.
///
/// Structs become reflectable aggregates: each member is archived beneath
/// its name, in declaration order, under a class attribute carrying the
/// type's identity string. Enums whose variants all carry no data are
/// archived as primitives (canonical name in the textual formats, ordinal
/// in the byte stream); enums with data become sums with an `Index` tag and
/// a `Value` payload.
///
/// # Attributes
///
/// Container attributes, via `#[reflect(...)]`:
///
/// - `tag = "..."`: Overrides the type-identity string. By default the
///   type's name is used, with generic parameters spliced in.
/// - `init`: Invokes the type's inherent
///   `fn initialize(&mut self) -> Result<(), triform::Error>` after every
///   load (never on save). Use it to recompute transient members or to
///   re-validate invariants; the method must exist.
///
/// Field attributes:
///
/// - `flatten`: Splices the field type's members into this descriptor at
///   the field's position instead of nesting them under the field name.
///   Declare the flattened parent first to keep parent members ahead of
///   the child's own. The field type must also derive `Reflect`.
/// - `skip`: Excludes the member from the archive; it is rebuilt with
///   `Default` on load.
/// - `omit_bounds`: Leaves the member's type out of the generated where
///   clauses. Required on self-referential members (for example the next
///   link of a list node), whose bounds would otherwise send trait
///   resolution into a cycle.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match reflect::derive(input) {
        Ok(result) => result.into(),
        Err(error) => error.to_compile_error().into(),
    }
}

/// Makes a base trait archivable behind owned handles, and registers
/// concrete implementations.
///
/// On a trait definition, adds the erased-save supertrait and generates the
/// per-format load registries plus `Save`/`Load` implementations for
/// `Box<dyn Trait>` and `Arc<dyn Trait>`. On an `impl Trait for Type`
/// block, registers `Type`'s load callbacks for all three formats at once.
///
/// The registration references a generated `<Trait>Registration` type next
/// to the trait, so an impl block in another module must bring that type
/// into scope along with the trait.
///
/// ```ignore
/// #[polymorphic]
/// pub trait Instrument {
///     fn price(&self) -> f64;
/// }
///
/// #[derive(Reflect)]
/// pub struct Swap {
///     notional: f64,
/// }
///
/// #[polymorphic]
/// impl Instrument for Swap {
///     fn price(&self) -> f64 {
///         self.notional
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn polymorphic(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    polymorphic::expand(attr.into(), item.into())
        .unwrap_or_else(|error| error.to_compile_error())
        .into()
}
