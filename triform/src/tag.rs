//! Type-identity strings.
//!
//! Every type that can sit behind a class attribute carries a stable textual
//! name chosen by the type's author. Names compose through generics
//! (`Vec<i32>`, `Option<String>`) so a container of named types is itself
//! named. The library treats the strings as opaque beyond equality.

use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

/// A stable, unique-per-type textual identity.
///
/// `#[derive(Reflect)]` implements this with the type's name by default; the
/// `#[reflect(tag = "...")]` attribute overrides it. The same string is used
/// by every archive format, both when a value writes its class attribute and
/// when the polymorphic registry resolves a concrete type on load.
pub trait Tag {
    /// Returns the type-identity string.
    ///
    /// Non-generic types should return a borrowed constant; generic types
    /// allocate to splice their parameters in.
    fn tag() -> Cow<'static, str>;
}

macro_rules! impl_tag {
    ($($ty:ty => $name:literal,)*) => {
        $(
            impl Tag for $ty {
                fn tag() -> Cow<'static, str> {
                    Cow::Borrowed($name)
                }
            }
        )*
    };
}

impl_tag! {
    bool => "bool",
    char => "char",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    String => "String",
    () => "()",
}

fn generic(name: &str, params: &[Cow<'static, str>]) -> Cow<'static, str> {
    Cow::Owned(format!("{}<{}>", name, params.join(", ")))
}

impl<T: Tag> Tag for Vec<T> {
    fn tag() -> Cow<'static, str> {
        generic("Vec", &[T::tag()])
    }
}

impl<T: Tag> Tag for VecDeque<T> {
    fn tag() -> Cow<'static, str> {
        generic("VecDeque", &[T::tag()])
    }
}

impl<T: Tag> Tag for Option<T> {
    fn tag() -> Cow<'static, str> {
        generic("Option", &[T::tag()])
    }
}

impl<T: Tag, E: Tag> Tag for Result<T, E> {
    fn tag() -> Cow<'static, str> {
        generic("Result", &[T::tag(), E::tag()])
    }
}

impl<K: Tag, V: Tag> Tag for BTreeMap<K, V> {
    fn tag() -> Cow<'static, str> {
        generic("BTreeMap", &[K::tag(), V::tag()])
    }
}

impl<K: Tag, V: Tag> Tag for HashMap<K, V> {
    fn tag() -> Cow<'static, str> {
        generic("HashMap", &[K::tag(), V::tag()])
    }
}

impl<T: Tag> Tag for BTreeSet<T> {
    fn tag() -> Cow<'static, str> {
        generic("BTreeSet", &[T::tag()])
    }
}

impl<T: Tag> Tag for HashSet<T> {
    fn tag() -> Cow<'static, str> {
        generic("HashSet", &[T::tag()])
    }
}

impl<T: Tag, const N: usize> Tag for [T; N] {
    fn tag() -> Cow<'static, str> {
        Cow::Owned(format!("[{}; {}]", T::tag(), N))
    }
}

impl<T: Tag> Tag for Box<T> {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
}

impl<T: Tag> Tag for Rc<T> {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
}

impl<T: Tag> Tag for Arc<T> {
    fn tag() -> Cow<'static, str> {
        T::tag()
    }
}

macro_rules! impl_tuple_tag {
    ($($ty:ident),+) => {
        impl<$($ty: Tag),+> Tag for ($($ty,)+) {
            fn tag() -> Cow<'static, str> {
                Cow::Owned(format!("({})", [$($ty::tag()),+].join(", ")))
            }
        }
    };
}

impl_tuple_tag!(T0);
impl_tuple_tag!(T0, T1);
impl_tuple_tag!(T0, T1, T2);
impl_tuple_tag!(T0, T1, T2, T3);
impl_tuple_tag!(T0, T1, T2, T3, T4);
impl_tuple_tag!(T0, T1, T2, T3, T4, T5);
impl_tuple_tag!(T0, T1, T2, T3, T4, T5, T6);
impl_tuple_tag!(T0, T1, T2, T3, T4, T5, T6, T7);
impl_tuple_tag!(T0, T1, T2, T3, T4, T5, T6, T7, T8);
impl_tuple_tag!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9);
impl_tuple_tag!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10);
impl_tuple_tag!(T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composed_tags() {
        assert_eq!(Vec::<i32>::tag(), "Vec<i32>");
        assert_eq!(BTreeMap::<u32, String>::tag(), "BTreeMap<u32, String>");
        assert_eq!(<(bool, f64)>::tag(), "(bool, f64)");
        assert_eq!(<[u8; 4]>::tag(), "[u8; 4]");
        assert_eq!(Arc::<Vec<i32>>::tag(), "Vec<i32>");
    }
}
