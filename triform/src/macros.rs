//! Macros for types the derive cannot cover.

/// Archives a type through its canonical string form.
///
/// Domain types whose whole identity is one string — dates, tenors, keys —
/// get the primitive treatment: the textual backings store the string, the
/// byte stream stores it length-prefixed, and loading parses it back. The
/// type must implement [`Display`](std::fmt::Display) and
/// [`FromStr`](std::str::FromStr) with a displayable error.
///
/// ```
/// use std::fmt;
/// use std::str::FromStr;
///
/// #[derive(Debug, PartialEq)]
/// struct Tenor {
///     months: u32,
/// }
///
/// impl fmt::Display for Tenor {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "{}M", self.months)
///     }
/// }
///
/// impl FromStr for Tenor {
///     type Err = String;
///
///     fn from_str(text: &str) -> Result<Self, Self::Err> {
///         let months = text
///             .strip_suffix('M')
///             .and_then(|n| n.parse().ok())
///             .ok_or_else(|| format!("bad tenor `{text}`"))?;
///         Ok(Tenor { months })
///     }
/// }
///
/// triform::archive_via_string!(Tenor, "Tenor");
///
/// let text = triform::to_json(&Tenor { months: 18 }).unwrap();
/// assert_eq!(text, "\"18M\"");
/// ```
#[macro_export]
macro_rules! archive_via_string {
    ($ty:ty, $tag:literal) => {
        impl $crate::Tag for $ty {
            fn tag() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed($tag)
            }
        }

        impl<A: $crate::Archive> $crate::Save<A> for $ty {
            fn save(
                &self,
                archive: &mut A,
                node: $crate::NodeRef,
            ) -> ::std::result::Result<(), $crate::Error> {
                $crate::Archive::put_str(archive, node, &self.to_string())
            }
        }

        impl<A: $crate::Archive> $crate::Load<A> for $ty {
            fn load(
                archive: &mut A,
                node: $crate::NodeRef,
            ) -> ::std::result::Result<Self, $crate::Error> {
                $crate::Archive::get_str(archive, node)?
                    .parse()
                    .map_err($crate::Error::decode)
            }
        }
    };
}
