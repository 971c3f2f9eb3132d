//! The failure taxonomy shared by every backing and traversal path.

use thiserror::Error;

/// Errors produced while saving to or loading from an archive.
///
/// A failure aborts the current save or load; the archive is left partially
/// modified and should be discarded by the caller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The declared child count disagrees with what the static type expects.
    #[error("size mismatch: expected {expected} children, found {found}")]
    SizeMismatch {
        /// The count the static type requires.
        expected: usize,
        /// The count the archive declared.
        found: usize,
    },
    /// A sum type with no inhabitable alternative cannot be rebuilt.
    #[error("sum type has no active alternative")]
    InvalidVariant,
    /// A variant tag read from the archive is outside the sum's arity.
    #[error("variant index {index} out of range for arity {arity}")]
    InvalidIndex {
        /// The tag found in the archive.
        index: u32,
        /// The number of alternatives the sum declares.
        arity: u32,
    },
    /// A null value was encountered where a handle must own a target.
    #[error("null value loaded into a non-nullable handle")]
    NullPointer,
    /// A required child or attribute is absent.
    #[error("missing field `{name}`")]
    MissingField {
        /// The member or attribute name that could not be found.
        name: String,
    },
    /// No callback is registered for the concrete type name.
    #[error("type `{tag}` is not registered for this format")]
    RegistryNotFound {
        /// The type-identity string read from the archive.
        tag: String,
    },
    /// Traversal exceeded the archive's depth budget.
    #[error("recursion limit of {limit} exceeded")]
    RecursionLimit {
        /// The depth budget that was in force.
        limit: u32,
    },
    /// The backing could not decode its input.
    #[error("decode error: {0}")]
    Decode(String),
    /// Filesystem failure in the whole-archive read and write helpers.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wraps a backing-level parse failure.
    pub fn decode(message: impl std::fmt::Display) -> Self {
        Error::Decode(message.to_string())
    }

    pub(crate) fn missing(name: &str) -> Self {
        Error::MissingField {
            name: name.to_string(),
        }
    }
}
