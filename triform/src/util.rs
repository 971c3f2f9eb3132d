//! One-call conversions and whole-archive file helpers.

use std::fs;
use std::path::Path;

use crate::archive::{Archive, BinaryArchive, JsonArchive, XmlArchive};
use crate::error::Error;
use crate::traits::{Load, Save};

/// Saves `value` at the archive root.
pub fn save<A: Archive, T: Save<A> + ?Sized>(archive: &mut A, value: &T) -> Result<(), Error> {
    let root = archive.root();
    value.save(archive, root)
}

/// Loads a `T` from the archive root.
pub fn load<A: Archive, T: Load<A>>(archive: &mut A) -> Result<T, Error> {
    let root = archive.root();
    T::load(archive, root)
}

/// Serializes `value` to a JSON string.
pub fn to_json<T: Save<JsonArchive> + ?Sized>(value: &T) -> Result<String, Error> {
    let mut archive = JsonArchive::new();
    save(&mut archive, value)?;
    archive.to_json()
}

/// Deserializes a `T` from a JSON string.
pub fn from_json<T: Load<JsonArchive>>(text: &str) -> Result<T, Error> {
    let mut archive = JsonArchive::parse(text)?;
    load(&mut archive)
}

/// Serializes `value` to an XML string whose root element is `root_tag`.
pub fn to_xml<T: Save<XmlArchive> + ?Sized>(root_tag: &str, value: &T) -> Result<String, Error> {
    let mut archive = XmlArchive::new(root_tag);
    save(&mut archive, value)?;
    archive.to_xml()
}

/// Deserializes a `T` from an XML string.
pub fn from_xml<T: Load<XmlArchive>>(text: &str) -> Result<T, Error> {
    let mut archive = XmlArchive::parse(text)?;
    load(&mut archive)
}

/// Serializes `value` to archive bytes.
pub fn to_bytes<T: Save<BinaryArchive> + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    let mut archive = BinaryArchive::new();
    save(&mut archive, value)?;
    Ok(archive.into_bytes())
}

/// Deserializes a `T` from archive bytes.
pub fn from_bytes<T: Load<BinaryArchive>>(bytes: &[u8]) -> Result<T, Error> {
    let mut archive = BinaryArchive::from_bytes(bytes);
    load(&mut archive)
}

/// Writes a JSON archive to a file.
pub fn write_json(path: impl AsRef<Path>, archive: &JsonArchive) -> Result<(), Error> {
    fs::write(path, archive.to_json()?)?;
    Ok(())
}

/// Reads a JSON archive from a file.
pub fn read_json(path: impl AsRef<Path>) -> Result<JsonArchive, Error> {
    JsonArchive::parse(&fs::read_to_string(path)?)
}

/// Writes an XML archive to a file.
pub fn write_xml(path: impl AsRef<Path>, archive: &XmlArchive) -> Result<(), Error> {
    fs::write(path, archive.to_xml()?)?;
    Ok(())
}

/// Reads an XML archive from a file.
pub fn read_xml(path: impl AsRef<Path>) -> Result<XmlArchive, Error> {
    XmlArchive::parse(&fs::read_to_string(path)?)
}

/// Writes a binary archive to a file.
pub fn write_bin(path: impl AsRef<Path>, archive: &BinaryArchive) -> Result<(), Error> {
    fs::write(path, archive.as_bytes())?;
    Ok(())
}

/// Reads a binary archive from a file.
pub fn read_bin(path: impl AsRef<Path>) -> Result<BinaryArchive, Error> {
    Ok(BinaryArchive::from_bytes(fs::read(path)?))
}

// Pre-allocation for untrusted lengths is capped so a corrupt count cannot
// reserve unbounded memory before any element is read.
pub(crate) fn bounded_capacity(len: usize) -> usize {
    len.min(4096)
}
