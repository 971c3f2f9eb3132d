//! The byte-stream backing.
//!
//! The archive tree flattens into a strictly positional stream: child
//! addressing by name or by index collapses onto a cursor, so a node handle
//! carries nothing but its depth. Numbers are little-endian and fixed
//! width, booleans and variant tags are one byte, strings and class names
//! are prefixed with a `u32` length, declared sizes are inline `u32`
//! counts, and the empty-sum placeholder is a single marker byte.
//!
//! Because addressing is positional, save and load must perform identical
//! operation sequences; the traversal engine guarantees this for every
//! supported type.

use crate::archive::{Archive, NodeRef, DEFAULT_MAX_DEPTH};
use crate::error::Error;

/// Archive over a flat byte buffer with a read cursor.
#[derive(Clone, Debug)]
pub struct BinaryArchive {
    buf: Vec<u8>,
    pos: usize,
    max_depth: u32,
}

impl BinaryArchive {
    /// Creates an empty archive ready for writing.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Creates an empty archive with an explicit depth budget.
    pub fn with_max_depth(max_depth: u32) -> Self {
        BinaryArchive {
            buf: Vec::new(),
            pos: 0,
            max_depth,
        }
    }

    /// Wraps existing bytes for reading; the cursor starts at the front.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        BinaryArchive {
            buf: bytes.into(),
            pos: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// The archived bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the archive, returning the archived bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn descend(&self, parent: NodeRef) -> Result<NodeRef, Error> {
        if parent.depth >= self.max_depth {
            return Err(Error::RecursionLimit {
                limit: self.max_depth,
            });
        }
        Ok(NodeRef {
            index: 0,
            depth: parent.depth + 1,
        })
    }

    fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn read(&mut self, len: usize) -> Result<&[u8], Error> {
        if self.buf.len() - self.pos < len {
            return Err(Error::decode("unexpected end of stream"));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read(N)?);
        Ok(out)
    }

    fn write_len(&mut self, len: usize) -> Result<(), Error> {
        let len = u32::try_from(len)
            .map_err(|_| Error::decode(format!("length {len} exceeds the stream's u32 limit")))?;
        self.write(&len.to_le_bytes());
        Ok(())
    }

    fn read_len(&mut self) -> Result<usize, Error> {
        Ok(u32::from_le_bytes(self.read_array()?) as usize)
    }

    fn write_str(&mut self, value: &str) -> Result<(), Error> {
        self.write_len(value.len())?;
        self.write(value.as_bytes());
        Ok(())
    }

    fn read_str(&mut self) -> Result<String, Error> {
        let len = self.read_len()?;
        let bytes = self.read(len)?.to_vec();
        String::from_utf8(bytes).map_err(Error::decode)
    }
}

impl Default for BinaryArchive {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! binary_numeric_ops {
    ($($put:ident, $get:ident, $ty:ty;)*) => {
        $(
            fn $put(&mut self, _node: NodeRef, value: $ty) -> Result<(), Error> {
                self.write(&value.to_le_bytes());
                Ok(())
            }

            fn $get(&mut self, _node: NodeRef) -> Result<$ty, Error> {
                Ok(<$ty>::from_le_bytes(self.read_array()?))
            }
        )*
    };
}

impl Archive for BinaryArchive {
    fn member(&mut self, parent: NodeRef, _name: &str) -> Result<NodeRef, Error> {
        self.descend(parent)
    }

    fn element(&mut self, parent: NodeRef, _index: usize) -> Result<NodeRef, Error> {
        self.descend(parent)
    }

    fn set_size(&mut self, _node: NodeRef, size: usize) -> Result<(), Error> {
        self.write_len(size)
    }

    fn size(&mut self, _node: NodeRef) -> Result<usize, Error> {
        self.read_len()
    }

    fn put_class(&mut self, _node: NodeRef, class: &str) -> Result<(), Error> {
        self.write_str(class)
    }

    fn get_class(&mut self, _node: NodeRef) -> Result<Option<String>, Error> {
        self.read_str().map(Some)
    }

    fn put_index(&mut self, _node: NodeRef, _key: &str, value: u8) -> Result<(), Error> {
        self.write(&[value]);
        Ok(())
    }

    fn get_index(&mut self, _node: NodeRef, _key: &str) -> Result<u8, Error> {
        Ok(self.read_array::<1>()?[0])
    }

    fn put_enum(&mut self, _node: NodeRef, ordinal: u32, _name: &'static str) -> Result<(), Error> {
        self.write(&ordinal.to_le_bytes());
        Ok(())
    }

    fn get_enum(&mut self, _node: NodeRef, names: &'static [&'static str]) -> Result<u32, Error> {
        let ordinal = u32::from_le_bytes(self.read_array()?);
        if (ordinal as usize) < names.len() {
            Ok(ordinal)
        } else {
            Err(Error::decode(format!(
                "enumeration ordinal {ordinal} out of range for {} values",
                names.len()
            )))
        }
    }

    fn put_unit(&mut self, _node: NodeRef) -> Result<(), Error> {
        self.write(&[0]);
        Ok(())
    }

    fn get_unit(&mut self, _node: NodeRef) -> Result<(), Error> {
        match self.read_array::<1>()?[0] {
            0 => Ok(()),
            other => Err(Error::decode(format!("bad placeholder byte {other:#04x}"))),
        }
    }

    fn put_bool(&mut self, _node: NodeRef, value: bool) -> Result<(), Error> {
        self.write(&[value as u8]);
        Ok(())
    }

    fn get_bool(&mut self, _node: NodeRef) -> Result<bool, Error> {
        match self.read_array::<1>()?[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(Error::decode(format!("bad boolean byte {other:#04x}"))),
        }
    }

    binary_numeric_ops! {
        put_i8, get_i8, i8;
        put_i16, get_i16, i16;
        put_i32, get_i32, i32;
        put_i64, get_i64, i64;
        put_u8, get_u8, u8;
        put_u16, get_u16, u16;
        put_u32, get_u32, u32;
        put_u64, get_u64, u64;
        put_f32, get_f32, f32;
        put_f64, get_f64, f64;
    }

    fn put_char(&mut self, _node: NodeRef, value: char) -> Result<(), Error> {
        self.write(&(value as u32).to_le_bytes());
        Ok(())
    }

    fn get_char(&mut self, _node: NodeRef) -> Result<char, Error> {
        let code = u32::from_le_bytes(self.read_array()?);
        char::from_u32(code)
            .ok_or_else(|| Error::decode(format!("invalid character code {code:#x}")))
    }

    fn put_str(&mut self, _node: NodeRef, value: &str) -> Result<(), Error> {
        self.write_str(value)
    }

    fn get_str(&mut self, _node: NodeRef) -> Result<String, Error> {
        self.read_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_encodings() {
        let mut archive = BinaryArchive::new();
        let root = archive.root();
        archive.put_u16(root, 0x0102).unwrap();
        archive.put_bool(root, true).unwrap();
        archive.put_str(root, "hi").unwrap();
        assert_eq!(
            archive.as_bytes(),
            [0x02, 0x01, 0x01, 0x02, 0x00, 0x00, 0x00, b'h', b'i']
        );
    }

    #[test]
    fn reads_consume_in_order() {
        let mut archive = BinaryArchive::new();
        let root = archive.root();
        archive.set_size(root, 2).unwrap();
        archive.put_i64(root, -5).unwrap();
        archive.put_char(root, 'é').unwrap();

        let mut archive = BinaryArchive::from_bytes(archive.into_bytes());
        let root = archive.root();
        assert_eq!(archive.size(root).unwrap(), 2);
        assert_eq!(archive.get_i64(root).unwrap(), -5);
        assert_eq!(archive.get_char(root).unwrap(), 'é');
    }

    #[test]
    fn truncated_streams_are_rejected() {
        let mut archive = BinaryArchive::from_bytes(vec![0x01]);
        let root = archive.root();
        assert!(archive.get_u32(root).is_err());
    }

    #[test]
    fn depth_budget_applies_to_descent() {
        let mut archive = BinaryArchive::with_max_depth(2);
        let root = archive.root();
        let one = archive.member(root, "a").unwrap();
        let two = archive.member(one, "b").unwrap();
        assert!(matches!(
            archive.member(two, "c"),
            Err(Error::RecursionLimit { limit: 2 })
        ));
    }
}
