//! In-memory node arena shared by the two textual backings.
//!
//! Nodes live in a flat arena and are addressed by [`NodeRef`]; the depth
//! budget is enforced here, on every descent, so neither textual backing can
//! be driven past its recursion limit by a deep value or a deep document.
//! Typed readers accept both natively typed scalars (parsed JSON) and raw
//! text (parsed XML), which is what lets one reader family serve both
//! backings.

use indexmap::IndexMap;

use crate::archive::{NodeRef, CLASS_ATTR};
use crate::error::Error;

/// Scalar payload of a tree node.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Scalar {
    Null,
    Bool(bool),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
}

/// Attribute payload. The tagged tree renders both shapes as strings; the
/// key-value tree keeps integers as numbers.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum AttrValue {
    Str(String),
    UInt(u64),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct TreeNode {
    pub scalar: Option<Scalar>,
    pub attrs: IndexMap<String, AttrValue>,
    pub named: IndexMap<String, u32>,
    pub items: Vec<u32>,
    pub declared_size: Option<usize>,
}

#[derive(Clone, Debug)]
pub(crate) struct Tree {
    nodes: Vec<TreeNode>,
    max_depth: u32,
    // Whether declared sizes are recorded and trusted (tagged tree) or
    // implicit in the positional child count (key-value tree).
    declared_sizes: bool,
}

impl Tree {
    pub fn new(max_depth: u32, declared_sizes: bool) -> Self {
        Tree {
            nodes: vec![TreeNode::default()],
            max_depth,
            declared_sizes,
        }
    }

    pub fn node(&self, at: NodeRef) -> &TreeNode {
        &self.nodes[at.index as usize]
    }

    pub fn node_mut(&mut self, at: NodeRef) -> &mut TreeNode {
        &mut self.nodes[at.index as usize]
    }

    /// Arena access by slot, for the emitters' depth-free walks.
    pub fn node_at(&self, index: u32) -> &TreeNode {
        &self.nodes[index as usize]
    }

    fn descend(&self, parent: NodeRef) -> Result<(), Error> {
        if parent.depth >= self.max_depth {
            return Err(Error::RecursionLimit {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn push_node(&mut self) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(TreeNode::default());
        index
    }

    pub fn member(&mut self, parent: NodeRef, name: &str) -> Result<NodeRef, Error> {
        self.descend(parent)?;
        if let Some(&index) = self.nodes[parent.index as usize].named.get(name) {
            return Ok(parent.child(index));
        }
        let index = self.push_node();
        self.nodes[parent.index as usize]
            .named
            .insert(name.to_string(), index);
        Ok(parent.child(index))
    }

    pub fn element(&mut self, parent: NodeRef, index: usize) -> Result<NodeRef, Error> {
        self.descend(parent)?;
        while self.nodes[parent.index as usize].items.len() <= index {
            let node = self.push_node();
            self.nodes[parent.index as usize].items.push(node);
        }
        let child = self.nodes[parent.index as usize].items[index];
        Ok(parent.child(child))
    }

    pub fn set_size(&mut self, node: NodeRef, size: usize) -> Result<(), Error> {
        // Recorded in both textual backings; only the tagged tree trusts it
        // on read. The key-value backing keeps it so an empty sequence still
        // renders as a sequence.
        self.node_mut(node).declared_size = Some(size);
        Ok(())
    }

    pub fn size(&mut self, node: NodeRef) -> Result<usize, Error> {
        let node = self.node(node);
        match node.declared_size {
            Some(declared) if self.declared_sizes => {
                // Trust the declared size; a short element list is a
                // truncated document.
                if node.items.len() < declared {
                    return Err(Error::SizeMismatch {
                        expected: declared,
                        found: node.items.len(),
                    });
                }
                Ok(declared)
            }
            _ => Ok(node.items.len()),
        }
    }

    pub fn put_class(&mut self, node: NodeRef, class: &str) -> Result<(), Error> {
        self.node_mut(node)
            .attrs
            .insert(CLASS_ATTR.to_string(), AttrValue::Str(class.to_string()));
        Ok(())
    }

    pub fn get_class(&mut self, node: NodeRef) -> Result<Option<String>, Error> {
        match self.node(node).attrs.get(CLASS_ATTR) {
            Some(AttrValue::Str(class)) => Ok(Some(class.clone())),
            Some(AttrValue::UInt(_)) => {
                log::warn!("non-string class attribute; using the default type identity");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn put_index(&mut self, node: NodeRef, key: &str, value: u8) -> Result<(), Error> {
        self.node_mut(node)
            .attrs
            .insert(key.to_string(), AttrValue::UInt(value as u64));
        Ok(())
    }

    pub fn get_index(&mut self, node: NodeRef, key: &str) -> Result<u8, Error> {
        match self.node(node).attrs.get(key) {
            Some(AttrValue::UInt(value)) => u8::try_from(*value)
                .map_err(|_| Error::decode(format!("attribute `{key}` out of range: {value}"))),
            Some(AttrValue::Str(text)) => text
                .parse()
                .map_err(|_| Error::decode(format!("attribute `{key}` is not an integer: `{text}`"))),
            None => Err(Error::missing(key)),
        }
    }

    pub fn put_enum(
        &mut self,
        node: NodeRef,
        _ordinal: u32,
        name: &'static str,
    ) -> Result<(), Error> {
        self.put_scalar(node, Scalar::Text(name.to_string()));
        Ok(())
    }

    pub fn get_enum(
        &mut self,
        node: NodeRef,
        names: &'static [&'static str],
    ) -> Result<u32, Error> {
        let text = self.read_str(node)?;
        names
            .iter()
            .position(|name| *name == text)
            .map(|ordinal| ordinal as u32)
            .ok_or_else(|| Error::decode(format!("unknown enumeration value `{text}`")))
    }

    pub fn put_scalar(&mut self, node: NodeRef, value: Scalar) {
        self.node_mut(node).scalar = Some(value);
    }

    fn scalar(&self, node: NodeRef) -> Option<&Scalar> {
        self.node(node).scalar.as_ref()
    }

    pub fn read_unit(&self, node: NodeRef) -> Result<(), Error> {
        match self.scalar(node) {
            None | Some(Scalar::Null) => Ok(()),
            Some(other) => Err(Error::decode(format!("expected null, found {other:?}"))),
        }
    }

    pub fn read_bool(&self, node: NodeRef) -> Result<bool, Error> {
        match self.scalar(node) {
            Some(Scalar::Bool(value)) => Ok(*value),
            Some(Scalar::Text(text)) => text
                .parse()
                .map_err(|_| Error::decode(format!("expected boolean, found `{text}`"))),
            Some(other) => Err(Error::decode(format!("expected boolean, found {other:?}"))),
            None => Err(Error::decode("expected boolean, node is empty")),
        }
    }

    pub fn read_u64(&self, node: NodeRef) -> Result<u64, Error> {
        match self.scalar(node) {
            Some(Scalar::Unsigned(value)) => Ok(*value),
            Some(Scalar::Signed(value)) => u64::try_from(*value)
                .map_err(|_| Error::decode(format!("expected unsigned integer, found {value}"))),
            Some(Scalar::Text(text)) => text
                .parse()
                .map_err(|_| Error::decode(format!("expected unsigned integer, found `{text}`"))),
            Some(other) => Err(Error::decode(format!(
                "expected unsigned integer, found {other:?}"
            ))),
            None => Err(Error::decode("expected unsigned integer, node is empty")),
        }
    }

    pub fn read_i64(&self, node: NodeRef) -> Result<i64, Error> {
        match self.scalar(node) {
            Some(Scalar::Signed(value)) => Ok(*value),
            Some(Scalar::Unsigned(value)) => i64::try_from(*value)
                .map_err(|_| Error::decode(format!("expected signed integer, found {value}"))),
            Some(Scalar::Text(text)) => text
                .parse()
                .map_err(|_| Error::decode(format!("expected signed integer, found `{text}`"))),
            Some(other) => Err(Error::decode(format!(
                "expected signed integer, found {other:?}"
            ))),
            None => Err(Error::decode("expected signed integer, node is empty")),
        }
    }

    pub fn read_f64(&self, node: NodeRef) -> Result<f64, Error> {
        match self.scalar(node) {
            Some(Scalar::Float(value)) => Ok(*value),
            Some(Scalar::Signed(value)) => Ok(*value as f64),
            Some(Scalar::Unsigned(value)) => Ok(*value as f64),
            Some(Scalar::Text(text)) => text
                .parse()
                .map_err(|_| Error::decode(format!("expected number, found `{text}`"))),
            Some(other) => Err(Error::decode(format!("expected number, found {other:?}"))),
            None => Err(Error::decode("expected number, node is empty")),
        }
    }

    pub fn read_str(&self, node: NodeRef) -> Result<String, Error> {
        match self.scalar(node) {
            Some(Scalar::Text(text)) => Ok(text.clone()),
            // The tagged tree cannot distinguish an empty string from no
            // text at all.
            None => Ok(String::new()),
            Some(other) => Err(Error::decode(format!("expected string, found {other:?}"))),
        }
    }

    pub fn read_char(&self, node: NodeRef) -> Result<char, Error> {
        let text = self.read_str(node)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(value), None) => Ok(value),
            _ => Err(Error::decode(format!(
                "expected a single character, found `{text}`"
            ))),
        }
    }
}

/// Implements [`Archive`](crate::Archive) for a backing that wraps a
/// [`Tree`] in a field named `tree`.
macro_rules! impl_tree_archive {
    ($archive:ty) => {
        impl $crate::archive::Archive for $archive {
            fn member(
                &mut self,
                parent: $crate::archive::NodeRef,
                name: &str,
            ) -> Result<$crate::archive::NodeRef, $crate::error::Error> {
                self.tree.member(parent, name)
            }

            fn element(
                &mut self,
                parent: $crate::archive::NodeRef,
                index: usize,
            ) -> Result<$crate::archive::NodeRef, $crate::error::Error> {
                self.tree.element(parent, index)
            }

            fn set_size(
                &mut self,
                node: $crate::archive::NodeRef,
                size: usize,
            ) -> Result<(), $crate::error::Error> {
                self.tree.set_size(node, size)
            }

            fn size(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<usize, $crate::error::Error> {
                self.tree.size(node)
            }

            fn put_class(
                &mut self,
                node: $crate::archive::NodeRef,
                class: &str,
            ) -> Result<(), $crate::error::Error> {
                self.tree.put_class(node, class)
            }

            fn get_class(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<Option<String>, $crate::error::Error> {
                self.tree.get_class(node)
            }

            fn put_index(
                &mut self,
                node: $crate::archive::NodeRef,
                key: &str,
                value: u8,
            ) -> Result<(), $crate::error::Error> {
                self.tree.put_index(node, key, value)
            }

            fn get_index(
                &mut self,
                node: $crate::archive::NodeRef,
                key: &str,
            ) -> Result<u8, $crate::error::Error> {
                self.tree.get_index(node, key)
            }

            fn put_enum(
                &mut self,
                node: $crate::archive::NodeRef,
                ordinal: u32,
                name: &'static str,
            ) -> Result<(), $crate::error::Error> {
                self.tree.put_enum(node, ordinal, name)
            }

            fn get_enum(
                &mut self,
                node: $crate::archive::NodeRef,
                names: &'static [&'static str],
            ) -> Result<u32, $crate::error::Error> {
                self.tree.get_enum(node, names)
            }

            fn put_unit(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<(), $crate::error::Error> {
                self.tree
                    .put_scalar(node, $crate::archive::tree::Scalar::Null);
                Ok(())
            }

            fn get_unit(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<(), $crate::error::Error> {
                self.tree.read_unit(node)
            }

            fn put_bool(
                &mut self,
                node: $crate::archive::NodeRef,
                value: bool,
            ) -> Result<(), $crate::error::Error> {
                self.tree
                    .put_scalar(node, $crate::archive::tree::Scalar::Bool(value));
                Ok(())
            }

            fn get_bool(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<bool, $crate::error::Error> {
                self.tree.read_bool(node)
            }

            $crate::archive::tree::tree_signed_ops! {
                put_i8, get_i8, i8;
                put_i16, get_i16, i16;
                put_i32, get_i32, i32;
            }

            fn put_i64(
                &mut self,
                node: $crate::archive::NodeRef,
                value: i64,
            ) -> Result<(), $crate::error::Error> {
                self.tree
                    .put_scalar(node, $crate::archive::tree::Scalar::Signed(value));
                Ok(())
            }

            fn get_i64(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<i64, $crate::error::Error> {
                self.tree.read_i64(node)
            }

            $crate::archive::tree::tree_unsigned_ops! {
                put_u8, get_u8, u8;
                put_u16, get_u16, u16;
                put_u32, get_u32, u32;
            }

            fn put_u64(
                &mut self,
                node: $crate::archive::NodeRef,
                value: u64,
            ) -> Result<(), $crate::error::Error> {
                self.tree
                    .put_scalar(node, $crate::archive::tree::Scalar::Unsigned(value));
                Ok(())
            }

            fn get_u64(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<u64, $crate::error::Error> {
                self.tree.read_u64(node)
            }

            fn put_f32(
                &mut self,
                node: $crate::archive::NodeRef,
                value: f32,
            ) -> Result<(), $crate::error::Error> {
                self.tree
                    .put_scalar(node, $crate::archive::tree::Scalar::Float(value as f64));
                Ok(())
            }

            fn get_f32(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<f32, $crate::error::Error> {
                Ok(self.tree.read_f64(node)? as f32)
            }

            fn put_f64(
                &mut self,
                node: $crate::archive::NodeRef,
                value: f64,
            ) -> Result<(), $crate::error::Error> {
                self.tree
                    .put_scalar(node, $crate::archive::tree::Scalar::Float(value));
                Ok(())
            }

            fn get_f64(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<f64, $crate::error::Error> {
                self.tree.read_f64(node)
            }

            fn put_char(
                &mut self,
                node: $crate::archive::NodeRef,
                value: char,
            ) -> Result<(), $crate::error::Error> {
                self.tree.put_scalar(
                    node,
                    $crate::archive::tree::Scalar::Text(value.to_string()),
                );
                Ok(())
            }

            fn get_char(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<char, $crate::error::Error> {
                self.tree.read_char(node)
            }

            fn put_str(
                &mut self,
                node: $crate::archive::NodeRef,
                value: &str,
            ) -> Result<(), $crate::error::Error> {
                self.tree.put_scalar(
                    node,
                    $crate::archive::tree::Scalar::Text(value.to_string()),
                );
                Ok(())
            }

            fn get_str(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<String, $crate::error::Error> {
                self.tree.read_str(node)
            }
        }
    };
}

/// Narrow signed accessors layered over the 64-bit scalar slot.
macro_rules! tree_signed_ops {
    ($($put:ident, $get:ident, $ty:ty;)*) => {
        $(
            fn $put(
                &mut self,
                node: $crate::archive::NodeRef,
                value: $ty,
            ) -> Result<(), $crate::error::Error> {
                self.tree
                    .put_scalar(node, $crate::archive::tree::Scalar::Signed(value as i64));
                Ok(())
            }

            fn $get(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<$ty, $crate::error::Error> {
                let value = self.tree.read_i64(node)?;
                <$ty>::try_from(value).map_err(|_| {
                    $crate::error::Error::decode(format!(
                        concat!("value {} out of range for ", stringify!($ty)),
                        value
                    ))
                })
            }
        )*
    };
}

/// Narrow unsigned accessors layered over the 64-bit scalar slot.
macro_rules! tree_unsigned_ops {
    ($($put:ident, $get:ident, $ty:ty;)*) => {
        $(
            fn $put(
                &mut self,
                node: $crate::archive::NodeRef,
                value: $ty,
            ) -> Result<(), $crate::error::Error> {
                self.tree
                    .put_scalar(node, $crate::archive::tree::Scalar::Unsigned(value as u64));
                Ok(())
            }

            fn $get(
                &mut self,
                node: $crate::archive::NodeRef,
            ) -> Result<$ty, $crate::error::Error> {
                let value = self.tree.read_u64(node)?;
                <$ty>::try_from(value).map_err(|_| {
                    $crate::error::Error::decode(format!(
                        concat!("value {} out of range for ", stringify!($ty)),
                        value
                    ))
                })
            }
        )*
    };
}

pub(crate) use {impl_tree_archive, tree_signed_ops, tree_unsigned_ops};
