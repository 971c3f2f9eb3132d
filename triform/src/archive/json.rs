//! The key-value (JSON-shaped) backing.
//!
//! The archive tree maps onto standard JSON with member insertion order
//! preserved. Attributes fold into reserved object keys: the type identity
//! becomes a `Class` member and a variant tag becomes an `Index` member.
//! When a node carries attributes alongside a non-aggregate payload (a
//! shared handle to a container, for instance), the payload folds beneath
//! the reserved `Value` member. `Class`, `Index`, and `Value` are therefore
//! reserved member names in this backing.
//!
//! Declared sizes are not written; a sequence's size is its array length.

use serde_json::{Map, Number, Value};

use crate::archive::tree::{impl_tree_archive, AttrValue, Scalar, Tree, TreeNode};
use crate::archive::{NodeRef, CLASS_ATTR, DEFAULT_MAX_DEPTH, INDEX_ATTR, VALUE_MEMBER};
use crate::error::Error;

/// Archive over an ordered JSON document.
#[derive(Clone, Debug)]
pub struct JsonArchive {
    tree: Tree,
}

impl JsonArchive {
    /// Creates an empty archive with the default depth budget.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Creates an empty archive with an explicit depth budget.
    pub fn with_max_depth(max_depth: u32) -> Self {
        JsonArchive {
            tree: Tree::new(max_depth, false),
        }
    }

    /// Parses a JSON document into an archive.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let value: Value = serde_json::from_str(text).map_err(Error::decode)?;
        let mut archive = JsonArchive::new();
        import(&mut archive.tree, NodeRef::root(), value)?;
        Ok(archive)
    }

    /// Renders the archive as a compact JSON string.
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(&export(&self.tree, 0)?).map_err(Error::decode)
    }

    /// Renders the archive as an indented JSON string.
    pub fn to_json_pretty(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(&export(&self.tree, 0)?).map_err(Error::decode)
    }
}

impl Default for JsonArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl_tree_archive!(JsonArchive);

fn scalar_to_value(scalar: &Scalar) -> Result<Value, Error> {
    Ok(match scalar {
        Scalar::Null => Value::Null,
        Scalar::Bool(value) => Value::Bool(*value),
        Scalar::Unsigned(value) => Value::Number(Number::from(*value)),
        Scalar::Signed(value) => Value::Number(Number::from(*value)),
        Scalar::Float(value) => Value::Number(
            Number::from_f64(*value)
                .ok_or_else(|| Error::decode("non-finite float cannot be archived as JSON"))?,
        ),
        Scalar::Text(text) => Value::String(text.clone()),
    })
}

fn export(tree: &Tree, index: u32) -> Result<Value, Error> {
    let node = tree.node_at(index);
    let payload = export_payload(tree, node)?;
    if node.attrs.is_empty() && node.named.is_empty() {
        return Ok(payload.unwrap_or(Value::Null));
    }

    let mut object = Map::new();
    for (key, attr) in &node.attrs {
        let value = match attr {
            AttrValue::Str(text) => Value::String(text.clone()),
            AttrValue::UInt(value) => Value::Number(Number::from(*value)),
        };
        object.insert(key.clone(), value);
    }
    if let Some(payload) = payload {
        object.insert(VALUE_MEMBER.to_string(), payload);
    }
    for (name, child) in &node.named {
        object.insert(name.clone(), export(tree, *child)?);
    }
    Ok(Value::Object(object))
}

fn export_payload(tree: &Tree, node: &TreeNode) -> Result<Option<Value>, Error> {
    if !node.items.is_empty() || node.declared_size.is_some() {
        let items = node
            .items
            .iter()
            .map(|child| export(tree, *child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Value::Array(items)))
    } else if let Some(scalar) = &node.scalar {
        Ok(Some(scalar_to_value(scalar)?))
    } else {
        Ok(None)
    }
}

fn import(tree: &mut Tree, at: NodeRef, value: Value) -> Result<(), Error> {
    match value {
        Value::Null => {}
        Value::Bool(value) => tree.put_scalar(at, Scalar::Bool(value)),
        Value::Number(number) => {
            let scalar = if let Some(value) = number.as_u64() {
                Scalar::Unsigned(value)
            } else if let Some(value) = number.as_i64() {
                Scalar::Signed(value)
            } else if let Some(value) = number.as_f64() {
                Scalar::Float(value)
            } else {
                return Err(Error::decode(format!("unrepresentable number {number}")));
            };
            tree.put_scalar(at, scalar);
        }
        Value::String(text) => tree.put_scalar(at, Scalar::Text(text)),
        Value::Array(items) => {
            for (index, item) in items.into_iter().enumerate() {
                let child = tree.element(at, index)?;
                import(tree, child, item)?;
            }
        }
        Value::Object(members) => {
            for (key, member) in members {
                if key == CLASS_ATTR {
                    match member {
                        Value::String(class) => {
                            tree.put_class(at, &class)?;
                        }
                        _ => log::warn!(
                            "non-string `{CLASS_ATTR}` member; \
                             using the default type identity"
                        ),
                    }
                    continue;
                }
                if key == INDEX_ATTR {
                    if let Some(value) = member.as_u64() {
                        tree.node_mut(at)
                            .attrs
                            .insert(INDEX_ATTR.to_string(), AttrValue::UInt(value));
                        continue;
                    }
                }
                let child = tree.member(at, &key)?;
                import(tree, child, member)?;
            }
            unfold_value(tree, at);
        }
    }
    Ok(())
}

// Inverse of the attribute fold: `{"Class": c, "Value": payload}` collapses
// back into one node carrying both the attribute and the payload. A node
// with any further attribute is a sum type, whose `Value` is a real member.
fn unfold_value(tree: &mut Tree, at: NodeRef) {
    let node = tree.node(at);
    if node.attrs.len() != 1 || !node.attrs.contains_key(CLASS_ATTR) || node.named.len() != 1 {
        return;
    }
    let Some(&child) = node.named.get(VALUE_MEMBER) else {
        return;
    };
    let payload = tree.node_at(child);
    if !payload.attrs.is_empty() || !payload.named.is_empty() {
        return;
    }
    let scalar = payload.scalar.clone();
    let items = payload.items.clone();
    let node = tree.node_mut(at);
    node.named.clear();
    node.scalar = scalar;
    node.items = items;
}

#[cfg(test)]
mod tests {
    use crate::archive::{Archive, JsonArchive, NodeRef};

    #[test]
    fn member_order_is_preserved() {
        let mut archive = JsonArchive::new();
        let root = archive.root();
        for name in ["zulu", "alpha", "mike"] {
            let child = archive.member(root, name).unwrap();
            archive.put_u32(child, 1).unwrap();
        }
        assert_eq!(
            archive.to_json().unwrap(),
            r#"{"zulu":1,"alpha":1,"mike":1}"#
        );
    }

    #[test]
    fn attributed_payload_folds_and_unfolds() {
        let mut archive = JsonArchive::new();
        let root = archive.root();
        archive.put_class(root, "u32").unwrap();
        archive.put_u32(root, 7).unwrap();
        let text = archive.to_json().unwrap();
        assert_eq!(text, r#"{"Class":"u32","Value":7}"#);

        let mut archive = JsonArchive::parse(&text).unwrap();
        let root = archive.root();
        assert_eq!(archive.get_class(root).unwrap().as_deref(), Some("u32"));
        assert_eq!(archive.get_u32(root).unwrap(), 7);
    }

    #[test]
    fn parse_rejects_malformed_documents() {
        assert!(JsonArchive::parse("{not json").is_err());
    }

    #[test]
    fn empty_nodes_read_as_missing() {
        let mut archive = JsonArchive::parse("{}").unwrap();
        let node = archive.member(NodeRef::root(), "absent").unwrap();
        assert!(archive.get_u32(node).is_err());
    }
}
