//! The tagged-tree (XML-shaped) backing.
//!
//! Each node renders as an element: named children become child elements
//! carrying the member name as their tag, positional children become `Item`
//! elements, scalar payloads become text content, and the reserved
//! attributes (`Class`, `Index`) become element attributes. Declared sizes
//! are written to a `Size` attribute, which is trusted on read: if an
//! element declares more children than it carries, reading the size fails
//! with a size mismatch.
//!
//! The root element's tag is chosen by the caller when the archive is
//! created and recovered from the document when parsing. Output is written
//! without indentation so text payloads survive byte-for-byte.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::archive::tree::{impl_tree_archive, AttrValue, Scalar, Tree};
use crate::archive::{NodeRef, DEFAULT_MAX_DEPTH, SIZE_ATTR};
use crate::error::Error;

/// Tag used for positional children.
const ITEM_TAG: &str = "Item";

/// Archive over an XML document.
#[derive(Clone, Debug)]
pub struct XmlArchive {
    tree: Tree,
    root_tag: String,
}

impl XmlArchive {
    /// Creates an empty archive whose root element uses `root_tag`.
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self::with_max_depth(root_tag, DEFAULT_MAX_DEPTH)
    }

    /// Creates an empty archive with an explicit depth budget.
    pub fn with_max_depth(root_tag: impl Into<String>, max_depth: u32) -> Self {
        XmlArchive {
            tree: Tree::new(max_depth, true),
            root_tag: root_tag.into(),
        }
    }

    /// The tag the root element is written with.
    pub fn root_tag(&self) -> &str {
        &self.root_tag
    }

    /// Parses an XML document into an archive.
    ///
    /// The root tag is taken from the document.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut archive = XmlArchive::new("");
        let mut reader = Reader::from_str(text);
        let mut stack: Vec<NodeRef> = Vec::new();
        let mut root_seen = false;
        loop {
            match reader.read_event().map_err(Error::decode)? {
                Event::Start(element) => {
                    let node =
                        open_element(&mut archive, &stack, &mut root_seen, &element)?;
                    apply_attributes(&mut archive.tree, node, &element)?;
                    stack.push(node);
                }
                Event::Empty(element) => {
                    let node =
                        open_element(&mut archive, &stack, &mut root_seen, &element)?;
                    apply_attributes(&mut archive.tree, node, &element)?;
                }
                Event::End(_) => {
                    stack.pop();
                }
                Event::Text(text) => {
                    let content = text.unescape().map_err(Error::decode)?;
                    if !content.trim().is_empty() {
                        if let Some(&node) = stack.last() {
                            archive
                                .tree
                                .put_scalar(node, Scalar::Text(content.into_owned()));
                        }
                    }
                }
                Event::CData(data) => {
                    let content =
                        String::from_utf8(data.into_inner().into_owned()).map_err(Error::decode)?;
                    if let Some(&node) = stack.last() {
                        archive.tree.put_scalar(node, Scalar::Text(content));
                    }
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions.
                _ => {}
            }
        }
        if !root_seen {
            return Err(Error::decode("document has no root element"));
        }
        Ok(archive)
    }

    /// Renders the archive as an XML string.
    pub fn to_xml(&self) -> Result<String, Error> {
        let mut writer = Writer::new(Vec::new());
        emit(&self.tree, 0, &self.root_tag, &mut writer)?;
        String::from_utf8(writer.into_inner()).map_err(Error::decode)
    }
}

impl_tree_archive!(XmlArchive);

fn open_element(
    archive: &mut XmlArchive,
    stack: &[NodeRef],
    root_seen: &mut bool,
    element: &BytesStart<'_>,
) -> Result<NodeRef, Error> {
    let name = String::from_utf8(element.name().as_ref().to_vec()).map_err(Error::decode)?;
    match stack.last() {
        None => {
            if *root_seen {
                return Err(Error::decode("document has more than one root element"));
            }
            *root_seen = true;
            archive.root_tag = name;
            Ok(NodeRef::root())
        }
        Some(&parent) => {
            if name == ITEM_TAG {
                let index = archive.tree.node(parent).items.len();
                archive.tree.element(parent, index)
            } else {
                archive.tree.member(parent, &name)
            }
        }
    }
}

fn apply_attributes(
    tree: &mut Tree,
    node: NodeRef,
    element: &BytesStart<'_>,
) -> Result<(), Error> {
    for attribute in element.attributes() {
        let attribute = attribute.map_err(Error::decode)?;
        let key = String::from_utf8(attribute.key.as_ref().to_vec()).map_err(Error::decode)?;
        let value = attribute
            .unescape_value()
            .map_err(Error::decode)?
            .into_owned();
        if key == SIZE_ATTR {
            let size = value
                .parse()
                .map_err(|_| Error::decode(format!("malformed `{SIZE_ATTR}`: `{value}`")))?;
            tree.node_mut(node).declared_size = Some(size);
        } else {
            tree.node_mut(node).attrs.insert(key, AttrValue::Str(value));
        }
    }
    Ok(())
}

fn scalar_to_text(scalar: &Scalar) -> Option<String> {
    match scalar {
        Scalar::Null => None,
        Scalar::Bool(value) => Some(value.to_string()),
        Scalar::Unsigned(value) => Some(value.to_string()),
        Scalar::Signed(value) => Some(value.to_string()),
        Scalar::Float(value) => Some(value.to_string()),
        Scalar::Text(text) => Some(text.clone()),
    }
}

fn emit(tree: &Tree, index: u32, tag: &str, writer: &mut Writer<Vec<u8>>) -> Result<(), Error> {
    let node = tree.node_at(index);
    let mut start = BytesStart::new(tag);
    for (key, attr) in &node.attrs {
        match attr {
            AttrValue::Str(value) => start.push_attribute((key.as_str(), value.as_str())),
            AttrValue::UInt(value) => {
                let value = value.to_string();
                start.push_attribute((key.as_str(), value.as_str()));
            }
        }
    }
    if let Some(size) = node.declared_size {
        let size = size.to_string();
        start.push_attribute((SIZE_ATTR, size.as_str()));
    }

    let text = node.scalar.as_ref().and_then(scalar_to_text);
    let childless = text.is_none() && node.named.is_empty() && node.items.is_empty();
    if childless {
        writer
            .write_event(Event::Empty(start))
            .map_err(Error::decode)?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(Error::decode)?;
    if let Some(text) = &text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(Error::decode)?;
    }
    for (name, child) in &node.named {
        emit(tree, *child, name, writer)?;
    }
    for child in &node.items {
        emit(tree, *child, ITEM_TAG, writer)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(tag)))
        .map_err(Error::decode)?;
    Ok(())
}
