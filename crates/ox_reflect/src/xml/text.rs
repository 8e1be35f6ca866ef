//! Conversion between [`XmlTree`] documents and XML text.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;

use crate::xml::node::{NodeId, XmlTree};

// -----------------------------------------------------------------------------
// Parsing

/// Parses an XML document into a tree, returning the arena and the root
/// element.
///
/// Text runs are kept verbatim as text children of the enclosing
/// element, whitespace-only runs included.
pub fn parse_document(input: &str) -> Result<(XmlTree, NodeId), XmlTextError> {
    let mut reader = Reader::from_str(input);
    let mut tree = XmlTree::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;

    loop {
        match reader.read_event().map_err(|e| XmlTextError::Parse {
            message: e.to_string(),
        })? {
            Event::Start(start) => {
                let node = open_element(&mut tree, &stack, &mut root, &start)?;
                stack.push(node);
            }
            Event::Empty(start) => {
                open_element(&mut tree, &stack, &mut root, &start)?;
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(text) => {
                let content = text.unescape().map_err(|e| XmlTextError::Parse {
                    message: e.to_string(),
                })?;
                // Whitespace-only runs are kept: they may be the entire
                // payload of a string element. Runs between element
                // children are inert, nothing reads text from those
                // nodes.
                if let Some(&parent) = stack.last() {
                    tree.add_text_child(parent, &content);
                }
            }
            Event::CData(data) => {
                let content = String::from_utf8_lossy(&data).into_owned();
                if let Some(&parent) = stack.last() {
                    tree.add_text_child(parent, &content);
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions.
            _ => {}
        }
    }

    match root {
        Some(root) => Ok((tree, root)),
        None => Err(XmlTextError::NoRoot),
    }
}

fn open_element(
    tree: &mut XmlTree,
    stack: &[NodeId],
    root: &mut Option<NodeId>,
    start: &quick_xml::events::BytesStart<'_>,
) -> Result<NodeId, XmlTextError> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let node = tree.new_node(&tag);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| XmlTextError::Parse {
            message: e.to_string(),
        })?;
        let name = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value().map_err(|e| XmlTextError::Parse {
            message: e.to_string(),
        })?;
        tree.set_attribute(node, &name, &value);
    }
    match stack.last() {
        Some(&parent) => tree.add_child(parent, node),
        None => {
            if root.is_some() {
                return Err(XmlTextError::Parse {
                    message: "multiple root elements".into(),
                });
            }
            *root = Some(node);
        }
    }
    Ok(node)
}

// -----------------------------------------------------------------------------
// Rendering

/// Renders a tree back to XML text, with an XML declaration and
/// two-space indentation.
///
/// Elements holding text children render their content inline so that
/// no whitespace is ever added to a text payload.
pub fn render_document(tree: &XmlTree, root: NodeId) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    render_node(tree, root, 0, &mut out);
    out
}

fn render_node(tree: &XmlTree, id: NodeId, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    out.push_str(&indent);
    out.push('<');
    out.push_str(tree.tag(id));
    for (name, value) in tree.attributes(id) {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    let children = tree.children(id);
    if children.is_empty() {
        out.push_str("/>\n");
        return;
    }
    let has_text = children.iter().any(|&child| tree.node(child).is_text());
    out.push('>');
    if has_text {
        for &child in children {
            match tree.node(child).text_content() {
                Some(text) => out.push_str(&escape(text)),
                None => render_node(tree, child, 0, out),
            }
        }
    } else {
        out.push('\n');
        for &child in children {
            render_node(tree, child, depth + 1, out);
        }
        out.push_str(&indent);
    }
    out.push_str("</");
    out.push_str(tree.tag(id));
    out.push_str(">\n");
}

// -----------------------------------------------------------------------------
// XmlTextError

/// Error produced while reading or writing XML text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlTextError {
    /// The input is not well-formed XML.
    Parse { message: String },
    /// The document contains no root element.
    NoRoot,
    /// A filesystem operation failed.
    Io { path: String, message: String },
    /// The path exists but does not name a regular file.
    NotAFile { path: String },
}

impl core::fmt::Display for XmlTextError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parse { message } => write!(f, "XML parse error: {message}"),
            Self::NoRoot => write!(f, "document has no root element"),
            Self::Io { path, message } => write!(f, "{path}: {message}"),
            Self::NotAFile { path } => write!(f, "{path}: not a file"),
        }
    }
}

impl std::error::Error for XmlTextError {}
