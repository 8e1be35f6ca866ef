//! An arena-backed XML document tree.
//!
//! Nodes are addressed by [`NodeId`] handles into an [`XmlTree`] arena.
//! The exporter records nodes early and rewrites them late (retagging a
//! node as `<shared>`, moving children between nodes), which handles
//! make trivial while direct ownership would not.

use std::mem;

/// A handle to a node inside an [`XmlTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) usize);

/// A single element or text node.
///
/// Attributes keep insertion order, which keeps rendered documents
/// deterministic.
pub struct XmlNode {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    text: Option<String>,
}

impl XmlNode {
    fn element(tag: &str) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    fn text(content: &str) -> Self {
        Self {
            tag: String::new(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: Some(content.into()),
        }
    }

    /// Whether this is a text node rather than an element.
    pub fn is_text(&self) -> bool {
        self.text.is_some()
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref()
    }
}

/// The arena owning every node of one document.
#[derive(Default)]
pub struct XmlTree {
    nodes: Vec<XmlNode>,
}

impl XmlTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached element node.
    pub fn new_node(&mut self, tag: &str) -> NodeId {
        self.nodes.push(XmlNode::element(tag));
        NodeId(self.nodes.len() - 1)
    }

    /// Allocates a detached text node.
    pub fn new_text_node(&mut self, content: &str) -> NodeId {
        self.nodes.push(XmlNode::text(content));
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> &XmlNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut XmlNode {
        &mut self.nodes[id.0]
    }

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    pub fn set_tag(&mut self, id: NodeId, tag: &str) {
        self.node_mut(id).tag = tag.into();
    }

    /// Sets an attribute, replacing any previous value under the same name.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let node = self.node_mut(id);
        for (existing, slot) in &mut node.attributes {
            if existing == name {
                *slot = value.into();
                return;
            }
        }
        node.attributes.push((name.into(), value.into()));
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn attribute_or<'a>(&'a self, id: NodeId, name: &str, default: &'a str) -> &'a str {
        self.attribute(id, name).unwrap_or(default)
    }

    /// Returns an attribute parsed as an integer, if present and valid.
    pub fn int_attribute(&self, id: NodeId, name: &str) -> Option<i64> {
        self.attribute(id, name)?.parse().ok()
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        self.node_mut(id).attributes.retain(|(n, _)| n != name);
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, String)] {
        &self.node(id).attributes
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(parent).children.push(child);
    }

    /// Inserts `child` at `index` among the children of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        let children = &mut self.node_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, child);
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// Returns the first element child with the given tag, if any.
    pub fn child_by_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .find(|&child| self.node(child).tag == tag)
    }

    /// Returns all element children with the given tag, in order.
    pub fn children_by_tag(&self, id: NodeId, tag: &str) -> Vec<NodeId> {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|&child| self.node(child).tag == tag)
            .collect()
    }

    /// Appends a text child to `parent`.
    pub fn add_text_child(&mut self, parent: NodeId, content: &str) {
        let child = self.new_text_node(content);
        self.add_child(parent, child);
    }

    /// Concatenates the content of all direct text children.
    pub fn all_text(&self, id: NodeId) -> String {
        let mut res = String::new();
        for &child in &self.node(id).children {
            if let Some(text) = self.node(child).text_content() {
                res.push_str(text);
            }
        }
        res
    }

    /// Moves all children of `source` onto the end of `target`'s child
    /// list, leaving `source` empty.
    pub fn move_children_from(&mut self, target: NodeId, source: NodeId) {
        let moved = mem::take(&mut self.node_mut(source).children);
        self.node_mut(target).children.extend(moved);
    }

    /// Copies `source`'s attributes onto `target` without overwriting
    /// attributes `target` already has.
    pub fn copy_attributes(&mut self, target: NodeId, source: NodeId) {
        let pairs: Vec<(String, String)> = self.node(source).attributes.clone();
        for (name, value) in pairs {
            if !self.has_attribute(target, &name) {
                self.set_attribute(target, &name, &value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_upsert_and_remove() {
        let mut tree = XmlTree::new();
        let node = tree.new_node("variable");
        tree.set_attribute(node, "name", "first");
        tree.set_attribute(node, "type", "Integer");
        tree.set_attribute(node, "name", "second");
        assert_eq!(tree.attribute(node, "name"), Some("second"));
        assert_eq!(tree.attributes(node).len(), 2);
        tree.remove_attribute(node, "type");
        assert!(!tree.has_attribute(node, "type"));
    }

    #[test]
    fn children_filter_by_tag() {
        let mut tree = XmlTree::new();
        let root = tree.new_node("lbcpp");
        for tag in ["shared", "variable", "shared"] {
            let child = tree.new_node(tag);
            tree.add_child(root, child);
        }
        assert_eq!(tree.children_by_tag(root, "shared").len(), 2);
        let first = tree.child_by_tag(root, "variable").unwrap();
        assert_eq!(tree.tag(first), "variable");
    }

    #[test]
    fn insert_child_at_front() {
        let mut tree = XmlTree::new();
        let root = tree.new_node("lbcpp");
        let a = tree.new_node("variable");
        tree.add_child(root, a);
        let b = tree.new_node("shared");
        tree.insert_child(root, 0, b);
        assert_eq!(tree.children(root), &[b, a]);
    }

    #[test]
    fn move_children_and_copy_attributes() {
        let mut tree = XmlTree::new();
        let source = tree.new_node("shared");
        tree.set_attribute(source, "type", "Pair[Integer,Integer]");
        tree.add_text_child(source, "payload");
        let target = tree.new_node("variable");
        tree.set_attribute(target, "name", "first");

        tree.move_children_from(target, source);
        tree.copy_attributes(target, source);

        assert!(tree.children(source).is_empty());
        assert_eq!(tree.all_text(target), "payload");
        assert_eq!(tree.attribute(target, "type"), Some("Pair[Integer,Integer]"));
        assert_eq!(tree.attribute(target, "name"), Some("first"));
    }
}
