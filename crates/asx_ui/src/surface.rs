//! # Output Surfaces
//!
//! The reconciler never touches a concrete DOM. It drives a [`Surface`]:
//! a tree of element and text nodes addressed by [`NodeId`].
//!
//! [`DomSurface`] is the in-memory implementation used by the headless
//! runtime and by tests. Removing a node from its parent destroys the whole
//! subtree, so a replaced node can be told apart from one that was patched
//! in place simply by asking whether its id still exists.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Write as _};

use tracing::trace;

use crate::error::{UiError, UiResult};

/// Identifier of a live surface node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Returns the raw id value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// A mutable output tree.
pub trait Surface {
    /// True if `node` exists and is attached (directly or transitively) to
    /// the surface.
    fn contains(&self, node: NodeId) -> bool;

    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Creates a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Replaces a text node's content.
    ///
    /// # Errors
    ///
    /// Unknown node, or the node is an element.
    fn set_text(&mut self, node: NodeId, text: &str) -> UiResult<()>;

    /// Sets an attribute on an element.
    ///
    /// # Errors
    ///
    /// Unknown node, or the node is a text node.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> UiResult<()>;

    /// Removes an attribute from an element. Absent attributes are a no-op.
    ///
    /// # Errors
    ///
    /// Unknown node, or the node is a text node.
    fn remove_attribute(&mut self, node: NodeId, name: &str) -> UiResult<()>;

    /// Names of the attributes currently set on an element.
    ///
    /// # Errors
    ///
    /// Unknown node, or the node is a text node.
    fn attribute_names(&self, node: NodeId) -> UiResult<Vec<String>>;

    /// Child at a position, if any.
    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId>;

    /// Number of children (0 for text or unknown nodes).
    fn child_count(&self, parent: NodeId) -> usize;

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Unknown node, or `parent` is a text node.
    fn append_child(&mut self, parent: NodeId, child: NodeId) -> UiResult<()>;

    /// Inserts `child` at `index` (clamped to the child count).
    ///
    /// # Errors
    ///
    /// Unknown node, or `parent` is a text node.
    fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> UiResult<()>;

    /// Detaches and destroys `child` together with its subtree.
    ///
    /// # Errors
    ///
    /// Unknown node, or `child` is not a direct child of `parent`.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> UiResult<()>;

    /// Destroys every child of `parent`.
    ///
    /// # Errors
    ///
    /// Unknown node.
    fn clear_children(&mut self, parent: NodeId) -> UiResult<()>;

    /// Puts `new` where `old` was, destroying `old`.
    ///
    /// # Errors
    ///
    /// [`UiError::NotAChild`] if `old` is not a direct child of `parent`.
    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> UiResult<()> {
        let index = (0..self.child_count(parent))
            .find(|&i| self.child_at(parent, i) == Some(old))
            .ok_or(UiError::NotAChild { parent, child: old })?;
        self.remove_child(parent, old)?;
        self.insert_child(parent, index, new)
    }
}

/// Counters for every mutation applied to a [`DomSurface`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutationStats {
    /// Nodes created.
    pub created: u64,
    /// Nodes destroyed (subtrees count every node).
    pub destroyed: u64,
    /// Nodes attached to a parent.
    pub attached: u64,
    /// Text content writes.
    pub text_writes: u64,
    /// Attribute writes.
    pub attribute_writes: u64,
    /// Attribute removals.
    pub attribute_removals: u64,
}

impl MutationStats {
    /// Sum of all counters.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.created
            + self.destroyed
            + self.attached
            + self.text_writes
            + self.attribute_writes
            + self.attribute_removals
    }
}

/// An `on<event>` binding found on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Handler name from the `on<event>` attribute.
    pub handler: String,
    /// Value of the element's `data-arg` attribute, if any.
    pub arg: Option<String>,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// In-memory DOM.
pub struct DomSurface {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
    stats: MutationStats,
}

impl DomSurface {
    /// Creates a surface whose root is an empty element with `root_tag`.
    #[must_use]
    pub fn new(root_tag: &str) -> Self {
        let root = NodeId(1);
        let mut nodes = HashMap::with_capacity(64);
        nodes.insert(
            root,
            Node {
                kind: NodeKind::Element {
                    tag: root_tag.to_string(),
                    attributes: BTreeMap::new(),
                },
                parent: None,
                children: Vec::new(),
            },
        );
        Self {
            nodes,
            root,
            next_id: 2,
            stats: MutationStats::default(),
        }
    }

    /// The root element.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Mutation counters since creation or the last [`take_stats`](Self::take_stats).
    #[must_use]
    pub const fn stats(&self) -> MutationStats {
        self.stats
    }

    /// Returns the counters and resets them.
    pub fn take_stats(&mut self) -> MutationStats {
        std::mem::take(&mut self.stats)
    }

    /// Number of nodes alive in the arena, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Tag of an element.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { tag, .. } => Some(tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Content of a text node.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element { .. } => None,
        }
    }

    /// Value of an attribute.
    #[must_use]
    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            NodeKind::Text(_) => None,
        }
    }

    /// Children of a node.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes.get(&node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Parent of a node.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node)?.parent
    }

    /// Concatenated text of a subtree.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(&node) else {
            return;
        };
        if let NodeKind::Text(text) = &n.kind {
            out.push_str(text);
        }
        for &child in &n.children {
            self.collect_text(child, out);
        }
    }

    /// The `on<event>` binding of an element, if it has one.
    #[must_use]
    pub fn listener(&self, node: NodeId, event: &str) -> Option<Binding> {
        let handler = self.attribute(node, &format!("on{event}"))?;
        Some(Binding {
            handler: handler.to_string(),
            arg: self.attribute(node, "data-arg").map(str::to_string),
        })
    }

    /// Attached elements carrying `name`, in document order.
    #[must_use]
    pub fn find_by_attribute(&self, name: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if self.attribute(id, name).is_some() {
                found.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        found
    }

    /// Destroys a node and its subtree, detaching it from its parent.
    ///
    /// Destroying the root leaves an empty arena, which any later patch
    /// reports as a missing root.
    pub fn destroy(&mut self, node: NodeId) -> bool {
        let Some(parent) = self.nodes.get(&node).map(|n| n.parent) else {
            return false;
        };
        if let Some(siblings) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            siblings.children.retain(|&c| c != node);
        }
        self.destroy_subtree(node);
        true
    }

    fn destroy_subtree(&mut self, node: NodeId) {
        if let Some(removed) = self.nodes.remove(&node) {
            self.stats.destroyed += 1;
            for child in removed.children {
                self.destroy_subtree(child);
            }
        }
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        self.stats.created += 1;
        id
    }

    fn node(&self, id: NodeId) -> UiResult<&Node> {
        self.nodes.get(&id).ok_or(UiError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> UiResult<&mut Node> {
        self.nodes.get_mut(&id).ok_or(UiError::UnknownNode(id))
    }

    fn attributes_mut(&mut self, id: NodeId) -> UiResult<&mut BTreeMap<String, String>> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes),
            NodeKind::Text(_) => Err(UiError::NotAnElement(id)),
        }
    }

    /// Detaches `child` from its current parent (if any) and checks that
    /// `parent` can take children without closing a cycle.
    fn prepare_attach(&mut self, parent: NodeId, child: NodeId) -> UiResult<()> {
        if matches!(self.node(parent)?.kind, NodeKind::Text(_)) {
            return Err(UiError::NotAnElement(parent));
        }
        self.node(child)?;
        if self.is_ancestor_or_self(child, parent) {
            return Err(UiError::HierarchyCycle { parent, child });
        }
        if let Some(old_parent) = self.node(child)?.parent {
            if let Some(p) = self.nodes.get_mut(&old_parent) {
                p.children.retain(|&c| c != child);
            }
        }
        self.node_mut(child)?.parent = Some(parent);
        self.stats.attached += 1;
        Ok(())
    }

    /// `true` when `node` is `of` or lies on the parent chain above it.
    fn is_ancestor_or_self(&self, node: NodeId, of: NodeId) -> bool {
        let mut current = Some(of);
        while let Some(id) = current {
            if id == node {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// Serializes the root's children as HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.root) {
            self.write_html(child, &mut out);
        }
        out
    }

    /// Serializes one node and its subtree as HTML.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        match &node.kind {
            NodeKind::Text(text) => out.push_str(&escape(text)),
            NodeKind::Element { tag, attributes } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{}\"", escape(value));
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl Default for DomSurface {
    fn default() -> Self {
        Self::new("div")
    }
}

impl fmt::Debug for DomSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomSurface")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl Surface for DomSurface {
    fn contains(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.root {
                return self.nodes.contains_key(&current);
            }
            match self.nodes.get(&current).and_then(|n| n.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(text.to_string()))
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> UiResult<()> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Text(content) => {
                text.clone_into(content);
            }
            NodeKind::Element { .. } => return Err(UiError::NotAnElement(node)),
        }
        self.stats.text_writes += 1;
        trace!(%node, "text updated");
        Ok(())
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> UiResult<()> {
        self.attributes_mut(node)?
            .insert(name.to_string(), value.to_string());
        self.stats.attribute_writes += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> UiResult<()> {
        if self.attributes_mut(node)?.remove(name).is_some() {
            self.stats.attribute_removals += 1;
        }
        Ok(())
    }

    fn attribute_names(&self, node: NodeId) -> UiResult<Vec<String>> {
        match &self.node(node)?.kind {
            NodeKind::Element { attributes, .. } => Ok(attributes.keys().cloned().collect()),
            NodeKind::Text(_) => Err(UiError::NotAnElement(node)),
        }
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Option<NodeId> {
        self.children(parent).get(index).copied()
    }

    fn child_count(&self, parent: NodeId) -> usize {
        self.children(parent).len()
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> UiResult<()> {
        self.prepare_attach(parent, child)?;
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) -> UiResult<()> {
        self.prepare_attach(parent, child)?;
        let children = &mut self.node_mut(parent)?.children;
        let at = index.min(children.len());
        children.insert(at, child);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> UiResult<()> {
        self.node(parent)?;
        if self.node(child)?.parent != Some(parent) {
            return Err(UiError::NotAChild { parent, child });
        }
        self.destroy(child);
        Ok(())
    }

    fn clear_children(&mut self, parent: NodeId) -> UiResult<()> {
        let children = std::mem::take(&mut self.node_mut(parent)?.children);
        for child in children {
            self.destroy_subtree(child);
        }
        Ok(())
    }
}
