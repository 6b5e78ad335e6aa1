//! # Virtual DOM
//!
//! Declarative, positional tree descriptions. Nodes carry no identity:
//! a composite node is matched against the previous render by its
//! `(position, tag)` pair only, so reordering children is always a
//! replace, never a move.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A leaf value, rendered as text content.
///
/// Deserializes directly from JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Primitive {
    /// Boolean leaf.
    Bool(bool),
    /// Integer leaf.
    Int(i64),
    /// Floating point leaf.
    Float(f64),
    /// String leaf.
    Str(String),
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Primitive {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Primitive {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Primitive {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Primitive {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for Primitive {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Primitive {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<bool> for Primitive {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Attribute values share the leaf representation and are stringified
/// the same way when written to a surface.
pub type PropValue = Primitive;

/// A composite node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VElement {
    /// Tag name.
    pub tag: String,
    /// Properties, written as attributes.
    #[serde(default)]
    pub props: BTreeMap<String, PropValue>,
    /// Ordered, positional children.
    #[serde(default)]
    pub children: Vec<VNode>,
}

impl VElement {
    /// Creates an element with no props and no children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Sets a property.
    #[must_use]
    pub fn prop(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.insert(name.into(), value.into());
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn child(mut self, node: impl Into<VNode>) -> Self {
        self.children.push(node.into());
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn children<I>(mut self, nodes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VNode>,
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }
}

/// One node of a tree description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VNode {
    /// Text leaf.
    Text(Primitive),
    /// Composite node.
    Element(VElement),
}

impl VNode {
    /// Tag name, or `None` for a text leaf.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Element(el) => Some(&el.tag),
        }
    }

    /// Children of a composite node (empty for leaves).
    #[must_use]
    pub fn child_nodes(&self) -> &[VNode] {
        match self {
            Self::Text(_) => &[],
            Self::Element(el) => &el.children,
        }
    }

    /// Total node count of the subtree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.child_nodes().iter().map(Self::node_count).sum::<usize>()
    }
}

impl From<VElement> for VNode {
    fn from(el: VElement) -> Self {
        Self::Element(el)
    }
}

impl From<Primitive> for VNode {
    fn from(p: Primitive) -> Self {
        Self::Text(p)
    }
}

impl From<&str> for VNode {
    fn from(s: &str) -> Self {
        Self::Text(s.into())
    }
}

impl From<String> for VNode {
    fn from(s: String) -> Self {
        Self::Text(s.into())
    }
}

/// Shorthand for [`VElement::new`].
#[must_use]
pub fn el(tag: impl Into<String>) -> VElement {
    VElement::new(tag)
}

/// Shorthand for a text leaf.
#[must_use]
pub fn text(value: impl Into<Primitive>) -> VNode {
    VNode::Text(value.into())
}
