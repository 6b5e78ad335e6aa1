//! # Tree Reconciler
//!
//! Diffs the previously rendered description against a new one and applies
//! the smallest positional mutation set to a [`Surface`].
//!
//! ```text
//! (old, new) at (parent, index)
//!   ├─ (Some, None)                  → remove live child
//!   ├─ (None, Some)                  → build + append
//!   ├─ (Text, Text)                  → set_text only if the strings differ
//!   ├─ kind or tag differs           → build + replace (old subtree destroyed)
//!   └─ same tag                      → props, then children positionally
//! ```
//!
//! The tree is mounted as the single child of the reconciler's root node.

use tracing::{debug, trace};

use crate::error::{UiError, UiResult};
use crate::surface::{NodeId, Surface};
use crate::vdom::{VElement, VNode};

/// Retains the last rendered tree and patches a surface against it.
#[derive(Debug, Clone)]
pub struct TreeReconciler {
    root: NodeId,
    previous: Option<VNode>,
}

impl TreeReconciler {
    /// Creates a reconciler that renders under `root`.
    #[must_use]
    pub const fn new(root: NodeId) -> Self {
        Self { root, previous: None }
    }

    /// The mount point.
    #[inline]
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// The tree rendered by the last patch.
    #[must_use]
    pub const fn previous(&self) -> Option<&VNode> {
        self.previous.as_ref()
    }

    /// Forgets the previous tree; the next patch rebuilds from scratch.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Renders `next`, diffing against the previous tree when there is one.
    ///
    /// Once the root has been verified the stored tree is replaced with
    /// `next` even if a mutation fails part way.
    ///
    /// # Errors
    ///
    /// - [`UiError::MissingRoot`] if the mount point is gone; nothing is
    ///   touched in that case
    /// - any surface error hit while applying mutations
    pub fn patch<S: Surface + ?Sized>(&mut self, surface: &mut S, next: VNode) -> UiResult<()> {
        if !surface.contains(self.root) {
            return Err(UiError::MissingRoot(self.root));
        }

        let outcome = match self.previous.as_ref() {
            None => mount(surface, self.root, &next),
            Some(previous) => diff(surface, self.root, 0, Some(previous), Some(&next)),
        };
        self.previous = Some(next);
        outcome
    }
}

fn mount<S: Surface + ?Sized>(surface: &mut S, root: NodeId, tree: &VNode) -> UiResult<()> {
    surface.clear_children(root)?;
    let node = build(surface, tree)?;
    surface.append_child(root, node)?;
    debug!(%root, nodes = tree.node_count(), "tree mounted");
    Ok(())
}

/// Materializes a description into a fresh detached subtree.
fn build<S: Surface + ?Sized>(surface: &mut S, node: &VNode) -> UiResult<NodeId> {
    match node {
        VNode::Text(value) => Ok(surface.create_text(&value.to_string())),
        VNode::Element(el) => {
            let id = surface.create_element(&el.tag);
            for (name, value) in &el.props {
                surface.set_attribute(id, name, &value.to_string())?;
            }
            for child in &el.children {
                let child_id = build(surface, child)?;
                surface.append_child(id, child_id)?;
            }
            Ok(id)
        }
    }
}

fn live_child<S: Surface + ?Sized>(surface: &S, parent: NodeId, index: usize) -> UiResult<NodeId> {
    surface
        .child_at(parent, index)
        .ok_or(UiError::MissingChild { parent, index })
}

fn diff<S: Surface + ?Sized>(
    surface: &mut S,
    parent: NodeId,
    index: usize,
    old: Option<&VNode>,
    new: Option<&VNode>,
) -> UiResult<()> {
    match (old, new) {
        (None, None) => Ok(()),
        (Some(_), None) => {
            let live = live_child(surface, parent, index)?;
            trace!(%parent, index, "removing child");
            surface.remove_child(parent, live)
        }
        (None, Some(new)) => {
            let built = build(surface, new)?;
            surface.append_child(parent, built)
        }
        (Some(VNode::Text(old)), Some(VNode::Text(new))) => {
            let (old, new) = (old.to_string(), new.to_string());
            if old == new {
                return Ok(());
            }
            let live = live_child(surface, parent, index)?;
            surface.set_text(live, &new)
        }
        (Some(VNode::Element(old)), Some(VNode::Element(new))) if old.tag == new.tag => {
            let live = live_child(surface, parent, index)?;
            patch_props(surface, live, new)?;
            patch_children(surface, live, old, new)
        }
        (Some(_), Some(new)) => {
            let live = live_child(surface, parent, index)?;
            let built = build(surface, new)?;
            trace!(%parent, index, "replacing subtree");
            surface.replace_child(parent, live, built)
        }
    }
}

/// Removes live attributes missing from the new props, then writes every
/// new prop.
fn patch_props<S: Surface + ?Sized>(surface: &mut S, live: NodeId, new: &VElement) -> UiResult<()> {
    for name in surface.attribute_names(live)? {
        if !new.props.contains_key(&name) {
            surface.remove_attribute(live, &name)?;
        }
    }
    for (name, value) in &new.props {
        surface.set_attribute(live, name, &value.to_string())?;
    }
    Ok(())
}

fn patch_children<S: Surface + ?Sized>(
    surface: &mut S,
    live: NodeId,
    old: &VElement,
    new: &VElement,
) -> UiResult<()> {
    let (old_len, new_len) = (old.children.len(), new.children.len());
    let common = old_len.min(new_len);

    for i in 0..common {
        diff(surface, live, i, old.children.get(i), new.children.get(i))?;
    }
    for i in common..new_len {
        diff(surface, live, i, None, new.children.get(i))?;
    }
    // Highest index first so earlier positions stay valid.
    for i in (new_len..old_len).rev() {
        diff(surface, live, i, old.children.get(i), None)?;
    }
    Ok(())
}
