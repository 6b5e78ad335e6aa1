//! # HUD Layer
//!
//! Owns the HUD surface and its reconciler. Pages render through here; a
//! failed mount shows the error view in the same place.

use asx_ui::{error_view, hud, Binding, DomSurface, Hud, NodeId, Surface, Theme, TreeReconciler, UiResult, VNode};
use tracing::trace;

/// HUD surface plus the reconciler that patches it.
#[derive(Debug)]
pub struct HudLayer {
    surface: DomSurface,
    reconciler: TreeReconciler,
    theme: Theme,
}

impl HudLayer {
    /// Creates an empty HUD with the default theme.
    #[must_use]
    pub fn new() -> Self {
        Self::with_theme(Theme::default())
    }

    /// Creates an empty HUD with a custom theme.
    #[must_use]
    pub fn with_theme(theme: Theme) -> Self {
        let surface = DomSurface::new("div");
        let reconciler = TreeReconciler::new(surface.root());
        Self {
            surface,
            reconciler,
            theme,
        }
    }

    /// The live surface.
    #[inline]
    #[must_use]
    pub fn surface(&self) -> &DomSurface {
        &self.surface
    }

    /// Mutable access for hosts that manipulate the surface directly.
    pub fn surface_mut(&mut self) -> &mut DomSurface {
        &mut self.surface
    }

    /// Patches the surface to `tree`.
    ///
    /// # Errors
    ///
    /// [`asx_ui::UiError::MissingRoot`] if the HUD root was destroyed,
    /// or any surface error hit while patching.
    pub fn show(&mut self, tree: VNode) -> UiResult<()> {
        self.reconciler.patch(&mut self.surface, tree)
    }

    /// Renders a page HUD; a HUD without content clears the layer.
    ///
    /// # Errors
    ///
    /// As [`show`](Self::show).
    pub fn render_hud(&mut self, page_hud: &Hud) -> UiResult<()> {
        match &page_hud.content {
            Some(content) => self.show(hud::render_with(&self.theme, content)),
            None => self.clear(),
        }
    }

    /// Shows the error view.
    ///
    /// # Errors
    ///
    /// As [`show`](Self::show).
    pub fn show_error(&mut self, message: &str) -> UiResult<()> {
        self.show(error_view(message))
    }

    /// Empties the HUD; the next render rebuilds from scratch.
    ///
    /// # Errors
    ///
    /// [`asx_ui::UiError::MissingRoot`] if the HUD root was destroyed.
    pub fn clear(&mut self) -> UiResult<()> {
        let root = self.reconciler.root();
        if !self.surface.contains(root) {
            return Err(asx_ui::UiError::MissingRoot(root));
        }
        self.surface.clear_children(root)?;
        self.reconciler.reset();
        trace!("hud cleared");
        Ok(())
    }

    /// Whether anything is rendered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surface.child_count(self.surface.root()) == 0
    }

    /// Serialized HUD contents.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.surface.to_html()
    }

    /// Visible text of the HUD.
    #[must_use]
    pub fn text(&self) -> String {
        self.surface.text_content(self.surface.root())
    }

    /// The click binding of a node.
    #[must_use]
    pub fn click_binding(&self, node: NodeId) -> Option<Binding> {
        self.surface.listener(node, "click")
    }

    /// Nodes with a click binding, in document order.
    #[must_use]
    pub fn clickable(&self) -> Vec<NodeId> {
        self.surface.find_by_attribute("onclick")
    }
}

impl Default for HudLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use asx_ui::{HudContent, UiError};

    #[test]
    fn test_render_clear_and_error() {
        let mut layer = HudLayer::new();
        assert!(layer.is_empty());

        let hud = Hud {
            content: Some(HudContent::Menu { items: Vec::new() }),
        };
        layer.render_hud(&hud).unwrap();
        assert!(layer.to_html().contains("asx-scanlines"));

        layer.clear().unwrap();
        assert!(layer.is_empty());

        layer.show_error("Page not found: x").unwrap();
        assert!(layer.text().contains("Page not found: x"));

        layer.render_hud(&Hud::default()).unwrap();
        assert!(layer.is_empty());
    }

    #[test]
    fn test_missing_root() {
        let mut layer = HudLayer::new();
        let root = layer.surface().root();
        layer.surface_mut().destroy(root);
        assert_eq!(layer.clear(), Err(UiError::MissingRoot(root)));
        assert_eq!(layer.show_error("x"), Err(UiError::MissingRoot(root)));
    }
}
