//! # OS Document
//!
//! The JSON document describing an application: metadata, the route table
//! and every page.
//!
//! ```json
//! {
//!   "meta":   { "boot": "home", "title": "ASX OS" },
//!   "routes": { "/": "home", "/store": "store" },
//!   "pages": {
//!     "home":  { "hud": { "content": { "type": "dashboard", "cards": [] } } },
//!     "store": { "webgl": { "scene": "starscape" },
//!                "asx": { "behaviour": "cart" },
//!                "entities": [ { "transform": { "x": 0, "y": 0 } } ] }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use asx_core::{EntityId, Lifetime, Renderable, Transform, Velocity, World};
use asx_ui::Hud;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AsxResult;
use crate::renderer::SceneDesc;

/// Route key used when neither the route table nor `meta.boot` resolves.
pub const FALLBACK_PAGE: &str = "home";

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsMeta {
    /// Page shown for unknown routes.
    pub boot: Option<String>,
    /// Application title.
    pub title: Option<String>,
}

/// A page definition. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageDef {
    /// HUD rendered on mount.
    pub hud: Option<Hud>,
    /// Scene loaded into the render backend.
    pub webgl: Option<SceneDesc>,
    /// Behaviour run on mount.
    pub asx: Option<PageScript>,
    /// Entities spawned on mount and destroyed on unmount.
    pub entities: Vec<EntitySpec>,
}

/// The behaviour section of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageScript {
    /// Name of a registered behaviour.
    pub behaviour: Option<String>,
    /// Free-form data handed to the behaviour.
    pub data: Value,
    /// Inline script source. Kept for document compatibility; never executed.
    pub inline: Option<String>,
}

/// Component literals for one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitySpec {
    /// Position.
    pub transform: Option<Transform>,
    /// Speed.
    pub velocity: Option<Velocity>,
    /// Lifespan.
    pub lifetime: Option<Lifetime>,
    /// Drawing hints.
    pub renderable: Option<Renderable>,
}

impl EntitySpec {
    /// Creates the entity and attaches every listed component.
    pub fn spawn(&self, world: &mut World) -> EntityId {
        let id = world.create_entity();
        if let Some(t) = self.transform {
            world.insert(id, t);
        }
        if let Some(v) = self.velocity {
            world.insert(id, v);
        }
        if let Some(l) = self.lifetime {
            world.insert(id, l);
        }
        if let Some(r) = &self.renderable {
            world.insert(id, r.clone());
        }
        id
    }
}

/// Routes and pages of one application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OsDocument {
    /// Metadata.
    pub meta: OsMeta,
    /// Path to page key.
    pub routes: BTreeMap<String, String>,
    /// Page key to definition.
    pub pages: BTreeMap<String, PageDef>,
}

impl OsDocument {
    /// Parses a document.
    ///
    /// # Errors
    ///
    /// [`AsxError::Json`](crate::AsxError::Json) on malformed input.
    pub fn from_json_str(source: &str) -> AsxResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    /// Reads and parses a document file.
    ///
    /// # Errors
    ///
    /// [`AsxError::Io`](crate::AsxError::Io) if unreadable, otherwise as
    /// [`from_json_str`](Self::from_json_str).
    pub fn load(path: impl AsRef<Path>) -> AsxResult<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Page key for a route: the route table entry, else `meta.boot`,
    /// else [`FALLBACK_PAGE`].
    #[must_use]
    pub fn route_to_key(&self, path: &str) -> &str {
        self.routes
            .get(path)
            .or(self.meta.boot.as_ref())
            .map_or(FALLBACK_PAGE, String::as_str)
    }

    /// Looks up a page.
    #[inline]
    #[must_use]
    pub fn page(&self, key: &str) -> Option<&PageDef> {
        self.pages.get(key)
    }
}

/// Normalizes a location fragment to a route path: `"#/store"` and
/// `"/store"` map to `"/store"`, an empty fragment maps to `"/"`.
#[must_use]
pub fn route_from_fragment(fragment: &str) -> &str {
    let path = fragment.strip_prefix('#').unwrap_or(fragment);
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "meta": { "boot": "landing", "title": "Test OS" },
        "routes": { "/": "landing", "/store": "store" },
        "pages": {
            "landing": { "hud": { "content": { "type": "menu", "items": [] } } },
            "store": {
                "webgl": { "scene": "starscape" },
                "asx": { "behaviour": "cart", "data": { "currency": "USD" } },
                "entities": [
                    { "transform": { "x": 1, "y": 2 }, "velocity": { "vx": 3, "vy": 0 } },
                    { "lifetime": { "max": 0.5 } }
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_document() {
        let doc = OsDocument::from_json_str(DOC).unwrap();
        assert_eq!(doc.meta.title.as_deref(), Some("Test OS"));
        let store = doc.page("store").unwrap();
        assert_eq!(store.webgl.as_ref().unwrap().scene, "starscape");
        assert_eq!(store.asx.as_ref().unwrap().behaviour.as_deref(), Some("cart"));
        assert_eq!(store.entities.len(), 2);
        assert!(doc.page("landing").unwrap().hud.is_some());
    }

    #[test]
    fn test_route_resolution_fallbacks() {
        let mut doc = OsDocument::from_json_str(DOC).unwrap();
        assert_eq!(doc.route_to_key("/store"), "store");
        assert_eq!(doc.route_to_key("/nowhere"), "landing");

        doc.meta.boot = None;
        assert_eq!(doc.route_to_key("/nowhere"), FALLBACK_PAGE);
    }

    #[test]
    fn test_entity_spec_spawn() {
        let doc = OsDocument::from_json_str(DOC).unwrap();
        let specs = &doc.page("store").unwrap().entities;
        let mut world = World::new();

        let mover = specs[0].spawn(&mut world);
        assert_eq!(world.get::<Transform>(mover), Some(&Transform::new(1.0, 2.0)));
        assert!(world.has::<Velocity>(mover));
        assert!(!world.has::<Lifetime>(mover));

        let fading = specs[1].spawn(&mut world);
        assert_eq!(world.get::<Lifetime>(fading).map(|l| l.age), Some(0.0));
    }

    #[test]
    fn test_route_from_fragment() {
        assert_eq!(route_from_fragment(""), "/");
        assert_eq!(route_from_fragment("#"), "/");
        assert_eq!(route_from_fragment("#/store"), "/store");
        assert_eq!(route_from_fragment("/chat"), "/chat");
    }

    #[test]
    fn test_malformed_document() {
        assert!(OsDocument::from_json_str("{ not json").is_err());
    }
}
