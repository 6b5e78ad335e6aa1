//! # Component System
//!
//! Components are pure data records with no behavior. Each kind is one
//! concrete Rust type; the world keeps one sparse store per kind.

use std::any::TypeId;
use std::fmt;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Marker trait for ECS components.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Clone, Debug, Default)]
/// struct Health(u32);
///
/// impl Component for Health {
///     const KIND: &'static str = "Health";
/// }
/// ```
pub trait Component: 'static {
    /// Human readable kind name, used in logs and error messages.
    const KIND: &'static str;
}

/// Runtime identity of a component kind.
///
/// Used by queries that are assembled dynamically rather than from a tuple
/// type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ComponentKind {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    /// Returns the kind of component type `C`.
    #[inline]
    #[must_use]
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: C::KIND,
        }
    }

    /// The type id keying this kind's store.
    #[inline]
    #[must_use]
    pub const fn type_id(self) -> TypeId {
        self.type_id
    }

    /// The kind name.
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.name
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 2D position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Transform {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Component for Transform {
    const KIND: &'static str = "Transform";
}

impl Transform {
    /// Creates a new transform.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the squared distance to another transform.
    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Movement speed in world units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Velocity {
    /// X velocity.
    pub vx: f32,
    /// Y velocity.
    pub vy: f32,
}

impl Component for Velocity {
    const KIND: &'static str = "Velocity";
}

impl Velocity {
    /// Creates a new velocity.
    #[inline]
    #[must_use]
    pub const fn new(vx: f32, vy: f32) -> Self {
        Self { vx, vy }
    }
}

/// Limited lifespan. The entity is destroyed once `age >= max`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
#[repr(C)]
pub struct Lifetime {
    /// Seconds lived so far.
    #[serde(default)]
    pub age: f32,
    /// Seconds to live.
    pub max: f32,
}

impl Component for Lifetime {
    const KIND: &'static str = "Lifetime";
}

impl Lifetime {
    /// Creates a fresh lifetime of `max` seconds.
    #[inline]
    #[must_use]
    pub const fn new(max: f32) -> Self {
        Self { age: 0.0, max }
    }

    /// Returns true once the configured lifespan has elapsed.
    #[inline]
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.age >= self.max
    }
}

/// Drawing hints read by the render backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Renderable {
    /// Shape or sprite kind (`"quad"`, `"star"`, ...).
    pub kind: String,
    /// CSS-style colour string.
    pub color: String,
    /// Size in world units.
    pub size: f32,
}

impl Component for Renderable {
    const KIND: &'static str = "Renderable";
}

impl Renderable {
    /// Creates a renderable.
    #[must_use]
    pub fn new(kind: impl Into<String>, color: impl Into<String>, size: f32) -> Self {
        Self {
            kind: kind.into(),
            color: color.into(),
            size,
        }
    }
}

impl Default for Renderable {
    fn default() -> Self {
        Self::new("quad", "#00ffff", 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_distance() {
        let a = Transform::new(0.0, 0.0);
        let b = Transform::new(3.0, 4.0);
        assert!((a.distance_squared(b) - 25.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_component_sizes() {
        // Tightly packed for instance uploads
        assert_eq!(std::mem::size_of::<Transform>(), 8);
        assert_eq!(std::mem::size_of::<Velocity>(), 8);
        assert_eq!(std::mem::size_of::<Lifetime>(), 8);
    }

    #[test]
    fn test_kind_identity() {
        assert_eq!(ComponentKind::of::<Transform>(), ComponentKind::of::<Transform>());
        assert_ne!(ComponentKind::of::<Transform>(), ComponentKind::of::<Velocity>());
        assert_eq!(ComponentKind::of::<Lifetime>().name(), "Lifetime");
    }

    #[test]
    fn test_lifetime_from_data_literal() {
        let lifetime: Lifetime = serde_json::from_str(r#"{"max": 0.5}"#).unwrap();
        assert_eq!(lifetime, Lifetime::new(0.5));
        assert!(!lifetime.is_expired());
    }

    #[test]
    fn test_renderable_defaults_missing_fields() {
        let r: Renderable = serde_json::from_str(r##"{"color": "#ff00ff"}"##).unwrap();
        assert_eq!(r.kind, "quad");
        assert_eq!(r.color, "#ff00ff");
    }
}
