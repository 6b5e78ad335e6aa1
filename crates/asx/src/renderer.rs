//! # Scene Renderer
//!
//! Placeholder backend. It reads the world once per frame and produces a
//! [`FrameOutput`] (clear colour + instance list) that a GPU pipeline could
//! upload as-is; nothing is drawn here.
//!
//! | Scene       | Clear colour                       | Instances                        |
//! |-------------|------------------------------------|----------------------------------|
//! | `flat`      | `(0.07, 0.07, 0.12)`               | `Transform + Renderable`         |
//! | `space`     | `(0.02, 0.02, 0.06)`               | `Transform + Renderable`         |
//! | `starscape` | `(0.03 + sin(t) * 0.01, 0.03, 0.08)` | seeded star field + entities   |
//!
//! The backend only ever receives `&World`, so it cannot mutate components
//! or destroy entities.

use asx_core::{Renderable, Transform, World};
use asx_ui::Color;
use bytemuck::{Pod, Zeroable};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seed used when a scene does not name one.
pub const DEFAULT_STAR_SEED: u64 = 42;

/// Star count used when a scene does not name one.
pub const DEFAULT_STAR_COUNT: usize = 200;

/// Scene section of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDesc {
    /// `flat`, `space` or `starscape`. Unknown names fall back to `flat`.
    pub scene: String,
    /// Star field seed.
    pub seed: u64,
    /// Number of stars in a `starscape`.
    pub stars: usize,
}

impl Default for SceneDesc {
    fn default() -> Self {
        Self {
            scene: "flat".to_string(),
            seed: DEFAULT_STAR_SEED,
            stars: DEFAULT_STAR_COUNT,
        }
    }
}

impl SceneDesc {
    /// Describes a scene by name with default parameters.
    #[must_use]
    pub fn named(scene: impl Into<String>) -> Self {
        Self {
            scene: scene.into(),
            ..Self::default()
        }
    }
}

/// Built-in scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    /// Plain dark background.
    Flat,
    /// Deep blue background.
    Space,
    /// Oscillating background with a star field.
    Starscape,
}

impl SceneKind {
    /// Resolves a scene name; unknown names map to [`SceneKind::Flat`].
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "space" => Self::Space,
            "starscape" => Self::Starscape,
            "flat" => Self::Flat,
            other => {
                debug!(scene = other, "unknown scene, using flat");
                Self::Flat
            }
        }
    }

    /// Seconds advanced per rendered frame.
    const fn time_step(self) -> f32 {
        match self {
            Self::Flat => 0.0,
            Self::Space => 0.016,
            Self::Starscape => 0.01,
        }
    }

    fn clear_color(self, t: f32) -> Color {
        match self {
            Self::Flat => Color::rgb(0.07, 0.07, 0.12),
            Self::Space => Color::rgb(0.02, 0.02, 0.06),
            Self::Starscape => Color::rgb(0.03 + t.sin() * 0.01, 0.03, 0.08),
        }
    }
}

/// Shape codes carried in [`InstanceData::shape`].
pub mod shape {
    /// Square sprite.
    pub const QUAD: u32 = 0;
    /// Round sprite.
    pub const CIRCLE: u32 = 1;
    /// Background star.
    pub const STAR: u32 = 2;

    /// Maps a `Renderable::kind` to a shape code.
    #[must_use]
    pub fn from_kind(kind: &str) -> u32 {
        match kind {
            "circle" => CIRCLE,
            "star" => STAR,
            _ => QUAD,
        }
    }
}

/// GPU-ready per-instance record.
///
/// Layout (32 bytes):
/// - position: `[f32; 2]` (8 bytes)
/// - size: `f32` (4 bytes)
/// - shape: `u32` (4 bytes)
/// - color: `[f32; 4]` (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct InstanceData {
    /// World position.
    pub position: [f32; 2],
    /// Size in world units.
    pub size: f32,
    /// See [`shape`].
    pub shape: u32,
    /// RGBA colour.
    pub color: [f32; 4],
}

/// What one frame would draw.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutput {
    /// Background colour.
    pub clear_color: Color,
    /// Instances in draw order.
    pub instances: Vec<InstanceData>,
}

impl FrameOutput {
    /// Instance buffer bytes, ready for upload.
    #[must_use]
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// A render backend driven once per frame.
pub trait RenderBackend {
    /// Replaces the active scene.
    fn load_scene(&mut self, desc: &SceneDesc);

    /// Draws the world. `None` when no scene is loaded.
    fn render(&mut self, world: &World) -> Option<FrameOutput>;

    /// Drops the active scene.
    fn unload(&mut self);

    /// Whether a scene is loaded.
    fn has_scene(&self) -> bool;
}

struct ActiveScene {
    kind: SceneKind,
    t: f32,
    stars: Vec<InstanceData>,
}

/// The built-in placeholder backend.
#[derive(Default)]
pub struct SceneRenderer {
    active: Option<ActiveScene>,
    frames: u64,
}

impl SceneRenderer {
    /// Creates a renderer with no scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The active scene kind.
    #[must_use]
    pub fn scene(&self) -> Option<SceneKind> {
        self.active.as_ref().map(|s| s.kind)
    }

    /// Frames rendered since creation.
    #[inline]
    #[must_use]
    pub const fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

/// Deterministic star field in `[-1, 1]²`.
#[must_use]
pub fn star_field(seed: u64, count: usize) -> Vec<InstanceData> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let brightness = rng.gen_range(0.4..1.0);
            InstanceData {
                position: [rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)],
                size: rng.gen_range(0.5..2.0),
                shape: shape::STAR,
                color: [brightness, brightness, 1.0, 1.0],
            }
        })
        .collect()
}

/// Collects `Transform + Renderable` entities in creation order.
#[must_use]
pub fn collect_instances(world: &World) -> Vec<InstanceData> {
    world
        .query::<(Transform, Renderable)>()
        .iter(world)
        .filter_map(|id| {
            let t = world.get::<Transform>(id)?;
            let r = world.get::<Renderable>(id)?;
            let color = Color::parse_hex(&r.color).unwrap_or(Color::CYAN);
            Some(InstanceData {
                position: [t.x, t.y],
                size: r.size,
                shape: shape::from_kind(&r.kind),
                color: color.to_array(),
            })
        })
        .collect()
}

impl RenderBackend for SceneRenderer {
    fn load_scene(&mut self, desc: &SceneDesc) {
        let kind = SceneKind::from_name(&desc.scene);
        let stars = if kind == SceneKind::Starscape {
            star_field(desc.seed, desc.stars)
        } else {
            Vec::new()
        };
        debug!(scene = ?kind, stars = stars.len(), "scene loaded");
        self.active = Some(ActiveScene { kind, t: 0.0, stars });
    }

    fn render(&mut self, world: &World) -> Option<FrameOutput> {
        let scene = self.active.as_mut()?;
        scene.t += scene.kind.time_step();
        self.frames += 1;

        let mut instances = scene.stars.clone();
        instances.extend(collect_instances(world));
        Some(FrameOutput {
            clear_color: scene.kind.clear_color(scene.t),
            instances,
        })
    }

    fn unload(&mut self) {
        if let Some(scene) = self.active.take() {
            debug!(scene = ?scene.kind, "scene unloaded");
        }
    }

    fn has_scene(&self) -> bool {
        self.active.is_some()
    }
}

impl std::fmt::Debug for SceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRenderer")
            .field("scene", &self.scene())
            .field("frames", &self.frames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_layout() {
        assert_eq!(std::mem::size_of::<InstanceData>(), 32);
        let output = FrameOutput {
            clear_color: Color::TRANSPARENT,
            instances: vec![InstanceData::zeroed(); 3],
        };
        assert_eq!(output.instance_bytes().len(), 96);
    }

    #[test]
    fn test_no_scene_renders_nothing() {
        let mut renderer = SceneRenderer::new();
        assert!(renderer.render(&World::new()).is_none());
        assert_eq!(renderer.frames_rendered(), 0);
    }

    #[test]
    fn test_unknown_scene_is_flat() {
        let mut renderer = SceneRenderer::new();
        renderer.load_scene(&SceneDesc::named("volcano"));
        assert_eq!(renderer.scene(), Some(SceneKind::Flat));
        let out = renderer.render(&World::new()).unwrap();
        assert_eq!(out.clear_color, Color::rgb(0.07, 0.07, 0.12));
        assert!(out.instances.is_empty());
    }

    #[test]
    fn test_entities_become_instances() {
        let mut world = World::new();
        let a = world.create_entity();
        world.insert(a, Transform::new(1.0, 2.0));
        world.insert(a, Renderable::new("circle", "#ff0000", 3.0));
        let hidden = world.create_entity();
        world.insert(hidden, Transform::new(5.0, 5.0));

        let mut renderer = SceneRenderer::new();
        renderer.load_scene(&SceneDesc::named("space"));
        let out = renderer.render(&world).unwrap();
        assert_eq!(out.instances.len(), 1);
        assert_eq!(out.instances[0].position, [1.0, 2.0]);
        assert_eq!(out.instances[0].shape, shape::CIRCLE);
        assert_eq!(out.instances[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn test_starscape_is_deterministic_and_oscillates() {
        assert_eq!(star_field(7, 50), star_field(7, 50));
        assert_ne!(star_field(7, 50), star_field(8, 50));

        let mut renderer = SceneRenderer::new();
        renderer.load_scene(&SceneDesc { stars: 10, ..SceneDesc::named("starscape") });
        let first = renderer.render(&World::new()).unwrap();
        let second = renderer.render(&World::new()).unwrap();
        assert_eq!(first.instances.len(), 10);
        assert!(first.instances.iter().all(|s| (-1.0..1.0).contains(&s.position[0])));
        assert!(second.clear_color.r > first.clear_color.r);
    }

    #[test]
    fn test_unload() {
        let mut renderer = SceneRenderer::new();
        renderer.load_scene(&SceneDesc::default());
        assert!(renderer.has_scene());
        renderer.unload();
        assert!(!renderer.has_scene());
        assert!(renderer.render(&World::new()).is_none());
    }
}
