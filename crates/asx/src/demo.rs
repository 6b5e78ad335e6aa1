//! # Demo Application
//!
//! The bundled OS document and the behaviours it names. Used by the
//! `asx-headless` binary, the benchmarks and the integration tests.
//!
//! | Behaviour   | Page    | Registers                                      |
//! |-------------|---------|------------------------------------------------|
//! | `cart`      | `store` | `addToCart` input, `cart:changed` event        |
//! | `particles` | `space` | seeded particles + a `respawn` system          |

use asx_core::{EntityId, Lifetime, Renderable, SystemContext, Transform, Velocity, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};

use crate::error::{AsxError, AsxResult};
use crate::os::OsDocument;
use crate::page::{BehaviourRegistry, PageContext};

/// The bundled OS document.
pub const OS_JSON: &str = include_str!("../assets/os.json");

/// Storage key of the cart.
pub const CART_KEY: &str = "cart";

/// Event emitted after the cart changes, with `{ "items": n }`.
pub const CART_CHANGED: &str = "cart:changed";

/// Parses the bundled OS document.
///
/// # Errors
///
/// [`AsxError::Json`] if the bundled document is malformed.
pub fn document() -> AsxResult<OsDocument> {
    OsDocument::from_json_str(OS_JSON)
}

/// Every behaviour the bundled document names.
#[must_use]
pub fn behaviours() -> BehaviourRegistry {
    let mut registry = BehaviourRegistry::new();
    registry.register("cart", cart).register("particles", particles);
    registry
}

fn cart(ctx: &mut PageContext<'_>) -> AsxResult<()> {
    ctx.on_input(asx_ui::hud::ADD_TO_CART, |ctx, args| {
        let id = match args.first() {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => return Err(AsxError::handler("addToCart expects a product id")),
        };
        let mut items: Vec<String> = ctx.storage.get(CART_KEY).unwrap_or_default();
        items.push(id);
        ctx.storage.set(CART_KEY, &items);
        ctx.events.emit(CART_CHANGED, &json!({ "items": items.len() }));
        Ok(())
    });
    Ok(())
}

/// Upper bounds applied to particle page data.
const MAX_PARTICLES: f64 = 10_000.0;
const MAX_SPEED: f64 = 1_000.0;
const MAX_LIFE: f64 = 3_600.0;

#[derive(Clone, Copy)]
struct ParticleParams {
    count: usize,
    speed: f32,
    life: f32,
}

impl ParticleParams {
    fn from_data(data: &Value) -> Self {
        let field = |name: &str, default: f64, max: f64| {
            data.get(name)
                .and_then(Value::as_f64)
                .unwrap_or(default)
                .clamp(0.0, max)
        };
        Self {
            count: field("count", 16.0, MAX_PARTICLES) as usize,
            speed: field("speed", 0.5, MAX_SPEED) as f32,
            life: field("life", 2.0, MAX_LIFE) as f32,
        }
    }
}

fn init_particle(world: &mut World, id: EntityId, rng: &mut ChaCha8Rng, params: ParticleParams) {
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    world.insert(id, Transform::new(0.0, 0.0));
    world.insert(id, Velocity::new(angle.cos() * params.speed, angle.sin() * params.speed));
    world.insert(id, Lifetime::new(rng.gen_range(params.life * 0.5..=params.life)));
    world.insert(id, Renderable::new("circle", "#00ffff", 2.0));
}

/// The particles one emitter keeps alive.
struct Emitter {
    params: ParticleParams,
    rng: ChaCha8Rng,
    live: Vec<EntityId>,
}

impl Emitter {
    fn new(params: ParticleParams) -> Self {
        Self {
            params,
            rng: ChaCha8Rng::seed_from_u64(crate::renderer::DEFAULT_STAR_SEED),
            live: Vec::with_capacity(params.count),
        }
    }

    fn init(&mut self, world: &mut World, id: EntityId) {
        init_particle(world, id, &mut self.rng, self.params);
        self.live.push(id);
    }

    /// Forgets expired particles and spawns replacements up to `count`.
    fn top_up(&mut self, world: &mut World) -> usize {
        self.live.retain(|&id| world.is_live(id));
        let missing = self.params.count.saturating_sub(self.live.len());
        for _ in 0..missing {
            let id = world.create_entity();
            self.init(world, id);
        }
        missing
    }
}

fn particles(ctx: &mut PageContext<'_>) -> AsxResult<()> {
    let mut emitter = Emitter::new(ParticleParams::from_data(ctx.data()));

    for _ in 0..emitter.params.count {
        let id = ctx.spawn();
        emitter.init(ctx.world, id);
    }

    // Replacements are not page-owned; they expire through their lifetime.
    ctx.register_system("respawn", 50, move |sys: &mut SystemContext<'_>| {
        emitter.top_up(sys.world);
        Ok(())
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_document_parses() {
        let os = document().unwrap();
        assert_eq!(os.route_to_key("/store"), "store");
        assert_eq!(os.route_to_key("/nowhere"), "home");
        let registry = behaviours();
        for page in os.pages.values() {
            if let Some(name) = page.asx.as_ref().and_then(|s| s.behaviour.as_deref()) {
                assert!(registry.get(name).is_some(), "unregistered behaviour {name}");
            }
        }
    }

    #[test]
    fn test_particle_params() {
        let params = ParticleParams::from_data(&json!({ "count": 5, "life": 1.0 }));
        assert_eq!(params.count, 5);
        assert!((params.speed - 0.5).abs() < f32::EPSILON);
        assert!((params.life - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_particle_params_are_bounded() {
        let params = ParticleParams::from_data(&json!({ "count": -3, "speed": 1e300, "life": 1e300 }));
        assert_eq!(params.count, 0);
        assert!(params.speed.is_finite());
        assert!(params.life.is_finite());

        // extreme values still yield a valid lifetime range
        let params = ParticleParams::from_data(&json!({ "count": 1, "life": 1e300 }));
        let mut world = World::new();
        let mut emitter = Emitter::new(params);
        assert_eq!(emitter.top_up(&mut world), 1);
    }

    #[test]
    fn test_emitter_counts_only_its_own_particles() {
        let mut world = World::new();
        let bystander = world.create_entity();
        world.insert(bystander, Lifetime::new(100.0));

        let mut emitter = Emitter::new(ParticleParams::from_data(&json!({ "count": 3 })));
        assert_eq!(emitter.top_up(&mut world), 3);
        assert_eq!(emitter.top_up(&mut world), 0);
        assert_eq!(world.entity_count(), 4);

        let first = emitter.live[0];
        world.destroy_entity(first);
        assert_eq!(emitter.top_up(&mut world), 1);
        assert!(!emitter.live.contains(&first));
        assert_eq!(emitter.live.len(), 3);
        assert!(world.is_live(bystander));
    }
}
