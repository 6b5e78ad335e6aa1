//! Built-in systems: motion integration and lifetime expiry.

use crate::error::SystemResult;

use super::component::{Lifetime, Transform, Velocity};
use super::system::SystemContext;
use super::world::World;

/// Order of [`integrate_motion`].
pub const MOTION_ORDER: i32 = 10;

/// Order of [`expire_lifetimes`].
pub const LIFETIME_ORDER: i32 = 20;

/// Registers both built-in systems on `world`.
pub fn install(world: &mut World) {
    world.register_system("integrate_motion", MOTION_ORDER, integrate_motion);
    world.register_system("expire_lifetimes", LIFETIME_ORDER, expire_lifetimes);
}

/// Moves every `Transform` by its `Velocity * dt`.
///
/// # Errors
///
/// Only if a matched entity loses its velocity mid-visit, which cannot
/// happen from inside this system.
pub fn integrate_motion(ctx: &mut SystemContext<'_>) -> SystemResult {
    let dt = ctx.dt;
    let world = &mut *ctx.world;
    let mut moving = world.query::<(Transform, Velocity)>();

    while let Some(id) = moving.next_match(world) {
        let velocity = *world.require::<Velocity>(id)?;
        if let Some(transform) = world.get_mut::<Transform>(id) {
            transform.x += velocity.vx * dt;
            transform.y += velocity.vy * dt;
        }
    }
    Ok(())
}

/// Ages every `Lifetime` by `dt` and destroys entities whose age reached
/// their maximum.
///
/// # Errors
///
/// Never fails.
pub fn expire_lifetimes(ctx: &mut SystemContext<'_>) -> SystemResult {
    let dt = ctx.dt;
    let world = &mut *ctx.world;
    let mut aging = world.query::<(Lifetime,)>();

    while let Some(id) = aging.next_match(world) {
        let expired = world.get_mut::<Lifetime>(id).is_some_and(|lifetime| {
            lifetime.age += dt;
            lifetime.is_expired()
        });
        if expired {
            world.destroy_entity(id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FrameClock;

    #[test]
    fn test_motion_integrates_clamped_dt() {
        let mut world = World::with_builtin_systems().with_clock(FrameClock::starting_at(0.0));
        let e = world.create_entity();
        world.insert(e, Transform::new(0.0, 0.0));
        world.insert(e, Velocity::new(10.0, -2.0));

        for frame in 1..=3 {
            world.advance(f64::from(frame) * 100.0);
        }

        let t = world.get::<Transform>(e).copied().unwrap_or_default();
        assert!((t.x - 1.5).abs() < 1e-5);
        assert!((t.y + 0.3).abs() < 1e-5);
    }

    #[test]
    fn test_transform_without_velocity_is_untouched() {
        let mut world = World::with_builtin_systems();
        let e = world.create_entity();
        world.insert(e, Transform::new(4.0, 4.0));
        world.advance(16.0);
        assert_eq!(world.get::<Transform>(e), Some(&Transform::new(4.0, 4.0)));
    }

    #[test]
    fn test_lifetime_expires_after_two_clamped_frames() {
        let mut world = World::with_builtin_systems();
        let e = world.create_entity();
        world.insert(e, Lifetime::new(0.1));

        world.advance(100.0);
        assert!(world.is_live(e));
        world.advance(200.0);
        assert!(!world.is_live(e));
        assert!(world.query_ids::<(Lifetime,)>().is_empty());
    }

    #[test]
    fn test_install_orders() {
        let world = World::with_builtin_systems();
        assert_eq!(world.systems().names(), vec!["integrate_motion", "expire_lifetimes"]);
    }
}
