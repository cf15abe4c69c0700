//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the character controller. This allows easy swapping
//! between physics engines (Rapier2D, XPBD, custom, etc.).
//!
//! The backend covers the body-state side of the contract: reading and
//! writing velocity, applying forces and impulses, and overwriting the
//! per-tick gravity scale, linear damping, and friction material. Geometry
//! queries (the foot overlap test and the slope rays) run in dedicated
//! systems registered by the backend's plugin, which write their results
//! into [`GroundProbe`](crate::probe::GroundProbe) and
//! [`SlopeProbe`](crate::probe::SlopeProbe).

use bevy::prelude::*;

use crate::config::FrictionMaterial;

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the character
/// controller. All operations are total: missing components degrade to
/// no-ops or zero values rather than failing.
///
/// For an example implementation, see the `rapier` module's
/// `Rapier2dBackend` which implements this trait for Bevy Rapier2D.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    ///
    /// The plugin is responsible for registering the backend's probe
    /// systems (ground overlap per frame, slope rays per tick) and any
    /// force-flushing systems the engine needs.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Apply a continuous force to an entity for the current tick.
    fn apply_force(world: &mut World, entity: Entity, force: Vec2);

    /// Apply an instantaneous impulse to an entity.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2);

    /// Overwrite the entity's gravity scale.
    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32);

    /// Overwrite the entity's linear damping coefficient.
    fn set_linear_damping(world: &mut World, entity: Entity, damping: f32);

    /// Overwrite the entity's active friction material.
    fn set_friction(world: &mut World, entity: Entity, material: FrictionMaterial);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Get the collision groups for an entity (memberships, filters).
    /// Returns None if the entity doesn't have collision groups.
    fn get_collision_groups(_world: &World, _entity: Entity) -> Option<(u32, u32)> {
        None
    }

    /// Get the distance from the entity's collider center to its bottom
    /// edge. Used to place the foot anchor.
    fn get_collider_bottom_offset(_world: &World, _entity: Entity) -> f32 {
        0.0
    }

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32;
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
