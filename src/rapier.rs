//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.
//!
//! Body-state operations go through the [`CharacterPhysicsBackend`] trait.
//! The geometry queries (foot overlap and slope rays) are dedicated systems
//! here that receive `RapierContext` as a system parameter and write their
//! results into the probe components.

use bevy::log::warn_once;
use bevy::prelude::*;
use bevy_rapier2d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::body::BodyForces;
use crate::config::{CharacterOrientation, ControllerConfig, FrictionCombine, FrictionMaterial};
use crate::probe::{foot_anchor, CollisionData, FootCircle, GroundProbe, SlopeProbe};
use crate::{CharacterControllerSet, CharacterFrameSet};

/// Rapier2D physics backend for the character controller.
///
/// This backend uses `bevy_rapier2d` for physics operations including
/// force application and velocity manipulation. Collision detection
/// (the overlap test and slope raycasts) is handled by dedicated Rapier
/// systems that receive `RapierContext` as a system parameter.
pub struct Rapier2dBackend;

impl CharacterPhysicsBackend for Rapier2dBackend {
    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn apply_force(world: &mut World, entity: Entity, force: Vec2) {
        // Accumulate into BodyForces instead of directly modifying
        // ExternalForce. The accumulated force is flushed to ExternalForce
        // at the end of the tick by apply_controller_forces.
        if let Some(mut forces) = world.get_mut::<BodyForces>(entity) {
            forces.add(force);
        }
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2) {
        if let Some(mut ext_impulse) = world.get_mut::<ExternalImpulse>(entity) {
            ext_impulse.impulse += impulse;
        } else if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            // Fallback: apply as velocity change if no ExternalImpulse component
            vel.linvel += impulse;
        }
    }

    fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
        if let Some(mut gravity) = world.get_mut::<GravityScale>(entity) {
            gravity.0 = scale;
        }
    }

    fn set_linear_damping(world: &mut World, entity: Entity, damping: f32) {
        if let Some(mut damp) = world.get_mut::<Damping>(entity) {
            damp.linear_damping = damping;
        }
    }

    fn set_friction(world: &mut World, entity: Entity, material: FrictionMaterial) {
        if let Some(mut friction) = world.get_mut::<Friction>(entity) {
            friction.coefficient = material.coefficient;
            friction.combine_rule = material.combine.into();
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn get_collision_groups(world: &World, entity: Entity) -> Option<(u32, u32)> {
        world
            .get::<CollisionGroups>(entity)
            .map(|cg| (cg.memberships.bits(), cg.filters.bits()))
    }

    fn get_collider_bottom_offset(world: &World, entity: Entity) -> f32 {
        world
            .get::<Collider>(entity)
            .map(collider_bottom_offset)
            .unwrap_or(0.0)
    }

    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

impl From<FrictionCombine> for CoefficientCombineRule {
    fn from(combine: FrictionCombine) -> Self {
        match combine {
            FrictionCombine::Average => CoefficientCombineRule::Average,
            FrictionCombine::Min => CoefficientCombineRule::Min,
            FrictionCombine::Multiply => CoefficientCombineRule::Multiply,
            FrictionCombine::Max => CoefficientCombineRule::Max,
        }
    }
}

/// Plugin that sets up Rapier2D-specific systems for the character controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        // Frame cadence: refresh the foot overlap before contact update.
        app.add_systems(
            Update,
            rapier_ground_sense.in_set(CharacterFrameSet::GroundSense),
        );

        // Tick cadence: slope rays before classification, force flushing
        // around everything else.
        app.add_systems(
            FixedUpdate,
            (
                clear_controller_forces.in_set(CharacterControllerSet::Preparation),
                rapier_slope_probe.in_set(CharacterControllerSet::Probe),
                apply_controller_forces.in_set(CharacterControllerSet::FinalApplication),
            ),
        );
    }
}

/// Get the distance from collider center to bottom for a given collider.
/// For capsules, this is half_height + radius.
pub fn collider_bottom_offset(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        // Capsule: half-length of segment + radius
        let segment = capsule.segment();
        let half_height = (segment.a().y - segment.b().y).abs() / 2.0;
        half_height + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().y
    } else {
        // Unknown shape: probe from the body center.
        0.0
    }
}

/// Build the query filter for ground-classified geometry.
fn ground_filter(entity: Entity, config: &ControllerConfig) -> QueryFilter<'static> {
    let mut filter = QueryFilter::default()
        .exclude_rigid_body(entity)
        .exclude_sensors();

    if let Some((memberships, filters)) = config.ground_filter {
        filter = filter.groups(CollisionGroups::new(
            Group::from_bits_truncate(memberships),
            Group::from_bits_truncate(filters),
        ));
    }

    filter
}

/// Perform a raycast using RapierContext, keeping the true surface normal.
fn rapier_raycast(
    context: &RapierContext,
    origin: Vec2,
    direction: Vec2,
    max_distance: f32,
    filter: QueryFilter,
) -> Option<CollisionData> {
    context
        .cast_ray_and_get_normal(origin, direction, max_distance, true, filter)
        .map(|(entity, hit)| {
            CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(entity))
        })
}

/// Per-frame foot overlap test.
///
/// Tests a circle at the body's lower collider edge against the ground
/// filter and records the result (and the tested circle, for diagnostics)
/// in [`GroundProbe`].
fn rapier_ground_sense(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        &mut GroundProbe,
        Option<&Collider>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        warn_once!("no Rapier context available; ground sensing is inactive");
        return;
    };

    for (entity, transform, config, mut probe, collider) in &mut q_controllers {
        let position = transform.translation().xy();
        let bottom_offset = collider.map(collider_bottom_offset).unwrap_or(0.0);
        let circle = FootCircle::at(position, bottom_offset, config.check_radius);

        let mut overlap = false;
        context.intersections_with_shape(
            circle.center,
            0.0,
            &Collider::ball(circle.radius),
            ground_filter(entity, config),
            |_| {
                overlap = true;
                false
            },
        );

        probe.overlap = overlap;
        probe.circle = circle;
    }
}

/// Per-tick slope rays.
///
/// Casts one ray straight down and one along each side of the character's
/// facing axis, all from the foot anchor, and records the hits in
/// [`SlopeProbe`]. Never mutates body state.
fn rapier_slope_probe(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        Option<&CharacterOrientation>,
        &mut SlopeProbe,
        Option<&Collider>,
    )>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, orientation, mut probe, collider) in &mut q_controllers {
        let position = transform.translation().xy();
        let bottom_offset = collider.map(collider_bottom_offset).unwrap_or(0.0);
        let anchor = foot_anchor(position, bottom_offset);
        let orientation = orientation.copied().unwrap_or_default();

        probe.clear();
        probe.below = rapier_raycast(
            &context,
            anchor,
            Vec2::NEG_Y,
            config.slope_check_distance,
            ground_filter(entity, config),
        );
        probe.ahead = rapier_raycast(
            &context,
            anchor,
            orientation.right(),
            config.slope_check_distance,
            ground_filter(entity, config),
        );
        probe.behind = rapier_raycast(
            &context,
            anchor,
            orientation.left(),
            config.slope_check_distance,
            ground_filter(entity, config),
        );
    }
}

/// Undo last tick's controller forces at the start of each tick.
///
/// This restores ExternalForce to the "external-only" state so forces
/// applied by user code are preserved across ticks.
pub fn clear_controller_forces(mut q_bodies: Query<(&mut ExternalForce, &mut BodyForces)>) {
    for (mut ext_force, mut forces) in &mut q_bodies {
        ext_force.force -= forces.prepare_new_tick();
    }
}

/// Flush the tick's accumulated controller forces into ExternalForce.
pub fn apply_controller_forces(mut q_bodies: Query<(&mut ExternalForce, &mut BodyForces)>) {
    for (mut ext_force, mut forces) in &mut q_bodies {
        ext_force.force += forces.finalize_tick();
    }
}

/// Bundle for creating a character with Rapier2D physics.
///
/// Provides the Rapier components the controller reads and writes: the
/// rigid body, velocity, external force/impulse accumulators, locked axes,
/// damping, gravity scale, and the friction component. Damping, gravity
/// scale, and friction are overwritten by the controller every physics
/// tick; their initial values here only cover the first tick.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use slope_character_controller::prelude::*;
/// use slope_character_controller::rapier::Rapier2dCharacterBundle;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 100.0, 0.0),
///         ControllerBundle::new(ControllerConfig::player()),
///         Rapier2dCharacterBundle::default(),
///         Collider::capsule_y(8.0, 4.0),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dCharacterBundle {
    /// The rigid body type. Should typically be [`RigidBody::Dynamic`] for characters.
    pub rigid_body: RigidBody,
    /// Current linear and angular velocity. Updated by Rapier each physics step.
    pub velocity: Velocity,
    /// Accumulated forces applied this frame. Flushed from [`BodyForces`] each tick.
    pub external_force: ExternalForce,
    /// Accumulated impulses applied this frame. Used for jump impulses.
    pub external_impulse: ExternalImpulse,
    /// Which axes are locked. Rotation is locked by default to keep the
    /// character upright.
    pub locked_axes: LockedAxes,
    /// Linear/angular damping. The linear coefficient is overwritten each tick.
    pub damping: Damping,
    /// Gravity scale. Overwritten each tick by the gravity selection.
    pub gravity_scale: GravityScale,
    /// Active friction material. Overwritten each tick by the classifier.
    pub friction: Friction,
}

impl Default for Rapier2dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dCharacterBundle {
    /// Create a character bundle with rotation locked.
    ///
    /// Initial damping, gravity scale, and friction mirror the
    /// [`ControllerConfig`] defaults so the first tick matches what the
    /// controller will keep writing afterwards.
    pub fn new() -> Self {
        let config = ControllerConfig::default();
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            external_force: ExternalForce::default(),
            external_impulse: ExternalImpulse::default(),
            locked_axes: LockedAxes::ROTATION_LOCKED,
            damping: Damping {
                linear_damping: config.default_drag,
                angular_damping: 0.0,
            },
            gravity_scale: GravityScale(config.grounded_gravity_scale),
            friction: Friction {
                coefficient: config.no_friction.coefficient,
                combine_rule: config.no_friction.combine.into(),
            },
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set the damping coefficients. Note that the linear coefficient is
    /// overwritten by the controller every physics tick.
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.damping = Damping {
            linear_damping: linear,
            angular_damping: angular,
        };
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
