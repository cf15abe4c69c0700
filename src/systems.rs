//! Core controller systems.
//!
//! Two cadences cooperate. Frame systems (`Update`) refresh ground contact
//! from the foot overlap result and handle jump input buffering. Tick
//! systems (`FixedUpdate`) classify the standing surface and write friction,
//! drag, propulsion force, and gravity scale to the body. They are generic
//! over the physics backend so different engines can be used.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::config::{CharacterOrientation, ControllerConfig};
use crate::intent::MoveIntent;
use crate::jump::JumpState;
use crate::probe::{GroundProbe, SlopeProbe};
use crate::slope::SlopeState;
use crate::state::{Airborne, GroundContact, Grounded};

/// Fold the frame's overlap result into ground contact and refill the jump
/// budget on the landing edge.
pub fn update_ground_contact(
    mut q_contacts: Query<(
        &GroundProbe,
        &mut GroundContact,
        &mut JumpState,
        &ControllerConfig,
    )>,
) {
    for (probe, mut contact, mut jump, config) in &mut q_contacts {
        if contact.apply_overlap(probe.overlap) {
            jump.refill(config.total_jumps);
        }
    }
}

/// Handle jump input for the frame.
///
/// On the press edge the buffer is armed and a jump is attempted in the same
/// frame; an ineligible attempt is silently dropped and the armed buffer is
/// left to count down. On every other frame the buffer counts down by the
/// frame's elapsed time.
pub fn buffer_jump_input<B: CharacterPhysicsBackend>(world: &mut World) {
    let delta = world.resource::<Time>().delta_secs();

    let entities: Vec<(Entity, ControllerConfig, CharacterOrientation, bool, f32)> = world
        .query::<(
            Entity,
            &ControllerConfig,
            Option<&CharacterOrientation>,
            &MoveIntent,
            &SlopeState,
        )>()
        .iter(world)
        .map(|(entity, config, orientation, intent, slope)| {
            (
                entity,
                *config,
                orientation.copied().unwrap_or_default(),
                intent.jump_just_pressed(),
                slope.down_angle,
            )
        })
        .collect();

    for (entity, config, orientation, pressed, down_angle) in entities {
        if !pressed {
            if let Some(mut jump) = world.get_mut::<JumpState>(entity) {
                jump.tick(delta);
            }
            continue;
        }

        let executed = {
            let Some(mut jump) = world.get_mut::<JumpState>(entity) else {
                continue;
            };
            jump.arm(config.jump_buffer_time);
            let eligible = jump.can_jump(down_angle, config.max_slope_angle);
            if eligible {
                jump.consume();
            }
            eligible
        };

        if executed {
            // Kill vertical motion first so jump height is consistent no
            // matter how fast the body was rising or falling.
            let velocity = B::get_velocity(world, entity);
            B::set_velocity(world, entity, Vec2::new(velocity.x, 0.0));
            B::apply_impulse(world, entity, orientation.up() * config.jump_force);
        }
    }
}

/// Classify this tick's probe results and write the selected friction
/// material to the body.
pub fn apply_slope_classification<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, ControllerConfig, f32, SlopeProbe)> = world
        .query::<(Entity, &ControllerConfig, &MoveIntent, &SlopeProbe)>()
        .iter(world)
        .map(|(entity, config, intent, probe)| (entity, *config, intent.axis.x, *probe))
        .collect();

    for (entity, config, move_x, probe) in entities {
        let material = {
            let Some(mut slope) = world.get_mut::<SlopeState>(entity) else {
                continue;
            };
            slope.classify(&probe, config.max_slope_angle);
            if slope.wants_full_friction(move_x) {
                config.full_friction
            } else {
                config.no_friction
            }
        };
        B::set_friction(world, entity, material);
    }
}

/// Pick the movement direction and drag for this tick.
///
/// On a walkable slope the character is propelled along the slope tangent;
/// everywhere else along its facing right-axis. The drag switches with the
/// direction so slope traversal keeps traction.
pub(crate) fn movement_decision(
    config: &ControllerConfig,
    orientation: &CharacterOrientation,
    contact: &GroundContact,
    slope: &SlopeState,
    move_x: f32,
) -> (Vec2, f32) {
    if contact.grounded && slope.on_slope && slope.walkable {
        (-slope.tangent * move_x, config.slope_drag)
    } else {
        (orientation.right() * move_x, config.default_drag)
    }
}

/// Apply the continuous propulsion force and the matching linear drag.
pub fn apply_movement<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(
        Entity,
        ControllerConfig,
        CharacterOrientation,
        GroundContact,
        SlopeState,
        f32,
    )> = world
        .query::<(
            Entity,
            &ControllerConfig,
            Option<&CharacterOrientation>,
            &GroundContact,
            &SlopeState,
            &MoveIntent,
        )>()
        .iter(world)
        .map(|(entity, config, orientation, contact, slope, intent)| {
            (
                entity,
                *config,
                orientation.copied().unwrap_or_default(),
                *contact,
                *slope,
                intent.axis.x,
            )
        })
        .collect();

    for (entity, config, orientation, contact, slope, move_x) in entities {
        let (direction, drag) = movement_decision(&config, &orientation, &contact, &slope, move_x);
        B::set_linear_damping(world, entity, drag);
        B::apply_force(world, entity, direction * config.movement_speed);
    }
}

/// Gravity scale for the current contact and velocity state.
///
/// Falling gets the heavy scale; everything else, including jump ascent,
/// gets the light one so rising never feels as heavy as dropping.
pub(crate) fn gravity_scale(config: &ControllerConfig, airborne: bool, vertical_velocity: f32) -> f32 {
    if airborne && vertical_velocity < 0.0 {
        config.falling_gravity_scale
    } else {
        config.grounded_gravity_scale
    }
}

/// Overwrite the body's gravity scale from this tick's contact state.
pub fn apply_gravity<B: CharacterPhysicsBackend>(world: &mut World) {
    let entities: Vec<(Entity, ControllerConfig, bool)> = world
        .query::<(Entity, &ControllerConfig, &GroundContact)>()
        .iter(world)
        .map(|(entity, config, contact)| (entity, *config, contact.airborne))
        .collect();

    for (entity, config, airborne) in entities {
        let velocity = B::get_velocity(world, entity);
        let scale = gravity_scale(&config, airborne, velocity.y);
        B::set_gravity_scale(world, entity, scale);
    }
}

/// Sync the [`Grounded`] and [`Airborne`] markers with [`GroundContact`].
pub fn sync_state_markers(
    mut commands: Commands,
    q_contacts: Query<(Entity, &GroundContact, Has<Grounded>, Has<Airborne>)>,
) {
    for (entity, contact, has_grounded, has_airborne) in &q_contacts {
        if contact.grounded != has_grounded {
            if contact.grounded {
                commands.entity(entity).insert(Grounded);
            } else {
                commands.entity(entity).remove::<Grounded>();
            }
        }
        if contact.airborne != has_airborne {
            if contact.airborne {
                commands.entity(entity).insert(Airborne);
            } else {
                commands.entity(entity).remove::<Airborne>();
            }
        }
    }
}

/// Advance the jump edge latch at the end of the frame.
pub fn latch_jump_input(mut q_intents: Query<&mut MoveIntent>) {
    for mut intent in &mut q_intents {
        intent.latch();
    }
}

/// Draw the foot probe circle of every controller.
///
/// Green while grounded, red while not. Requires the app to include Bevy's
/// `GizmoPlugin` (part of `DefaultPlugins`).
#[cfg(feature = "debug-draw")]
pub fn draw_foot_circles(
    mut gizmos: Gizmos,
    q_probes: Query<(&GroundProbe, &GroundContact)>,
) {
    use bevy::color::palettes::css::{LIME, RED};

    for (probe, contact) in &q_probes {
        let color = if contact.grounded { LIME } else { RED };
        gizmos.circle_2d(probe.circle.center, probe.circle.radius, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NoOpBackendPlugin;
    use crate::config::FrictionMaterial;

    // ==================== Pure Decision Tests ====================

    fn walkable_slope() -> SlopeState {
        let mut slope = SlopeState::default();
        slope.on_slope = true;
        slope.walkable = true;
        slope.down_angle = 20.0;
        slope.side_angle = 20.0;
        slope.tangent = Vec2::new(-0.94, 0.342);
        slope
    }

    #[test]
    fn movement_follows_slope_tangent_when_walkable() {
        let config = ControllerConfig::default();
        let orientation = CharacterOrientation::default();
        let contact = GroundContact {
            grounded: true,
            airborne: false,
        };
        let slope = walkable_slope();

        let (direction, drag) = movement_decision(&config, &orientation, &contact, &slope, 1.0);
        assert!((direction - -slope.tangent).length() < 1e-5);
        assert_eq!(drag, config.slope_drag);
    }

    #[test]
    fn movement_on_slope_with_idle_input_is_zero_force() {
        let config = ControllerConfig::default();
        let orientation = CharacterOrientation::default();
        let contact = GroundContact {
            grounded: true,
            airborne: false,
        };
        let slope = walkable_slope();

        let (direction, _) = movement_decision(&config, &orientation, &contact, &slope, 0.0);
        assert_eq!(direction * config.movement_speed, Vec2::ZERO);
        assert!(slope.wants_full_friction(0.0));
    }

    #[test]
    fn movement_uses_facing_axis_when_airborne_or_steep() {
        let config = ControllerConfig::default();
        let orientation = CharacterOrientation::default();
        let mut slope = walkable_slope();
        slope.walkable = false;

        // Grounded but too steep.
        let contact = GroundContact {
            grounded: true,
            airborne: false,
        };
        let (direction, drag) = movement_decision(&config, &orientation, &contact, &slope, -1.0);
        assert_eq!(direction, Vec2::NEG_X);
        assert_eq!(drag, config.default_drag);

        // Airborne over a walkable slope.
        let contact = GroundContact {
            grounded: false,
            airborne: true,
        };
        let slope = walkable_slope();
        let (direction, _) = movement_decision(&config, &orientation, &contact, &slope, 1.0);
        assert_eq!(direction, Vec2::X);
    }

    #[test]
    fn gravity_scale_heavy_only_while_falling() {
        let config = ControllerConfig::default();

        // Airborne and descending.
        assert_eq!(
            gravity_scale(&config, true, -3.0),
            config.falling_gravity_scale
        );
        // Airborne but rising through a jump.
        assert_eq!(
            gravity_scale(&config, true, 3.0),
            config.grounded_gravity_scale
        );
        // Standing still.
        assert_eq!(
            gravity_scale(&config, false, 0.0),
            config.grounded_gravity_scale
        );
        // Descending while not flagged airborne (e.g. walking down a slope).
        assert_eq!(
            gravity_scale(&config, false, -1.0),
            config.grounded_gravity_scale
        );
    }

    // ==================== Test Backend ====================

    /// Minimal in-memory backend so the generic systems can be exercised
    /// without a physics engine.
    struct TestBackend;

    #[derive(Component, Default, Debug, Clone, Copy)]
    struct TestBody {
        velocity: Vec2,
        impulse: Vec2,
        force: Vec2,
        gravity_scale: f32,
        damping: f32,
        friction: Option<FrictionMaterial>,
    }

    impl CharacterPhysicsBackend for TestBackend {
        fn plugin() -> impl Plugin {
            NoOpBackendPlugin
        }

        fn get_velocity(world: &World, entity: Entity) -> Vec2 {
            world
                .get::<TestBody>(entity)
                .map(|b| b.velocity)
                .unwrap_or_default()
        }

        fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
            if let Some(mut body) = world.get_mut::<TestBody>(entity) {
                body.velocity = velocity;
            }
        }

        fn apply_force(world: &mut World, entity: Entity, force: Vec2) {
            if let Some(mut body) = world.get_mut::<TestBody>(entity) {
                body.force += force;
            }
        }

        fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec2) {
            if let Some(mut body) = world.get_mut::<TestBody>(entity) {
                body.impulse += impulse;
            }
        }

        fn set_gravity_scale(world: &mut World, entity: Entity, scale: f32) {
            if let Some(mut body) = world.get_mut::<TestBody>(entity) {
                body.gravity_scale = scale;
            }
        }

        fn set_linear_damping(world: &mut World, entity: Entity, damping: f32) {
            if let Some(mut body) = world.get_mut::<TestBody>(entity) {
                body.damping = damping;
            }
        }

        fn set_friction(world: &mut World, entity: Entity, material: FrictionMaterial) {
            if let Some(mut body) = world.get_mut::<TestBody>(entity) {
                body.friction = Some(material);
            }
        }

        fn get_position(world: &World, entity: Entity) -> Vec2 {
            world
                .get::<Transform>(entity)
                .map(|t| t.translation.truncate())
                .unwrap_or_default()
        }

        fn get_fixed_timestep(_world: &World) -> f32 {
            1.0 / 60.0
        }
    }

    fn spawn_controller(world: &mut World, body: TestBody) -> Entity {
        world
            .spawn((
                ControllerConfig::default(),
                MoveIntent::default(),
                GroundProbe::default(),
                SlopeProbe::default(),
                SlopeState::default(),
                GroundContact::default(),
                JumpState::new(2),
                body,
            ))
            .id()
    }

    #[test]
    fn jump_zeroes_vertical_velocity_and_applies_impulse() {
        let mut world = World::new();
        world.init_resource::<Time>();

        let entity = spawn_controller(
            &mut world,
            TestBody {
                velocity: Vec2::new(12.0, -30.0),
                ..default()
            },
        );
        world.get_mut::<MoveIntent>(entity).unwrap().jump_pressed = true;

        buffer_jump_input::<TestBackend>(&mut world);

        let body = world.get::<TestBody>(entity).unwrap();
        assert_eq!(body.velocity, Vec2::new(12.0, 0.0));
        let expected = Vec2::Y * ControllerConfig::default().jump_force;
        assert!((body.impulse - expected).length() < 1e-4);

        let jump = world.get::<JumpState>(entity).unwrap();
        assert_eq!(jump.jumps_remaining, 1);
        assert_eq!(jump.buffer_counter, 0.0);
    }

    #[test]
    fn ineligible_jump_is_dropped_but_stays_buffered() {
        let mut world = World::new();
        world.init_resource::<Time>();

        let entity = spawn_controller(&mut world, TestBody::default());
        world.get_mut::<JumpState>(entity).unwrap().jumps_remaining = 0;
        world.get_mut::<MoveIntent>(entity).unwrap().jump_pressed = true;

        buffer_jump_input::<TestBackend>(&mut world);

        let body = world.get::<TestBody>(entity).unwrap();
        assert_eq!(body.impulse, Vec2::ZERO);

        // The press still armed the buffer even though nothing fired.
        let jump = world.get::<JumpState>(entity).unwrap();
        assert!(jump.is_armed());
    }

    #[test]
    fn steep_ground_blocks_the_jump() {
        let mut world = World::new();
        world.init_resource::<Time>();

        let entity = spawn_controller(&mut world, TestBody::default());
        world.get_mut::<SlopeState>(entity).unwrap().down_angle = 60.0;
        world.get_mut::<MoveIntent>(entity).unwrap().jump_pressed = true;

        buffer_jump_input::<TestBackend>(&mut world);

        assert_eq!(world.get::<TestBody>(entity).unwrap().impulse, Vec2::ZERO);
        assert_eq!(world.get::<JumpState>(entity).unwrap().jumps_remaining, 2);
    }

    #[test]
    fn movement_system_writes_drag_and_force() {
        let mut world = World::new();

        let entity = spawn_controller(&mut world, TestBody::default());
        world.get_mut::<MoveIntent>(entity).unwrap().axis = Vec2::X;

        apply_movement::<TestBackend>(&mut world);

        let config = ControllerConfig::default();
        let body = world.get::<TestBody>(entity).unwrap();
        assert_eq!(body.damping, config.default_drag);
        assert!((body.force - Vec2::X * config.movement_speed).length() < 1e-4);
    }

    #[test]
    fn gravity_system_selects_falling_scale() {
        let mut world = World::new();

        let entity = spawn_controller(
            &mut world,
            TestBody {
                velocity: Vec2::new(0.0, -3.0),
                ..default()
            },
        );
        world.get_mut::<GroundContact>(entity).unwrap().airborne = true;

        apply_gravity::<TestBackend>(&mut world);

        let config = ControllerConfig::default();
        let body = world.get::<TestBody>(entity).unwrap();
        assert_eq!(body.gravity_scale, config.falling_gravity_scale);
    }

    #[test]
    fn classification_system_writes_friction_material() {
        let mut world = World::new();

        let entity = spawn_controller(&mut world, TestBody::default());

        // Flat ground, idle input: the angle never changed, so this is not
        // a slope and the frictionless material is selected.
        apply_slope_classification::<TestBackend>(&mut world);
        let config = ControllerConfig::default();
        let body = world.get::<TestBody>(entity).unwrap();
        assert_eq!(body.friction, Some(config.no_friction));
    }

    // ==================== Marker Sync Tests ====================

    #[test]
    fn markers_follow_contact_state() {
        let mut app = App::new();
        app.add_systems(Update, sync_state_markers);

        let entity = app
            .world_mut()
            .spawn(GroundContact {
                grounded: true,
                airborne: false,
            })
            .id();

        app.update();
        assert!(app.world().get::<Grounded>(entity).is_some());
        assert!(app.world().get::<Airborne>(entity).is_none());

        *app.world_mut().get_mut::<GroundContact>(entity).unwrap() = GroundContact {
            grounded: false,
            airborne: true,
        };

        app.update();
        assert!(app.world().get::<Grounded>(entity).is_none());
        assert!(app.world().get::<Airborne>(entity).is_some());
    }

    #[test]
    fn landing_refills_budget_through_the_contact_system() {
        let mut app = App::new();
        app.add_systems(Update, update_ground_contact);

        let entity = app
            .world_mut()
            .spawn((
                ControllerConfig::default(),
                GroundProbe::default(),
                GroundContact::default(),
                JumpState::new(0),
            ))
            .id();

        // Airborne frame, then a grounded one.
        app.update();
        app.world_mut().get_mut::<GroundProbe>(entity).unwrap().overlap = true;
        app.update();

        assert_eq!(app.world().get::<JumpState>(entity).unwrap().jumps_remaining, 2);

        // Staying grounded does not refill again.
        app.world_mut()
            .get_mut::<JumpState>(entity)
            .unwrap()
            .jumps_remaining = 1;
        app.update();
        assert_eq!(app.world().get::<JumpState>(entity).unwrap().jumps_remaining, 1);
    }
}
