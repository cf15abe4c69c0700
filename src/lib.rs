//! # `slope_character_controller`
//!
//! A slope-aware 2D rigidbody character movement controller with physics
//! backend abstraction.
//!
//! This crate provides a fixed-timestep locomotion controller that:
//! - Detects ground contact with a circular foot probe
//! - Classifies the standing surface with raycasts (flat/slope/none)
//! - Steers propulsion along walkable slopes and picks friction materials
//! - Buffers jump input and tracks a multi-jump budget
//! - Switches gravity scale between ascent and descent
//! - Abstracts physics backend for easy swapping (Rapier2D included)
//!
//! ## Architecture
//!
//! The controller drives a **dynamic rigidbody** owned by the physics
//! engine. Two update cadences cooperate:
//! 1. Once per frame (`Update`): the foot overlap test refreshes ground
//!    contact, the jump budget refills on landing, and jump input is
//!    buffered and attempted.
//! 2. Once per physics tick (`FixedUpdate`): raycasts from the foot anchor
//!    classify the standing surface, then friction material, linear drag,
//!    propulsion force, and gravity scale are written to the body.
//!
//! The split matters: jump buffering decays with frame time while forces
//! apply per fixed tick, so the two halves must never be collapsed into one
//! schedule.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bevy_rapier2d::prelude::*;
//! use slope_character_controller::prelude::*;
//!
//! App::new()
//!     .add_plugins(DefaultPlugins)
//!     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
//!     .add_plugins(CharacterControllerPlugin::<Rapier2dBackend>::default())
//!     .run();
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod body;
pub mod config;
pub mod intent;
pub mod jump;
pub mod probe;
pub mod slope;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::body::BodyForces;
    pub use crate::config::{
        CharacterOrientation, ControllerConfig, FrictionCombine, FrictionMaterial,
    };
    pub use crate::intent::MoveIntent;
    pub use crate::jump::JumpState;
    pub use crate::probe::{CollisionData, FootCircle, GroundProbe, SlopeProbe};
    pub use crate::slope::SlopeState;
    pub use crate::state::{Airborne, GroundContact, Grounded};
    pub use crate::{
        CharacterControllerPlugin, CharacterControllerSet, CharacterFrameSet, ControllerBundle,
    };

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dCharacterBundle};
}

/// System sets for the frame-cadence half of the controller, in `Update`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterFrameSet {
    /// Backend foot overlap test.
    GroundSense,
    /// Ground contact fold, marker sync, and jump budget refill.
    ContactUpdate,
    /// Jump buffering and the same-frame jump attempt.
    JumpInput,
}

/// System sets for the tick-cadence half of the controller, in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacterControllerSet {
    /// Undo last tick's controller forces.
    Preparation,
    /// Backend slope raycasts.
    Probe,
    /// Slope classification and friction material selection.
    Classify,
    /// Movement direction, drag, and propulsion force.
    Locomotion,
    /// Gravity scale selection.
    Gravity,
    /// Flush accumulated forces to the physics engine.
    FinalApplication,
}

/// All controller-side components for one character, as a single bundle.
///
/// Pair this with the backend's physics bundle and a collider:
///
/// ```rust,ignore
/// commands.spawn((
///     Transform::from_xyz(0.0, 100.0, 0.0),
///     ControllerBundle::new(ControllerConfig::player()),
///     Rapier2dCharacterBundle::default(),
///     Collider::capsule_y(8.0, 4.0),
/// ));
/// ```
#[derive(Bundle)]
pub struct ControllerBundle {
    /// Controller configuration, fixed at spawn.
    pub config: config::ControllerConfig,
    /// Polled input snapshot.
    pub intent: intent::MoveIntent,
    /// Character facing axes.
    pub orientation: config::CharacterOrientation,
    /// Per-frame foot overlap result.
    pub ground_probe: probe::GroundProbe,
    /// Per-tick slope ray results.
    pub slope_probe: probe::SlopeProbe,
    /// Classified standing-surface state.
    pub slope: slope::SlopeState,
    /// Grounded/airborne contact state.
    pub contact: state::GroundContact,
    /// Jump buffer and budget.
    pub jump: jump::JumpState,
    /// Per-tick force accumulator.
    pub forces: body::BodyForces,
}

impl Default for ControllerBundle {
    fn default() -> Self {
        Self::new(config::ControllerConfig::default())
    }
}

impl ControllerBundle {
    /// Create the bundle for a given config, starting with a full jump
    /// budget so a character spawned on the ground can jump before its
    /// first landing edge.
    pub fn new(config: config::ControllerConfig) -> Self {
        Self {
            intent: intent::MoveIntent::default(),
            orientation: config::CharacterOrientation::default(),
            ground_probe: probe::GroundProbe::default(),
            slope_probe: probe::SlopeProbe::default(),
            slope: slope::SlopeState::default(),
            contact: state::GroundContact::default(),
            jump: jump::JumpState::new(config.total_jumps),
            forces: body::BodyForces::default(),
            config,
        }
    }
}

/// Main plugin for the character controller system.
///
/// This plugin is generic over a physics backend `B` which provides the
/// actual physics operations (probing, force application, etc.).
///
/// # Type Parameters
/// - `B`: The physics backend implementation (e.g., `Rapier2dBackend`)
pub struct CharacterControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        // Register core types
        app.register_type::<config::ControllerConfig>();
        app.register_type::<config::CharacterOrientation>();
        app.register_type::<intent::MoveIntent>();
        app.register_type::<probe::GroundProbe>();
        app.register_type::<probe::SlopeProbe>();
        app.register_type::<slope::SlopeState>();
        app.register_type::<state::GroundContact>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<jump::JumpState>();
        app.register_type::<body::BodyForces>();

        // Frame cadence runs input-side state; tick cadence runs the
        // physics writes, in dependency order.
        app.configure_sets(
            Update,
            (
                CharacterFrameSet::GroundSense,
                CharacterFrameSet::ContactUpdate,
                CharacterFrameSet::JumpInput,
            )
                .chain(),
        );
        app.configure_sets(
            FixedUpdate,
            (
                CharacterControllerSet::Preparation,
                CharacterControllerSet::Probe,
                CharacterControllerSet::Classify,
                CharacterControllerSet::Locomotion,
                CharacterControllerSet::Gravity,
                CharacterControllerSet::FinalApplication,
            )
                .chain(),
        );

        // Add the physics backend plugin (probe systems + force flushing).
        app.add_plugins(B::plugin());

        app.add_systems(
            Update,
            (
                (systems::update_ground_contact, systems::sync_state_markers)
                    .chain()
                    .in_set(CharacterFrameSet::ContactUpdate),
                systems::buffer_jump_input::<B>.in_set(CharacterFrameSet::JumpInput),
            ),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::apply_slope_classification::<B>.in_set(CharacterControllerSet::Classify),
                systems::apply_movement::<B>.in_set(CharacterControllerSet::Locomotion),
                systems::apply_gravity::<B>.in_set(CharacterControllerSet::Gravity),
            ),
        );

        // Advance the jump edge latch after all input handling.
        app.add_systems(PostUpdate, systems::latch_jump_input);

        #[cfg(feature = "debug-draw")]
        app.add_systems(
            Update,
            systems::draw_foot_circles
                .after(CharacterFrameSet::GroundSense)
                .run_if(resource_exists::<bevy::gizmos::config::GizmoConfigStore>),
        );
    }
}
