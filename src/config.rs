//! Controller configuration components.
//!
//! This module defines the per-character configuration (movement, ground
//! check, jumping, slopes), the friction materials the classifier selects
//! between, and the orientation component that supplies the character's
//! facing axes.

use bevy::prelude::*;

/// Defines the local coordinate system for a character controller.
///
/// The orientation is defined by a single `up` vector; the facing right-axis
/// is derived perpendicular to it. Movement direction while airborne or on
/// flat ground follows `right()`, and jump impulses follow `up()`.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CharacterOrientation {
    /// The "up" direction for this character.
    up: Vec2,
}

impl Default for CharacterOrientation {
    fn default() -> Self {
        Self { up: Vec2::Y }
    }
}

impl CharacterOrientation {
    /// Create a new orientation with the given up direction.
    ///
    /// The vector will be normalized. If zero-length, defaults to `Vec2::Y`.
    pub fn new(up: Vec2) -> Self {
        let normalized = up.normalize_or_zero();
        Self {
            up: if normalized == Vec2::ZERO {
                Vec2::Y
            } else {
                normalized
            },
        }
    }

    /// Get the "up" direction.
    #[inline]
    pub fn up(&self) -> Vec2 {
        self.up
    }

    /// Get the "down" direction (opposite of up).
    #[inline]
    pub fn down(&self) -> Vec2 {
        -self.up
    }

    /// Get the "right" direction (perpendicular to up, clockwise).
    #[inline]
    pub fn right(&self) -> Vec2 {
        Vec2::new(self.up.y, -self.up.x)
    }

    /// Get the "left" direction (perpendicular to up, counter-clockwise).
    #[inline]
    pub fn left(&self) -> Vec2 {
        Vec2::new(-self.up.y, self.up.x)
    }

    /// Set the "up" direction.
    pub fn set_up(&mut self, up: Vec2) {
        let normalized = up.normalize_or_zero();
        if normalized != Vec2::ZERO {
            self.up = normalized;
        }
    }
}

/// How two touching friction coefficients combine into one.
///
/// Mirrors the combine rules common to 2D physics engines; the backend maps
/// this onto its own enum.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrictionCombine {
    /// Arithmetic mean of the two coefficients.
    #[default]
    Average,
    /// The smaller coefficient wins.
    Min,
    /// Product of the two coefficients.
    Multiply,
    /// The larger coefficient wins.
    Max,
}

/// A friction material the controller can assign to the body.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct FrictionMaterial {
    /// Friction coefficient (0.0 = frictionless).
    pub coefficient: f32,
    /// Rule used to combine this coefficient with the touched surface's.
    pub combine: FrictionCombine,
}

impl FrictionMaterial {
    /// Create a material with an explicit combine rule.
    pub const fn new(coefficient: f32, combine: FrictionCombine) -> Self {
        Self {
            coefficient,
            combine,
        }
    }

    /// Full friction: holds the body still against the surface regardless
    /// of what the surface itself is made of.
    pub const fn full() -> Self {
        Self::new(1.0, FrictionCombine::Max)
    }

    /// No friction: the body slides freely regardless of the surface.
    pub const fn none() -> Self {
        Self::new(0.0, FrictionCombine::Min)
    }
}

impl Default for FrictionMaterial {
    fn default() -> Self {
        Self::none()
    }
}

/// Configuration parameters for the character controller.
///
/// Fixed at construction; the controller never mutates it mid-tick.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ControllerConfig {
    // === Movement ===
    /// Scale of the continuous propulsion force (force units per unit of
    /// input axis).
    pub movement_speed: f32,

    /// Strength of the instantaneous jump impulse.
    pub jump_force: f32,

    // === Ground Check ===
    /// Radius of the circular foot overlap probe.
    pub check_radius: f32,

    /// Collision groups for ground classification as (memberships, filters)
    /// bits. `None` means "collide with everything except self".
    pub ground_filter: Option<(u32, u32)>,

    // === Jumping ===
    /// Gravity scale while airborne and descending.
    pub falling_gravity_scale: f32,

    /// Gravity scale in every other case, including jump ascent. Lighter
    /// than the falling scale so ascent feels less heavy than descent.
    pub grounded_gravity_scale: f32,

    /// Number of jumps available between landings.
    pub total_jumps: u32,

    /// Seconds a jump press stays buffered.
    pub jump_buffer_time: f32,

    // === Slopes ===
    /// Material assigned while idle on a walkable slope.
    pub full_friction: FrictionMaterial,

    /// Material assigned in every other case.
    pub no_friction: FrictionMaterial,

    /// Maximum length of the three slope rays.
    pub slope_check_distance: f32,

    /// Steepest walkable slope, in degrees.
    pub max_slope_angle: f32,

    /// Linear drag while moving along a walkable slope.
    pub slope_drag: f32,

    /// Linear drag everywhere else (flat ground and airborne).
    pub default_drag: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Movement
            movement_speed: 900.0,
            jump_force: 320.0,

            // Ground check
            check_radius: 4.0,
            ground_filter: None,

            // Jumping
            falling_gravity_scale: 4.0,
            grounded_gravity_scale: 2.0,
            total_jumps: 2,
            jump_buffer_time: 0.2,

            // Slopes
            full_friction: FrictionMaterial::full(),
            no_friction: FrictionMaterial::none(),
            slope_check_distance: 8.0,
            max_slope_angle: 45.0,
            slope_drag: 2.25,
            default_drag: 5.0,
        }
    }
}

impl ControllerConfig {
    /// Create a config tuned for a responsive player character: snappier
    /// propulsion and a slightly stronger jump than the defaults.
    pub fn player() -> Self {
        Self {
            movement_speed: 1200.0,
            jump_force: 380.0,
            ..default()
        }
    }

    /// Builder: set the propulsion force scale.
    pub fn with_movement_speed(mut self, speed: f32) -> Self {
        self.movement_speed = speed;
        self
    }

    /// Builder: set the jump impulse strength.
    pub fn with_jump_force(mut self, force: f32) -> Self {
        self.jump_force = force;
        self
    }

    /// Builder: set the foot probe radius.
    pub fn with_check_radius(mut self, radius: f32) -> Self {
        self.check_radius = radius;
        self
    }

    /// Builder: set the ground collision filter as (memberships, filters).
    pub fn with_ground_filter(mut self, memberships: u32, filters: u32) -> Self {
        self.ground_filter = Some((memberships, filters));
        self
    }

    /// Builder: set the falling and grounded gravity scales.
    pub fn with_gravity_scales(mut self, falling: f32, grounded: f32) -> Self {
        self.falling_gravity_scale = falling;
        self.grounded_gravity_scale = grounded;
        self
    }

    /// Builder: set the number of jumps available between landings.
    pub fn with_total_jumps(mut self, total: u32) -> Self {
        self.total_jumps = total;
        self
    }

    /// Builder: set the jump buffer window.
    pub fn with_jump_buffer_time(mut self, time: f32) -> Self {
        self.jump_buffer_time = time;
        self
    }

    /// Builder: set the slope ray length.
    pub fn with_slope_check_distance(mut self, distance: f32) -> Self {
        self.slope_check_distance = distance;
        self
    }

    /// Builder: set the steepest walkable slope in degrees.
    pub fn with_max_slope_angle(mut self, degrees: f32) -> Self {
        self.max_slope_angle = degrees;
        self
    }

    /// Builder: set the slope and default linear drags.
    pub fn with_drags(mut self, slope: f32, default: f32) -> Self {
        self.slope_drag = slope;
        self.default_drag = default;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_default_is_world_up() {
        let orientation = CharacterOrientation::default();
        assert_eq!(orientation.up(), Vec2::Y);
        assert_eq!(orientation.down(), Vec2::NEG_Y);
        assert_eq!(orientation.right(), Vec2::X);
        assert_eq!(orientation.left(), Vec2::NEG_X);
    }

    #[test]
    fn orientation_new_normalizes_input() {
        let orientation = CharacterOrientation::new(Vec2::new(0.0, 10.0));
        assert!((orientation.up() - Vec2::Y).length() < 0.001);
    }

    #[test]
    fn orientation_zero_up_falls_back_to_world_up() {
        let orientation = CharacterOrientation::new(Vec2::ZERO);
        assert_eq!(orientation.up(), Vec2::Y);

        let mut mutated = CharacterOrientation::default();
        mutated.set_up(Vec2::ZERO);
        assert_eq!(mutated.up(), Vec2::Y);
    }

    #[test]
    fn friction_materials() {
        assert_eq!(FrictionMaterial::full().coefficient, 1.0);
        assert_eq!(FrictionMaterial::full().combine, FrictionCombine::Max);
        assert_eq!(FrictionMaterial::none().coefficient, 0.0);
        assert_eq!(FrictionMaterial::none().combine, FrictionCombine::Min);
    }

    #[test]
    fn config_default_gravity_is_heavier_when_falling() {
        let config = ControllerConfig::default();
        assert!(config.falling_gravity_scale > config.grounded_gravity_scale);
    }

    #[test]
    fn config_default_slope_drag_is_lower() {
        let config = ControllerConfig::default();
        assert!(config.slope_drag < config.default_drag);
    }

    #[test]
    fn config_player_preset() {
        let player = ControllerConfig::player();
        let default = ControllerConfig::default();
        assert!(player.movement_speed >= default.movement_speed);
        assert!(player.jump_force >= default.jump_force);
    }

    #[test]
    fn config_builders() {
        let config = ControllerConfig::default()
            .with_max_slope_angle(60.0)
            .with_total_jumps(3)
            .with_gravity_scales(6.0, 3.0)
            .with_ground_filter(0b01, 0b10);

        assert_eq!(config.max_slope_angle, 60.0);
        assert_eq!(config.total_jumps, 3);
        assert_eq!(config.falling_gravity_scale, 6.0);
        assert_eq!(config.grounded_gravity_scale, 3.0);
        assert_eq!(config.ground_filter, Some((0b01, 0b10)));
    }
}
