//! Slope classification.
//!
//! Consumes the three slope rays and derives the standing-surface geometry:
//! slope angles, the movement tangent, and whether the surface is walkable.
//! This is where the friction material decision lives as well.

use bevy::prelude::*;

use crate::probe::{CollisionData, SlopeProbe};

/// Classified standing-surface state.
///
/// Recomputed fully each physics tick from the [`SlopeProbe`] results. The
/// only history kept across ticks is the previous downward angle, used to
/// detect transitions onto a differently-angled surface.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct SlopeState {
    /// Whether the character is considered to be on a slope this tick.
    pub on_slope: bool,
    /// Whether both slope angles are within the configured maximum.
    pub walkable: bool,
    /// Angle between the ground normal below and world up, in degrees.
    pub down_angle: f32,
    /// Angle between the nearest horizontal-ray normal and world up, in degrees.
    pub side_angle: f32,
    /// Unit vector perpendicular to the ground normal below; the movement
    /// axis while on a walkable slope.
    pub tangent: Vec2,
    /// Downward angle measured on the previous classification pass.
    prev_down_angle: f32,
}

impl Default for SlopeState {
    fn default() -> Self {
        Self {
            on_slope: false,
            walkable: false,
            down_angle: 0.0,
            side_angle: 0.0,
            tangent: Vec2::ZERO,
            prev_down_angle: 0.0,
        }
    }
}

impl SlopeState {
    /// Classify the standing surface from this tick's probe results.
    ///
    /// The vertical ray is evaluated first, then the horizontal rays. The
    /// horizontal result is written unconditionally, so it can clear an
    /// `on_slope` the vertical pass just set within the same tick. This
    /// mirrors the behavior the controller was tuned against; see DESIGN.md
    /// before changing the order.
    pub fn classify(&mut self, probe: &SlopeProbe, max_slope_angle: f32) {
        self.vertical_pass(probe.below.as_ref());
        self.horizontal_pass(probe.ahead.as_ref(), probe.behind.as_ref());
        self.walkable = self.down_angle <= max_slope_angle && self.side_angle <= max_slope_angle;
    }

    /// Evaluate the downward ray.
    ///
    /// On a miss, `down_angle` and `tangent` keep their previous values:
    /// classification degrades gracefully over a single missed raycast frame
    /// instead of snapping back to flat.
    fn vertical_pass(&mut self, below: Option<&CollisionData>) {
        let Some(hit) = below else {
            return;
        };

        self.tangent = hit.normal.perp().normalize_or_zero();
        self.down_angle = surface_angle(hit.normal);

        // Any measured change in the downward angle counts as a slope
        // transition, including between two differently-angled flats.
        if self.down_angle != self.prev_down_angle {
            self.on_slope = true;
        }
        self.prev_down_angle = self.down_angle;
    }

    /// Evaluate the horizontal rays. The front hit wins over the back hit;
    /// with neither, the side angle resets and `on_slope` is forced false.
    fn horizontal_pass(&mut self, ahead: Option<&CollisionData>, behind: Option<&CollisionData>) {
        if let Some(hit) = ahead {
            self.on_slope = true;
            self.side_angle = surface_angle(hit.normal);
        } else if let Some(hit) = behind {
            self.on_slope = true;
            self.side_angle = surface_angle(hit.normal);
        } else {
            self.side_angle = 0.0;
            self.on_slope = false;
        }
    }

    /// Whether the body should get the full-friction material this tick.
    ///
    /// Full friction holds the character still while idle on a walkable
    /// slope. Active input or too-steep terrain always gets the frictionless
    /// material so movement and sliding are never impeded.
    pub fn wants_full_friction(&self, move_x: f32) -> bool {
        self.on_slope && move_x == 0.0 && self.walkable
    }
}

/// Unsigned angle in degrees between a surface normal and world up.
///
/// Bounded to [0, 180] by construction.
pub fn surface_angle(normal: Vec2) -> f32 {
    normal.angle_to(Vec2::Y).abs().to_degrees()
}
