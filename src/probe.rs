//! Geometry probe result structures.
//!
//! These structures hold the results of the per-frame foot overlap test and
//! the per-tick slope raycasts. Backend-specific systems fill them in; the
//! controller systems only read them.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionData {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec2,
    /// World position of the hit point.
    pub point: Vec2,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a hit result.
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// The foot-probe circle used for the ground overlap test.
///
/// Exposed read-only for visualization; drawing it has no behavioral effect.
#[derive(Reflect, Debug, Clone, Copy, Default, PartialEq)]
pub struct FootCircle {
    /// Center of the probe circle in world space.
    pub center: Vec2,
    /// Radius of the probe circle.
    pub radius: f32,
}

impl FootCircle {
    /// Build the foot circle for a body at `position` whose collider extends
    /// `collider_bottom_offset` below its center.
    pub fn at(position: Vec2, collider_bottom_offset: f32, radius: f32) -> Self {
        Self {
            center: foot_anchor(position, collider_bottom_offset),
            radius,
        }
    }
}

/// Result of the per-frame ground overlap test.
///
/// Written once per frame by the backend's ground sensing system.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct GroundProbe {
    /// Whether the foot circle overlaps ground-classified geometry.
    pub overlap: bool,
    /// The circle that was tested, for diagnostics.
    pub circle: FootCircle,
}

/// Results of the per-tick slope raycasts.
///
/// Three short rays are cast from the foot anchor: one straight down and two
/// along the character's facing axis (forward and backward). Written once per
/// physics tick by the backend's slope probe system.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct SlopeProbe {
    /// Hit of the downward ray, if any.
    #[reflect(ignore)]
    pub below: Option<CollisionData>,
    /// Hit of the ray cast along the facing direction, if any.
    #[reflect(ignore)]
    pub ahead: Option<CollisionData>,
    /// Hit of the ray cast against the facing direction, if any.
    #[reflect(ignore)]
    pub behind: Option<CollisionData>,
}

impl SlopeProbe {
    /// Clear all ray results before a new probe pass.
    pub fn clear(&mut self) {
        self.below = None;
        self.ahead = None;
        self.behind = None;
    }

    /// Whether either horizontal ray hit.
    pub fn any_horizontal(&self) -> bool {
        self.ahead.is_some() || self.behind.is_some()
    }
}

/// Compute the foot anchor: the point at the body's lower collider edge from
/// which the overlap test and slope rays originate.
pub fn foot_anchor(position: Vec2, collider_bottom_offset: f32) -> Vec2 {
    position + Vec2::NEG_Y * collider_bottom_offset
}
