//! Ground contact state and marker components.
//!
//! [`GroundContact`] carries the grounded flag and its airborne hysteresis
//! twin. The [`Grounded`] and [`Airborne`] markers mirror it for convenient
//! query filtering; they are kept in sync by the controller systems.

use bevy::prelude::*;

/// Per-frame ground contact state.
///
/// `grounded` is the raw overlap result, refreshed every frame. `airborne`
/// is not simply its negation: it flips true once when contact is lost and
/// flips back false on the landing frame, so the airborne→grounded edge can
/// be observed exactly once per landing.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct GroundContact {
    /// Whether the foot probe overlaps ground this frame.
    pub grounded: bool,
    /// Whether the character has been off the ground since it was last on it.
    pub airborne: bool,
}

impl GroundContact {
    /// Fold this frame's overlap result into the contact state.
    ///
    /// Returns `true` exactly on the airborne→grounded transition (the
    /// landing frame). Repeated grounded frames return `false`, which is
    /// what keeps the jump budget from refilling mid-contact.
    pub fn apply_overlap(&mut self, overlap: bool) -> bool {
        self.grounded = overlap;

        if !overlap {
            self.airborne = true;
            return false;
        }

        if self.airborne {
            self.airborne = false;
            return true;
        }

        false
    }
}

/// Marker component indicating the character is grounded.
///
/// Added and removed by the controller based on the foot overlap test.
/// This is a marker component - it has no data, just indicates state.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character has left ground contact.
///
/// Mirrors [`GroundContact::airborne`], so it carries the same one-frame
/// hysteresis. Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;
