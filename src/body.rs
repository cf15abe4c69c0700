//! Per-tick body force accumulation.
//!
//! The controller expresses its effect on the body as explicit deltas: the
//! movement force accumulates here during a tick and is flushed into the
//! physics engine's force component at the end of it. Last tick's
//! contribution is subtracted at the start of the next, so forces applied
//! by user code on the same body survive untouched.

use bevy::prelude::*;

/// Accumulator for the forces this controller wants applied this tick.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct BodyForces {
    /// Force gathered during the current tick, not yet handed to physics.
    accumulated: Vec2,
    /// Force handed to physics last tick; subtracted before the next one.
    applied: Vec2,
}

impl BodyForces {
    /// Add a force to this tick's accumulation.
    pub fn add(&mut self, force: Vec2) {
        self.accumulated += force;
    }

    /// Force currently accumulated for this tick.
    pub fn accumulated(&self) -> Vec2 {
        self.accumulated
    }

    /// Begin a new tick: returns the force to subtract from the physics
    /// engine's force component (what we applied last tick) and clears both
    /// accumulators.
    pub(crate) fn prepare_new_tick(&mut self) -> Vec2 {
        let previous = self.applied;
        self.applied = Vec2::ZERO;
        self.accumulated = Vec2::ZERO;
        previous
    }

    /// End the tick: promote the accumulated force to "applied" and return
    /// it for handing to the physics engine.
    pub(crate) fn finalize_tick(&mut self) -> Vec2 {
        self.applied = self.accumulated;
        self.accumulated = Vec2::ZERO;
        self.applied
    }
}
