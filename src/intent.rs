//! Movement input snapshot.
//!
//! The controller never subscribes to input events. Whatever produces input
//! (keyboard, gamepad, AI, network) writes the current state into
//! [`MoveIntent`] each frame, and the controller systems poll it.

use bevy::prelude::*;

/// Immutable-per-tick snapshot of movement input.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use slope_character_controller::prelude::*;
///
/// let mut intent = MoveIntent::default();
/// intent.set_axis(Vec2::new(1.0, 0.0));
/// intent.set_jump_pressed(true);
/// assert!(intent.jump_just_pressed());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct MoveIntent {
    /// Movement axis, each component in [-1, 1]. Only the x component
    /// steers locomotion; y is carried for input sources that report both.
    pub axis: Vec2,
    /// Whether the jump action is currently held.
    ///
    /// Set this every frame from your input source. The controller detects
    /// the rising edge itself; you never need to send a one-frame pulse.
    pub jump_pressed: bool,
    /// Previous frame's jump state, advanced by the controller at the end
    /// of each frame for edge detection.
    pub(crate) jump_pressed_prev: bool,
}

impl MoveIntent {
    /// Set the movement axis, clamping each component to [-1, 1].
    ///
    /// Last value wins; there is no queuing.
    pub fn set_axis(&mut self, axis: Vec2) {
        self.axis = axis.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    }

    /// Set the current jump-held state.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    /// Whether any horizontal input is active.
    pub fn is_moving(&self) -> bool {
        self.axis.x != 0.0
    }

    /// True only on the frame the jump input transitioned to pressed.
    pub fn jump_just_pressed(&self) -> bool {
        self.jump_pressed && !self.jump_pressed_prev
    }

    /// Advance the edge latch. Called once per frame after input handling.
    pub(crate) fn latch(&mut self) {
        self.jump_pressed_prev = self.jump_pressed;
    }
}
