//! Jump buffering and the multi-jump budget.
//!
//! Two independent pieces of state per character: a countdown that keeps a
//! jump press alive for a short grace window, and an integer budget of
//! remaining jumps that refills on landing.

use bevy::prelude::*;

/// Jump buffer and budget state.
///
/// The buffer counter is armed to the configured window on a jump press and
/// decremented by frame time otherwise. The decrement is unconditional and
/// the counter has no lower bound; anything at or below zero simply means
/// "expired". The budget is decremented by one per executed jump and refills
/// to the configured total on the airborne→grounded transition.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct JumpState {
    /// Remaining seconds of the jump input grace window.
    pub buffer_counter: f32,
    /// Remaining jumps before the character must touch ground again.
    pub jumps_remaining: u32,
}

impl JumpState {
    /// Create jump state with a full budget.
    ///
    /// Use this when spawning so a character that starts on the ground can
    /// jump before its first landing edge.
    pub fn new(total_jumps: u32) -> Self {
        Self {
            buffer_counter: 0.0,
            jumps_remaining: total_jumps,
        }
    }

    /// Arm the buffer for a fresh jump press.
    pub fn arm(&mut self, buffer_time: f32) {
        self.buffer_counter = buffer_time;
    }

    /// Count the buffer down by one frame's elapsed time.
    pub fn tick(&mut self, delta: f32) {
        self.buffer_counter -= delta;
    }

    /// Whether the buffer window is still open.
    pub fn is_armed(&self) -> bool {
        self.buffer_counter > 0.0
    }

    /// Refill the budget to the configured total. Called on landing.
    pub fn refill(&mut self, total_jumps: u32) {
        self.jumps_remaining = total_jumps;
    }

    /// Whether a jump may execute right now.
    ///
    /// Requires a standing surface no steeper than `max_slope_angle`, at
    /// least one jump left in the budget, and an open buffer window. Note
    /// that being grounded is deliberately not required: budgeted mid-air
    /// jumps are how double jumps work.
    pub fn can_jump(&self, down_angle: f32, max_slope_angle: f32) -> bool {
        down_angle <= max_slope_angle && self.jumps_remaining > 0 && self.is_armed()
    }

    /// Consume one jump: spend a unit of budget and close the buffer window
    /// so a single press never fires twice.
    pub fn consume(&mut self) {
        self.jumps_remaining = self.jumps_remaining.saturating_sub(1);
        self.buffer_counter = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_with_full_budget_and_expired_buffer() {
        let jump = JumpState::new(2);
        assert_eq!(jump.jumps_remaining, 2);
        assert!(!jump.is_armed());
    }

    #[test]
    fn arm_opens_the_window() {
        let mut jump = JumpState::new(1);
        jump.arm(0.2);
        assert!(jump.is_armed());
        assert_eq!(jump.buffer_counter, 0.2);
    }

    #[test]
    fn buffer_decreases_monotonically_and_goes_negative() {
        let mut jump = JumpState::new(1);
        jump.arm(0.1);

        jump.tick(0.06);
        assert!(jump.is_armed());

        jump.tick(0.06);
        assert!(!jump.is_armed());

        // No floor: the counter keeps decrementing and stays ineligible.
        jump.tick(0.06);
        assert!(jump.buffer_counter < 0.0);
        assert!(!jump.is_armed());
    }

    #[test]
    fn eligibility_requires_all_three_conditions() {
        let mut jump = JumpState::new(2);
        jump.arm(0.1);

        // Everything satisfied.
        assert!(jump.can_jump(30.0, 45.0));

        // Too steep.
        assert!(!jump.can_jump(50.0, 45.0));

        // Budget exhausted.
        let mut spent = jump;
        spent.jumps_remaining = 0;
        assert!(!spent.can_jump(30.0, 45.0));

        // Buffer expired.
        let mut expired = jump;
        expired.buffer_counter = 0.0;
        assert!(!expired.can_jump(30.0, 45.0));
    }

    #[test]
    fn boundary_angle_is_eligible() {
        let mut jump = JumpState::new(1);
        jump.arm(0.1);
        assert!(jump.can_jump(45.0, 45.0));
    }

    #[test]
    fn consume_spends_one_jump_and_zeroes_buffer() {
        let mut jump = JumpState::new(2);
        jump.arm(0.1);

        jump.consume();
        assert_eq!(jump.jumps_remaining, 1);
        assert_eq!(jump.buffer_counter, 0.0);
        assert!(!jump.is_armed());
    }

    #[test]
    fn consume_never_underflows_budget() {
        let mut jump = JumpState::new(0);
        jump.consume();
        assert_eq!(jump.jumps_remaining, 0);
    }

    #[test]
    fn refill_restores_the_configured_total() {
        let mut jump = JumpState::new(2);
        jump.consume();
        jump.consume();
        assert_eq!(jump.jumps_remaining, 0);

        jump.refill(2);
        assert_eq!(jump.jumps_remaining, 2);
    }

    #[test]
    fn ticking_alone_never_rearms() {
        let mut jump = JumpState::new(1);
        jump.arm(0.1);
        jump.consume();

        // Only a fresh press re-opens the window.
        jump.tick(0.016);
        assert!(!jump.is_armed());
    }
}
