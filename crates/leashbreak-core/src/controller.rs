use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::collectible::Collectible;
use crate::side::Side;

/// Horizontal movement request for one tick, `dx` in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveIntent {
    pub dx: f32,
}

impl MoveIntent {
    pub const IDLE: MoveIntent = MoveIntent { dx: 0.0 };
    pub const LEFT: MoveIntent = MoveIntent { dx: -1.0 };
    pub const RIGHT: MoveIntent = MoveIntent { dx: 1.0 };
}

/// Directional keys held for a side, as reported by the input layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldKeys {
    pub left: bool,
    pub right: bool,
}

impl HeldKeys {
    pub fn intent(self) -> MoveIntent {
        match (self.left, self.right) {
            (true, false) => MoveIntent::LEFT,
            (false, true) => MoveIntent::RIGHT,
            _ => MoveIntent::IDLE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    Human,
    Ai,
}

/// Everything a controller may look at when deciding.
pub struct ControlContext<'a> {
    pub side: &'a Side,
    /// Live snacks in the side's own arena.
    pub snacks: &'a [Collectible],
    pub held: HeldKeys,
}

/// Produces a movement intent for a side each tick.
pub trait Controller: Send + std::fmt::Debug {
    fn kind(&self) -> ControllerKind;

    fn decide(&mut self, ctx: &ControlContext<'_>, dt: f32, rng: &mut StdRng) -> MoveIntent;

    /// Forget per-round memory.
    fn reset(&mut self) {}
}

/// Follows the held keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct HumanController;

impl Controller for HumanController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Human
    }

    fn decide(&mut self, ctx: &ControlContext<'_>, _dt: f32, _rng: &mut StdRng) -> MoveIntent {
        ctx.held.intent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_cancel_out() {
        assert_eq!(HeldKeys { left: true, right: true }.intent(), MoveIntent::IDLE);
        assert_eq!(HeldKeys { left: true, right: false }.intent(), MoveIntent::LEFT);
        assert_eq!(HeldKeys { left: false, right: true }.intent(), MoveIntent::RIGHT);
        assert_eq!(HeldKeys::default().intent(), MoveIntent::IDLE);
    }
}
