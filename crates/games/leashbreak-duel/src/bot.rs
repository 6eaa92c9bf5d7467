use rand::Rng;
use rand::rngs::StdRng;

use leashbreak_core::collectible::Collectible;
use leashbreak_core::controller::{ControlContext, Controller, ControllerKind, MoveIntent};
use leashbreak_core::effect::EffectKind;
use leashbreak_core::side::Side;

use crate::config::DifficultyConfig;

/// Close enough to the target to stop moving.
const ARRIVE_DISTANCE: f32 = 5.0;
/// Wander targets keep this far from the arena walls.
const WANDER_MARGIN: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Snack { id: u64, x: f32 },
    Wander { x: f32 },
}

/// Computer-controlled dog.
#[derive(Debug, Clone)]
pub struct AiController {
    difficulty: DifficultyConfig,
    decision_timer: f32,
    target: Option<Target>,
}

impl AiController {
    pub fn new(difficulty: DifficultyConfig) -> Self {
        Self {
            difficulty,
            decision_timer: 0.0,
            target: None,
        }
    }

    fn reaction_delay(&self) -> f32 {
        self.difficulty.reaction_delay_ms as f32 / 1000.0
    }

    /// How much the AI wants a snack. Higher is better.
    pub fn desirability(&self, side: &Side, snack: &Collectible) -> f32 {
        let (sx, sy) = side.center();
        let (cx, cy) = snack.center();
        let distance = ((cx - sx).powi(2) + (cy - sy).powi(2)).sqrt();

        let mut score = snack.point_value as f32 - distance * 0.5;
        if snack.is_penalty() && self.difficulty.avoids_penalties {
            score -= 300.0;
        }
        if self.difficulty.targets_powerups
            && let Some(effect) = snack.effect
        {
            match effect.kind {
                EffectKind::SpeedBoost => score += 100.0,
                EffectKind::Invincibility => score += 150.0,
                _ => {},
            }
        }
        score + (5.0 - snack.age).max(0.0) * 10.0
    }

    fn choose(&self, ctx: &ControlContext<'_>, rng: &mut StdRng) -> Option<Target> {
        let active: Vec<&Collectible> = ctx.snacks.iter().filter(|s| s.active).collect();
        if active.is_empty() {
            let arena = ctx.side.arena;
            let lo = arena.x + WANDER_MARGIN;
            let hi = arena.right() - WANDER_MARGIN;
            let x = if hi > lo { rng.random_range(lo..hi) } else { arena.center().0 };
            return Some(Target::Wander { x });
        }

        let pick = if rng.random::<f32>() > self.difficulty.decision_accuracy {
            active[rng.random_range(0..active.len())]
        } else {
            active
                .iter()
                .copied()
                .max_by(|a, b| {
                    self.desirability(ctx.side, a)
                        .total_cmp(&self.desirability(ctx.side, b))
                })
                .unwrap_or(active[0])
        };
        Some(Target::Snack {
            id: pick.id,
            x: pick.center().0,
        })
    }

    fn target_x(&self) -> Option<f32> {
        match self.target? {
            Target::Snack { x, .. } | Target::Wander { x } => Some(x),
        }
    }
}

impl Controller for AiController {
    fn kind(&self) -> ControllerKind {
        ControllerKind::Ai
    }

    fn decide(&mut self, ctx: &ControlContext<'_>, dt: f32, rng: &mut StdRng) -> MoveIntent {
        // Drop a target that was eaten or fell away; otherwise follow it.
        if let Some(Target::Snack { id, .. }) = self.target {
            match ctx.snacks.iter().find(|s| s.id == id && s.active) {
                Some(snack) => {
                    self.target = Some(Target::Snack {
                        id,
                        x: snack.center().0,
                    })
                },
                None => self.target = None,
            }
        }

        self.decision_timer -= dt;
        if self.decision_timer <= 0.0 {
            self.target = self.choose(ctx, rng);
            self.decision_timer = self.reaction_delay();
        }

        let Some(target_x) = self.target_x() else {
            return MoveIntent::IDLE;
        };
        let dx = target_x - ctx.side.center().0;
        if dx.abs() < ARRIVE_DISTANCE {
            return MoveIntent::IDLE;
        }
        let mut dir = dx.signum();
        if rng.random::<f32>() > self.difficulty.pathfinding_efficiency {
            dir += rng.random_range(-0.3..0.3);
        }
        MoveIntent {
            dx: dir.clamp(-1.0, 1.0),
        }
    }

    fn reset(&mut self) {
        self.decision_timer = 0.0;
        self.target = None;
    }
}
