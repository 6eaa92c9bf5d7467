use serde::{Deserialize, Serialize};

/// Timed modifiers a snack can put on a dog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    SpeedBoost,
    Slow,
    Invincibility,
    Chaos,
    ScoreBoost,
}

impl EffectKind {
    /// Penalties are blocked while invincible.
    pub fn is_penalty(self) -> bool {
        matches!(self, EffectKind::Slow | EffectKind::Chaos)
    }

    /// Whether the magnitude scales movement speed.
    pub fn affects_speed(self) -> bool {
        matches!(self, EffectKind::SpeedBoost | EffectKind::Slow)
    }
}

/// Effect description carried by a snack definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    #[serde(default = "default_magnitude")]
    pub magnitude: f32,
    /// Use `f32::INFINITY` for effects that last the whole round.
    #[serde(rename = "duration_seconds")]
    pub duration_secs: f32,
}

fn default_magnitude() -> f32 {
    1.0
}

impl EffectSpec {
    pub fn new(kind: EffectKind, magnitude: f32, duration_secs: f32) -> Self {
        Self {
            kind,
            magnitude,
            duration_secs,
        }
    }
}

/// An effect currently applied to a side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub kind: EffectKind,
    pub magnitude: f32,
    pub remaining: f32,
}

impl ActiveEffect {
    pub fn new(spec: EffectSpec) -> Self {
        Self {
            kind: spec.kind,
            magnitude: spec.magnitude,
            remaining: spec.duration_secs,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if self.remaining.is_finite() {
            self.remaining -= dt;
        }
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// The stack of effects on one side. Effects of the same kind stack
/// multiplicatively and expire independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectSet {
    effects: Vec<ActiveEffect>,
}

impl EffectSet {
    pub fn push(&mut self, spec: EffectSpec) {
        self.effects.push(ActiveEffect::new(spec));
    }

    /// Advance all timers and drop expired effects, returning their kinds.
    pub fn tick(&mut self, dt: f32) -> Vec<EffectKind> {
        let mut expired = Vec::new();
        self.effects.retain_mut(|effect| {
            effect.tick(dt);
            if effect.is_expired() {
                expired.push(effect.kind);
                false
            } else {
                true
            }
        });
        expired
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.effects.iter()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn speed_multiplier(&self) -> f32 {
        self.effects
            .iter()
            .filter(|e| e.kind.affects_speed())
            .map(|e| e.magnitude)
            .product()
    }

    pub fn score_multiplier(&self) -> f32 {
        self.effects
            .iter()
            .filter(|e| e.kind == EffectKind::ScoreBoost)
            .map(|e| e.magnitude)
            .product()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_effect_expires() {
        let mut e = ActiveEffect::new(EffectSpec::new(EffectKind::SpeedBoost, 1.5, 3.0));
        e.tick(2.0);
        assert!(!e.is_expired());
        e.tick(1.0);
        assert!(e.is_expired());
    }

    #[test]
    fn infinite_effect_persists() {
        let mut e = ActiveEffect::new(EffectSpec::new(EffectKind::Invincibility, 1.0, f32::INFINITY));
        e.tick(10_000.0);
        assert!(!e.is_expired());
    }

    #[test]
    fn multipliers_default_to_one() {
        let set = EffectSet::default();
        assert_eq!(set.speed_multiplier(), 1.0);
        assert_eq!(set.score_multiplier(), 1.0);
    }

    #[test]
    fn speed_effects_stack_multiplicatively() {
        let mut set = EffectSet::default();
        set.push(EffectSpec::new(EffectKind::SpeedBoost, 2.0, 5.0));
        set.push(EffectSpec::new(EffectKind::Slow, 0.5, 5.0));
        set.push(EffectSpec::new(EffectKind::ScoreBoost, 2.0, 5.0));
        assert!((set.speed_multiplier() - 1.0).abs() < 1e-6);
        assert!((set.score_multiplier() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn tick_reports_expired_kinds() {
        let mut set = EffectSet::default();
        set.push(EffectSpec::new(EffectKind::Chaos, 1.0, 1.0));
        set.push(EffectSpec::new(EffectKind::Invincibility, 1.0, 4.0));
        let expired = set.tick(1.5);
        assert_eq!(expired, vec![EffectKind::Chaos]);
        assert!(set.has(EffectKind::Invincibility));
        assert!(!set.has(EffectKind::Chaos));
    }

    #[test]
    fn effect_spec_reads_snack_json_shape() {
        let spec: EffectSpec =
            serde_json::from_str(r#"{"type":"speed_boost","magnitude":1.5,"duration_seconds":5.0}"#)
                .unwrap();
        assert_eq!(spec.kind, EffectKind::SpeedBoost);
        assert_eq!(spec.duration_secs, 5.0);
    }

    #[test]
    fn penalties_are_slow_and_chaos() {
        assert!(EffectKind::Slow.is_penalty());
        assert!(EffectKind::Chaos.is_penalty());
        assert!(!EffectKind::SpeedBoost.is_penalty());
        assert!(!EffectKind::Invincibility.is_penalty());
    }
}
