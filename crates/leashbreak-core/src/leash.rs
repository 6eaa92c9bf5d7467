use serde::{Deserialize, Serialize};

use crate::time::Countdown;

/// Which vote outcome is currently bending the leash.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeashState {
    #[default]
    Normal,
    Extended,
    Yanked,
}

/// Leash tuning. All distances are measured from the side's anchor wall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeashConfig {
    pub base_min: f32,
    pub base_max: f32,
    /// How far one `extend` pushes the max bound out.
    pub extend_delta: f32,
    /// Cap on how far past `base_max` repeated extends may reach.
    pub max_extension: f32,
    /// How far one `yank` pulls the max bound in.
    pub yank_delta: f32,
    /// The max bound never comes closer than this to the min bound.
    pub minimum_range: f32,
    /// Seconds before an extend/yank wears off and the bounds reset.
    pub effect_duration_secs: f32,
}

impl Default for LeashConfig {
    fn default() -> Self {
        Self {
            base_min: 50.0,
            base_max: 550.0,
            extend_delta: 120.0,
            max_extension: 120.0,
            yank_delta: 200.0,
            minimum_range: 300.0,
            effect_duration_secs: 5.0,
        }
    }
}

/// Mutable horizontal range constraint on a side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leash {
    pub min: f32,
    pub max: f32,
    pub state: LeashState,
    pub effect_timer: Countdown,
    config: LeashConfig,
}

impl Leash {
    pub fn new(config: LeashConfig) -> Self {
        let mut config = config;
        config.base_max = config.base_max.max(config.base_min + config.minimum_range);
        Self {
            min: config.base_min,
            max: config.base_max,
            state: LeashState::Normal,
            effect_timer: Countdown::idle(),
            config,
        }
    }

    pub fn config(&self) -> &LeashConfig {
        &self.config
    }

    /// Furthest the max bound may ever reach.
    pub fn ceiling(&self) -> f32 {
        self.config.base_max + self.config.max_extension.max(0.0)
    }

    /// Closest the max bound may ever come to the anchor.
    pub fn floor(&self) -> f32 {
        self.min + self.config.minimum_range
    }

    pub fn extend(&mut self) {
        self.max = (self.max + self.config.extend_delta).min(self.ceiling());
        self.begin_effect(LeashState::Extended);
    }

    pub fn yank(&mut self) {
        self.max = (self.max - self.config.yank_delta).max(self.floor());
        self.begin_effect(LeashState::Yanked);
    }

    fn begin_effect(&mut self, state: LeashState) {
        self.state = state;
        self.effect_timer
            .restart_with(self.config.effect_duration_secs);
    }

    /// Advance the effect timer. Returns `true` when the bounds snapped back.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.state == LeashState::Normal {
            return false;
        }
        if self.effect_timer.tick(dt) {
            self.reset();
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.min = self.config.base_min;
        self.max = self.config.base_max;
        self.state = LeashState::Normal;
        self.effect_timer = Countdown::idle();
    }

    pub fn is_extended(&self) -> bool {
        self.state == LeashState::Extended
    }

    /// Clamp a near-edge offset of a body `width` wide into the leash range.
    pub fn clamp(&self, offset: f32, width: f32) -> f32 {
        let hi = (self.max - width).max(self.min);
        offset.clamp(self.min, hi)
    }

    /// Remaining effect time as a fraction of the effect duration.
    pub fn effect_remaining(&self) -> f32 {
        if self.state == LeashState::Normal {
            return 0.0;
        }
        self.effect_timer.fraction_remaining()
    }
}
