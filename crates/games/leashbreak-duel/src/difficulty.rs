use leashbreak_core::collectible::{SnackDef, resolve_pool};

use crate::config::{DuelConfig, ScalingConfig};

const FALLBACK_ROUND_SECS: f32 = 60.0;

/// Everything that changes from round to round.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTuning {
    pub level: u32,
    pub round_duration_secs: f32,
    pub fall_speed: f32,
    pub spawn_interval_secs: f32,
    pub snack_pool: Vec<SnackDef>,
}

/// Fall speed for `round` (1-based), rising linearly up to the cap.
pub fn fall_speed(scaling: &ScalingConfig, round: u32) -> f32 {
    let steps = round.saturating_sub(1) as f32;
    (scaling.base_fall_speed + scaling.fall_speed_step * steps).min(scaling.max_fall_speed)
}

/// Base spawn interval for `round`, shrinking linearly down to the floor.
pub fn base_spawn_interval(scaling: &ScalingConfig, round: u32) -> f32 {
    let steps = round.saturating_sub(1) as f32;
    (scaling.base_spawn_interval_secs - scaling.spawn_interval_step_secs * steps)
        .max(scaling.min_spawn_interval_secs)
}

pub fn tuning_for_round(config: &DuelConfig, round: u32) -> RoundTuning {
    let level = config.level_for_round(round);
    let multiplier = if level.spawn_rate_multiplier > 0.0 {
        level.spawn_rate_multiplier
    } else {
        1.0
    };
    let snack_pool = resolve_pool(&config.catalog(), &level.snack_pool);
    if snack_pool.is_empty() {
        tracing::warn!(level = level.level_number, "snack pool resolved empty, using default snack");
    }
    RoundTuning {
        level: level.level_number,
        round_duration_secs: if level.round_duration_secs > 0.0 {
            level.round_duration_secs
        } else {
            FALLBACK_ROUND_SECS
        },
        fall_speed: fall_speed(&config.scaling, round),
        spawn_interval_secs: base_spawn_interval(&config.scaling, round) / multiplier,
        snack_pool,
    }
}
