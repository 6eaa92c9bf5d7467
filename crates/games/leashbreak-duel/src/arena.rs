use leashbreak_core::collision::Rect;
use leashbreak_core::leash::LeashConfig;
use leashbreak_core::side::{BodyConfig, PerSide, Side};

use crate::config::{DuelLeashConfig, LayoutConfig};

/// Arena rectangles and the line the dogs stand on.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaLayout {
    pub arenas: PerSide<Rect>,
    pub dog_y: f32,
}

impl ArenaLayout {
    pub fn gap(&self) -> f32 {
        self.arenas.right.x - self.arenas.left.right()
    }
}

/// Split the game area into two equal arenas.
pub fn create_layout(config: &LayoutConfig, dog: &BodyConfig) -> ArenaLayout {
    let gap = config.gap.max(0.0);
    let width = ((config.game_width - gap) / 2.0).floor().max(dog.width);
    let height = (config.screen_height - config.arena_top - config.hud_height).max(dog.height);
    let left = Rect::new(0.0, config.arena_top, width, height);
    let right = Rect::new(width + gap, config.arena_top, width, height);
    let dog_y = (left.bottom() - config.ground_offset).clamp(left.y, left.bottom() - dog.height);
    ArenaLayout {
        arenas: PerSide::new(left, right),
        dog_y,
    }
}

/// Leash spanning the dog's own arena, extending across the gap and
/// `cross_reach` into the rival arena.
pub fn leash_for(layout: &ArenaLayout, leash: &DuelLeashConfig) -> LeashConfig {
    let width = layout.arenas.left.w;
    let reach = layout.gap() + leash.cross_reach.max(0.0);
    LeashConfig {
        base_min: 0.0,
        base_max: width,
        extend_delta: reach,
        max_extension: reach,
        yank_delta: leash.yank_delta.max(0.0),
        minimum_range: leash.minimum_range.clamp(0.0, width),
        effect_duration_secs: leash.effect_duration_secs,
    }
}

pub fn ease_out(progress: f32) -> f32 {
    let p = progress.clamp(0.0, 1.0);
    1.0 - (1.0 - p) * (1.0 - p)
}

/// Offset for a dog walking in from its anchor wall to the arena centre.
/// Starts at the leash minimum so the dog never leaves its leash range.
pub fn walk_in_offset(side: &Side, progress: f32) -> f32 {
    let start = side.leash.min;
    let end = side.home_offset();
    start + (end - start) * ease_out(progress)
}
