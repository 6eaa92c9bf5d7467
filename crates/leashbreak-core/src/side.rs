use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::collision::Rect;
use crate::controller::MoveIntent;
use crate::effect::{EffectKind, EffectSet, EffectSpec};
use crate::leash::{Leash, LeashConfig};
use crate::voting::LeashVote;

/// One of the two competing dogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideId {
    Left,
    Right,
}

impl SideId {
    pub const ALL: [SideId; 2] = [SideId::Left, SideId::Right];

    pub fn rival(self) -> Self {
        match self {
            SideId::Left => SideId::Right,
            SideId::Right => SideId::Left,
        }
    }

    pub fn index(self) -> usize {
        match self {
            SideId::Left => 0,
            SideId::Right => 1,
        }
    }
}

impl std::fmt::Display for SideId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideId::Left => write!(f, "left"),
            SideId::Right => write!(f, "right"),
        }
    }
}

/// A value kept for each side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub left: T,
    pub right: T,
}

impl<T> PerSide<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn from_fn(mut f: impl FnMut(SideId) -> T) -> Self {
        Self {
            left: f(SideId::Left),
            right: f(SideId::Right),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> PerSide<U> {
        PerSide {
            left: f(&self.left),
            right: f(&self.right),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SideId, &T)> {
        [(SideId::Left, &self.left), (SideId::Right, &self.right)].into_iter()
    }
}

impl<T> Index<SideId> for PerSide<T> {
    type Output = T;

    fn index(&self, id: SideId) -> &T {
        match id {
            SideId::Left => &self.left,
            SideId::Right => &self.right,
        }
    }
}

impl<T> IndexMut<SideId> for PerSide<T> {
    fn index_mut(&mut self, id: SideId) -> &mut T {
        match id {
            SideId::Left => &mut self.left,
            SideId::Right => &mut self.right,
        }
    }
}

/// A selectable dog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterDef {
    pub id: String,
    pub name: String,
    /// Multiplier on the base move speed.
    pub base_speed: f32,
    /// Whether this dog makes an entrance after the countdown.
    pub walk_in: bool,
}

impl Default for CharacterDef {
    fn default() -> Self {
        Self {
            id: "jazzy".to_string(),
            name: "Jazzy".to_string(),
            base_speed: 1.0,
            walk_in: true,
        }
    }
}

impl CharacterDef {
    pub fn new(id: &str, name: &str, base_speed: f32, walk_in: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            base_speed,
            walk_in,
        }
    }
}

/// The built-in roster.
pub fn default_roster() -> Vec<CharacterDef> {
    vec![
        CharacterDef::new("jazzy", "Jazzy", 1.0, true),
        CharacterDef::new("biggie", "Biggie", 0.85, false),
        CharacterDef::new("prissy", "Prissy", 1.15, false),
        CharacterDef::new("dash", "Dash", 1.25, false),
    ]
}

/// Body dimensions and movement speed shared by all dogs in a mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub width: f32,
    pub height: f32,
    /// Shrink applied to every edge of the body for pickups.
    pub hitbox_inset: f32,
    /// Pixels per second before character and effect multipliers.
    pub base_move_speed: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            width: 144.0,
            height: 144.0,
            hitbox_inset: 40.0,
            base_move_speed: 240.0,
        }
    }
}

/// What happened to a side during its per-tick effect update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideTick {
    pub expired: Vec<EffectKind>,
    pub leash_reset: bool,
}

/// A dog on the field: position, leash, effects and round score.
///
/// Horizontal position is stored as `offset`, the distance of the dog's near
/// edge from its anchor wall. The left side is anchored to the left wall of
/// its arena, the right side to the right wall of its arena, so the leash max
/// always points toward the rival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Side {
    pub id: SideId,
    pub character_id: String,
    pub name: String,
    pub arena: Rect,
    pub offset: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub hitbox_inset: f32,
    pub move_speed: f32,
    pub velocity: f32,
    pub facing_right: bool,
    pub leash: Leash,
    pub effects: EffectSet,
    pub is_invincible: bool,
    pub controls_flipped: bool,
    pub score: u32,
}

impl Side {
    pub fn new(
        id: SideId,
        character: &CharacterDef,
        body: &BodyConfig,
        arena: Rect,
        y: f32,
        leash: LeashConfig,
    ) -> Self {
        let mut side = Self {
            id,
            character_id: character.id.clone(),
            name: character.name.clone(),
            arena,
            offset: 0.0,
            y,
            width: body.width,
            height: body.height,
            hitbox_inset: body.hitbox_inset,
            move_speed: body.base_move_speed * character.base_speed,
            velocity: 0.0,
            facing_right: id == SideId::Left,
            leash: Leash::new(leash),
            effects: EffectSet::default(),
            is_invincible: false,
            controls_flipped: false,
            score: 0,
        };
        side.offset = side.home_offset();
        side
    }

    /// Offset that centres the dog in its arena, respecting the leash.
    pub fn home_offset(&self) -> f32 {
        self.leash
            .clamp((self.arena.w - self.width) / 2.0, self.width)
    }

    /// World x of the dog's left edge.
    pub fn world_x(&self) -> f32 {
        self.offset_to_world_x(self.offset)
    }

    pub fn offset_to_world_x(&self, offset: f32) -> f32 {
        match self.id {
            SideId::Left => self.arena.x + offset,
            SideId::Right => self.arena.right() - offset - self.width,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.world_x(), self.y, self.width, self.height)
    }

    pub fn hitbox(&self) -> Rect {
        self.bounds().shrink(self.hitbox_inset)
    }

    pub fn center(&self) -> (f32, f32) {
        self.bounds().center()
    }

    pub fn is_extended(&self) -> bool {
        self.leash.is_extended()
    }

    /// Turn a movement intent into a velocity. Chaos flips the direction.
    pub fn apply_intent(&mut self, intent: MoveIntent) {
        let mut dir = intent.dx.clamp(-1.0, 1.0);
        if self.controls_flipped {
            dir = -dir;
        }
        self.velocity = dir * self.move_speed * self.effects.speed_multiplier();
        if dir > 0.0 {
            self.facing_right = true;
        } else if dir < 0.0 {
            self.facing_right = false;
        }
    }

    /// Integrate velocity and clamp to the leash.
    pub fn advance(&mut self, dt: f32) {
        let world_dx = self.velocity * dt;
        let local_dx = match self.id {
            SideId::Left => world_dx,
            SideId::Right => -world_dx,
        };
        self.offset = self.leash.clamp(self.offset + local_dx, self.width);
    }

    pub fn clamp_to_leash(&mut self) {
        self.offset = self.leash.clamp(self.offset, self.width);
    }

    pub fn apply_leash_vote(&mut self, vote: LeashVote) {
        match vote {
            LeashVote::Extend => self.leash.extend(),
            LeashVote::Yank => self.leash.yank(),
        }
        self.clamp_to_leash();
    }

    /// Tick effect and leash timers, reverting derived flags on expiry.
    pub fn update_effects(&mut self, dt: f32) -> SideTick {
        let expired = self.effects.tick(dt);
        let leash_reset = self.leash.tick(dt);
        if leash_reset {
            self.clamp_to_leash();
        }
        self.refresh_flags();
        SideTick {
            expired,
            leash_reset,
        }
    }

    /// Apply a snack effect. Penalties bounce off an invincible dog.
    pub fn apply_effect(&mut self, spec: EffectSpec) -> bool {
        if self.is_invincible && spec.kind.is_penalty() {
            return false;
        }
        self.effects.push(spec);
        self.refresh_flags();
        true
    }

    fn refresh_flags(&mut self) {
        self.is_invincible = self.effects.has(EffectKind::Invincibility);
        self.controls_flipped = self.effects.has(EffectKind::Chaos);
    }

    /// Add (or subtract) points, flooring the score at zero. Returns the
    /// change actually applied.
    pub fn add_points(&mut self, points: i32) -> i64 {
        let before = i64::from(self.score);
        let after = (before + i64::from(points)).clamp(0, i64::from(u32::MAX));
        self.score = after as u32;
        after - before
    }

    /// Fresh state for a new round.
    pub fn reset_for_round(&mut self) {
        self.score = 0;
        self.effects.clear();
        self.leash.reset();
        self.refresh_flags();
        self.velocity = 0.0;
        self.offset = self.home_offset();
    }
}
