use serde::{Deserialize, Serialize};

use crate::collectible::Collectible;
use crate::effect::EffectSpec;
use crate::side::{PerSide, Side, SideId};

/// Multiplier applied to snacks taken from the rival's arena.
pub const STEAL_BONUS: f32 = 1.5;

/// Axis-aligned rectangle in world pixels, origin top-left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Shrink every edge by `inset`, keeping the centre. Never goes below
    /// zero size.
    pub fn shrink(&self, inset: f32) -> Rect {
        let w = (self.w - 2.0 * inset).max(0.0);
        let h = (self.h - 2.0 * inset).max(0.0);
        Rect {
            x: self.x + (self.w - w) / 2.0,
            y: self.y + (self.h - h) / 2.0,
            w,
            h,
        }
    }

    /// Strict overlap. Touching edges and empty rects never intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.w <= 0.0 || self.h <= 0.0 || other.w <= 0.0 || other.h <= 0.0 {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x && x < self.right()
    }
}

/// One pickup made during collision resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub side: SideId,
    /// Arena the snack was taken from.
    pub arena: SideId,
    pub collectible_id: u64,
    pub snack_id: String,
    /// Points after steal bonus, multipliers and invincibility.
    pub points: i32,
    /// Score change actually applied after the zero floor.
    pub applied: i64,
    pub stolen: bool,
    pub effect: Option<EffectSpec>,
    pub effect_applied: bool,
}

/// Points a pickup is worth to a side.
///
/// Steals get `steal_bonus` first (truncated), then the score multiplier.
/// Invincible sides ignore negative values.
pub fn compute_points(
    point_value: i32,
    stolen: bool,
    steal_bonus: f32,
    score_multiplier: f32,
    invincible: bool,
) -> i32 {
    let base = if stolen {
        (point_value as f32 * steal_bonus) as i32
    } else {
        point_value
    };
    let points = (base as f32 * score_multiplier) as i32;
    if invincible && points < 0 { 0 } else { points }
}

/// Collect every active item in `items` that `side` overlaps.
pub fn collect_overlapping(
    side: &mut Side,
    arena: SideId,
    items: &mut [Collectible],
    steal_bonus: f32,
) -> Vec<Collection> {
    let stolen = arena != side.id;
    let hitbox = side.hitbox();
    let mut out = Vec::new();
    for item in items.iter_mut() {
        if !item.active || !hitbox.intersects(&item.hitbox()) {
            continue;
        }
        if !item.collect() {
            continue;
        }
        let points = compute_points(
            item.point_value,
            stolen,
            steal_bonus,
            side.effects.score_multiplier(),
            side.is_invincible,
        );
        let applied = side.add_points(points);
        let effect_applied = match item.effect {
            Some(spec) => side.apply_effect(spec),
            None => false,
        };
        tracing::trace!(
            side = %side.id,
            snack = %item.snack_id,
            points,
            stolen,
            "snack collected"
        );
        out.push(Collection {
            side: side.id,
            arena,
            collectible_id: item.id,
            snack_id: item.snack_id.clone(),
            points,
            applied,
            stolen,
            effect: item.effect,
            effect_applied,
        });
    }
    out
}

/// Resolve all pickups for one tick.
///
/// Each side is checked against its own arena first (left, then right), then
/// each extended side against the rival arena (left, then right). The first
/// check to overlap a collectible wins it.
pub fn resolve_collisions(
    sides: &mut PerSide<Side>,
    items: &mut PerSide<Vec<Collectible>>,
    steal_bonus: f32,
) -> Vec<Collection> {
    let mut out = Vec::new();
    for id in SideId::ALL {
        out.extend(collect_overlapping(
            &mut sides[id],
            id,
            &mut items[id],
            steal_bonus,
        ));
    }
    for id in SideId::ALL {
        if sides[id].is_extended() {
            let rival = id.rival();
            out.extend(collect_overlapping(
                &mut sides[id],
                rival,
                &mut items[rival],
                steal_bonus,
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effect::{EffectKind, EffectSpec};
    use crate::test_helpers::test_side;
    use crate::voting::LeashVote;

    fn sides() -> PerSide<Side> {
        PerSide::from_fn(test_side)
    }

    fn snack_at(id: u64, x: f32, y: f32, points: i32) -> Collectible {
        let mut c = Collectible::test_item(id, points);
        c.x = x;
        c.y = y;
        c
    }

    fn under(side: &Side, id: u64, points: i32) -> Collectible {
        let (cx, cy) = side.center();
        snack_at(id, cx - 16.0, cy - 16.0, points)
    }

    #[test]
    fn rect_overlap_is_strict() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(a.intersects(&Rect::new(5.0, 5.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 10.0, 10.0)));
        assert!(!a.intersects(&Rect::new(2.0, 2.0, 0.0, 0.0)));
    }

    #[test]
    fn shrink_keeps_centre() {
        let r = Rect::new(0.0, 0.0, 144.0, 144.0).shrink(40.0);
        assert_eq!(r, Rect::new(40.0, 40.0, 64.0, 64.0));
        assert_eq!(Rect::new(0.0, 0.0, 10.0, 10.0).shrink(20.0).w, 0.0);
    }

    #[test]
    fn steal_bonus_truncates_before_multiplier() {
        assert_eq!(compute_points(150, true, STEAL_BONUS, 1.0, false), 225);
        assert_eq!(compute_points(75, true, STEAL_BONUS, 2.0, false), 224);
        assert_eq!(compute_points(-200, false, STEAL_BONUS, 1.0, true), 0);
        assert_eq!(compute_points(-200, false, STEAL_BONUS, 1.0, false), -200);
    }

    #[test]
    fn own_arena_pickup_scores() {
        let mut s = sides();
        let mut items = PerSide::new(vec![under(&s.left, 1, 100)], Vec::new());
        let got = resolve_collisions(&mut s, &mut items, STEAL_BONUS);
        assert_eq!(got.len(), 1);
        assert_eq!(s.left.score, 100);
        assert!(!items.left[0].active);
        assert!(!got[0].stolen);
    }

    #[test]
    fn penalty_snack_floors_score() {
        let mut s = sides();
        s.left.score = 150;
        let mut items = PerSide::new(vec![under(&s.left, 1, -200)], Vec::new());
        let got = resolve_collisions(&mut s, &mut items, STEAL_BONUS);
        assert_eq!(s.left.score, 0);
        assert_eq!(got[0].applied, -150);
    }

    #[test]
    fn collectible_is_only_collected_once() {
        let mut s = sides();
        let mut items = PerSide::new(vec![under(&s.left, 1, 100)], Vec::new());
        resolve_collisions(&mut s, &mut items, STEAL_BONUS);
        let again = resolve_collisions(&mut s, &mut items, STEAL_BONUS);
        assert!(again.is_empty());
        assert_eq!(s.left.score, 100);
    }

    #[test]
    fn far_snack_not_collected() {
        let mut s = sides();
        let mut items = PerSide::new(vec![snack_at(1, 0.0, 0.0, 100)], Vec::new());
        assert!(resolve_collisions(&mut s, &mut items, STEAL_BONUS).is_empty());
        assert!(items.left[0].active);
    }

    #[test]
    fn normal_leash_cannot_steal() {
        let mut s = sides();
        let snack = under(&s.left, 1, 100);
        // Put the left dog's pickup inside the right arena's list.
        let mut items = PerSide::new(Vec::new(), vec![snack]);
        assert!(resolve_collisions(&mut s, &mut items, STEAL_BONUS).is_empty());
    }

    #[test]
    fn extended_side_steals_with_bonus() {
        let mut s = sides();
        s.left.apply_leash_vote(LeashVote::Extend);
        s.left.offset = s.left.leash.max - s.left.width;
        let snack = under(&s.left, 7, 100);
        let mut items = PerSide::new(Vec::new(), vec![snack]);
        let got = resolve_collisions(&mut s, &mut items, STEAL_BONUS);
        assert_eq!(got.len(), 1);
        assert!(got[0].stolen);
        assert_eq!(got[0].arena, SideId::Right);
        assert_eq!(s.left.score, 150);
    }

    #[test]
    fn owner_beats_thief_in_same_tick() {
        let mut s = sides();
        s.left.apply_leash_vote(LeashVote::Extend);
        s.left.offset = s.left.leash.max - s.left.width;
        // Right dog standing at its inner wall, overlapping the thief.
        s.right.offset = s.right.leash.max - s.right.width;
        let (lx, _) = s.left.center();
        let (rx, cy) = s.right.center();
        let mid = (lx + rx) / 2.0;
        let snack = snack_at(3, mid - 16.0, cy - 16.0, 100);
        assert!(s.left.hitbox().intersects(&snack.hitbox()));
        assert!(s.right.hitbox().intersects(&snack.hitbox()));
        let mut items = PerSide::new(Vec::new(), vec![snack]);
        let got = resolve_collisions(&mut s, &mut items, STEAL_BONUS);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].side, SideId::Right);
        assert_eq!(s.left.score, 0);
    }

    #[test]
    fn effect_snack_applies_effect() {
        let mut s = sides();
        let mut snack = under(&s.left, 1, 50);
        snack.effect = Some(EffectSpec::new(EffectKind::Invincibility, 1.0, 5.0));
        let mut items = PerSide::new(vec![snack], Vec::new());
        let got = resolve_collisions(&mut s, &mut items, STEAL_BONUS);
        assert!(got[0].effect_applied);
        assert!(s.left.is_invincible);
    }

    #[test]
    fn score_boost_multiplies_points() {
        let mut s = sides();
        s.left
            .apply_effect(EffectSpec::new(EffectKind::ScoreBoost, 2.0, 5.0));
        let mut items = PerSide::new(vec![under(&s.left, 1, 100)], Vec::new());
        resolve_collisions(&mut s, &mut items, STEAL_BONUS);
        assert_eq!(s.left.score, 200);
    }
}
