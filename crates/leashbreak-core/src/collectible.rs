use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::collision::Rect;
use crate::effect::{EffectKind, EffectSpec};

/// A snack type as it appears in the catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnackDef {
    pub id: String,
    pub name: String,
    pub point_value: i32,
    pub spawn_weight: f32,
    pub effect: Option<EffectSpec>,
    /// Stationary snacks vanish after this many seconds.
    pub despawn_secs: Option<f32>,
    /// Spawn in the right part of the field (Treat Attack).
    pub spawn_bias_right: bool,
}

impl Default for SnackDef {
    fn default() -> Self {
        Self {
            id: "pizza".to_string(),
            name: "Pizza".to_string(),
            point_value: 100,
            spawn_weight: 40.0,
            effect: None,
            despawn_secs: None,
            spawn_bias_right: false,
        }
    }
}

impl SnackDef {
    fn plain(id: &str, name: &str, point_value: i32, spawn_weight: f32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            point_value,
            spawn_weight,
            ..Self::default()
        }
    }

    fn with_effect(mut self, kind: EffectKind, magnitude: f32, duration_secs: f32) -> Self {
        self.effect = Some(EffectSpec::new(kind, magnitude, duration_secs));
        self
    }
}

/// Built-in snack catalogue used when no config provides one.
pub fn default_catalog() -> Vec<SnackDef> {
    vec![
        SnackDef::default(),
        SnackDef::plain("bone", "Bone", 150, 20.0),
        SnackDef::plain("steak", "Steak", 500, 8.0),
        SnackDef::plain("broccoli", "Broccoli", -200, 15.0),
        SnackDef::plain("red_bull", "Red Bull", 50, 6.0).with_effect(
            EffectKind::SpeedBoost,
            1.5,
            5.0,
        ),
        SnackDef::plain("hot_pepper", "Hot Pepper", 50, 5.0).with_effect(
            EffectKind::Chaos,
            1.0,
            4.0,
        ),
        SnackDef::plain("golden_biscuit", "Golden Biscuit", 200, 3.0).with_effect(
            EffectKind::Invincibility,
            1.0,
            5.0,
        ),
        SnackDef::plain("golden_bone", "Golden Bone", 100, 3.0).with_effect(
            EffectKind::ScoreBoost,
            2.0,
            6.0,
        ),
        SnackDef::plain("mud_pie", "Mud Pie", -100, 5.0).with_effect(
            EffectKind::Slow,
            0.5,
            3.0,
        ),
    ]
}

/// Look up snack ids in a catalogue, skipping unknown ones.
pub fn resolve_pool(catalog: &[SnackDef], ids: &[String]) -> Vec<SnackDef> {
    ids.iter()
        .filter_map(|id| catalog.iter().find(|d| &d.id == id).cloned())
        .collect()
}

/// Weighted random pick. Non-positive weights never win unless every weight
/// is non-positive, in which case the first entry is returned.
pub fn pick_weighted<'a, R: Rng + ?Sized>(pool: &'a [SnackDef], rng: &mut R) -> Option<&'a SnackDef> {
    let total: f32 = pool.iter().map(|d| d.spawn_weight.max(0.0)).sum();
    if total <= 0.0 {
        return pool.first();
    }
    let roll = rng.random::<f32>() * total;
    let mut acc = 0.0;
    for def in pool {
        acc += def.spawn_weight.max(0.0);
        if roll < acc {
            return Some(def);
        }
    }
    pool.iter().rev().find(|d| d.spawn_weight > 0.0)
}

/// A live snack in an arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    pub id: u64,
    pub snack_id: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub hitbox_inset: f32,
    pub point_value: i32,
    pub effect: Option<EffectSpec>,
    pub fall_speed: f32,
    /// Removed once its top passes this line.
    pub floor_y: f32,
    pub despawn_after: Option<f32>,
    pub age: f32,
    pub active: bool,
    pub collected: bool,
}

impl Collectible {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.size, self.size)
    }

    pub fn hitbox(&self) -> Rect {
        self.bounds().shrink(self.hitbox_inset)
    }

    pub fn center(&self) -> (f32, f32) {
        self.bounds().center()
    }

    pub fn is_penalty(&self) -> bool {
        self.point_value < 0
    }

    /// Fall and age. Returns `false` once the snack has left play.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.active {
            return false;
        }
        self.age += dt;
        self.y += self.fall_speed * dt;
        let timed_out = self.despawn_after.is_some_and(|t| self.age >= t);
        if self.y > self.floor_y || timed_out {
            self.active = false;
        }
        self.active
    }

    /// Check-and-mark in one step. Returns `true` only for the first caller.
    pub fn collect(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        self.collected = true;
        true
    }

    #[cfg(test)]
    pub(crate) fn test_item(id: u64, point_value: i32) -> Self {
        Self {
            id,
            snack_id: "test".to_string(),
            x: 0.0,
            y: 0.0,
            size: 32.0,
            hitbox_inset: 0.0,
            point_value,
            effect: None,
            fall_speed: 0.0,
            floor_y: 10_000.0,
            despawn_after: None,
            age: 0.0,
            active: true,
            collected: false,
        }
    }
}

/// Spawner tuning shared by every arena in a mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub jitter_secs: f32,
    pub min_interval_secs: f32,
    pub first_spawn_delay_secs: f32,
    pub max_live: usize,
    /// Horizontal margin kept clear at both arena walls.
    pub padding: f32,
    pub snack_size: f32,
    pub hitbox_inset: f32,
    /// Snacks leave play this far above the arena bottom.
    pub floor_margin: f32,
    /// Left edge of right-biased spawns, as a fraction of arena width.
    pub bias_right_start: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            jitter_secs: 0.3,
            min_interval_secs: 0.2,
            first_spawn_delay_secs: 0.5,
            max_live: 15,
            padding: 20.0,
            snack_size: 64.0,
            hitbox_inset: 10.0,
            floor_margin: 0.0,
            bias_right_start: 0.6,
        }
    }
}

/// Per-arena spawn timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawner {
    pub interval_secs: f32,
    pub fall_speed: f32,
    timer: f32,
    config: SpawnConfig,
}

impl Spawner {
    pub fn new(config: SpawnConfig, interval_secs: f32, fall_speed: f32) -> Self {
        let mut spawner = Self {
            interval_secs: 0.0,
            fall_speed,
            timer: config.first_spawn_delay_secs,
            config,
        };
        spawner.set_interval(interval_secs);
        spawner
    }

    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    pub fn set_interval(&mut self, secs: f32) {
        self.interval_secs = secs.max(self.config.min_interval_secs);
    }

    pub fn reset(&mut self) {
        self.timer = self.config.first_spawn_delay_secs;
    }

    pub fn time_to_next(&self) -> f32 {
        self.timer.max(0.0)
    }

    fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let j = self.config.jitter_secs;
        let jitter = if j > 0.0 { rng.random_range(-j..=j) } else { 0.0 };
        (self.interval_secs + jitter).max(self.config.min_interval_secs)
    }

    /// Advance the timer and maybe spawn one snack into `area`.
    ///
    /// An empty pool falls back to the default snack. When `live` has hit the
    /// cap the timer still rolls over but nothing spawns.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        area: Rect,
        live: usize,
        pool: &[SnackDef],
        next_id: &mut u64,
        rng: &mut R,
    ) -> Option<Collectible> {
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        self.timer = self.next_delay(rng);
        if live >= self.config.max_live {
            return None;
        }
        let fallback = SnackDef::default();
        let def = pick_weighted(pool, rng).unwrap_or(&fallback);
        Some(self.spawn(def, area, next_id, rng))
    }

    /// Build a snack just above `area` at a random x.
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        def: &SnackDef,
        area: Rect,
        next_id: &mut u64,
        rng: &mut R,
    ) -> Collectible {
        let size = self.config.snack_size;
        let hi = area.right() - self.config.padding - size;
        let lo = if def.spawn_bias_right {
            area.x + area.w * self.config.bias_right_start
        } else {
            area.x + self.config.padding
        };
        let x = if hi > lo { rng.random_range(lo..hi) } else { hi.max(area.x) };
        let id = *next_id;
        *next_id += 1;
        Collectible {
            id,
            snack_id: def.id.clone(),
            x,
            y: area.y - size,
            size,
            hitbox_inset: self.config.hitbox_inset,
            point_value: def.point_value,
            effect: def.effect,
            fall_speed: if def.despawn_secs.is_some() { 0.0 } else { self.fall_speed },
            floor_y: area.bottom() - self.config.floor_margin,
            despawn_after: def.despawn_secs,
            age: 0.0,
            active: true,
            collected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn area() -> Rect {
        Rect::new(0.0, 0.0, 400.0, 600.0)
    }

    #[test]
    fn default_catalog_has_penalties_and_effects() {
        let cat = default_catalog();
        assert!(cat.iter().any(|d| d.id == "broccoli" && d.point_value == -200));
        assert!(cat.iter().any(|d| d.effect.is_some()));
        assert_eq!(cat[0].id, "pizza");
    }

    #[test]
    fn resolve_pool_skips_unknown_ids() {
        let cat = default_catalog();
        let pool = resolve_pool(&cat, &["bone".into(), "nope".into(), "steak".into()]);
        let ids: Vec<_> = pool.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["bone", "steak"]);
    }

    #[test]
    fn weighted_pick_ignores_zero_weights() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = vec![
            SnackDef::plain("never", "Never", 1, 0.0),
            SnackDef::plain("always", "Always", 1, 5.0),
        ];
        for _ in 0..100 {
            assert_eq!(pick_weighted(&pool, &mut rng).map(|d| d.id.as_str()), Some("always"));
        }
        assert!(pick_weighted(&[], &mut rng).is_none());
    }

    #[test]
    fn falling_snack_despawns_past_floor() {
        let mut c = Collectible::test_item(1, 100);
        c.fall_speed = 100.0;
        c.floor_y = 50.0;
        assert!(c.advance(0.4));
        assert!(!c.advance(0.2));
        assert!(!c.collected);
        assert!(!c.collect(), "inactive snack cannot be collected");
    }

    #[test]
    fn stationary_snack_times_out() {
        let mut c = Collectible::test_item(1, 100);
        c.despawn_after = Some(1.0);
        assert!(c.advance(0.9));
        assert!(!c.advance(0.1));
    }

    #[test]
    fn collect_is_one_shot() {
        let mut c = Collectible::test_item(1, 100);
        assert!(c.collect());
        assert!(!c.collect());
        assert!(!c.advance(1.0));
    }

    #[test]
    fn spawner_waits_for_first_delay() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = Spawner::new(SpawnConfig::default(), 1.0, 180.0);
        let mut next_id = 1;
        let pool = default_catalog();
        assert!(s.tick(0.25, area(), 0, &pool, &mut next_id, &mut rng).is_none());
        let c = s.tick(0.25, area(), 0, &pool, &mut next_id, &mut rng);
        assert!(c.is_some());
        assert_eq!(next_id, 2);
    }

    #[test]
    fn spawner_respects_live_cap() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = Spawner::new(SpawnConfig::default(), 1.0, 180.0);
        let mut next_id = 1;
        assert!(s.tick(5.0, area(), 15, &default_catalog(), &mut next_id, &mut rng).is_none());
        assert_eq!(next_id, 1);
    }

    #[test]
    fn empty_pool_falls_back_to_pizza() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut s = Spawner::new(SpawnConfig::default(), 1.0, 180.0);
        let mut next_id = 1;
        let c = s.tick(5.0, area(), 0, &[], &mut next_id, &mut rng);
        assert_eq!(c.map(|c| c.snack_id), Some("pizza".to_string()));
    }

    #[test]
    fn interval_clamped_to_minimum() {
        let s = Spawner::new(SpawnConfig::default(), 0.01, 180.0);
        assert_eq!(s.interval_secs, 0.2);
    }

    #[test]
    fn right_biased_spawn_lands_in_right_part() {
        let mut rng = StdRng::seed_from_u64(9);
        let s = Spawner::new(SpawnConfig::default(), 1.0, 150.0);
        let mut def = SnackDef::default();
        def.spawn_bias_right = true;
        let mut next_id = 1;
        for _ in 0..50 {
            let c = s.spawn(&def, area(), &mut next_id, &mut rng);
            assert!(c.x >= 240.0);
            assert!(c.x + c.size <= 380.0);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn spawns_stay_inside_padding(seed in any::<u64>(), w in 150.0f32..1200.0) {
                let mut rng = StdRng::seed_from_u64(seed);
                let s = Spawner::new(SpawnConfig::default(), 1.0, 150.0);
                let arena = Rect::new(100.0, 0.0, w, 600.0);
                let mut next_id = 1;
                let c = s.spawn(&SnackDef::default(), arena, &mut next_id, &mut rng);
                prop_assert!(c.x >= arena.x + 20.0);
                prop_assert!(c.x + c.size <= arena.right() - 20.0 + 0.001);
            }
        }
    }
}
