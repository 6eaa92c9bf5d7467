use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use leashbreak_core::collectible::{SnackDef, SpawnConfig, default_catalog};
use leashbreak_core::side::{BodyConfig, CharacterDef, default_roster};
use leashbreak_core::vote_sim::ChatSimConfig;
use leashbreak_core::voting::VotingConfig;

/// Data-driven configuration for the split-screen match.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    pub rules: RulesConfig,
    pub layout: LayoutConfig,
    pub dog: BodyConfig,
    pub leash: DuelLeashConfig,
    pub voting: VotingConfig,
    pub chat_sim: ChatSimConfig,
    pub spawn: SpawnConfig,
    pub scaling: ScalingConfig,
    pub levels: Vec<LevelConfig>,
    pub snacks: Vec<SnackDef>,
    pub difficulties: BTreeMap<String, DifficultyConfig>,
    pub characters: Vec<CharacterDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Best-of count. Even values are bumped to the next odd number.
    pub max_rounds: u32,
    pub countdown_from: u32,
    pub countdown_step_secs: f32,
    pub walk_in_secs: f32,
    /// Hold on the round result before the next countdown.
    pub round_end_pause_secs: f32,
    pub steal_bonus: f32,
    pub tick_rate_hz: f32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            countdown_from: 3,
            countdown_step_secs: 1.0,
            walk_in_secs: 3.5,
            round_end_pause_secs: 2.0,
            steal_bonus: 1.5,
            tick_rate_hz: 60.0,
        }
    }
}

/// Screen split into two arenas with a gap between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub game_width: f32,
    pub screen_height: f32,
    pub gap: f32,
    pub arena_top: f32,
    /// Space below the arenas kept for the HUD.
    pub hud_height: f32,
    /// Distance from arena bottom to the top of a dog.
    pub ground_offset: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            game_width: 960.0,
            screen_height: 720.0,
            gap: 16.0,
            arena_top: 65.0,
            hud_height: 75.0,
            ground_offset: 160.0,
        }
    }
}

/// Leash tuning for the split screen. The base range always spans the dog's
/// own arena; only the deltas are configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelLeashConfig {
    /// How far past the gap an extended dog reaches into the rival arena.
    pub cross_reach: f32,
    pub yank_delta: f32,
    pub minimum_range: f32,
    pub effect_duration_secs: f32,
}

impl Default for DuelLeashConfig {
    fn default() -> Self {
        Self {
            cross_reach: 150.0,
            yank_delta: 200.0,
            minimum_range: 200.0,
            effect_duration_secs: 5.0,
        }
    }
}

/// Per-round difficulty ramp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub base_fall_speed: f32,
    pub fall_speed_step: f32,
    pub max_fall_speed: f32,
    pub base_spawn_interval_secs: f32,
    pub spawn_interval_step_secs: f32,
    pub min_spawn_interval_secs: f32,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            base_fall_speed: 180.0,
            fall_speed_step: 30.0,
            max_fall_speed: 300.0,
            base_spawn_interval_secs: 1.0,
            spawn_interval_step_secs: 0.15,
            min_spawn_interval_secs: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub level_number: u32,
    pub round_duration_secs: f32,
    pub spawn_rate_multiplier: f32,
    pub snack_pool: Vec<String>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            level_number: 1,
            round_duration_secs: 60.0,
            spawn_rate_multiplier: 1.0,
            snack_pool: vec!["pizza".to_string()],
        }
    }
}

fn pool(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

pub fn default_levels() -> Vec<LevelConfig> {
    vec![
        LevelConfig {
            level_number: 1,
            round_duration_secs: 60.0,
            spawn_rate_multiplier: 1.0,
            snack_pool: pool(&["pizza", "bone", "broccoli", "red_bull"]),
        },
        LevelConfig {
            level_number: 2,
            round_duration_secs: 60.0,
            spawn_rate_multiplier: 1.2,
            snack_pool: pool(&[
                "pizza",
                "bone",
                "steak",
                "broccoli",
                "red_bull",
                "hot_pepper",
                "mud_pie",
            ]),
        },
        LevelConfig {
            level_number: 3,
            round_duration_secs: 60.0,
            spawn_rate_multiplier: 1.5,
            snack_pool: pool(&[
                "pizza",
                "bone",
                "steak",
                "broccoli",
                "red_bull",
                "hot_pepper",
                "golden_biscuit",
                "golden_bone",
                "mud_pie",
            ]),
        },
    ]
}

/// AI tuning for one difficulty preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyConfig {
    pub reaction_delay_ms: u32,
    /// Chance of picking the best snack instead of a random one.
    pub decision_accuracy: f32,
    /// Chance per tick of heading straight for the target.
    pub pathfinding_efficiency: f32,
    pub avoids_penalties: bool,
    pub targets_powerups: bool,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            reaction_delay_ms: 250,
            decision_accuracy: 0.8,
            pathfinding_efficiency: 0.85,
            avoids_penalties: true,
            targets_powerups: true,
        }
    }
}

pub fn default_difficulties() -> BTreeMap<String, DifficultyConfig> {
    BTreeMap::from([
        (
            "easy".to_string(),
            DifficultyConfig {
                reaction_delay_ms: 500,
                decision_accuracy: 0.5,
                pathfinding_efficiency: 0.6,
                avoids_penalties: false,
                targets_powerups: false,
            },
        ),
        ("medium".to_string(), DifficultyConfig::default()),
        (
            "hard".to_string(),
            DifficultyConfig {
                reaction_delay_ms: 100,
                decision_accuracy: 0.95,
                pathfinding_efficiency: 0.95,
                avoids_penalties: true,
                targets_powerups: true,
            },
        ),
    ])
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig::default(),
            layout: LayoutConfig::default(),
            dog: BodyConfig::default(),
            leash: DuelLeashConfig::default(),
            voting: VotingConfig::default(),
            chat_sim: ChatSimConfig::default(),
            spawn: SpawnConfig {
                floor_margin: 16.0,
                ..SpawnConfig::default()
            },
            scaling: ScalingConfig::default(),
            levels: default_levels(),
            snacks: default_catalog(),
            difficulties: default_difficulties(),
            characters: default_roster(),
        }
    }
}

impl DuelConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("LEASHBREAK_DUEL_CONFIG")
            && let Some(config) = Self::from_path(&path)
        {
            return config;
        }
        Self::from_path("config/duel.toml").unwrap_or_default()
    }

    fn from_path(path: &str) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        match toml::from_str::<Self>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                None
            },
        }
    }

    /// Level used for `round`. Rounds past the last level reuse it; an empty
    /// level list falls back to a single pizza-only level.
    pub fn level_for_round(&self, round: u32) -> LevelConfig {
        if self.levels.is_empty() {
            return LevelConfig::default();
        }
        if let Some(level) = self.levels.iter().find(|l| l.level_number == round) {
            return level.clone();
        }
        self.levels
            .iter()
            .filter(|l| l.level_number <= round)
            .max_by_key(|l| l.level_number)
            .or_else(|| self.levels.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Difficulty preset by name, `medium` when unknown.
    pub fn difficulty(&self, name: &str) -> DifficultyConfig {
        self.difficulties
            .get(name)
            .or_else(|| self.difficulties.get("medium"))
            .cloned()
            .unwrap_or_default()
    }

    /// Character by id, first roster entry or built-in default when unknown.
    pub fn character(&self, id: &str) -> CharacterDef {
        self.characters
            .iter()
            .find(|c| c.id == id)
            .or_else(|| self.characters.first())
            .cloned()
            .unwrap_or_default()
    }

    /// Catalogue entries, falling back to the built-ins when empty.
    pub fn catalog(&self) -> Vec<SnackDef> {
        if self.snacks.is_empty() {
            default_catalog()
        } else {
            self.snacks.clone()
        }
    }

    /// Odd best-of count, at least 1.
    pub fn max_rounds(&self) -> u32 {
        let n = self.rules.max_rounds.max(1);
        if n % 2 == 0 { n + 1 } else { n }
    }
}
