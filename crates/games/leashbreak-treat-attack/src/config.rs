use serde::{Deserialize, Serialize};

use leashbreak_core::collectible::{SnackDef, SpawnConfig};
use leashbreak_core::collision::Rect;
use leashbreak_core::leash::LeashConfig;
use leashbreak_core::side::{BodyConfig, CharacterDef, default_roster};
use leashbreak_core::vote_sim::ChatSimConfig;
use leashbreak_core::voting::VotingConfig;

/// Configuration for the single-dog Treat Attack mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatAttackConfig {
    pub field: FieldConfig,
    pub dog: BodyConfig,
    pub leash: TreatLeashConfig,
    pub round_duration_secs: f32,
    pub spawn_interval_secs: f32,
    pub fall_speed: f32,
    pub spawn: SpawnConfig,
    pub treats: Vec<SnackDef>,
    pub voting: VotingConfig,
    pub chat_sim: ChatSimConfig,
    pub characters: Vec<CharacterDef>,
    pub tick_rate_hz: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub width: f32,
    pub height: f32,
    /// Top edge of the dog.
    pub ground_y: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            width: 720.0,
            height: 720.0,
            ground_y: 650.0,
        }
    }
}

impl FieldConfig {
    pub fn rect(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// Leash bounds as absolute x positions from the left wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TreatLeashConfig {
    pub min_x: f32,
    pub max_x: f32,
    pub extended_max_x: f32,
    pub yanked_max_x: f32,
    pub effect_duration_secs: f32,
}

impl Default for TreatLeashConfig {
    fn default() -> Self {
        Self {
            min_x: 50.0,
            max_x: 550.0,
            extended_max_x: 670.0,
            yanked_max_x: 350.0,
            effect_duration_secs: 5.0,
        }
    }
}

impl TreatLeashConfig {
    /// Express the absolute bounds as deltas for the shared leash model.
    /// One extend or yank lands exactly on the configured bound.
    pub fn to_leash(&self) -> LeashConfig {
        let max_x = self.max_x.max(self.min_x);
        let extend = (self.extended_max_x - max_x).max(0.0);
        let yanked = self.yanked_max_x.clamp(self.min_x, max_x);
        LeashConfig {
            base_min: self.min_x,
            base_max: max_x,
            extend_delta: extend,
            max_extension: extend,
            yank_delta: max_x - yanked,
            minimum_range: yanked - self.min_x,
            effect_duration_secs: self.effect_duration_secs,
        }
    }
}

fn treat(id: &str, name: &str, point_value: i32, spawn_weight: f32, bias_right: bool) -> SnackDef {
    SnackDef {
        id: id.to_string(),
        name: name.to_string(),
        point_value,
        spawn_weight,
        spawn_bias_right: bias_right,
        ..SnackDef::default()
    }
}

/// Built-in treats. The high-value ones land out of reach unless the leash is
/// extended.
pub fn default_treats() -> Vec<SnackDef> {
    vec![
        treat("treat", "Treat", 100, 50.0, false),
        treat("bone", "Bone", 150, 25.0, false),
        treat("steak", "Steak", 300, 15.0, true),
        treat("golden_biscuit", "Golden Biscuit", 500, 5.0, true),
        treat("broccoli", "Broccoli", -100, 10.0, false),
    ]
}

impl Default for TreatAttackConfig {
    fn default() -> Self {
        Self {
            field: FieldConfig::default(),
            dog: BodyConfig {
                width: 64.0,
                height: 64.0,
                hitbox_inset: 0.0,
                base_move_speed: 300.0,
            },
            leash: TreatLeashConfig::default(),
            round_duration_secs: 60.0,
            spawn_interval_secs: 1.5,
            fall_speed: 150.0,
            spawn: SpawnConfig {
                jitter_secs: 0.0,
                min_interval_secs: 0.3,
                first_spawn_delay_secs: 1.5,
                max_live: 15,
                padding: 50.0,
                snack_size: 48.0,
                hitbox_inset: 0.0,
                floor_margin: 0.0,
                bias_right_start: 0.6,
            },
            treats: default_treats(),
            voting: VotingConfig::default(),
            chat_sim: ChatSimConfig::default(),
            characters: default_roster(),
            tick_rate_hz: 60.0,
        }
    }
}

impl TreatAttackConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("LEASHBREAK_TREAT_ATTACK_CONFIG")
            && let Some(config) = Self::from_path(&path)
        {
            return config;
        }
        Self::from_path("config/treat_attack.toml").unwrap_or_default()
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

    pub fn character(&self, id: &str) -> CharacterDef {
        self.characters
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .unwrap_or_else(|| CharacterDef {
                id: id.to_string(),
                ..CharacterDef::default()
            })
    }

    /// Round length, 60 s when unset.
    pub fn round_secs(&self) -> f32 {
        if self.round_duration_secs > 0.0 {
            self.round_duration_secs
        } else {
            60.0
        }
    }
}
