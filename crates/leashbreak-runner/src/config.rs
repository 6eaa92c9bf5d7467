use serde::Deserialize;

use leashbreak_core::game::GameMode;
use leashbreak_core::side::PerSide;
use leashbreak_duel::{MatchSetup, SideControl};

use crate::error::RunnerError;

/// Top-level runner configuration, loaded from `leashbreak.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub mode: GameMode,
    pub seed: u64,
    pub session: SessionSettings,
    pub duel: DuelSettings,
    pub treat_attack: TreatAttackSettings,
    pub chat: ChatSettings,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Duel,
            seed: 0,
            session: SessionSettings::default(),
            duel: DuelSettings::default(),
            treat_attack: TreatAttackSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

/// Clock settings for the session loop.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Overrides the game's own tick rate when set.
    pub tick_rate_hz: Option<f32>,
    /// Simulated seconds per real second. Headless runs go faster than 1.
    pub time_scale: f32,
    /// Broadcast a snapshot every this many ticks (0 disables).
    pub snapshot_every_ticks: u32,
    /// Stop the session after this much simulated time (0 for no limit).
    pub max_sim_secs: f32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: None,
            time_scale: 1.0,
            snapshot_every_ticks: 1,
            max_sim_secs: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DuelSettings {
    pub left_character: String,
    pub right_character: String,
    pub left: SideControl,
    pub right: SideControl,
}

impl Default for DuelSettings {
    fn default() -> Self {
        let setup = MatchSetup::default();
        Self {
            left_character: setup.characters.left,
            right_character: setup.characters.right,
            left: SideControl::Ai {
                difficulty: "medium".to_string(),
            },
            right: setup.control.right,
        }
    }
}

impl DuelSettings {
    pub fn setup(&self, seed: u64) -> MatchSetup {
        MatchSetup {
            characters: PerSide::new(self.left_character.clone(), self.right_character.clone()),
            control: PerSide::new(self.left.clone(), self.right.clone()),
            seed,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TreatAttackSettings {
    pub character: String,
}

impl Default for TreatAttackSettings {
    fn default() -> Self {
        Self {
            character: "jazzy".to_string(),
        }
    }
}

/// Audience voting sources.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Connect the IRC bridge when `TWITCH_*` credentials are present.
    pub enabled: bool,
    /// Let simulated viewers vote from the start.
    pub auto_vote: bool,
}

impl RunnerConfig {
    /// Load config from `LEASHBREAK_CONFIG`, then `config/leashbreak.toml`,
    /// then defaults. A file that exists but does not parse is logged and
    /// skipped.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("LEASHBREAK_CONFIG")
            && let Some(config) = Self::try_path(&path)
        {
            return config;
        }
        Self::try_path("config/leashbreak.toml").unwrap_or_default()
    }

    fn try_path(path: &str) -> Option<Self> {
        if !std::path::Path::new(path).exists() {
            return None;
        }
        match Self::from_path(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Failed to load {path}: {e}, using defaults");
                None
            },
        }
    }

    pub fn from_path(path: &str) -> Result<Self, RunnerError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, RunnerError> {
        toml::from_str(contents).map_err(|e| RunnerError::Config(e.to_string()))
    }
}
