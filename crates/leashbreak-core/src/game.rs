use serde::{Deserialize, Serialize};

use crate::controller::HeldKeys;
use crate::events::GameSignal;
use crate::side::{PerSide, SideId};
use crate::snapshot::SnapshotError;
use crate::voting::{LeashVote, VoteSender};

/// Which game mode produced a session or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Duel,
    TreatAttack,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub mode: GameMode,
    pub name: String,
    pub description: String,
    pub sides: u8,
    pub estimated_duration_secs: f32,
}

/// Interface the host drives every game through.
///
/// The host owns the clock and the input sources; the game owns the
/// simulation and reports what happened as signals.
pub trait ArenaGame: Send {
    fn metadata(&self) -> GameMetadata;

    /// Advance the simulation by `dt` seconds. Returns the signals raised.
    fn update(&mut self, dt: f32) -> Vec<GameSignal>;

    /// Replace the held keys for a human-controlled side.
    fn set_input(&mut self, side: SideId, keys: HeldKeys);

    /// Cast a vote directly. Same rules as votes arriving through the queue.
    fn cast_vote(&mut self, option: LeashVote, voter_id: &str) -> bool;

    /// Handle for producers on other threads or tasks.
    fn vote_sender(&self) -> VoteSender;

    /// Cast a vote under a generated local voter id.
    fn inject_vote(&mut self, option: LeashVote) -> bool;

    fn toggle_auto_vote(&mut self) -> bool;

    fn serialize_state(&self) -> Result<Vec<u8>, SnapshotError>;

    fn apply_state(&mut self, state: &[u8]) -> Result<(), SnapshotError>;

    fn pause(&mut self);

    fn resume(&mut self);

    fn is_paused(&self) -> bool;

    /// Terminal: no further updates change anything.
    fn is_finished(&self) -> bool;

    /// Final outcome, once finished.
    fn result(&self) -> Option<MatchResult>;

    /// Simulation rate in Hz the host should drive `update` at.
    fn tick_rate(&self) -> f32 {
        60.0
    }
}

/// Per-round outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub level: u32,
    pub scores: PerSide<u32>,
    pub winner: Option<SideId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideSummary {
    pub side: SideId,
    pub character_id: String,
    pub name: String,
    pub round_wins: u32,
    pub last_round_score: u32,
    pub total_score: u32,
}

/// What the results screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub mode: GameMode,
    /// `None` on a tie, and always for single-dog modes.
    pub winner: Option<SideId>,
    pub rounds_played: u32,
    pub sides: Vec<SideSummary>,
    pub rounds: Vec<RoundRecord>,
}

impl MatchResult {
    pub fn summary(&self, side: SideId) -> Option<&SideSummary> {
        self.sides.iter().find(|s| s.side == side)
    }

    pub fn winner_name(&self) -> Option<&str> {
        let winner = self.winner?;
        self.summary(winner).map(|s| s.name.as_str())
    }
}
