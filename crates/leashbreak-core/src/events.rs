use serde::{Deserialize, Serialize};

use crate::effect::EffectKind;
use crate::leash::LeashState;
use crate::side::{PerSide, SideId};
use crate::voting::LeashVote;

/// Fire-and-forget notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum GameSignal {
    CountdownTick {
        value: u32,
    },
    WalkInStarted {
        sides: Vec<SideId>,
        duration_secs: f32,
    },
    RoundStarted {
        round: u32,
        level: u32,
        duration_secs: f32,
    },
    SnackSpawned {
        arena: SideId,
        collectible_id: u64,
        snack_id: String,
    },
    SnackCollected {
        side: SideId,
        arena: SideId,
        collectible_id: u64,
        snack_id: String,
        points: i32,
        stolen: bool,
    },
    SnackDespawned {
        arena: SideId,
        collectible_id: u64,
    },
    EffectApplied {
        side: SideId,
        kind: EffectKind,
    },
    EffectBlocked {
        side: SideId,
        kind: EffectKind,
    },
    EffectExpired {
        side: SideId,
        kind: EffectKind,
    },
    VoteAccepted {
        option: LeashVote,
        voter_id: String,
    },
    VoteResolved {
        winner: Option<LeashVote>,
        extend_votes: usize,
        yank_votes: usize,
    },
    VotingReopened,
    LeashChanged {
        side: SideId,
        state: LeashState,
        max: f32,
    },
    LeashReset {
        side: SideId,
    },
    RoundEnded {
        round: u32,
        winner: Option<SideId>,
        scores: PerSide<u32>,
        round_wins: PerSide<u32>,
    },
    MatchEnded {
        winner: Option<SideId>,
        round_wins: PerSide<u32>,
    },
    GameOver {
        final_score: u32,
    },
}

impl GameSignal {
    /// Stable name for mapping to sounds and effects.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CountdownTick { .. } => "countdown_tick",
            Self::WalkInStarted { .. } => "walk_in_started",
            Self::RoundStarted { .. } => "round_started",
            Self::SnackSpawned { .. } => "snack_spawned",
            Self::SnackCollected { stolen: true, .. } => "snack_stolen",
            Self::SnackCollected { .. } => "snack_collected",
            Self::SnackDespawned { .. } => "snack_despawned",
            Self::EffectApplied { .. } => "effect_applied",
            Self::EffectBlocked { .. } => "effect_blocked",
            Self::EffectExpired { .. } => "effect_expired",
            Self::VoteAccepted { .. } => "vote_accepted",
            Self::VoteResolved {
                winner: Some(LeashVote::Extend),
                ..
            } => "vote_resolved_extend",
            Self::VoteResolved {
                winner: Some(LeashVote::Yank),
                ..
            } => "vote_resolved_yank",
            Self::VoteResolved { winner: None, .. } => "vote_resolved_tie",
            Self::VotingReopened => "voting_reopened",
            Self::LeashChanged { .. } => "leash_changed",
            Self::LeashReset { .. } => "leash_reset",
            Self::RoundEnded { .. } => "round_ended",
            Self::MatchEnded { .. } => "match_ended",
            Self::GameOver { .. } => "game_over",
        }
    }
}

/// Outbound signal buffer, filled during a tick and drained by the caller.
#[derive(Debug, Clone, Default)]
pub struct SignalQueue {
    pending: Vec<GameSignal>,
}

impl SignalQueue {
    pub fn push(&mut self, signal: GameSignal) {
        self.pending.push(signal);
    }

    pub fn drain(&mut self) -> Vec<GameSignal> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
