use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::voting::{LeashVote, VotingSystem};

const MAX_BOT_ID: u32 = 99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSimConfig {
    pub auto_vote: bool,
    pub auto_vote_interval_secs: f32,
    pub auto_vote_jitter_secs: f32,
}

impl Default for ChatSimConfig {
    fn default() -> Self {
        Self {
            auto_vote: false,
            auto_vote_interval_secs: 2.0,
            auto_vote_jitter_secs: 0.5,
        }
    }
}

/// Local stand-in for a chat audience: click-to-vote and an optional stream
/// of random bot votes while the window is open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSimulator {
    pub auto_vote: bool,
    next_bot: u32,
    timer: f32,
    config: ChatSimConfig,
}

impl ChatSimulator {
    pub fn new(config: ChatSimConfig) -> Self {
        Self {
            auto_vote: config.auto_vote,
            next_bot: 1,
            timer: config.auto_vote_interval_secs,
            config,
        }
    }

    /// Next generated voter id, cycling `Bot1..=Bot99`.
    pub fn next_voter_id(&mut self) -> String {
        let id = format!("Bot{}", self.next_bot);
        self.next_bot = self.next_bot % MAX_BOT_ID + 1;
        id
    }

    /// Cast one vote under a fresh bot id. Returns the id when accepted.
    pub fn inject_vote(&mut self, voting: &mut VotingSystem, option: LeashVote) -> Option<String> {
        let voter = self.next_voter_id();
        let accepted = voting.cast_vote(option, &voter);
        tracing::debug!(voter = %voter, option = %option, accepted, "simulated vote");
        accepted.then_some(voter)
    }

    pub fn toggle_auto_vote(&mut self) -> bool {
        self.auto_vote = !self.auto_vote;
        self.timer = self.config.auto_vote_interval_secs;
        self.auto_vote
    }

    /// Drive auto-voting. Returns the vote cast this tick, if any.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        voting: &mut VotingSystem,
        rng: &mut R,
    ) -> Option<(LeashVote, String)> {
        if !self.auto_vote || !voting.is_open() {
            return None;
        }
        self.timer -= dt;
        if self.timer > 0.0 {
            return None;
        }
        let j = self.config.auto_vote_jitter_secs;
        let jitter = if j > 0.0 { rng.random_range(-j..=j) } else { 0.0 };
        self.timer = (self.config.auto_vote_interval_secs + jitter).max(0.05);
        let option = if rng.random::<bool>() {
            LeashVote::Extend
        } else {
            LeashVote::Yank
        };
        let voter = self.next_voter_id();
        voting.cast_vote(option, &voter).then_some((option, voter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voting::VotingConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn bot_ids_cycle_after_99() {
        let mut sim = ChatSimulator::new(ChatSimConfig::default());
        assert_eq!(sim.next_voter_id(), "Bot1");
        for _ in 0..97 {
            sim.next_voter_id();
        }
        assert_eq!(sim.next_voter_id(), "Bot99");
        assert_eq!(sim.next_voter_id(), "Bot1");
    }

    #[test]
    fn injected_votes_count_separately() {
        let mut sim = ChatSimulator::new(ChatSimConfig::default());
        let mut voting = VotingSystem::leash(&VotingConfig::default());
        assert_eq!(sim.inject_vote(&mut voting, LeashVote::Extend).as_deref(), Some("Bot1"));
        sim.inject_vote(&mut voting, LeashVote::Extend);
        sim.inject_vote(&mut voting, LeashVote::Yank);
        assert_eq!(voting.votes_for(LeashVote::Extend), 2);
        assert_eq!(voting.tick(10.0), Some(LeashVote::Extend));
    }

    #[test]
    fn auto_vote_only_while_enabled_and_open() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sim = ChatSimulator::new(ChatSimConfig::default());
        let mut voting = VotingSystem::leash(&VotingConfig::default());
        assert!(sim.update(5.0, &mut voting, &mut rng).is_none());

        assert!(sim.toggle_auto_vote());
        let mut cast = 0;
        for _ in 0..90 {
            if sim.update(0.1, &mut voting, &mut rng).is_some() {
                cast += 1;
            }
        }
        // 9 seconds at 2.0 +/- 0.5 s per vote.
        assert!((3..=6).contains(&cast), "cast {cast}");

        voting.tick(10.0);
        assert!(sim.update(5.0, &mut voting, &mut rng).is_none());
    }
}
