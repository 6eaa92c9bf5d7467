use std::collections::BTreeSet;
use std::sync::mpsc;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::time::Countdown;

/// Shortest window or cooldown accepted, so a zero config still cycles.
const MIN_PHASE_SECS: f32 = 0.01;

/// Trait for the option enums a [`VotingSystem`] can tally.
pub trait VoteOption: Clone + Copy + PartialEq + std::fmt::Debug + Serialize + DeserializeOwned {}

/// The two audience outcomes that bend the leash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeashVote {
    Extend,
    Yank,
}

impl VoteOption for LeashVote {}

impl LeashVote {
    pub const ALL: [LeashVote; 2] = [LeashVote::Extend, LeashVote::Yank];

    /// Parse a chat command. `!extend`/`!help` extend, `!yank`/`!hinder` yank.
    pub fn parse_command(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "!extend" | "!help" => Some(LeashVote::Extend),
            "!yank" | "!hinder" => Some(LeashVote::Yank),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeashVote::Extend => "extend",
            LeashVote::Yank => "yank",
        }
    }
}

impl std::fmt::Display for LeashVote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VotePhase {
    #[default]
    Voting,
    Cooldown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    pub window_secs: f32,
    pub cooldown_secs: f32,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            window_secs: 10.0,
            cooldown_secs: 5.0,
        }
    }
}

/// Voters currently backing one option.
///
/// Only the count is serialized; voter ids stay with the live game so
/// snapshots do not grow with the audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Tally<O: VoteOption> {
    pub option: O,
    pub votes: usize,
    #[serde(skip)]
    pub voters: BTreeSet<String>,
}

/// What a closed voting window produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VoteResolution<O: VoteOption> {
    /// `None` on a tie, including no votes at all.
    pub winner: Option<O>,
    pub counts: Vec<(O, usize)>,
}

/// Timed audience vote: a window where votes are taken, then a cooldown.
///
/// Each voter backs at most one option; a new vote moves them. Exactly one of
/// the two timers runs at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VotingSystem<O: VoteOption = LeashVote> {
    tallies: Vec<Tally<O>>,
    phase: VotePhase,
    voting_timer: Countdown,
    cooldown_timer: Countdown,
    last_winner: Option<O>,
}

impl VotingSystem<LeashVote> {
    pub fn leash(config: &VotingConfig) -> Self {
        Self::new(&LeashVote::ALL, config)
    }
}

impl<O: VoteOption> VotingSystem<O> {
    pub fn new(options: &[O], config: &VotingConfig) -> Self {
        let mut tallies: Vec<Tally<O>> = Vec::with_capacity(options.len());
        for &option in options {
            if !tallies.iter().any(|t| t.option == option) {
                tallies.push(Tally {
                    option,
                    votes: 0,
                    voters: BTreeSet::new(),
                });
            }
        }
        Self {
            tallies,
            phase: VotePhase::Voting,
            voting_timer: Countdown::new(config.window_secs.max(MIN_PHASE_SECS)),
            cooldown_timer: Countdown::new(config.cooldown_secs.max(MIN_PHASE_SECS)),
            last_winner: None,
        }
        .with_cooldown_idle()
    }

    fn with_cooldown_idle(mut self) -> Self {
        self.cooldown_timer.remaining = 0.0;
        self
    }

    /// Record `voter_id`'s vote for `option`, replacing any earlier vote.
    /// Rejected outside the voting window or for unknown options.
    pub fn cast_vote(&mut self, option: O, voter_id: &str) -> bool {
        if self.phase != VotePhase::Voting {
            return false;
        }
        let Some(idx) = self.tallies.iter().position(|t| t.option == option) else {
            return false;
        };
        for tally in &mut self.tallies {
            if tally.voters.remove(voter_id) {
                tally.votes = tally.votes.saturating_sub(1);
            }
        }
        let tally = &mut self.tallies[idx];
        if tally.voters.insert(voter_id.to_string()) {
            tally.votes += 1;
        }
        true
    }

    /// Advance the running timer. Returns the winner on the tick the voting
    /// window closes; `None` on every other tick and on ties.
    pub fn tick(&mut self, dt: f32) -> Option<O> {
        self.tick_resolution(dt).and_then(|r| r.winner)
    }

    /// Like [`tick`](Self::tick) but reports every window close, ties included.
    pub fn tick_resolution(&mut self, dt: f32) -> Option<VoteResolution<O>> {
        match self.phase {
            VotePhase::Voting => {
                if !self.voting_timer.tick(dt) {
                    return None;
                }
                let resolution = VoteResolution {
                    winner: self.winner(),
                    counts: self.counts(),
                };
                self.last_winner = resolution.winner;
                self.phase = VotePhase::Cooldown;
                self.cooldown_timer.restart();
                Some(resolution)
            },
            VotePhase::Cooldown => {
                if self.cooldown_timer.tick(dt) {
                    self.clear_votes();
                    self.phase = VotePhase::Voting;
                    self.voting_timer.restart();
                }
                None
            },
        }
    }

    /// Strict leader of the current tallies. Ties and empty tallies give `None`.
    pub fn winner(&self) -> Option<O> {
        let mut best: Option<(O, usize)> = None;
        let mut tied = false;
        for tally in &self.tallies {
            let n = tally.votes;
            match best {
                None => best = Some((tally.option, n)),
                Some((_, top)) if n > top => {
                    best = Some((tally.option, n));
                    tied = false;
                },
                Some((_, top)) if n == top => tied = true,
                _ => {},
            }
        }
        match best {
            Some((option, n)) if n > 0 && !tied => Some(option),
            _ => None,
        }
    }

    pub fn counts(&self) -> Vec<(O, usize)> {
        self.tallies
            .iter()
            .map(|t| (t.option, t.votes))
            .collect()
    }

    pub fn votes_for(&self, option: O) -> usize {
        self.tallies
            .iter()
            .find(|t| t.option == option)
            .map_or(0, |t| t.votes)
    }

    pub fn total_votes(&self) -> usize {
        self.tallies.iter().map(|t| t.votes).sum()
    }

    pub fn vote_of(&self, voter_id: &str) -> Option<O> {
        self.tallies
            .iter()
            .find(|t| t.voters.contains(voter_id))
            .map(|t| t.option)
    }

    /// Share of the vote per option in whole percent. An empty tally splits
    /// evenly.
    pub fn percentages(&self) -> Vec<(O, u32)> {
        let total = self.total_votes();
        let n = self.tallies.len().max(1) as u32;
        self.tallies
            .iter()
            .map(|t| {
                let pct = if total == 0 {
                    100 / n
                } else {
                    (t.votes * 100 / total) as u32
                };
                (t.option, pct)
            })
            .collect()
    }

    pub fn options(&self) -> impl Iterator<Item = O> + '_ {
        self.tallies.iter().map(|t| t.option)
    }

    pub fn phase(&self) -> VotePhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == VotePhase::Voting
    }

    /// Seconds left in whichever phase is running.
    pub fn time_remaining(&self) -> f32 {
        match self.phase {
            VotePhase::Voting => self.voting_timer.remaining(),
            VotePhase::Cooldown => self.cooldown_timer.remaining(),
        }
    }

    pub fn last_winner(&self) -> Option<O> {
        self.last_winner
    }

    fn clear_votes(&mut self) {
        for tally in &mut self.tallies {
            tally.voters.clear();
            tally.votes = 0;
        }
    }

    /// Back to a fresh voting window with no history.
    pub fn reset(&mut self) {
        self.clear_votes();
        self.phase = VotePhase::Voting;
        self.voting_timer.restart();
        self.cooldown_timer.remaining = 0.0;
        self.last_winner = None;
    }
}

/// A vote travelling from an outside producer to the game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastVote {
    pub option: LeashVote,
    pub voter_id: String,
}

/// Producer half of the vote queue. Cheap to clone and `Send`, so chat bridges
/// can post from their own threads or tasks.
#[derive(Debug, Clone)]
pub struct VoteSender {
    tx: mpsc::Sender<CastVote>,
}

impl VoteSender {
    /// Queue a vote. Returns `false` once the game has been dropped.
    pub fn send(&self, option: LeashVote, voter_id: impl Into<String>) -> bool {
        self.tx
            .send(CastVote {
                option,
                voter_id: voter_id.into(),
            })
            .is_ok()
    }
}

/// Consumer half of the vote queue, drained once per tick by the game.
#[derive(Debug)]
pub struct VoteInbox {
    rx: mpsc::Receiver<CastVote>,
}

impl VoteInbox {
    /// Take everything queued so far without blocking.
    pub fn drain(&self) -> Vec<CastVote> {
        self.rx.try_iter().collect()
    }
}

pub fn vote_channel() -> (VoteSender, VoteInbox) {
    let (tx, rx) = mpsc::channel();
    (VoteSender { tx }, VoteInbox { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system() -> VotingSystem {
        VotingSystem::leash(&VotingConfig::default())
    }

    #[test]
    fn window_resolves_majority_then_cools_down() {
        let mut v = system();
        assert!(v.cast_vote(LeashVote::Extend, "a"));
        assert!(v.cast_vote(LeashVote::Extend, "b"));
        assert!(v.cast_vote(LeashVote::Yank, "c"));

        for _ in 0..19 {
            assert_eq!(v.tick(0.5), None);
        }
        assert_eq!(v.tick(0.5), Some(LeashVote::Extend));
        assert_eq!(v.phase(), VotePhase::Cooldown);
        assert_eq!(v.last_winner(), Some(LeashVote::Extend));
        assert!(!v.cast_vote(LeashVote::Yank, "d"), "closed during cooldown");

        for _ in 0..9 {
            v.tick(0.5);
        }
        assert_eq!(v.phase(), VotePhase::Cooldown);
        assert_eq!(v.tick(0.5), None);
        assert_eq!(v.phase(), VotePhase::Voting);
        assert_eq!(v.total_votes(), 0);
        assert_eq!(v.last_winner(), Some(LeashVote::Extend));
    }

    #[test]
    fn revote_moves_voter() {
        let mut v = system();
        v.cast_vote(LeashVote::Extend, "a");
        v.cast_vote(LeashVote::Yank, "a");
        assert_eq!(v.votes_for(LeashVote::Extend), 0);
        assert_eq!(v.votes_for(LeashVote::Yank), 1);
        assert_eq!(v.vote_of("a"), Some(LeashVote::Yank));
    }

    #[test]
    fn ties_and_empty_windows_have_no_winner() {
        let mut v = system();
        let r = v.tick_resolution(10.0);
        assert_eq!(r.map(|r| r.winner), Some(None));

        let mut v = system();
        v.cast_vote(LeashVote::Extend, "a");
        v.cast_vote(LeashVote::Yank, "b");
        assert_eq!(v.tick(10.0), None);
        assert_eq!(v.phase(), VotePhase::Cooldown);
    }

    #[test]
    fn unknown_option_rejected() {
        let mut v: VotingSystem<LeashVote> =
            VotingSystem::new(&[LeashVote::Extend], &VotingConfig::default());
        assert!(!v.cast_vote(LeashVote::Yank, "a"));
        assert!(v.cast_vote(LeashVote::Extend, "a"));
    }

    #[test]
    fn overshooting_dt_resolves_once() {
        let mut v = system();
        v.cast_vote(LeashVote::Yank, "a");
        assert_eq!(v.tick(25.0), Some(LeashVote::Yank));
        assert_eq!(v.tick(25.0), None);
        assert!(v.is_open());
    }

    #[test]
    fn percentages_split_evenly_when_empty() {
        let mut v = system();
        assert_eq!(v.percentages(), vec![(LeashVote::Extend, 50), (LeashVote::Yank, 50)]);
        v.cast_vote(LeashVote::Extend, "a");
        v.cast_vote(LeashVote::Extend, "b");
        v.cast_vote(LeashVote::Extend, "c");
        v.cast_vote(LeashVote::Yank, "d");
        assert_eq!(v.percentages(), vec![(LeashVote::Extend, 75), (LeashVote::Yank, 25)]);
    }

    #[test]
    fn time_remaining_tracks_running_phase() {
        let mut v = system();
        v.tick(4.0);
        assert_eq!(v.time_remaining(), 6.0);
        v.tick(6.0);
        assert_eq!(v.time_remaining(), 5.0);
    }

    #[test]
    fn reset_reopens_window() {
        let mut v = system();
        v.cast_vote(LeashVote::Yank, "a");
        v.tick(10.0);
        v.reset();
        assert!(v.is_open());
        assert_eq!(v.last_winner(), None);
        assert_eq!(v.time_remaining(), 10.0);
    }

    #[test]
    fn zero_durations_still_cycle() {
        let mut v = VotingSystem::leash(&VotingConfig {
            window_secs: 0.0,
            cooldown_secs: 0.0,
        });
        v.cast_vote(LeashVote::Extend, "a");
        assert_eq!(v.tick(0.016), Some(LeashVote::Extend));
        v.tick(0.016);
        assert!(v.is_open());
    }

    #[test]
    fn parse_chat_commands() {
        assert_eq!(LeashVote::parse_command("!extend"), Some(LeashVote::Extend));
        assert_eq!(LeashVote::parse_command("  !HELP "), Some(LeashVote::Extend));
        assert_eq!(LeashVote::parse_command("!Yank"), Some(LeashVote::Yank));
        assert_eq!(LeashVote::parse_command("!hinder"), Some(LeashVote::Yank));
        assert_eq!(LeashVote::parse_command("extend"), None);
        assert_eq!(LeashVote::parse_command("!extend now"), None);
    }

    #[test]
    fn vote_channel_crosses_threads() {
        let (tx, inbox) = vote_channel();
        let handle = std::thread::spawn({
            let tx = tx.clone();
            move || {
                for i in 0..10 {
                    tx.send(LeashVote::Yank, format!("viewer{i}"));
                }
            }
        });
        handle.join().unwrap();
        tx.send(LeashVote::Extend, "local");
        let votes = inbox.drain();
        assert_eq!(votes.len(), 11);
        assert!(inbox.drain().is_empty());
    }

    #[test]
    fn sender_reports_dropped_inbox() {
        let (tx, inbox) = vote_channel();
        drop(inbox);
        assert!(!tx.send(LeashVote::Extend, "a"));
    }

    #[test]
    fn state_roundtrips_through_msgpack() {
        let mut v = system();
        v.cast_vote(LeashVote::Extend, "a");
        v.tick(3.0);
        let bytes = rmp_serde::to_vec(&v).unwrap();
        let back: VotingSystem = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back.counts(), v.counts());
        assert_eq!(back.phase(), v.phase());
        assert_eq!(back.last_winner(), v.last_winner());
        assert_eq!(back.time_remaining(), v.time_remaining());
    }

    #[test]
    fn encoded_size_does_not_grow_with_voters() {
        let mut v = system();
        let empty = rmp_serde::to_vec(&v).unwrap().len();
        for i in 0..20_000 {
            let option = if i % 3 == 0 { LeashVote::Yank } else { LeashVote::Extend };
            assert!(v.cast_vote(option, &format!("viewer{i}")));
        }
        assert_eq!(v.total_votes(), 20_000);
        let full = rmp_serde::to_vec(&v).unwrap();
        assert!(full.len() <= empty + 16);
        let back: VotingSystem = rmp_serde::from_slice(&full).unwrap();
        assert_eq!(back.votes_for(LeashVote::Yank), 6_667);
        assert_eq!(back.votes_for(LeashVote::Extend), 13_333);
    }

    #[test]
    fn revote_keeps_counts_in_step() {
        let mut v = system();
        v.cast_vote(LeashVote::Extend, "a");
        v.cast_vote(LeashVote::Extend, "a");
        v.cast_vote(LeashVote::Yank, "a");
        assert_eq!(v.counts(), vec![(LeashVote::Extend, 0), (LeashVote::Yank, 1)]);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::{HashMap, HashSet};

        fn ballots() -> impl Strategy<Value = Vec<(u8, bool)>> {
            proptest::collection::vec((0u8..12, any::<bool>()), 0..80)
        }

        proptest! {
            #[test]
            fn winner_is_strict_majority_of_final_votes(ballots in ballots()) {
                let mut v = system();
                let mut last: HashMap<u8, bool> = HashMap::new();
                for &(voter, extend) in &ballots {
                    let option = if extend { LeashVote::Extend } else { LeashVote::Yank };
                    let voter_name = format!("voter{voter}");
                    prop_assert!(v.cast_vote(option, &voter_name));
                    last.insert(voter, extend);
                }
                let extend = last.values().filter(|&&e| e).count();
                let yank = last.len() - extend;
                let expected = if extend > yank {
                    Some(LeashVote::Extend)
                } else if yank > extend {
                    Some(LeashVote::Yank)
                } else {
                    None
                };
                prop_assert_eq!(v.tick(10.0), expected);
            }

            #[test]
            fn one_vote_per_voter(ballots in ballots()) {
                let mut v = system();
                let mut seen = HashSet::new();
                for &(voter, extend) in &ballots {
                    let option = if extend { LeashVote::Extend } else { LeashVote::Yank };
                    v.cast_vote(option, &format!("voter{voter}"));
                    seen.insert(voter);
                    prop_assert_eq!(v.total_votes(), seen.len());
                }
            }

            #[test]
            fn exactly_one_timer_runs(steps in proptest::collection::vec(0.0f32..3.0, 1..60)) {
                let mut v = system();
                for dt in steps {
                    v.tick(dt);
                    let running = [v.voting_timer.remaining > 0.0, v.cooldown_timer.remaining > 0.0];
                    prop_assert!(running.iter().filter(|&&r| r).count() <= 1);
                    match v.phase() {
                        VotePhase::Voting => prop_assert!(v.cooldown_timer.is_expired()),
                        VotePhase::Cooldown => prop_assert!(v.voting_timer.is_expired()),
                    }
                }
            }
        }
    }
}
