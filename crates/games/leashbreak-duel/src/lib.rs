pub mod arena;
pub mod bot;
pub mod config;
pub mod difficulty;
pub mod scoring;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use leashbreak_core::collectible::{Collectible, SnackDef, Spawner};
use leashbreak_core::collision::resolve_collisions;
use leashbreak_core::controller::{ControlContext, Controller, HeldKeys, HumanController};
use leashbreak_core::events::{GameSignal, SignalQueue};
use leashbreak_core::game::{
    ArenaGame, GameMetadata, GameMode, MatchResult, RoundRecord, SideSummary,
};
use leashbreak_core::side::{PerSide, Side, SideId};
use leashbreak_core::snapshot::{SnapshotError, decode_snapshot, encode_snapshot};
use leashbreak_core::time::Countdown;
use leashbreak_core::vote_sim::ChatSimulator;
use leashbreak_core::voting::{LeashVote, VoteInbox, VoteSender, VotingSystem, vote_channel};

use arena::{ArenaLayout, create_layout, leash_for, walk_in_offset};
use bot::AiController;
use config::DuelConfig;
use difficulty::{RoundTuning, tuning_for_round};

/// Shortest countdown step accepted from config.
const MIN_STEP_SECS: f32 = 0.01;

/// Phases of a match. `RoundEnd` loops back to `Countdown` until the match is
/// decided; `MatchEnd` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Countdown,
    WalkIn,
    Active,
    RoundEnd,
    MatchEnd,
}

/// Who drives a side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SideControl {
    Human,
    Ai { difficulty: String },
}

/// Choices made on the character select screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSetup {
    pub characters: PerSide<String>,
    pub control: PerSide<SideControl>,
    pub seed: u64,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            characters: PerSide::new("jazzy".to_string(), "biggie".to_string()),
            control: PerSide::new(
                SideControl::Human,
                SideControl::Ai {
                    difficulty: "medium".to_string(),
                },
            ),
            seed: 0,
        }
    }
}

/// Serializable match state, broadcast to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuelState {
    pub phase: RoundPhase,
    pub current_round: u32,
    pub max_rounds: u32,
    pub level: u32,
    pub round_wins: PerSide<u32>,
    pub countdown_value: u32,
    pub countdown_timer: Countdown,
    pub walk_in_timer: Countdown,
    pub walk_in_sides: Vec<SideId>,
    /// Time left in the active round.
    pub round_timer: Countdown,
    pub round_end_timer: Countdown,
    pub sides: PerSide<Side>,
    pub snacks: PerSide<Vec<Collectible>>,
    pub spawners: PerSide<Spawner>,
    pub snack_pool: Vec<SnackDef>,
    pub voting: VotingSystem,
    pub chat_sim: ChatSimulator,
    pub rounds: Vec<RoundRecord>,
    pub total_scores: PerSide<u32>,
    pub winner: Option<SideId>,
    pub next_snack_id: u64,
}

/// The split-screen match: two dogs, two arenas, one audience.
pub struct DuelMatch {
    state: DuelState,
    config: DuelConfig,
    layout: ArenaLayout,
    controllers: PerSide<Box<dyn Controller>>,
    held: PerSide<HeldKeys>,
    walk_in_flags: PerSide<bool>,
    inbox: VoteInbox,
    votes: VoteSender,
    signals: SignalQueue,
    rng: StdRng,
    paused: bool,
}

fn controller_for(config: &DuelConfig, control: &SideControl) -> Box<dyn Controller> {
    match control {
        SideControl::Human => Box::new(HumanController),
        SideControl::Ai { difficulty } => Box::new(AiController::new(config.difficulty(difficulty))),
    }
}

impl DuelMatch {
    pub fn new(setup: MatchSetup) -> Self {
        Self::with_config(DuelConfig::load(), setup)
    }

    pub fn with_config(config: DuelConfig, setup: MatchSetup) -> Self {
        let layout = create_layout(&config.layout, &config.dog);
        let leash = leash_for(&layout, &config.leash);
        let characters = setup.characters.map(|id| config.character(id));
        let sides = PerSide::from_fn(|id| {
            Side::new(
                id,
                &characters[id],
                &config.dog,
                layout.arenas[id],
                layout.dog_y,
                leash.clone(),
            )
        });
        let tuning = tuning_for_round(&config, 1);
        let spawners = PerSide::from_fn(|_| {
            Spawner::new(config.spawn.clone(), tuning.spawn_interval_secs, tuning.fall_speed)
        });
        let controllers = PerSide::new(
            controller_for(&config, &setup.control.left),
            controller_for(&config, &setup.control.right),
        );
        let (votes, inbox) = vote_channel();

        let state = DuelState {
            phase: RoundPhase::Countdown,
            current_round: 1,
            max_rounds: config.max_rounds(),
            level: tuning.level,
            round_wins: PerSide::default(),
            countdown_value: 0,
            countdown_timer: Countdown::idle(),
            walk_in_timer: Countdown::idle(),
            walk_in_sides: Vec::new(),
            round_timer: Countdown::new(tuning.round_duration_secs),
            round_end_timer: Countdown::idle(),
            sides,
            snacks: PerSide::default(),
            spawners,
            snack_pool: tuning.snack_pool.clone(),
            voting: VotingSystem::leash(&config.voting),
            chat_sim: ChatSimulator::new(config.chat_sim.clone()),
            rounds: Vec::new(),
            total_scores: PerSide::default(),
            winner: None,
            next_snack_id: 1,
        };

        let mut game = Self {
            state,
            layout,
            controllers,
            held: PerSide::default(),
            walk_in_flags: characters.map(|c| c.walk_in),
            inbox,
            votes,
            signals: SignalQueue::default(),
            rng: StdRng::seed_from_u64(setup.seed),
            paused: false,
            config,
        };
        game.start_countdown();
        game
    }

    pub fn state(&self) -> &DuelState {
        &self.state
    }

    pub fn config(&self) -> &DuelConfig {
        &self.config
    }

    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    /// Replace the controller for a side.
    pub fn set_controller(&mut self, side: SideId, controller: Box<dyn Controller>) {
        self.controllers[side] = controller;
    }

    fn apply_tuning(&mut self, tuning: RoundTuning) {
        self.state.level = tuning.level;
        self.state.round_timer = Countdown::new(tuning.round_duration_secs);
        for spawner in [&mut self.state.spawners.left, &mut self.state.spawners.right] {
            spawner.set_interval(tuning.spawn_interval_secs);
            spawner.fall_speed = tuning.fall_speed;
            spawner.reset();
        }
        self.state.snack_pool = tuning.snack_pool;
    }

    /// Fresh round state and the first countdown tick.
    fn start_countdown(&mut self) {
        let tuning = tuning_for_round(&self.config, self.state.current_round);
        self.apply_tuning(tuning);

        for id in SideId::ALL {
            self.state.sides[id].reset_for_round();
            self.state.snacks[id].clear();
            self.controllers[id].reset();
        }
        self.state.walk_in_sides = SideId::ALL
            .into_iter()
            .filter(|&id| self.walk_in_flags[id])
            .collect();
        // Walk-in dogs wait at their wall until their entrance.
        if self.config.rules.walk_in_secs > 0.0 {
            for &id in &self.state.walk_in_sides {
                let side = &mut self.state.sides[id];
                side.offset = walk_in_offset(side, 0.0);
            }
        }

        self.state.phase = RoundPhase::Countdown;
        self.state.countdown_value = self.config.rules.countdown_from;
        self.state.countdown_timer =
            Countdown::new(self.config.rules.countdown_step_secs.max(MIN_STEP_SECS));
        tracing::info!(
            round = self.state.current_round,
            level = self.state.level,
            "round countdown started"
        );
        if self.state.countdown_value == 0 {
            self.finish_countdown();
        } else {
            self.signals.push(GameSignal::CountdownTick {
                value: self.state.countdown_value,
            });
        }
    }

    fn tick_countdown(&mut self, dt: f32) {
        if !self.state.countdown_timer.tick(dt) {
            return;
        }
        self.state.countdown_value = self.state.countdown_value.saturating_sub(1);
        if self.state.countdown_value == 0 {
            self.finish_countdown();
        } else {
            self.signals.push(GameSignal::CountdownTick {
                value: self.state.countdown_value,
            });
            self.state.countdown_timer.restart();
        }
    }

    fn finish_countdown(&mut self) {
        let walk_in_secs = self.config.rules.walk_in_secs;
        if walk_in_secs > 0.0 && !self.state.walk_in_sides.is_empty() {
            self.state.phase = RoundPhase::WalkIn;
            self.state.walk_in_timer = Countdown::new(walk_in_secs);
            self.signals.push(GameSignal::WalkInStarted {
                sides: self.state.walk_in_sides.clone(),
                duration_secs: walk_in_secs,
            });
        } else {
            self.start_active();
        }
    }

    fn tick_walk_in(&mut self, dt: f32) {
        let done = self.state.walk_in_timer.tick(dt);
        let progress = self.state.walk_in_timer.progress();
        for &id in &self.state.walk_in_sides {
            let side = &mut self.state.sides[id];
            side.offset = walk_in_offset(side, progress);
        }
        if done {
            for &id in &self.state.walk_in_sides {
                let side = &mut self.state.sides[id];
                side.offset = side.home_offset();
            }
            self.start_active();
        }
    }

    fn start_active(&mut self) {
        for id in SideId::ALL {
            let side = &mut self.state.sides[id];
            side.offset = side.home_offset();
        }
        self.state.phase = RoundPhase::Active;
        self.state.round_timer.restart();
        self.signals.push(GameSignal::RoundStarted {
            round: self.state.current_round,
            level: self.state.level,
            duration_secs: self.state.round_timer.duration,
        });
        tracing::info!(round = self.state.current_round, "round started");
    }

    fn tick_active(&mut self, dt: f32) {
        self.tick_voting(dt);

        for id in SideId::ALL {
            let tick = self.state.sides[id].update_effects(dt);
            for kind in tick.expired {
                self.signals.push(GameSignal::EffectExpired { side: id, kind });
            }
            if tick.leash_reset {
                self.signals.push(GameSignal::LeashReset { side: id });
            }
        }

        for id in SideId::ALL {
            let ctx = ControlContext {
                side: &self.state.sides[id],
                snacks: &self.state.snacks[id],
                held: self.held[id],
            };
            let intent = self.controllers[id].decide(&ctx, dt, &mut self.rng);
            let side = &mut self.state.sides[id];
            side.apply_intent(intent);
            side.advance(dt);
        }

        self.tick_snacks(dt);
        self.resolve_pickups();

        if self.state.round_timer.tick(dt) {
            self.end_round();
        }
    }

    fn tick_voting(&mut self, dt: f32) {
        let was_open = self.state.voting.is_open();
        if let Some(resolution) = self.state.voting.tick_resolution(dt) {
            let extend_votes = self.state.voting.votes_for(LeashVote::Extend);
            let yank_votes = self.state.voting.votes_for(LeashVote::Yank);
            tracing::info!(
                winner = ?resolution.winner,
                extend_votes,
                yank_votes,
                "vote resolved"
            );
            self.signals.push(GameSignal::VoteResolved {
                winner: resolution.winner,
                extend_votes,
                yank_votes,
            });
            if let Some(vote) = resolution.winner {
                for id in SideId::ALL {
                    let side = &mut self.state.sides[id];
                    side.apply_leash_vote(vote);
                    self.signals.push(GameSignal::LeashChanged {
                        side: id,
                        state: side.leash.state,
                        max: side.leash.max,
                    });
                }
            }
        }
        if !was_open && self.state.voting.is_open() {
            self.signals.push(GameSignal::VotingReopened);
        }

        if let Some((option, voter_id)) =
            self.state
                .chat_sim
                .update(dt, &mut self.state.voting, &mut self.rng)
        {
            self.signals
                .push(GameSignal::VoteAccepted { option, voter_id });
        }
    }

    fn tick_snacks(&mut self, dt: f32) {
        for id in SideId::ALL {
            let snacks = &mut self.state.snacks[id];
            for snack in snacks.iter_mut() {
                if !snack.advance(dt) && !snack.collected {
                    self.signals.push(GameSignal::SnackDespawned {
                        arena: id,
                        collectible_id: snack.id,
                    });
                }
            }
            snacks.retain(|s| s.active);

            let live = snacks.len();
            if let Some(snack) = self.state.spawners[id].tick(
                dt,
                self.layout.arenas[id],
                live,
                &self.state.snack_pool,
                &mut self.state.next_snack_id,
                &mut self.rng,
            ) {
                self.signals.push(GameSignal::SnackSpawned {
                    arena: id,
                    collectible_id: snack.id,
                    snack_id: snack.snack_id.clone(),
                });
                self.state.snacks[id].push(snack);
            }
        }
    }

    fn resolve_pickups(&mut self) {
        let pickups = resolve_collisions(
            &mut self.state.sides,
            &mut self.state.snacks,
            self.config.rules.steal_bonus,
        );
        for pickup in pickups {
            if let Some(effect) = pickup.effect {
                self.signals.push(if pickup.effect_applied {
                    GameSignal::EffectApplied {
                        side: pickup.side,
                        kind: effect.kind,
                    }
                } else {
                    GameSignal::EffectBlocked {
                        side: pickup.side,
                        kind: effect.kind,
                    }
                });
            }
            self.signals.push(GameSignal::SnackCollected {
                side: pickup.side,
                arena: pickup.arena,
                collectible_id: pickup.collectible_id,
                snack_id: pickup.snack_id,
                points: pickup.points,
                stolen: pickup.stolen,
            });
        }
        for id in SideId::ALL {
            self.state.snacks[id].retain(|s| s.active);
        }
    }

    fn end_round(&mut self) {
        let scores = self.state.sides.map(|s| s.score);
        let winner = scoring::round_winner(&scores);
        if let Some(w) = winner {
            self.state.round_wins[w] += 1;
        }
        self.state.total_scores.left += scores.left;
        self.state.total_scores.right += scores.right;
        self.state.rounds.push(RoundRecord {
            round: self.state.current_round,
            level: self.state.level,
            scores,
            winner,
        });
        for id in SideId::ALL {
            self.state.sides[id].velocity = 0.0;
        }
        tracing::info!(
            round = self.state.current_round,
            winner = ?winner,
            left = scores.left,
            right = scores.right,
            "round ended"
        );
        self.signals.push(GameSignal::RoundEnded {
            round: self.state.current_round,
            winner,
            scores,
            round_wins: self.state.round_wins,
        });

        if scoring::match_over(
            &self.state.round_wins,
            self.state.current_round,
            self.state.max_rounds,
        ) {
            self.finish_match();
            return;
        }

        let pause = self.config.rules.round_end_pause_secs;
        if pause > 0.0 {
            self.state.phase = RoundPhase::RoundEnd;
            self.state.round_end_timer = Countdown::new(pause);
        } else {
            self.next_round();
        }
    }

    fn tick_round_end(&mut self, dt: f32) {
        if self.state.round_end_timer.tick(dt) {
            self.next_round();
        }
    }

    fn next_round(&mut self) {
        self.state.current_round += 1;
        self.start_countdown();
    }

    fn finish_match(&mut self) {
        self.state.phase = RoundPhase::MatchEnd;
        self.state.winner = scoring::match_winner(&self.state.round_wins);
        tracing::info!(
            winner = ?self.state.winner,
            left = self.state.round_wins.left,
            right = self.state.round_wins.right,
            "match ended"
        );
        self.signals.push(GameSignal::MatchEnded {
            winner: self.state.winner,
            round_wins: self.state.round_wins,
        });
    }

    fn drain_votes(&mut self) {
        for vote in self.inbox.drain() {
            self.record_vote(vote.option, &vote.voter_id);
        }
    }

    fn record_vote(&mut self, option: LeashVote, voter_id: &str) -> bool {
        let accepted = self.state.phase != RoundPhase::MatchEnd
            && self.state.voting.cast_vote(option, voter_id);
        if accepted {
            self.signals.push(GameSignal::VoteAccepted {
                option,
                voter_id: voter_id.to_string(),
            });
        } else {
            tracing::debug!(voter_id, option = %option, "vote rejected");
        }
        accepted
    }
}

impl Default for DuelMatch {
    fn default() -> Self {
        Self::with_config(DuelConfig::default(), MatchSetup::default())
    }
}

impl ArenaGame for DuelMatch {
    fn metadata(&self) -> GameMetadata {
        let round_secs = tuning_for_round(&self.config, 1).round_duration_secs;
        GameMetadata {
            mode: GameMode::Duel,
            name: "Leashbreak Duel".to_string(),
            description: "Two dogs, two arenas, one fickle audience holding the leashes."
                .to_string(),
            sides: 2,
            estimated_duration_secs: round_secs * self.state.max_rounds as f32,
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameSignal> {
        if self.paused || self.state.phase == RoundPhase::MatchEnd {
            return Vec::new();
        }
        self.drain_votes();
        match self.state.phase {
            RoundPhase::Countdown => self.tick_countdown(dt),
            RoundPhase::WalkIn => self.tick_walk_in(dt),
            RoundPhase::Active => self.tick_active(dt),
            RoundPhase::RoundEnd => self.tick_round_end(dt),
            RoundPhase::MatchEnd => {},
        }
        self.signals.drain()
    }

    fn set_input(&mut self, side: SideId, keys: HeldKeys) {
        self.held[side] = keys;
    }

    fn cast_vote(&mut self, option: LeashVote, voter_id: &str) -> bool {
        self.record_vote(option, voter_id)
    }

    fn vote_sender(&self) -> VoteSender {
        self.votes.clone()
    }

    fn inject_vote(&mut self, option: LeashVote) -> bool {
        if self.state.phase == RoundPhase::MatchEnd {
            return false;
        }
        match self
            .state
            .chat_sim
            .inject_vote(&mut self.state.voting, option)
        {
            Some(voter_id) => {
                self.signals
                    .push(GameSignal::VoteAccepted { option, voter_id });
                true
            },
            None => false,
        }
    }

    fn toggle_auto_vote(&mut self) -> bool {
        self.state.chat_sim.toggle_auto_vote()
    }

    fn serialize_state(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_snapshot(&self.state)
    }

    fn apply_state(&mut self, state: &[u8]) -> Result<(), SnapshotError> {
        self.state = decode_snapshot(state)?;
        Ok(())
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn is_finished(&self) -> bool {
        self.state.phase == RoundPhase::MatchEnd
    }

    fn result(&self) -> Option<MatchResult> {
        if !self.is_finished() {
            return None;
        }
        let sides = SideId::ALL
            .into_iter()
            .map(|id| {
                let side = &self.state.sides[id];
                SideSummary {
                    side: id,
                    character_id: side.character_id.clone(),
                    name: side.name.clone(),
                    round_wins: self.state.round_wins[id],
                    last_round_score: side.score,
                    total_score: self.state.total_scores[id],
                }
            })
            .collect();
        Some(MatchResult {
            mode: GameMode::Duel,
            winner: self.state.winner,
            rounds_played: self.state.rounds.len() as u32,
            sides,
            rounds: self.state.rounds.clone(),
        })
    }

    fn tick_rate(&self) -> f32 {
        self.config.rules.tick_rate_hz
    }
}
