pub mod config;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use leashbreak_core::collectible::{Collectible, Spawner};
use leashbreak_core::collision::collect_overlapping;
use leashbreak_core::controller::HeldKeys;
use leashbreak_core::events::{GameSignal, SignalQueue};
use leashbreak_core::game::{
    ArenaGame, GameMetadata, GameMode, MatchResult, RoundRecord, SideSummary,
};
use leashbreak_core::side::{PerSide, Side, SideId};
use leashbreak_core::snapshot::{SnapshotError, decode_snapshot, encode_snapshot};
use leashbreak_core::time::Countdown;
use leashbreak_core::vote_sim::ChatSimulator;
use leashbreak_core::voting::{LeashVote, VoteInbox, VoteSender, VotingSystem, vote_channel};

use config::TreatAttackConfig;

/// Treats are never stolen in a one-dog field.
const NO_STEAL_BONUS: f32 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreatAttackState {
    pub dog: Side,
    pub treats: Vec<Collectible>,
    pub spawner: Spawner,
    pub time_remaining: Countdown,
    pub voting: VotingSystem,
    pub chat_sim: ChatSimulator,
    pub treats_caught: u32,
    pub game_over: bool,
    pub next_treat_id: u64,
}

/// One dog, one timer, treats falling from above. The audience decides how
/// far the leash reaches.
pub struct TreatAttack {
    state: TreatAttackState,
    config: TreatAttackConfig,
    held: HeldKeys,
    inbox: VoteInbox,
    votes: VoteSender,
    signals: SignalQueue,
    rng: StdRng,
    paused: bool,
}

impl TreatAttack {
    pub fn new(character_id: &str, seed: u64) -> Self {
        Self::with_config(TreatAttackConfig::load(), character_id, seed)
    }

    pub fn with_config(config: TreatAttackConfig, character_id: &str, seed: u64) -> Self {
        let character = config.character(character_id);
        let dog = Side::new(
            SideId::Left,
            &character,
            &config.dog,
            config.field.rect(),
            config.field.ground_y,
            config.leash.to_leash(),
        );
        let spawner = Spawner::new(
            config.spawn.clone(),
            config.spawn_interval_secs,
            config.fall_speed,
        );
        let (votes, inbox) = vote_channel();
        let state = TreatAttackState {
            dog,
            treats: Vec::new(),
            spawner,
            time_remaining: Countdown::new(config.round_secs()),
            voting: VotingSystem::leash(&config.voting),
            chat_sim: ChatSimulator::new(config.chat_sim.clone()),
            treats_caught: 0,
            game_over: false,
            next_treat_id: 1,
        };
        let mut signals = SignalQueue::default();
        signals.push(GameSignal::RoundStarted {
            round: 1,
            level: 1,
            duration_secs: state.time_remaining.duration,
        });
        tracing::info!(character = %character.id, seed, "treat attack started");
        Self {
            state,
            config,
            held: HeldKeys::default(),
            inbox,
            votes,
            signals,
            rng: StdRng::seed_from_u64(seed),
            paused: false,
        }
    }

    pub fn state(&self) -> &TreatAttackState {
        &self.state
    }

    pub fn config(&self) -> &TreatAttackConfig {
        &self.config
    }

    pub fn score(&self) -> u32 {
        self.state.dog.score
    }

    fn finish(&mut self) {
        self.state.game_over = true;
        self.state.time_remaining.remaining = 0.0;
        self.state.dog.velocity = 0.0;
        let final_score = self.state.dog.score;
        tracing::info!(final_score, caught = self.state.treats_caught, "treat attack over");
        self.signals.push(GameSignal::GameOver { final_score });
    }

    fn tick_voting(&mut self, dt: f32) {
        let was_open = self.state.voting.is_open();
        if let Some(resolution) = self.state.voting.tick_resolution(dt) {
            let extend_votes = self.state.voting.votes_for(LeashVote::Extend);
            let yank_votes = self.state.voting.votes_for(LeashVote::Yank);
            tracing::info!(winner = ?resolution.winner, extend_votes, yank_votes, "vote resolved");
            self.signals.push(GameSignal::VoteResolved {
                winner: resolution.winner,
                extend_votes,
                yank_votes,
            });
            if let Some(vote) = resolution.winner {
                let dog = &mut self.state.dog;
                dog.apply_leash_vote(vote);
                self.signals.push(GameSignal::LeashChanged {
                    side: SideId::Left,
                    state: dog.leash.state,
                    max: dog.leash.max,
                });
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

    fn tick_dog(&mut self, dt: f32) {
        let tick = self.state.dog.update_effects(dt);
        for kind in tick.expired {
            self.signals.push(GameSignal::EffectExpired {
                side: SideId::Left,
                kind,
            });
        }
        if tick.leash_reset {
            self.signals.push(GameSignal::LeashReset { side: SideId::Left });
        }
        let dog = &mut self.state.dog;
        dog.apply_intent(self.held.intent());
        dog.advance(dt);
    }

    fn tick_treats(&mut self, dt: f32) {
        let field = self.config.field.rect();
        if let Some(treat) = self.state.spawner.tick(
            dt,
            field,
            self.state.treats.len(),
            &self.config.treats,
            &mut self.state.next_treat_id,
            &mut self.rng,
        ) {
            self.signals.push(GameSignal::SnackSpawned {
                arena: SideId::Left,
                collectible_id: treat.id,
                snack_id: treat.snack_id.clone(),
            });
            self.state.treats.push(treat);
        }

        for treat in &mut self.state.treats {
            if !treat.advance(dt) {
                self.signals.push(GameSignal::SnackDespawned {
                    arena: SideId::Left,
                    collectible_id: treat.id,
                });
            }
        }

        let caught = collect_overlapping(
            &mut self.state.dog,
            SideId::Left,
            &mut self.state.treats,
            NO_STEAL_BONUS,
        );
        for pickup in caught {
            self.state.treats_caught += 1;
            if let Some(effect) = pickup.effect {
                self.signals.push(if pickup.effect_applied {
                    GameSignal::EffectApplied {
                        side: SideId::Left,
                        kind: effect.kind,
                    }
                } else {
                    GameSignal::EffectBlocked {
                        side: SideId::Left,
                        kind: effect.kind,
                    }
                });
            }
            self.signals.push(GameSignal::SnackCollected {
                side: SideId::Left,
                arena: SideId::Left,
                collectible_id: pickup.collectible_id,
                snack_id: pickup.snack_id,
                points: pickup.points,
                stolen: false,
            });
        }
        self.state.treats.retain(|t| t.active);
    }

    fn record_vote(&mut self, option: LeashVote, voter_id: &str) -> bool {
        let accepted = !self.state.game_over && self.state.voting.cast_vote(option, voter_id);
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

impl ArenaGame for TreatAttack {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            mode: GameMode::TreatAttack,
            name: "Treat Attack".to_string(),
            description: "Catch falling treats while chat tugs on the leash.".to_string(),
            sides: 1,
            estimated_duration_secs: self.config.round_secs(),
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameSignal> {
        if self.paused || self.state.game_over {
            return Vec::new();
        }
        for vote in self.inbox.drain() {
            self.record_vote(vote.option, &vote.voter_id);
        }
        if self.state.time_remaining.tick(dt) {
            self.finish();
            return self.signals.drain();
        }
        self.tick_voting(dt);
        self.tick_dog(dt);
        self.tick_treats(dt);
        self.signals.drain()
    }

    fn set_input(&mut self, side: SideId, keys: HeldKeys) {
        if side == SideId::Left {
            self.held = keys;
        }
    }

    fn cast_vote(&mut self, option: LeashVote, voter_id: &str) -> bool {
        self.record_vote(option, voter_id)
    }

    fn vote_sender(&self) -> VoteSender {
        self.votes.clone()
    }

    fn inject_vote(&mut self, option: LeashVote) -> bool {
        if self.state.game_over {
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
        self.state.game_over
    }

    fn result(&self) -> Option<MatchResult> {
        if !self.state.game_over {
            return None;
        }
        let dog = &self.state.dog;
        Some(MatchResult {
            mode: GameMode::TreatAttack,
            winner: None,
            rounds_played: 1,
            sides: vec![SideSummary {
                side: SideId::Left,
                character_id: dog.character_id.clone(),
                name: dog.name.clone(),
                round_wins: 0,
                last_round_score: dog.score,
                total_score: dog.score,
            }],
            rounds: vec![RoundRecord {
                round: 1,
                level: 1,
                scores: PerSide::new(dog.score, 0),
                winner: None,
            }],
        })
    }

    fn tick_rate(&self) -> f32 {
        self.config.tick_rate_hz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leashbreak_core::collectible::SnackDef;
    use leashbreak_core::leash::LeashState;
    use leashbreak_core::test_helpers::{
        contract_eventually_finishes, contract_pause_freezes_state, contract_queued_votes_drained,
        contract_state_roundtrip, contract_update_advances_state, run_ticks, run_until,
    };

    fn short_game(seed: u64) -> TreatAttack {
        let config = TreatAttackConfig {
            round_duration_secs: 20.0,
            ..TreatAttackConfig::default()
        };
        TreatAttack::with_config(config, "jazzy", seed)
    }

    fn drop_treat_on_dog(game: &mut TreatAttack, point_value: i32) {
        let def = SnackDef {
            id: "bone".to_string(),
            point_value,
            ..SnackDef::default()
        };
        let mut treat = game.state.spawner.spawn(
            &def,
            game.config.field.rect(),
            &mut game.state.next_treat_id,
            &mut game.rng,
        );
        treat.x = game.state.dog.world_x();
        treat.y = game.state.dog.y;
        game.state.treats.push(treat);
    }

    #[test]
    fn contract_update_advances() {
        contract_update_advances_state(&mut short_game(1));
    }

    #[test]
    fn contract_pause() {
        contract_pause_freezes_state(&mut short_game(1));
    }

    #[test]
    fn contract_roundtrip() {
        contract_state_roundtrip(&mut short_game(1));
    }

    #[test]
    fn contract_votes() {
        contract_queued_votes_drained(&mut short_game(1));
    }

    #[test]
    fn contract_finishes() {
        contract_eventually_finishes(&mut short_game(2), 0.1, 1_000);
    }

    #[test]
    fn snapshot_decodes_to_state() {
        let mut game = short_game(11);
        game.update(0.5);
        let bytes = game.serialize_state().unwrap();
        let state: TreatAttackState = rmp_serde::from_slice(&bytes).unwrap();
        assert!(!state.game_over);
        assert!((state.time_remaining.remaining - 19.5).abs() < 1e-3);
    }

    #[test]
    fn dog_starts_inside_default_leash() {
        let game = short_game(3);
        let dog = &game.state.dog;
        assert_eq!(dog.width, 64.0);
        assert!(dog.world_x() >= 50.0);
        assert!(dog.bounds().right() <= 550.0);
    }

    #[test]
    fn game_over_reports_final_score() {
        let mut game = short_game(4);
        game.state.dog.score = 1234;
        game.state.time_remaining.remaining = 0.05;
        let signals = game.update(0.1);
        assert!(signals.contains(&GameSignal::GameOver { final_score: 1234 }));
        assert!(game.is_finished());
        assert_eq!(game.result().map(|r| r.sides[0].total_score), Some(1234));
        assert!(game.update(0.1).is_empty());
        assert!(!game.cast_vote(LeashVote::Extend, "late"));
    }

    #[test]
    fn catching_a_treat_scores() {
        let mut game = short_game(5);
        drop_treat_on_dog(&mut game, 150);
        let signals = game.update(0.01);
        assert!(signals.iter().any(|s| matches!(
            s,
            GameSignal::SnackCollected { points: 150, stolen: false, .. }
        )));
        assert_eq!(game.score(), 150);
        assert_eq!(game.state.treats_caught, 1);
        assert!(game.state.treats.is_empty());
    }

    #[test]
    fn penalty_treat_never_drops_below_zero() {
        let mut game = short_game(6);
        drop_treat_on_dog(&mut game, -100);
        game.update(0.01);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn treats_fall_out_of_the_field() {
        let mut game = short_game(7);
        let signals = run_until(&mut game, 0.1, 200, |s| {
            matches!(s, GameSignal::SnackDespawned { .. })
        })
        .expect("an uncaught treat should fall past the floor");
        assert!(signals.iter().any(|s| matches!(s, GameSignal::SnackSpawned { .. })));
    }

    #[test]
    fn extend_vote_opens_the_right_edge() {
        let mut game = short_game(8);
        assert!(game.cast_vote(LeashVote::Extend, "viewer"));
        game.set_input(SideId::Left, HeldKeys { left: false, right: true });
        let signals = run_until(&mut game, 0.5, 30, |s| {
            matches!(s, GameSignal::VoteResolved { .. })
        })
        .unwrap();
        assert!(signals.iter().any(|s| matches!(
            s,
            GameSignal::LeashChanged { state: LeashState::Extended, max, .. } if *max == 670.0
        )));
        run_ticks(&mut game, 10, 0.1);
        assert_eq!(game.state.dog.bounds().right(), 670.0);

        // Five seconds later the leash snaps back and drags the dog with it.
        let signals = run_ticks(&mut game, 45, 0.1);
        assert!(signals.contains(&GameSignal::LeashReset { side: SideId::Left }));
        assert_eq!(game.state.dog.bounds().right(), 550.0);
    }

    #[test]
    fn yank_vote_shrinks_the_reach() {
        let mut game = short_game(9);
        game.cast_vote(LeashVote::Yank, "a");
        game.cast_vote(LeashVote::Yank, "b");
        game.cast_vote(LeashVote::Extend, "c");
        game.set_input(SideId::Left, HeldKeys { left: false, right: true });
        run_ticks(&mut game, 101, 0.1);
        assert_eq!(game.state.dog.leash.state, LeashState::Yanked);
        assert!(game.state.dog.bounds().right() <= 350.0);
    }

    #[test]
    fn only_the_left_side_takes_input() {
        let mut game = short_game(10);
        game.set_input(SideId::Right, HeldKeys { left: true, right: false });
        let x = game.state.dog.world_x();
        game.update(0.5);
        assert_eq!(game.state.dog.world_x(), x);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(16))]

            #[test]
            fn dog_stays_on_the_leash(
                seed in any::<u64>(),
                moves in proptest::collection::vec((any::<bool>(), any::<bool>(), 0.01f32..0.5), 1..80),
            ) {
                let mut game = short_game(seed);
                game.toggle_auto_vote();
                for (left, right, dt) in moves {
                    game.set_input(SideId::Left, HeldKeys { left, right });
                    game.update(dt);
                    let dog = &game.state.dog;
                    prop_assert!(dog.world_x() >= dog.leash.min - 1e-3);
                    prop_assert!(dog.bounds().right() <= dog.leash.max + 1e-3);
                }
            }
        }
    }
}
