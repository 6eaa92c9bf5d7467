pub mod collectible;
pub mod collision;
pub mod controller;
pub mod effect;
pub mod events;
pub mod game;
pub mod leash;
pub mod side;
pub mod snapshot;
pub mod time;
pub mod vote_sim;
pub mod voting;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use crate::collision::Rect;
    use crate::events::GameSignal;
    use crate::game::ArenaGame;
    use crate::leash::LeashConfig;
    use crate::side::{BodyConfig, CharacterDef, Side, SideId};
    use crate::voting::LeashVote;

    /// Two 400px arenas side by side, leash spanning each arena.
    pub fn test_side(id: SideId) -> Side {
        let arena = match id {
            SideId::Left => Rect::new(0.0, 0.0, 400.0, 600.0),
            SideId::Right => Rect::new(400.0, 0.0, 400.0, 600.0),
        };
        Side::new(
            id,
            &CharacterDef::default(),
            &BodyConfig::default(),
            arena,
            400.0,
            LeashConfig {
                base_min: 0.0,
                base_max: 400.0,
                extend_delta: 150.0,
                max_extension: 150.0,
                yank_delta: 100.0,
                minimum_range: 200.0,
                effect_duration_secs: 5.0,
            },
        )
    }

    /// Run `n` updates of `dt`, returning every signal raised.
    pub fn run_ticks(game: &mut dyn ArenaGame, n: usize, dt: f32) -> Vec<GameSignal> {
        let mut all = Vec::new();
        for _ in 0..n {
            all.extend(game.update(dt));
        }
        all
    }

    /// Update until the game finishes or `max_ticks` runs out.
    pub fn run_until_finished(
        game: &mut dyn ArenaGame,
        dt: f32,
        max_ticks: usize,
    ) -> Vec<GameSignal> {
        let mut all = Vec::new();
        for _ in 0..max_ticks {
            if game.is_finished() {
                break;
            }
            all.extend(game.update(dt));
        }
        all
    }

    /// Update until a signal matching `pred` shows up. Returns the signals seen
    /// up to and including it, or `None` after `max_ticks`.
    pub fn run_until(
        game: &mut dyn ArenaGame,
        dt: f32,
        max_ticks: usize,
        pred: impl Fn(&GameSignal) -> bool,
    ) -> Option<Vec<GameSignal>> {
        let mut all = Vec::new();
        for _ in 0..max_ticks {
            let signals = game.update(dt);
            let hit = signals.iter().any(&pred);
            all.extend(signals);
            if hit {
                return Some(all);
            }
        }
        None
    }

    // ================================================================
    // Game contract checks
    // ================================================================
    // Each game crate calls these from its own tests with a fresh game.

    /// `update(dt > 0)` must change the serialized state.
    pub fn contract_update_advances_state(game: &mut dyn ArenaGame) {
        let before = game.serialize_state().unwrap();
        game.update(0.5);
        let after = game.serialize_state().unwrap();
        assert_ne!(before, after, "update(dt>0) must advance game state");
    }

    /// Nothing may change while paused; updates resume afterwards.
    pub fn contract_pause_freezes_state(game: &mut dyn ArenaGame) {
        game.pause();
        assert!(game.is_paused());
        let before = game.serialize_state().unwrap();
        let signals = game.update(1.0);
        assert!(signals.is_empty(), "no signals while paused");
        assert_eq!(before, game.serialize_state().unwrap());

        game.resume();
        game.update(1.0);
        assert_ne!(before, game.serialize_state().unwrap());
    }

    /// serialize -> apply -> serialize must be stable.
    pub fn contract_state_roundtrip(game: &mut dyn ArenaGame) {
        game.update(0.5);
        let a = game.serialize_state().unwrap();
        game.apply_state(&a).unwrap();
        let b = game.serialize_state().unwrap();
        assert_eq!(a, b, "state must survive a roundtrip unchanged");
        assert!(game.apply_state(&[]).is_err());
    }

    /// Queued votes are counted on the next update.
    pub fn contract_queued_votes_drained(game: &mut dyn ArenaGame) {
        let tx = game.vote_sender();
        assert!(tx.send(LeashVote::Yank, "queued-viewer"));
        let signals = game.update(0.0);
        assert!(
            signals.iter().any(|s| matches!(
                s,
                GameSignal::VoteAccepted { voter_id, .. } if voter_id == "queued-viewer"
            )),
            "queued vote must be accepted on the next update"
        );
    }

    /// The game must finish within `max_ticks` of `dt` and report a result.
    pub fn contract_eventually_finishes(game: &mut dyn ArenaGame, dt: f32, max_ticks: usize) {
        run_until_finished(game, dt, max_ticks);
        assert!(game.is_finished(), "game must finish within {max_ticks} ticks");
        assert!(game.result().is_some(), "finished game must have a result");
        let before = game.serialize_state().unwrap();
        assert!(game.update(dt).is_empty(), "finished game raises no signals");
        assert_eq!(before, game.serialize_state().unwrap());
    }
}
