use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use leashbreak_core::controller::HeldKeys;
use leashbreak_core::events::GameSignal;
use leashbreak_core::game::{ArenaGame, GameMode, MatchResult};
use leashbreak_core::side::SideId;
use leashbreak_core::voting::LeashVote;
use leashbreak_duel::DuelMatch;
use leashbreak_treat_attack::TreatAttack;

use crate::config::{RunnerConfig, SessionSettings};

/// Commands sent from input sources to the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    Vote {
        option: LeashVote,
        voter_id: String,
    },
    /// Vote under a generated local viewer id.
    InjectVote(LeashVote),
    ToggleAutoVote,
    Input {
        side: SideId,
        keys: HeldKeys,
    },
    Pause,
    Resume,
    Stop,
}

/// Broadcasts sent from the session loop to the presentation layer.
#[derive(Debug, Clone)]
pub enum SessionBroadcast {
    Signals {
        tick: u64,
        signals: Vec<GameSignal>,
    },
    /// Encoded game state. `Bytes` keeps fan-out clones cheap.
    Snapshot { tick: u64, data: Bytes },
    /// The loop has exited. `None` when stopped before the game finished.
    Ended(Option<MatchResult>),
}

/// Build the game named by the config.
pub fn create_game(config: &RunnerConfig) -> Box<dyn ArenaGame> {
    match config.mode {
        GameMode::Duel => Box::new(DuelMatch::new(config.duel.setup(config.seed))),
        GameMode::TreatAttack => Box::new(TreatAttack::new(
            &config.treat_attack.character,
            config.seed,
        )),
    }
}

/// Spawn a game tick loop as a tokio task.
/// Returns the command sender, broadcast receiver and task handle.
pub fn spawn_match_session(
    game: Box<dyn ArenaGame>,
    settings: SessionSettings,
) -> (
    mpsc::UnboundedSender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionBroadcast>,
    JoinHandle<Option<MatchResult>>,
) {
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let mut game = game;
        run_session_loop(&mut *game, &settings, cmd_rx, broadcast_tx).await
    });

    (cmd_tx, broadcast_rx, handle)
}

fn broadcast_snapshot(
    game: &dyn ArenaGame,
    tick: u64,
    broadcast_tx: &mpsc::UnboundedSender<SessionBroadcast>,
) {
    match game.serialize_state() {
        Ok(data) => {
            let _ = broadcast_tx.send(SessionBroadcast::Snapshot {
                tick,
                data: Bytes::from(data),
            });
        },
        Err(e) => tracing::error!(tick, error = %e, "Failed to encode snapshot"),
    }
}

/// Drive `game` at a fixed rate until it finishes, is stopped, or every
/// command sender is gone.
async fn run_session_loop(
    game: &mut dyn ArenaGame,
    settings: &SessionSettings,
    mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
    broadcast_tx: mpsc::UnboundedSender<SessionBroadcast>,
) -> Option<MatchResult> {
    let tick_rate = settings
        .tick_rate_hz
        .filter(|hz| *hz > 0.0)
        .unwrap_or_else(|| game.tick_rate())
        .max(1.0);
    let dt = settings.time_scale.max(0.0) / tick_rate;
    let mut interval = tokio::time::interval(Duration::from_secs_f32(1.0 / tick_rate));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let meta = game.metadata();
    tracing::info!(game = %meta.name, tick_rate, dt, "session started");

    let mut tick: u64 = 0;
    let mut sim_secs = 0.0f32;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                tick += 1;
                if !game.is_paused() {
                    sim_secs += dt;
                }
                let signals = game.update(dt);
                if !signals.is_empty() {
                    for signal in &signals {
                        tracing::debug!(tick, signal = signal.name(), "game signal");
                    }
                    let _ = broadcast_tx.send(SessionBroadcast::Signals { tick, signals });
                }
                if settings.snapshot_every_ticks > 0
                    && tick % u64::from(settings.snapshot_every_ticks) == 0
                {
                    broadcast_snapshot(game, tick, &broadcast_tx);
                }
                if game.is_finished() {
                    broadcast_snapshot(game, tick, &broadcast_tx);
                    break;
                }
                if settings.max_sim_secs > 0.0 && sim_secs >= settings.max_sim_secs {
                    tracing::warn!(sim_secs, "session hit its time limit");
                    break;
                }
            }
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Vote { option, voter_id }) => {
                        game.cast_vote(option, &voter_id);
                    },
                    Some(SessionCommand::InjectVote(option)) => {
                        game.inject_vote(option);
                    },
                    Some(SessionCommand::ToggleAutoVote) => {
                        let on = game.toggle_auto_vote();
                        tracing::info!(auto_vote = on, "auto vote toggled");
                    },
                    Some(SessionCommand::Input { side, keys }) => {
                        game.set_input(side, keys);
                    },
                    Some(SessionCommand::Pause) => game.pause(),
                    Some(SessionCommand::Resume) => game.resume(),
                    Some(SessionCommand::Stop) | None => break,
                }
            }
        }
    }

    let result = game.result();
    tracing::info!(tick, finished = result.is_some(), "session ended");
    let _ = broadcast_tx.send(SessionBroadcast::Ended(result.clone()));
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_the_configured_mode() {
        let mut config = RunnerConfig::default();
        assert_eq!(create_game(&config).metadata().mode, GameMode::Duel);
        config.mode = GameMode::TreatAttack;
        let game = create_game(&config);
        assert_eq!(game.metadata().mode, GameMode::TreatAttack);
        assert_eq!(game.metadata().sides, 1);
    }
}
