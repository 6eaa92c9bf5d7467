pub mod config;
pub mod error;
pub mod game_loop;

use leashbreak_chat::{ChatBridge, ChatConfig, ChatHandle};
use leashbreak_core::events::GameSignal;
use leashbreak_core::game::{ArenaGame, MatchResult};

use config::RunnerConfig;
use error::RunnerError;
use game_loop::{SessionBroadcast, SessionCommand, spawn_match_session};

pub use game_loop::create_game;

/// Start the chat bridge for `game` if enabled and credentials are set.
fn start_chat(config: &RunnerConfig, game: &dyn ArenaGame) -> Option<ChatHandle> {
    if !config.chat.enabled {
        return None;
    }
    let Some(chat) = ChatConfig::from_env() else {
        tracing::warn!("chat enabled but TWITCH_CHANNEL/TWITCH_ACCESS_TOKEN are not set");
        return None;
    };
    tracing::info!(channel = %chat.channel, "starting chat bridge");
    Some(ChatBridge::new(chat, game.vote_sender()).spawn())
}

/// Play one match headless and return its result.
pub async fn run(config: RunnerConfig) -> Result<MatchResult, RunnerError> {
    let game = create_game(&config);
    run_game(game, &config).await
}

/// Play an already-built game under the session settings in `config`.
pub async fn run_game(
    game: Box<dyn ArenaGame>,
    config: &RunnerConfig,
) -> Result<MatchResult, RunnerError> {
    let chat = start_chat(config, &*game);
    let (cmd_tx, mut broadcast_rx, handle) =
        spawn_match_session(game, config.session.clone());
    if config.chat.auto_vote {
        let _ = cmd_tx.send(SessionCommand::ToggleAutoVote);
    }

    let mut result = None;
    while let Some(msg) = broadcast_rx.recv().await {
        match msg {
            SessionBroadcast::Signals { signals, .. } => {
                for signal in signals {
                    log_signal(&signal);
                }
            },
            SessionBroadcast::Snapshot { .. } => {},
            SessionBroadcast::Ended(r) => {
                result = r;
                break;
            },
        }
    }
    drop(cmd_tx);

    if let Err(e) = handle.await {
        tracing::error!(error = %e, "session task failed");
    }
    if let Some(chat) = chat {
        chat.stop().await;
    }
    result.ok_or(RunnerError::SessionLost)
}

/// Pretty JSON for the final result, as printed by the binary.
pub fn result_json(result: &MatchResult) -> Result<String, RunnerError> {
    Ok(serde_json::to_string_pretty(result)?)
}

fn log_signal(signal: &GameSignal) {
    match signal {
        GameSignal::RoundEnded {
            round,
            winner,
            scores,
            ..
        } => {
            tracing::info!(round, winner = ?winner, left = scores.left, right = scores.right, "round over");
        },
        GameSignal::VoteResolved { winner, .. } => {
            tracing::info!(winner = ?winner, "audience vote");
        },
        GameSignal::GameOver { final_score } => {
            tracing::info!(final_score, "game over");
        },
        _ => {},
    }
}
