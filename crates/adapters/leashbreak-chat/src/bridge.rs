use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use leashbreak_core::voting::VoteSender;

use crate::config::ChatConfig;
use crate::irc::{ChatLine, parse_line, vote_from_line};

#[derive(Debug)]
pub enum BridgeError {
    Io(std::io::Error),
    /// The server hung up or asked us to reconnect.
    Closed,
    AuthRejected(String),
    /// The game dropped its vote inbox; nothing left to deliver to.
    InboxClosed,
}

impl std::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "chat connection error: {e}"),
            Self::Closed => write!(f, "chat connection closed"),
            Self::AuthRejected(m) => write!(f, "chat login rejected: {m}"),
            Self::InboxClosed => write!(f, "vote inbox closed"),
        }
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Connection state, observable from the game side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeStatus {
    Connecting,
    Connected,
    Disconnected(String),
    Stopped,
}

/// Forwards `!extend`/`!yank` chat commands into a game's vote queue.
pub struct ChatBridge {
    config: ChatConfig,
    votes: VoteSender,
    status: watch::Sender<BridgeStatus>,
}

/// Handle to a running bridge task.
pub struct ChatHandle {
    shutdown: watch::Sender<bool>,
    status: watch::Receiver<BridgeStatus>,
    task: JoinHandle<()>,
}

impl ChatHandle {
    pub fn status(&self) -> BridgeStatus {
        self.status.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        *self.status.borrow() == BridgeStatus::Connected
    }

    /// Wait for the next status change.
    pub async fn changed(&mut self) -> BridgeStatus {
        if self.status.changed().await.is_err() {
            return BridgeStatus::Stopped;
        }
        self.status.borrow().clone()
    }

    /// Ask the bridge to disconnect and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "chat bridge task failed");
        }
    }
}

impl ChatBridge {
    pub fn new(config: ChatConfig, votes: VoteSender) -> Self {
        let (status, _) = watch::channel(BridgeStatus::Connecting);
        Self {
            config,
            votes,
            status,
        }
    }

    /// Run the bridge on the current tokio runtime.
    pub fn spawn(self) -> ChatHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let status = self.status.subscribe();
        let task = tokio::spawn(self.run(shutdown_rx));
        ChatHandle {
            shutdown: shutdown_tx,
            status,
            task,
        }
    }

    /// Connect, forward votes, and reconnect with backoff until shut down,
    /// the login is rejected, or the game's inbox goes away.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let base = self.config.reconnect_delay_secs.max(1);
        let mut delay = base;
        loop {
            self.status.send_replace(BridgeStatus::Connecting);
            let error = tokio::select! {
                e = self.session() => e,
                _ = shutdown.changed() => {
                    tracing::info!("chat bridge shutting down");
                    break;
                }
            };
            match error {
                BridgeError::AuthRejected(_) | BridgeError::InboxClosed => {
                    tracing::warn!(error = %error, "chat bridge giving up");
                    self.status
                        .send_replace(BridgeStatus::Disconnected(error.to_string()));
                    return;
                },
                e => {
                    // A session that got through login starts the backoff over.
                    if *self.status.borrow() == BridgeStatus::Connected {
                        delay = base;
                    }
                    tracing::warn!(error = %e, retry_secs = delay, "chat bridge disconnected");
                    self.status
                        .send_replace(BridgeStatus::Disconnected(e.to_string()));
                },
            }
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(delay)) => {},
                _ = shutdown.changed() => break,
            }
            delay = (delay * 2).min(self.config.max_reconnect_delay_secs.max(base));
        }
        self.status.send_replace(BridgeStatus::Stopped);
    }

    /// One connection lifetime, ending in the reason it ended.
    async fn session(&self) -> BridgeError {
        match self.read_chat().await {
            Ok(()) => BridgeError::Closed,
            Err(e) => e,
        }
    }

    async fn read_chat(&self) -> Result<(), BridgeError> {
        let stream = TcpStream::connect(self.config.address()).await?;
        let (read, mut write) = stream.into_split();
        self.login(&mut write).await?;
        tracing::info!(channel = %self.config.channel, "chat bridge connected");

        let mut lines = BufReader::new(read).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_line(&line) {
                ChatLine::Ping(token) => {
                    write
                        .write_all(format!("PONG :{token}\r\n").as_bytes())
                        .await?;
                },
                ChatLine::Welcome => {
                    self.status.send_replace(BridgeStatus::Connected);
                },
                ChatLine::AuthFailed(msg) => {
                    return Err(BridgeError::AuthRejected(msg.to_string()));
                },
                ChatLine::Reconnect => return Err(BridgeError::Closed),
                ChatLine::Privmsg { .. } => {
                    if let Some((vote, voter)) = vote_from_line(&line, &self.config.nick) {
                        tracing::debug!(voter = %voter, vote = %vote, "chat vote");
                        if !self.votes.send(vote, voter) {
                            return Err(BridgeError::InboxClosed);
                        }
                    }
                },
                ChatLine::Other => {},
            }
        }
        Ok(())
    }

    async fn login<W: AsyncWrite + Unpin>(&self, write: &mut W) -> Result<(), BridgeError> {
        let handshake = format!(
            "CAP REQ :twitch.tv/tags\r\nPASS {}\r\nNICK {}\r\nJOIN #{}\r\n",
            self.config.token, self.config.nick, self.config.channel
        );
        write.write_all(handshake.as_bytes()).await?;
        write.flush().await?;
        Ok(())
    }
}
