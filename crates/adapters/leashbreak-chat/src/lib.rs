pub mod bridge;
pub mod config;
pub mod irc;

pub use bridge::{BridgeError, BridgeStatus, ChatBridge, ChatHandle};
pub use config::ChatConfig;
