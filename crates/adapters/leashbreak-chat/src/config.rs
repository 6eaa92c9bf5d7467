/// Connection settings for the chat vote bridge.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// IRC host, `irc.chat.twitch.tv` for Twitch.
    pub host: String,
    pub port: u16,
    /// Channel name without the leading `#`.
    pub channel: String,
    /// OAuth token, always carrying the `oauth:` prefix.
    pub token: String,
    pub nick: String,
    /// First reconnect delay; doubles after each failed attempt.
    pub reconnect_delay_secs: u64,
    pub max_reconnect_delay_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            host: "irc.chat.twitch.tv".to_string(),
            port: 6667,
            channel: String::new(),
            token: String::new(),
            nick: String::new(),
            reconnect_delay_secs: 2,
            max_reconnect_delay_secs: 60,
        }
    }
}

/// Add the `oauth:` prefix the IRC gateway expects if it is missing.
pub fn normalize_token(token: &str) -> String {
    let token = token.trim();
    if token.starts_with("oauth:") {
        token.to_string()
    } else {
        format!("oauth:{token}")
    }
}

impl ChatConfig {
    pub fn new(channel: &str, token: &str) -> Self {
        let channel = channel.trim().trim_start_matches('#').to_lowercase();
        Self {
            nick: channel.clone(),
            channel,
            token: normalize_token(token),
            ..Self::default()
        }
    }

    /// Read `TWITCH_CHANNEL`, `TWITCH_ACCESS_TOKEN` and optionally
    /// `TWITCH_NICK`. Returns `None` when chat is not configured.
    pub fn from_env() -> Option<Self> {
        let channel = std::env::var("TWITCH_CHANNEL").ok()?;
        let token = std::env::var("TWITCH_ACCESS_TOKEN").ok()?;
        if channel.trim().is_empty() || token.trim().is_empty() {
            return None;
        }
        let mut config = Self::new(&channel, &token);
        if let Ok(nick) = std::env::var("TWITCH_NICK")
            && !nick.trim().is_empty()
        {
            config.nick = nick.trim().to_lowercase();
        }
        Some(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_prefix_added_once() {
        assert_eq!(normalize_token("abc123"), "oauth:abc123");
        assert_eq!(normalize_token("oauth:abc123"), "oauth:abc123");
        assert_eq!(normalize_token("  abc  "), "oauth:abc");
    }

    #[test]
    fn channel_is_normalised() {
        let config = ChatConfig::new("#MyChannel ", "tok");
        assert_eq!(config.channel, "mychannel");
        assert_eq!(config.nick, "mychannel");
        assert_eq!(config.token, "oauth:tok");
        assert_eq!(config.address(), "irc.chat.twitch.tv:6667");
    }
}
