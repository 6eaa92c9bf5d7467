use leashbreak_core::voting::LeashVote;

/// The handful of IRC lines the bridge cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine<'a> {
    Privmsg {
        sender: &'a str,
        /// Twitch `display-name` tag when present.
        display_name: Option<&'a str>,
        channel: &'a str,
        text: &'a str,
    },
    Ping(&'a str),
    /// `001` numeric: registration accepted.
    Welcome,
    /// Server notice announcing a failed login.
    AuthFailed(&'a str),
    Reconnect,
    Other,
}

/// Parse one IRC line (without the trailing CRLF).
pub fn parse_line(line: &str) -> ChatLine<'_> {
    let mut rest = line.trim_end_matches(['\r', '\n']);

    let mut tags = None;
    if let Some(stripped) = rest.strip_prefix('@') {
        let (t, r) = stripped.split_once(' ').unwrap_or((stripped, ""));
        tags = Some(t);
        rest = r;
    }

    let mut prefix = None;
    if let Some(stripped) = rest.strip_prefix(':') {
        let (p, r) = stripped.split_once(' ').unwrap_or((stripped, ""));
        prefix = Some(p);
        rest = r;
    }

    let (command, params) = rest.split_once(' ').unwrap_or((rest, ""));
    match command {
        "PING" => ChatLine::Ping(params.strip_prefix(':').unwrap_or(params)),
        "001" => ChatLine::Welcome,
        "RECONNECT" => ChatLine::Reconnect,
        "NOTICE" => {
            let text = trailing(params).unwrap_or_default();
            let lower = text.to_lowercase();
            if lower.contains("authentication failed") || lower.contains("improperly formatted auth")
            {
                ChatLine::AuthFailed(text)
            } else {
                ChatLine::Other
            }
        },
        "PRIVMSG" => {
            let Some(sender) = prefix.map(|p| p.split('!').next().unwrap_or(p)) else {
                return ChatLine::Other;
            };
            let channel = params
                .split_once(' ')
                .map(|(c, _)| c)
                .unwrap_or(params)
                .trim_start_matches('#');
            let Some(text) = trailing(params) else {
                return ChatLine::Other;
            };
            ChatLine::Privmsg {
                sender,
                display_name: tags.and_then(|t| tag_value(t, "display-name")),
                channel,
                text,
            }
        },
        _ => ChatLine::Other,
    }
}

/// The `:`-prefixed trailing parameter.
fn trailing(params: &str) -> Option<&str> {
    if let Some(t) = params.strip_prefix(':') {
        return Some(t);
    }
    params.split_once(" :").map(|(_, t)| t)
}

fn tag_value<'a>(tags: &'a str, key: &str) -> Option<&'a str> {
    tags.split(';')
        .filter_map(|kv| kv.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
        .filter(|v| !v.is_empty())
}

/// A chat vote: the voter is the lowercase login name.
pub fn vote_from_line(line: &str, own_nick: &str) -> Option<(LeashVote, String)> {
    match parse_line(line) {
        ChatLine::Privmsg { sender, text, .. } if !sender.eq_ignore_ascii_case(own_nick) => {
            LeashVote::parse_command(text).map(|vote| (vote, sender.to_lowercase()))
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_privmsg() {
        let line = ":alice!alice@alice.tmi.twitch.tv PRIVMSG #dogs :!extend";
        assert_eq!(
            parse_line(line),
            ChatLine::Privmsg {
                sender: "alice",
                display_name: None,
                channel: "dogs",
                text: "!extend",
            }
        );
    }

    #[test]
    fn parses_tagged_privmsg() {
        let line = "@badge-info=;display-name=Bob;mod=0 :bob!bob@bob.tmi.twitch.tv PRIVMSG #dogs :!YANK now\r\n";
        match parse_line(line) {
            ChatLine::Privmsg {
                sender,
                display_name,
                text,
                ..
            } => {
                assert_eq!(sender, "bob");
                assert_eq!(display_name, Some("Bob"));
                assert_eq!(text, "!YANK now");
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_ping_and_welcome() {
        assert_eq!(parse_line("PING :tmi.twitch.tv"), ChatLine::Ping("tmi.twitch.tv"));
        assert_eq!(
            parse_line(":tmi.twitch.tv 001 dogbot :Welcome, GLHF!"),
            ChatLine::Welcome
        );
        assert_eq!(parse_line(":tmi.twitch.tv RECONNECT"), ChatLine::Reconnect);
        assert_eq!(parse_line(":tmi.twitch.tv 372 dogbot :You are in"), ChatLine::Other);
    }

    #[test]
    fn detects_auth_failure() {
        let line = ":tmi.twitch.tv NOTICE * :Login authentication failed";
        assert_eq!(
            parse_line(line),
            ChatLine::AuthFailed("Login authentication failed")
        );
    }

    #[test]
    fn votes_use_command_grammar() {
        let line = |text: &str| format!(":Carol!carol@host PRIVMSG #dogs :{text}");
        assert_eq!(
            vote_from_line(&line("  !Help "), "dogbot"),
            Some((LeashVote::Extend, "carol".to_string()))
        );
        assert_eq!(
            vote_from_line(&line("!hinder"), "dogbot"),
            Some((LeashVote::Yank, "carol".to_string()))
        );
        assert_eq!(vote_from_line(&line("!yank now"), "dogbot"), None);
        assert_eq!(vote_from_line(&line("hello"), "dogbot"), None);
    }

    #[test]
    fn own_messages_are_ignored() {
        let line = ":DogBot!dogbot@host PRIVMSG #dogs :!extend";
        assert_eq!(vote_from_line(line, "dogbot"), None);
    }

    #[test]
    fn garbage_is_other() {
        assert_eq!(parse_line(""), ChatLine::Other);
        assert_eq!(parse_line(":"), ChatLine::Other);
        assert_eq!(parse_line("PRIVMSG #dogs :no prefix"), ChatLine::Other);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_panics(line in ".{0,200}") {
                let _ = parse_line(&line);
                let _ = vote_from_line(&line, "dogbot");
            }
        }
    }
}
