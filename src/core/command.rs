//! Command parser for the : command system

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Navigation
    Propose,
    Pending,
    History,
    /// Select a transaction by id and show its details
    Tx(u64),

    // Actions
    Approve(u64),
    Cancel(u64),
    Refresh,

    // Wallet
    Connect,
    Watch(String),
    Disconnect,
    Endpoint(Option<usize>),

    Help,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let id = || args.as_deref().and_then(parse_id);

    match cmd.to_lowercase().as_str() {
        "propose" | "new" => Command::Propose,
        "pending" | "p" => Command::Pending,
        "history" | "hist" => Command::History,
        "tx" | "show" => match id() {
            Some(id) => Command::Tx(id),
            None => Command::Unknown(input.to_string()),
        },

        "approve" | "ok" => match id() {
            Some(id) => Command::Approve(id),
            None => Command::Unknown(input.to_string()),
        },
        "cancel" => match id() {
            Some(id) => Command::Cancel(id),
            None => Command::Unknown(input.to_string()),
        },
        "refresh" | "r" => Command::Refresh,

        "connect" | "conn" => Command::Connect,
        "watch" => match args.clone() {
            Some(address) => Command::Watch(address),
            None => Command::Unknown(input.to_string()),
        },
        "disconnect" | "dc" => Command::Disconnect,
        "endpoint" | "rpc" => Command::Endpoint(args.as_deref().and_then(|s| s.parse().ok())),

        "help" | "h" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}

/// Transaction ids are positive; `#` prefixes are accepted
fn parse_id(value: &str) -> Option<u64> {
    value
        .trim()
        .trim_start_matches('#')
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation_commands() {
        assert_eq!(parse_command("propose"), Command::Propose);
        assert_eq!(parse_command("pending"), Command::Pending);
        assert_eq!(parse_command("HISTORY"), Command::History);
        assert_eq!(parse_command("tx 12"), Command::Tx(12));
        assert_eq!(parse_command("tx #12"), Command::Tx(12));
    }

    #[test]
    fn test_parse_action_commands() {
        assert_eq!(parse_command("approve 3"), Command::Approve(3));
        assert_eq!(parse_command("cancel  7 "), Command::Cancel(7));
        assert_eq!(parse_command("refresh"), Command::Refresh);
    }

    #[test]
    fn test_ids_must_be_positive() {
        assert_eq!(
            parse_command("approve 0"),
            Command::Unknown("approve 0".to_string())
        );
        assert_eq!(
            parse_command("cancel"),
            Command::Unknown("cancel".to_string())
        );
        assert_eq!(
            parse_command("tx abc"),
            Command::Unknown("tx abc".to_string())
        );
    }

    #[test]
    fn test_parse_wallet_commands() {
        assert_eq!(parse_command("connect"), Command::Connect);
        assert_eq!(parse_command("disconnect"), Command::Disconnect);
        assert_eq!(
            parse_command("watch 0xabc"),
            Command::Watch("0xabc".to_string())
        );
        assert_eq!(parse_command("endpoint 1"), Command::Endpoint(Some(1)));
        assert_eq!(parse_command("endpoint"), Command::Endpoint(None));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("notacommand"),
            Command::Unknown("notacommand".to_string())
        );
    }
}
