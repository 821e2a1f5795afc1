//! Bot command definitions

use teloxide::utils::command::BotCommands;

/// Slash commands registered with Telegram
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "I can do:")]
pub enum Command {
    #[command(description = "welcome and quick start")]
    Start,
    #[command(description = "list available commands")]
    Help,
    #[command(description = "sign in with your email")]
    Login,
    #[command(description = "sign out and clear your session")]
    Logout,
    #[command(description = "show your account profile")]
    Profile,
    #[command(description = "show your KYC verification status")]
    Kyc,
    #[command(description = "show wallet balances")]
    Balance,
    #[command(description = "list wallets and set the default")]
    Wallets,
    #[command(description = "send funds to an email address")]
    Send,
    #[command(description = "withdraw to an external wallet")]
    Withdraw,
    #[command(description = "send to multiple recipients at once")]
    Batch,
    #[command(description = "recent transfer history")]
    Transfers,
    #[command(description = "abort the current operation")]
    Cancel,
}

/// Whether a command requires a valid authentication.
///
/// Everything that reads account data or moves funds is protected;
/// /start, /help, /login, /logout and /cancel always work.
pub fn is_protected_command(cmd: &Command) -> bool {
    matches!(
        cmd,
        Command::Profile
            | Command::Kyc
            | Command::Balance
            | Command::Wallets
            | Command::Send
            | Command::Withdraw
            | Command::Batch
            | Command::Transfers
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_parse_lowercase() {
        assert_eq!(Command::parse("/login", "testbot").unwrap(), Command::Login);
        assert_eq!(Command::parse("/balance", "testbot").unwrap(), Command::Balance);
        assert_eq!(Command::parse("/cancel", "testbot").unwrap(), Command::Cancel);
        assert!(Command::parse("/unknown", "testbot").is_err());
    }

    #[test]
    fn test_protected_set() {
        let open = [
            Command::Start,
            Command::Help,
            Command::Login,
            Command::Logout,
            Command::Cancel,
        ];
        for cmd in &open {
            assert!(!is_protected_command(cmd), "{cmd:?} must not require auth");
        }
        let protected = [
            Command::Profile,
            Command::Kyc,
            Command::Balance,
            Command::Wallets,
            Command::Send,
            Command::Withdraw,
            Command::Batch,
            Command::Transfers,
        ];
        for cmd in &protected {
            assert!(is_protected_command(cmd), "{cmd:?} must require auth");
        }
    }
}
