//! Input validation for user-supplied strings
//!
//! Stateless predicates over the raw text a user types into a scene:
//! - email format
//! - transfer amount (positive decimal, bounded precision)
//! - blockchain address formats (EVM, Solana) with network detection
//! - `email,amount` lines for batch sends
//!
//! Error messages are user-displayable; scenes re-prompt with them verbatim.

use lazy_regex::regex_is_match;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum fractional digits accepted in an amount
pub const MAX_AMOUNT_DECIMALS: usize = 6;

/// Validation errors
///
/// These never surface as system failures; the owning scene step replies
/// with the message and stays in the same state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("That doesn't look like a valid email address. Please try again.")]
    InvalidEmail,

    #[error("Amount must be a positive number with at most {MAX_AMOUNT_DECIMALS} decimal places.")]
    InvalidAmount,

    #[error("That doesn't look like a valid {0} address. Please check it and try again.")]
    InvalidAddress(Network),

    #[error("Unrecognized address format. Supported networks: EVM (0x…) and Solana.")]
    UnknownNetwork,

    #[error("Line {line}: {reason}")]
    InvalidBatchLine { line: usize, reason: String },
}

/// Blockchain networks the bot can withdraw to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Evm,
    Solana,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Evm => write!(f, "EVM"),
            Network::Solana => write!(f, "Solana"),
        }
    }
}

impl Network {
    /// Wire value expected by the banking API
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Network::Evm => "evm",
            Network::Solana => "solana",
        }
    }
}

/// Validates an email address.
///
/// Format check only (one `@`, non-empty local part, dotted domain, no
/// whitespace) — deliverability is the API's problem.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// Validates a transfer amount string.
///
/// Accepts a plain positive decimal with at most [`MAX_AMOUNT_DECIMALS`]
/// fractional digits. Returns the input unchanged on success so callers can
/// forward exactly what the user typed to the API.
pub fn validate_amount(amount: &str) -> Result<&str, ValidationError> {
    if !regex_is_match!(r"^[0-9]+(\.[0-9]{1,6})?$", amount) {
        return Err(ValidationError::InvalidAmount);
    }
    // "0", "0.00" etc. are syntactically fine but not a transferable amount
    let value: f64 = amount.parse().map_err(|_| ValidationError::InvalidAmount)?;
    if value <= 0.0 {
        return Err(ValidationError::InvalidAmount);
    }
    Ok(amount)
}

/// Detects which network an address belongs to from its format.
///
/// EVM addresses are accepted case-insensitively; no EIP-55 checksum pass
/// is performed or claimed.
pub fn detect_network(address: &str) -> Result<Network, ValidationError> {
    if regex_is_match!(r"^0x[0-9a-fA-F]{40}$", address) {
        return Ok(Network::Evm);
    }
    if regex_is_match!(r"^[1-9A-HJ-NP-Za-km-z]{32,44}$", address) {
        return Ok(Network::Solana);
    }
    Err(ValidationError::UnknownNetwork)
}

/// Validates an address against an already-chosen network.
pub fn validate_address(address: &str, network: Network) -> Result<(), ValidationError> {
    match detect_network(address) {
        Ok(found) if found == network => Ok(()),
        _ => Err(ValidationError::InvalidAddress(network)),
    }
}

/// Parses one `email,amount` line of a batch send.
///
/// `line_no` is 1-based and only used for the error message.
pub fn parse_batch_line(line: &str, line_no: usize) -> Result<(String, String), ValidationError> {
    let mut parts = line.splitn(2, ',');
    let email = parts.next().unwrap_or("").trim();
    let amount = parts.next().unwrap_or("").trim();

    if email.is_empty() || amount.is_empty() {
        return Err(ValidationError::InvalidBatchLine {
            line: line_no,
            reason: "expected `email,amount`".to_string(),
        });
    }
    validate_email(email).map_err(|e| ValidationError::InvalidBatchLine {
        line: line_no,
        reason: e.to_string(),
    })?;
    validate_amount(amount).map_err(|e| ValidationError::InvalidBatchLine {
        line: line_no,
        reason: e.to_string(),
    })?;

    Ok((email.to_string(), amount.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== validate_email Tests ====================

    #[test]
    fn test_validate_email_valid() {
        let valid = vec![
            "user@example.com",
            "first.last@sub.domain.io",
            "a+tag@b.co",
        ];
        for email in valid {
            assert!(validate_email(email).is_ok(), "Failed for: {}", email);
        }
    }

    #[test]
    fn test_validate_email_invalid() {
        let invalid = vec![
            "user@",
            "@example.com",
            "user example.com",
            "user@domain",
            "user@@example.com",
            "",
        ];
        for email in invalid {
            assert!(validate_email(email).is_err(), "Should fail for: {}", email);
        }
    }

    // ==================== validate_amount Tests ====================

    #[test]
    fn test_validate_amount_valid() {
        let valid = vec!["10", "10.5", "0.000001", "1.123456", "100000"];
        for amount in valid {
            assert!(validate_amount(amount).is_ok(), "Failed for: {}", amount);
        }
    }

    #[test]
    fn test_validate_amount_invalid() {
        let invalid = vec!["-5", "0", "0.0", "abc", "1.2345678", "10,5", "1.", ".5", "1e3", ""];
        for amount in invalid {
            assert!(validate_amount(amount).is_err(), "Should fail for: {}", amount);
        }
    }

    #[test]
    fn test_validate_amount_returns_input_unchanged() {
        assert_eq!(validate_amount("10.50").unwrap(), "10.50");
    }

    // ==================== address Tests ====================

    #[test]
    fn test_detect_network_evm() {
        let addr = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
        assert_eq!(detect_network(addr).unwrap(), Network::Evm);
        // Case-insensitive: all-lowercase is accepted too
        assert_eq!(detect_network(&addr.to_lowercase()).unwrap(), Network::Evm);
    }

    #[test]
    fn test_detect_network_solana() {
        let addr = "7v91N7iZ9mNicL8WfG6cgSCKyRXydQjLh6UYBWwm6y1Q";
        assert_eq!(detect_network(addr).unwrap(), Network::Solana);
    }

    #[test]
    fn test_detect_network_unknown() {
        let bad = vec![
            "0x742d35",                                     // too short
            "0x742d35Cc6634C0532925a3b844Bc454e4438f44eFF", // too long
            "hello world",
            "O0Il-not-base58",
            "",
        ];
        for addr in bad {
            assert!(detect_network(addr).is_err(), "Should fail for: {}", addr);
        }
    }

    #[test]
    fn test_validate_address_network_mismatch() {
        let evm = "0x742d35Cc6634C0532925a3b844Bc454e4438f44e";
        assert!(validate_address(evm, Network::Evm).is_ok());
        assert_eq!(
            validate_address(evm, Network::Solana).unwrap_err(),
            ValidationError::InvalidAddress(Network::Solana)
        );
    }

    // ==================== parse_batch_line Tests ====================

    #[test]
    fn test_parse_batch_line_valid() {
        let (email, amount) = parse_batch_line("user@example.com, 10.5", 1).unwrap();
        assert_eq!(email, "user@example.com");
        assert_eq!(amount, "10.5");
    }

    #[test]
    fn test_parse_batch_line_invalid() {
        let cases = vec!["user@example.com", "user@example.com,", ",10", "user@,10", "a@b.co,abc"];
        for (i, line) in cases.into_iter().enumerate() {
            let err = parse_batch_line(line, i + 1).unwrap_err();
            match err {
                ValidationError::InvalidBatchLine { line: n, .. } => assert_eq!(n, i + 1),
                other => panic!("Unexpected error for {:?}: {:?}", line, other),
            }
        }
    }
}
