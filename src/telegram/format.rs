//! Message text builders
//!
//! Pure functions from API data to the plain-text messages the bot sends.
//! No parse mode is used anywhere, so nothing here needs escaping.

use crate::api::types::{KycPage, Profile, Transfer, Wallet, WalletBalance};
use crate::core::config::display::TRANSFERS_PAGE_SIZE;

pub fn welcome() -> String {
    "Welcome to CopperX! I help you manage your stablecoin account from Telegram.\n\n\
     Use /login to sign in, then /help to see everything I can do."
        .to_string()
}

pub fn auth_required() -> String {
    "You need to sign in first. Use /login to get started.".to_string()
}

pub fn session_expired() -> String {
    "Your session has expired. Use /login to sign in again.".to_string()
}

pub fn operation_cancelled() -> String {
    "Cancelled. Nothing was sent.".to_string()
}

pub fn nothing_to_cancel() -> String {
    "There's nothing in progress to cancel.".to_string()
}

pub fn unknown_input() -> String {
    "I didn't understand that. Use /help to see available commands.".to_string()
}

pub fn generic_failure() -> String {
    "Something went wrong on our side. The operation was aborted; please try again.".to_string()
}

pub fn rate_limited(message: &str, seconds_remaining: i64) -> String {
    format!("{message} Please try again in {seconds_remaining} seconds.")
}

pub fn profile(p: &Profile) -> String {
    let mut out = format!("Your profile\n\nName: {}\nEmail: {}", p.display_name(), p.email);
    if let Some(status) = &p.status {
        out.push_str(&format!("\nStatus: {status}"));
    }
    if let Some(org) = &p.organization_id {
        out.push_str(&format!("\nOrganization: {org}"));
    }
    out
}

pub fn kyc_status(page: &KycPage) -> String {
    match page.data.first() {
        Some(kyc) if kyc.status.eq_ignore_ascii_case("approved") => {
            "KYC status: approved. You have full access to transfers.".to_string()
        }
        Some(kyc) => format!(
            "KYC status: {}.\nComplete your verification on the CopperX website to unlock transfers.",
            kyc.status
        ),
        None => "No KYC application found. Start verification on the CopperX website.".to_string(),
    }
}

pub fn balances(balances: &[WalletBalance]) -> String {
    if balances.is_empty() {
        return "No wallets found on your account.".to_string();
    }
    let mut out = String::from("Your balances\n");
    for wb in balances {
        let marker = if wb.is_default.unwrap_or(false) { " (default)" } else { "" };
        out.push_str(&format!("\n{}{}:\n", wb.network, marker));
        if wb.balances.is_empty() {
            out.push_str("  (empty)\n");
        }
        for token in &wb.balances {
            out.push_str(&format!("  {} {}\n", token.balance, token.symbol));
        }
    }
    out.trim_end().to_string()
}

pub fn wallets_header(wallets: &[Wallet]) -> String {
    if wallets.is_empty() {
        return "No wallets found on your account.".to_string();
    }
    let mut out = String::from("Your wallets\n");
    for wallet in wallets {
        let marker = if wallet.is_default.unwrap_or(false) { " (default)" } else { "" };
        let address = wallet.wallet_address.as_deref().unwrap_or("(no address)");
        out.push_str(&format!("\n{}{}\n  {}\n", wallet.network, marker, address));
    }
    out.push_str("\nTap a wallet below to make it the default.");
    out
}

pub fn transfers_page(page_items: &[Transfer], page: u32) -> String {
    if page_items.is_empty() {
        return if page <= 1 {
            "No transfers yet.".to_string()
        } else {
            "No more transfers.".to_string()
        };
    }
    let mut out = format!("Recent transfers (page {page})\n");
    for t in page_items {
        let amount = t.amount.as_deref().unwrap_or("?");
        let currency = t.currency.as_deref().unwrap_or("");
        let status = t.status.as_deref().unwrap_or("unknown");
        let kind = t.transfer_type.as_deref().unwrap_or("transfer");
        let date = t
            .created_at
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!("\n{date}  {kind}  {amount} {currency}  [{status}]"));
    }
    if page_items.len() as u32 >= TRANSFERS_PAGE_SIZE {
        out.push_str("\n\nUse the buttons below to see more.");
    }
    out
}

pub fn transfer_submitted(t: &Transfer) -> String {
    let status = t.status.as_deref().unwrap_or("pending");
    format!("Transfer submitted.\nID: {}\nStatus: {status}", t.id)
}
