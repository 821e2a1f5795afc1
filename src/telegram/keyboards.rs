//! Inline keyboard construction
//!
//! Scenes describe keyboards as rows of `(label, callback_data)` pairs so
//! they stay independent of teloxide types; this module converts them and
//! builds the keyboards used outside scenes.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::api::types::Wallet;
use crate::telegram::callback::CallbackAction;

/// Row-major button spec produced by scenes
pub type KeyboardSpec = Vec<Vec<(String, String)>>;

/// Converts a scene keyboard spec into Telegram markup.
pub fn to_markup(spec: &KeyboardSpec) -> InlineKeyboardMarkup {
    let rows = spec
        .iter()
        .map(|row| {
            row.iter()
                .map(|(label, data)| InlineKeyboardButton::callback(label.clone(), data.clone()))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// One button per wallet, for picking the default.
pub fn wallet_picker(wallets: &[Wallet]) -> InlineKeyboardMarkup {
    let rows = wallets
        .iter()
        .map(|wallet| {
            let marker = if wallet.is_default.unwrap_or(false) { " ✓" } else { "" };
            vec![InlineKeyboardButton::callback(
                format!("{}{marker}", wallet.network),
                CallbackAction::DefaultWallet(wallet.id.clone()).to_data(),
            )]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Prev/next navigation for the transfer history.
pub fn transfers_pager(page: u32, has_more: bool) -> Option<InlineKeyboardMarkup> {
    let mut row = Vec::new();
    if page > 1 {
        row.push(InlineKeyboardButton::callback(
            "« Prev".to_string(),
            CallbackAction::TransfersPage(page - 1).to_data(),
        ));
    }
    if has_more {
        row.push(InlineKeyboardButton::callback(
            "Next »".to_string(),
            CallbackAction::TransfersPage(page + 1).to_data(),
        ));
    }
    if row.is_empty() {
        None
    } else {
        Some(InlineKeyboardMarkup::new(vec![row]))
    }
}
