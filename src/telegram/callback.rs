//! Callback query data parsing
//!
//! All inline keyboard buttons carry `action` or `action:param` strings.
//! Parsing happens exactly once, at the edge of the callback handler; the
//! rest of the code matches on [`CallbackAction`] instead of poking at raw
//! strings. Telegram caps callback data at 64 bytes, so params are short
//! tokens (list indices, enum values), never full payloads.

/// A parsed inline button press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// Abort the active scene
    Cancel,
    /// Generic confirmation inside a scene
    Confirm,
    /// Payee chosen by index into the list shown with the keyboard
    Payee(usize),
    /// Recipient typed manually instead of picking a payee
    ManualRecipient,
    /// Answer to the "save this recipient?" question
    SavePayee(bool),
    /// Transfer purpose chosen from the keyboard
    Purpose(crate::api::types::PurposeCode),
    /// Make a wallet the default one
    DefaultWallet(String),
    /// Transfer history page navigation
    TransfersPage(u32),
}

impl CallbackAction {
    /// Parses raw callback data.
    ///
    /// `None` means the button is from an old message or unknown; the
    /// handler acknowledges the query and does nothing else.
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.splitn(2, ':');
        let action = parts.next()?;
        let param = parts.next();

        match (action, param) {
            ("cancel", None) => Some(CallbackAction::Cancel),
            ("confirm", None) => Some(CallbackAction::Confirm),
            ("payee", Some(idx)) => idx.parse().ok().map(CallbackAction::Payee),
            ("manual", None) => Some(CallbackAction::ManualRecipient),
            ("save_payee", Some("yes")) => Some(CallbackAction::SavePayee(true)),
            ("save_payee", Some("no")) => Some(CallbackAction::SavePayee(false)),
            ("purpose", Some(code)) => code.parse().ok().map(CallbackAction::Purpose),
            ("default_wallet", Some(id)) if !id.is_empty() => {
                Some(CallbackAction::DefaultWallet(id.to_string()))
            }
            ("transfers_page", Some(page)) => page.parse().ok().map(CallbackAction::TransfersPage),
            _ => None,
        }
    }

    /// Serializes back to callback data (inverse of [`parse`](Self::parse)).
    pub fn to_data(&self) -> String {
        match self {
            CallbackAction::Cancel => "cancel".to_string(),
            CallbackAction::Confirm => "confirm".to_string(),
            CallbackAction::Payee(idx) => format!("payee:{idx}"),
            CallbackAction::ManualRecipient => "manual".to_string(),
            CallbackAction::SavePayee(true) => "save_payee:yes".to_string(),
            CallbackAction::SavePayee(false) => "save_payee:no".to_string(),
            CallbackAction::Purpose(code) => format!("purpose:{code}"),
            CallbackAction::DefaultWallet(id) => format!("default_wallet:{id}"),
            CallbackAction::TransfersPage(page) => format!("transfers_page:{page}"),
        }
    }

    /// Whether the action touches account data and needs a valid auth.
    pub fn is_protected(&self) -> bool {
        !matches!(self, CallbackAction::Cancel)
    }
}
