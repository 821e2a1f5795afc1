//! Banking API wire types
//!
//! Request and response bodies for the CopperX REST API. The wire format is
//! camelCase JSON; unknown fields are ignored so upstream additions don't
//! break deserialization.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Purpose codes accepted on outbound transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PurposeCode {
    #[strum(serialize = "self")]
    #[serde(rename = "self")]
    Self_,
    Salary,
    Gift,
    Reimbursement,
}

impl PurposeCode {
    /// Human label for keyboards
    pub fn label(&self) -> &'static str {
        match self {
            PurposeCode::Self_ => "Self",
            PurposeCode::Salary => "Salary",
            PurposeCode::Gift => "Gift",
            PurposeCode::Reimbursement => "Reimbursement",
        }
    }
}

/// Response to an OTP request; `sid` must be echoed back on verification
#[derive(Debug, Clone, Deserialize)]
pub struct OtpRequested {
    pub email: String,
    pub sid: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpAuthenticateRequest {
    pub email: String,
    pub otp: String,
    pub sid: String,
}

/// Successful authentication payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub access_token: String,
    pub expire_at: chrono::DateTime<chrono::Utc>,
    pub user: Profile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(f), Some(l)) => format!("{f} {l}"),
            (Some(f), None) => f.clone(),
            (None, Some(l)) => l.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

/// One KYC application status
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycStatus {
    pub status: String,
    #[serde(default)]
    pub kyc_provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycPage {
    #[serde(default)]
    pub data: Vec<KycStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub network: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

/// Balances of one wallet across its tokens
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalance {
    pub wallet_id: String,
    pub network: String,
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub balances: Vec<TokenBalance>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub symbol: String,
    pub balance: String,
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payee {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub nick_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayeePage {
    #[serde(default)]
    pub data: Vec<Payee>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayeeRequest {
    pub email: String,
    pub nick_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendToEmailRequest {
    pub email: String,
    pub amount: String,
    pub purpose_code: PurposeCode,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletWithdrawRequest {
    pub wallet_address: String,
    pub network: String,
    pub amount: String,
    pub purpose_code: PurposeCode,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawQuoteRequest {
    pub wallet_address: String,
    pub network: String,
    pub amount: String,
    pub currency: String,
}

/// Fee quote for a wallet withdrawal
///
/// `error` carries a provider-side refusal (minimum amount, unsupported
/// route); shown to the user verbatim when present.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawQuote {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub fee: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSendRequest {
    pub requests: Vec<BatchSendItem>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSendItem {
    pub request_id: String,
    pub request: SendToEmailRequest,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    #[serde(default)]
    pub responses: Vec<BatchItemResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItemResult {
    pub request_id: String,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

impl BatchItemResult {
    pub fn succeeded(&self) -> bool {
        match &self.error {
            None | Some(serde_json::Value::Null) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default, rename = "type")]
    pub transfer_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPage {
    #[serde(default)]
    pub data: Vec<Transfer>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub has_more: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_code_wire_values() {
        assert_eq!(PurposeCode::Self_.to_string(), "self");
        assert_eq!(PurposeCode::Salary.to_string(), "salary");
        assert_eq!("gift".parse::<PurposeCode>().unwrap(), PurposeCode::Gift);
        assert_eq!(
            serde_json::to_string(&PurposeCode::Self_).unwrap(),
            r#""self""#
        );
    }

    #[test]
    fn test_auth_payload_deserializes_camel_case() {
        let json = r#"{
            "accessToken": "tok123",
            "expireAt": "2026-09-01T00:00:00Z",
            "user": {"id": "u1", "email": "a@b.co", "firstName": "Ada"}
        }"#;
        let payload: AuthPayload = serde_json::from_str(json).unwrap();
        assert_eq!(payload.access_token, "tok123");
        assert_eq!(payload.user.display_name(), "Ada");
    }

    #[test]
    fn test_batch_item_result_null_error_is_success() {
        let ok: BatchItemResult =
            serde_json::from_str(r#"{"requestId": "1", "error": null}"#).unwrap();
        assert!(ok.succeeded());
        let failed: BatchItemResult =
            serde_json::from_str(r#"{"requestId": "2", "error": {"message": "no"}}"#).unwrap();
        assert!(!failed.succeeded());
    }

    #[test]
    fn test_quote_error_field_optional() {
        let quote: WithdrawQuote =
            serde_json::from_str(r#"{"amount": "10", "fee": "0.5"}"#).unwrap();
        assert!(quote.error.is_none());
        let refused: WithdrawQuote =
            serde_json::from_str(r#"{"error": "Minimum withdrawal is 50 USDC"}"#).unwrap();
        assert_eq!(refused.error.as_deref(), Some("Minimum withdrawal is 50 USDC"));
    }
}
