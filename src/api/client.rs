//! CopperX REST client
//!
//! Thin reqwest wrapper: every operation is `method + path + optional bearer
//! token + JSON body`, with the API's `{"message": ...}` error envelope
//! mapped to [`ApiError::Api`]. The [`BankingApi`] trait is the seam the
//! Telegram layer talks through; tests substitute a mock implementation.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::api::types::*;
use crate::core::config;

/// Banking API failure
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (timeout, DNS, TLS)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response with the server's message extracted
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl ApiError {
    /// Token rejected; the caller should clear stored credentials
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Api { status: 401, .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// All banking operations the bot performs
///
/// `token` is the bearer token from the user's session; authentication
/// endpoints take none.
#[async_trait::async_trait]
pub trait BankingApi: Send + Sync {
    async fn request_otp(&self, email: &str) -> ApiResult<OtpRequested>;
    async fn authenticate_otp(&self, email: &str, otp: &str, sid: &str) -> ApiResult<AuthPayload>;
    async fn profile(&self, token: &str) -> ApiResult<Profile>;
    async fn kyc_status(&self, token: &str) -> ApiResult<KycPage>;
    async fn wallets(&self, token: &str) -> ApiResult<Vec<Wallet>>;
    async fn balances(&self, token: &str) -> ApiResult<Vec<WalletBalance>>;
    async fn set_default_wallet(&self, token: &str, wallet_id: &str) -> ApiResult<Wallet>;
    async fn payees(&self, token: &str) -> ApiResult<PayeePage>;
    async fn create_payee(&self, token: &str, req: &CreatePayeeRequest) -> ApiResult<Payee>;
    async fn send_to_email(&self, token: &str, req: &SendToEmailRequest) -> ApiResult<Transfer>;
    async fn wallet_withdraw(&self, token: &str, req: &WalletWithdrawRequest) -> ApiResult<Transfer>;
    async fn withdraw_quote(&self, token: &str, req: &WithdrawQuoteRequest) -> ApiResult<WithdrawQuote>;
    async fn send_batch(&self, token: &str, req: &BatchSendRequest) -> ApiResult<BatchResponse>;
    async fn transfers(&self, token: &str, page: u32, limit: u32) -> ApiResult<TransferPage>;
}

/// reqwest-backed implementation against the live API
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

/// Shape of the API's error body
#[derive(Debug, serde::Deserialize)]
struct ErrorEnvelope {
    message: serde_json::Value,
}

impl ApiClient {
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config::network::timeout())
            .build()?;
        Self::with_client(base_url, http)
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> ApiResult<Self> {
        // Trailing slash so Url::join treats the base as a directory
        let normalized = format!("{}/", base_url.trim_end_matches('/'));
        let base = Url::parse(&normalized).map_err(|_| ApiError::Api {
            status: 0,
            message: format!("Invalid API base URL: {base_url}"),
        })?;
        Ok(Self { http, base })
    }

    async fn request<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> ApiResult<T> {
        let url = self.base.join(path).map_err(|_| ApiError::Api {
            status: 0,
            message: format!("Invalid API path: {path}"),
        })?;

        let mut req = self.http.request(method.clone(), url);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let message = Self::extract_message(status, resp.text().await.unwrap_or_default());
        log::warn!("API {method} {path} failed with {status}: {message}");
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Pulls a human-readable message out of an error body.
    ///
    /// The API returns `{"message": "..."}` or `{"message": [...]}`; anything
    /// else falls back to the status text.
    fn extract_message(status: StatusCode, body: String) -> String {
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            match envelope.message {
                serde_json::Value::String(s) if !s.is_empty() => return s,
                serde_json::Value::Array(items) => {
                    let parts: Vec<String> = items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect();
                    if !parts.is_empty() {
                        return parts.join("; ");
                    }
                }
                _ => {}
            }
        }
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> ApiResult<T> {
        self.request::<(), T>(Method::GET, path, Some(token), None).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::POST, path, token, Some(body)).await
    }
}

#[async_trait::async_trait]
impl BankingApi for ApiClient {
    async fn request_otp(&self, email: &str) -> ApiResult<OtpRequested> {
        let body = OtpRequest { email: email.to_string() };
        self.post("api/auth/email-otp/request", None, &body).await
    }

    async fn authenticate_otp(&self, email: &str, otp: &str, sid: &str) -> ApiResult<AuthPayload> {
        let body = OtpAuthenticateRequest {
            email: email.to_string(),
            otp: otp.to_string(),
            sid: sid.to_string(),
        };
        self.post("api/auth/email-otp/authenticate", None, &body).await
    }

    async fn profile(&self, token: &str) -> ApiResult<Profile> {
        self.get("api/auth/me", token).await
    }

    async fn kyc_status(&self, token: &str) -> ApiResult<KycPage> {
        self.get("api/kycs", token).await
    }

    async fn wallets(&self, token: &str) -> ApiResult<Vec<Wallet>> {
        self.get("api/wallets", token).await
    }

    async fn balances(&self, token: &str) -> ApiResult<Vec<WalletBalance>> {
        self.get("api/wallets/balances", token).await
    }

    async fn set_default_wallet(&self, token: &str, wallet_id: &str) -> ApiResult<Wallet> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body<'a> {
            wallet_id: &'a str,
        }
        self.post("api/wallets/default", Some(token), &Body { wallet_id }).await
    }

    async fn payees(&self, token: &str) -> ApiResult<PayeePage> {
        self.get("api/payees", token).await
    }

    async fn create_payee(&self, token: &str, req: &CreatePayeeRequest) -> ApiResult<Payee> {
        self.post("api/payees", Some(token), req).await
    }

    async fn send_to_email(&self, token: &str, req: &SendToEmailRequest) -> ApiResult<Transfer> {
        self.post("api/transfers/send", Some(token), req).await
    }

    async fn wallet_withdraw(&self, token: &str, req: &WalletWithdrawRequest) -> ApiResult<Transfer> {
        self.post("api/transfers/wallet-withdraw", Some(token), req).await
    }

    async fn withdraw_quote(&self, token: &str, req: &WithdrawQuoteRequest) -> ApiResult<WithdrawQuote> {
        self.post("api/quotes/offramp", Some(token), req).await
    }

    async fn send_batch(&self, token: &str, req: &BatchSendRequest) -> ApiResult<BatchResponse> {
        self.post("api/transfers/send-batch", Some(token), req).await
    }

    async fn transfers(&self, token: &str, page: u32, limit: u32) -> ApiResult<TransferPage> {
        self.get(&format!("api/transfers?page={page}&limit={limit}"), token).await
    }
}
