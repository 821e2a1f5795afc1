//! Dispatcher-level tests for the protected-command auth gate
//!
//! These drive the real handler schema with mock updates, so the gate is
//! exercised exactly where production hits it: before any command handler
//! or banking API call runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};
use serial_test::serial;
use teloxide_tests::{MockBot, MockMessageText};

use copperbot::api::types::*;
use copperbot::api::{ApiError, ApiResult, BankingApi};
use copperbot::core::error::AppResult;
use copperbot::session::{AuthSession, MemoryStore, Session, SessionStore};
use copperbot::telegram::{schema, HandlerDeps};

/// Counts every banking API call; the gate tests assert the total.
#[derive(Default)]
struct GateApi {
    calls: AtomicUsize,
}

impl GateApi {
    fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BankingApi for GateApi {
    async fn request_otp(&self, email: &str) -> ApiResult<OtpRequested> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(OtpRequested { email: email.to_string(), sid: "sid-1".to_string() })
    }

    async fn authenticate_otp(&self, email: &str, _otp: &str, _sid: &str) -> ApiResult<AuthPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(AuthPayload {
            access_token: "tok".to_string(),
            expire_at: Utc::now() + Duration::hours(24),
            user: Profile {
                id: "u1".to_string(),
                email: email.to_string(),
                first_name: None,
                last_name: None,
                organization_id: None,
                status: None,
            },
        })
    }

    async fn profile(&self, _token: &str) -> ApiResult<Profile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Api { status: 500, message: "unused".to_string() })
    }

    async fn kyc_status(&self, _token: &str) -> ApiResult<KycPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(KycPage { data: vec![] })
    }

    async fn wallets(&self, _token: &str) -> ApiResult<Vec<Wallet>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Wallet {
            id: "w-1".to_string(),
            network: "Polygon".to_string(),
            wallet_address: Some("0xabc".to_string()),
            is_default: Some(true),
        }])
    }

    async fn balances(&self, _token: &str) -> ApiResult<Vec<WalletBalance>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![])
    }

    async fn set_default_wallet(&self, _token: &str, _wallet_id: &str) -> ApiResult<Wallet> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Api { status: 500, message: "unused".to_string() })
    }

    async fn payees(&self, _token: &str) -> ApiResult<PayeePage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PayeePage { data: vec![] })
    }

    async fn create_payee(&self, _token: &str, req: &CreatePayeeRequest) -> ApiResult<Payee> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Payee { id: "p-1".to_string(), email: req.email.clone(), nick_name: None })
    }

    async fn send_to_email(&self, _token: &str, _req: &SendToEmailRequest) -> ApiResult<Transfer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Api { status: 500, message: "unused".to_string() })
    }

    async fn wallet_withdraw(&self, _token: &str, _req: &WalletWithdrawRequest) -> ApiResult<Transfer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Api { status: 500, message: "unused".to_string() })
    }

    async fn withdraw_quote(&self, _token: &str, _req: &WithdrawQuoteRequest) -> ApiResult<WithdrawQuote> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::Api { status: 500, message: "unused".to_string() })
    }

    async fn send_batch(&self, _token: &str, _req: &BatchSendRequest) -> ApiResult<BatchResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(BatchResponse { responses: vec![] })
    }

    async fn transfers(&self, _token: &str, _page: u32, _limit: u32) -> ApiResult<TransferPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(TransferPage { data: vec![], count: None, has_more: None })
    }
}

/// Memory store that remembers which keys the dispatcher touched, so tests
/// can seed a session under the exact key the schema derives.
struct RecordingStore {
    inner: MemoryStore,
    keys: Mutex<Vec<String>>,
}

impl RecordingStore {
    fn new() -> Self {
        Self { inner: MemoryStore::new(), keys: Mutex::new(Vec::new()) }
    }

    fn last_key(&self) -> Option<String> {
        self.keys.lock().ok()?.last().cloned()
    }
}

#[async_trait::async_trait]
impl SessionStore for RecordingStore {
    async fn get(&self, key: &str) -> AppResult<Option<Session>> {
        if let Ok(mut keys) = self.keys.lock() {
            keys.push(key.to_string());
        }
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, session: &Session) -> AppResult<()> {
        self.inner.put(key, session).await
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.inner.remove(key).await
    }
}

fn authed() -> Session {
    let mut session = Session::default();
    session.auth = Some(AuthSession {
        access_token: "tok".to_string(),
        expires_at: Utc::now() + Duration::hours(1),
        user_id: "u1".to_string(),
        organization_id: None,
        email: "me@example.com".to_string(),
    });
    session
}

#[tokio::test]
#[serial]
async fn test_protected_command_without_auth_is_blocked() {
    let api = Arc::new(GateApi::default());
    let store = Arc::new(RecordingStore::new());
    let deps = HandlerDeps::new(api.clone(), store.clone());

    let mut bot = MockBot::new(MockMessageText::new().text("/wallets"), schema(deps));
    bot.dispatch().await;

    let responses = bot.get_responses();
    assert_eq!(responses.sent_messages.len(), 1, "Should refuse with exactly one message");
    let text = responses.sent_messages[0].text().unwrap_or_default();
    assert!(text.contains("/login"), "Should point the user at /login, got: {text}");
    assert_eq!(api.count(), 0, "No banking API call may happen before login");
}

#[tokio::test]
#[serial]
async fn test_stale_auth_is_cleared_and_reported_expired() {
    let api = Arc::new(GateApi::default());
    let store = Arc::new(RecordingStore::new());
    let deps = HandlerDeps::new(api.clone(), store.clone());

    // First dispatch only reveals the session key the schema derives
    let mut bot = MockBot::new(MockMessageText::new().text("/start"), schema(deps.clone()));
    bot.dispatch().await;
    let key = store.last_key().expect("dispatch should have touched the store");
    // MockBot holds a global lock for its lifetime; release it before making the next one
    drop(bot);

    // Seed an expired auth under that key
    let mut session = authed();
    if let Some(auth) = session.auth.as_mut() {
        auth.expires_at = Utc::now() - Duration::hours(1);
    }
    store.put(&key, &session).await.unwrap();

    let mut bot = MockBot::new(MockMessageText::new().text("/wallets"), schema(deps));
    bot.dispatch().await;

    let responses = bot.get_responses();
    let text = responses.sent_messages.last().unwrap().text().unwrap_or_default();
    assert!(text.contains("expired"), "Stale token should read as expired, got: {text}");
    assert_eq!(api.count(), 0);

    let session = store.get(&key).await.unwrap().unwrap();
    assert!(session.auth.is_none(), "Stale auth must be cleared by the gate");
}

#[tokio::test]
#[serial]
async fn test_protected_command_with_auth_reaches_api() {
    let api = Arc::new(GateApi::default());
    let store = Arc::new(RecordingStore::new());
    let deps = HandlerDeps::new(api.clone(), store.clone());

    let mut bot = MockBot::new(MockMessageText::new().text("/start"), schema(deps.clone()));
    bot.dispatch().await;
    let key = store.last_key().expect("dispatch should have touched the store");
    // MockBot holds a global lock for its lifetime; release it before making the next one
    drop(bot);
    store.put(&key, &authed()).await.unwrap();

    let mut bot = MockBot::new(MockMessageText::new().text("/wallets"), schema(deps));
    bot.dispatch().await;

    let responses = bot.get_responses();
    let text = responses.sent_messages.last().unwrap().text().unwrap_or_default();
    assert!(text.contains("Your wallets"), "Authed /wallets should list wallets, got: {text}");
    assert_eq!(api.count(), 1, "Exactly the wallets call should have happened");
}
