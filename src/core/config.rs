use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Base URL of the CopperX banking API
/// Read from COPPERX_API_URL environment variable
pub static COPPERX_API_URL: Lazy<String> =
    Lazy::new(|| env::var("COPPERX_API_URL").unwrap_or_else(|_| "https://income-api.copperx.io".to_string()));

/// Session store backend: "memory" (default) or "redis"
/// Read from SESSION_BACKEND environment variable
pub static SESSION_BACKEND: Lazy<String> =
    Lazy::new(|| env::var("SESSION_BACKEND").unwrap_or_else(|_| "memory".to_string()));

/// Redis connection URL, used when SESSION_BACKEND=redis
pub static REDIS_URL: Lazy<String> =
    Lazy::new(|| env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: copperbot.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "copperbot.log".to_string()));

/// Network configuration
pub mod network {
    use super::{env, Duration, Lazy};

    /// HTTP request timeout for banking API calls (seconds)
    pub static REQUEST_TIMEOUT_SECS: Lazy<u64> = Lazy::new(|| {
        env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30)
    });

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(*REQUEST_TIMEOUT_SECS)
    }
}

/// Rate limiting policies
///
/// Fixed-window counters stored per user session. Callers check the limit
/// before acting and increment only when the action proceeds.
pub mod rate_limit {
    use crate::core::rate_limiter::RateLimitConfig;

    /// OTP email requests: 5 per 5 minutes per user
    pub const OTP_REQUEST: RateLimitConfig = RateLimitConfig {
        key: "login_otp_request",
        max_attempts: 5,
        decay_secs: 300,
        message: "Too many verification codes requested.",
    };

    /// OTP verification attempts: 5 per 5 minutes per user
    pub const OTP_VERIFY: RateLimitConfig = RateLimitConfig {
        key: "login_otp_verify",
        max_attempts: 5,
        decay_secs: 300,
        message: "Too many failed code attempts.",
    };

    /// Outbound transfer submissions: 10 per minute per user
    pub const TRANSFER: RateLimitConfig = RateLimitConfig {
        key: "transfer_submit",
        max_attempts: 10,
        decay_secs: 60,
        message: "Too many transfers in a short time.",
    };
}

/// Dispatcher retry configuration
pub mod retry {
    use super::Duration;

    /// Maximum restarts of the dispatcher after a panic
    pub const MAX_DISPATCHER_RETRIES: u32 = 5;

    /// Base for exponential backoff between dispatcher restarts (seconds)
    pub const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

    /// Delay between dispatcher restarts
    pub fn dispatcher_delay() -> Duration {
        Duration::from_secs(5)
    }
}

/// Display configuration
pub mod display {
    /// Page size for the /transfers history listing
    pub const TRANSFERS_PAGE_SIZE: u32 = 10;

    /// Maximum recipients accepted in one batch send
    pub const BATCH_MAX_RECIPIENTS: usize = 20;
}
