pub mod config;
pub mod error;
pub mod logging;
pub mod rate_limiter;
pub mod validation;
