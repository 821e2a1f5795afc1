//! Telegram update handlers
//!
//! The dispatcher schema and its endpoints. The schema is a plain function
//! of [`HandlerDeps`] so integration tests can drive the exact tree that
//! runs in production.

mod commands;
mod schema;
mod types;

pub use schema::schema;
pub use types::{send_replies, HandlerDeps, HandlerError, HandlerResult};
