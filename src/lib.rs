//! Telegram bot front-end for the CopperX stablecoin banking API.
//!
//! Structure:
//! - [`core`]: configuration, errors, logging, validation, rate limiting
//! - [`api`]: REST client and wire types for the banking API
//! - [`session`]: per-user state and its storage backends
//! - [`telegram`]: commands, conversational scenes, and the dispatcher tree

pub mod api;
pub mod cli;
pub mod core;
pub mod session;
pub mod telegram;

pub use core::logging::init_logger;
