//! # Core Module
//!
//! Shared configuration and outbound text utilities.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add mention sanitising to the response module
//! - 1.0.0: Initial creation with config and response modules

pub mod config;
pub mod response;

pub use config::{BotConfig, FrameworkConfig, PrefixDeleteMode, VisibilityPredicate};
pub use response::{
    chunk_for_message, chunk_text, sanitise_mentions, truncate_for_embed, EMBED_LIMIT,
    MESSAGE_LIMIT,
};
