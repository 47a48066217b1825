//! # Conversations Feature
//!
//! Multi-turn guided dialogues that reuse the argument types to collect
//! one typed answer per step.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Idle eviction and lifecycle events
//! - 1.0.0: Initial per-user conversation state machine

pub mod conversation;
pub mod service;

pub use conversation::{CompletionFn, Conversation, ConversationContext, Prompt, Step};
pub use service::{ConversationKey, ConversationService, ConversationStart, CANCELLED_MESSAGE};
