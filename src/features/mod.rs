//! # Features Layer
//!
//! Optional building blocks layered on the command system.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Conversations and permissions replace the persona features
//! - 1.0.0: Initial feature module layout

pub mod conversations;
pub mod permissions;

pub use conversations::{Conversation, ConversationContext, ConversationService, ConversationStart, Prompt};
pub use permissions::{Permission, PermissionManager};
