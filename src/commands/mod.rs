//! # Command System
//!
//! Prefix command registration, preconditions, argument conversion and dispatch.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Typed prefix commands with preconditions and recommendations
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 2.0.0: Remove bang commands, slash-only command system
//! - 1.0.0: Initial reorganization with modular command structure

use std::future::Future;
use std::pin::Pin;

pub mod command;
pub mod dispatcher;
pub mod event;
pub mod help;
pub mod parser;
pub mod preconditions;
pub mod recommender;
pub mod tokenizer;

/// Boxed, sendable future returned by stored handlers
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use command::{
    arg, commands, Command, CommandArgument, CommandHandlerFn, CommandsContainer, DefaultValue,
    DEFAULT_CATEGORY,
};
pub use dispatcher::{DispatchOutcome, Dispatcher, GUILD_REQUIRED_MESSAGE};
pub use event::CommandEvent;
pub use help::{help_commands, HELP_CATEGORY};
pub use parser::{convert_arguments, ArgumentFailure};
pub use preconditions::{
    precondition, Precondition, PreconditionEvaluator, PreconditionKind, PreconditionResult,
};
pub use recommender::{edit_distance, CommandRecommender, Suggestion, MIN_SIMILARITY};
pub use tokenizer::{clean_command_message, is_command_invocation, CommandStruct};
