// Core layer - shared types and configuration
pub mod core;

// Transport boundary and the serenity adapter
pub mod transport;

// Argument types and the command system
pub mod arguments;
pub mod commands;

// Dependency injection and startup assembly
pub mod framework;
pub mod injection;

// Events and features layered on top of dispatch
pub mod events;
pub mod features;

#[cfg(test)]
mod testing;

pub use core::{BotConfig, FrameworkConfig, PrefixDeleteMode};

pub use arguments::{
    ArgValue, ArgumentContext, ArgumentKind, ArgumentResult, ArgumentType, ConsumptionType,
};
pub use commands::{
    arg, commands, precondition, Command, CommandEvent, CommandsContainer, DispatchOutcome,
    PreconditionKind, PreconditionResult,
};
pub use events::{EventBus, FrameworkEvent, Subscription};
pub use features::{Conversation, ConversationService, ConversationStart, PermissionManager};
pub use framework::{Framework, FrameworkBuilder, MessageOutcome, StartupError};
pub use injection::{Data, Dependencies, Dependency, InjectionError, Injector, JsonFileStore, Service};
pub use transport::{Embed, FrameworkHandler, InboundMessage, SerenityTransport, Transport, UserInfo};
