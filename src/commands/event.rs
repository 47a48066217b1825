//! Per-invocation context handed to preconditions and command handlers
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Responses are sanitised and chunked through the transport
//! - 1.0.0: Initial shared context for command handlers

use anyhow::Result;
use std::fmt;
use std::sync::Arc;

use super::command::{Command, CommandsContainer};
use super::tokenizer::CommandStruct;
use crate::arguments::{ArgValue, ArgumentContext};
use crate::core::sanitise_mentions;
use crate::transport::{ChannelId, Embed, GuildId, InboundMessage, MessageId, Transport, UserInfo};

/// One parsed attempt to run a command
///
/// Preconditions see a provisional event: `command` is `None` when the name
/// did not match a registered command, and `args` is always empty. Handlers
/// always receive a resolved command and fully converted arguments.
#[derive(Clone)]
pub struct CommandEvent {
    pub command_struct: CommandStruct,
    pub command: Option<Arc<Command>>,
    pub message: InboundMessage,
    pub args: Vec<ArgValue>,
    pub container: Arc<CommandsContainer>,
    /// The invoking message will be deleted after the invocation
    pub stealth_invocation: bool,
    pub transport: Arc<dyn Transport>,
}

impl CommandEvent {
    pub fn author(&self) -> &UserInfo {
        &self.message.author
    }

    pub fn channel_id(&self) -> ChannelId {
        self.message.channel_id
    }

    pub fn guild_id(&self) -> Option<GuildId> {
        self.message.guild_id
    }

    pub fn command_name(&self) -> &str {
        &self.command_struct.command_name
    }

    /// Converted argument at `index`, if present
    pub fn arg(&self, index: usize) -> Option<&ArgValue> {
        self.args.get(index)
    }

    pub fn argument_context(&self) -> ArgumentContext {
        ArgumentContext {
            author: self.message.author.clone(),
            channel_id: self.message.channel_id,
            guild_id: self.message.guild_id,
            transport: Arc::clone(&self.transport),
        }
    }

    /// Reply in the invoking channel with mass mentions neutralised
    pub async fn respond(&self, text: &str) -> Result<Vec<MessageId>> {
        self.unsafe_respond(&sanitise_mentions(text)).await
    }

    /// Reply without mention sanitising
    pub async fn unsafe_respond(&self, text: &str) -> Result<Vec<MessageId>> {
        self.transport.send_text(self.message.channel_id, text).await
    }

    pub async fn respond_embed(&self, embed: &Embed) -> Result<MessageId> {
        self.transport.send_embed(self.message.channel_id, embed).await
    }
}

impl fmt::Debug for CommandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEvent")
            .field("command_struct", &self.command_struct)
            .field("message", &self.message)
            .field("args", &self.args)
            .field("stealth_invocation", &self.stealth_invocation)
            .finish_non_exhaustive()
    }
}
