//! Message-to-invocation pipeline
//!
//! filter → tokenize → preconditions → lookup → guild check → argument
//! conversion → handler → acknowledge/delete.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.0: Replies are sent before the invoking message is deleted on every path
//! - 2.0.0: Prefix commands with typed arguments replace slash interactions
//! - 1.0.0: Initial message handler

use log::{debug, error, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use super::command::CommandsContainer;
use super::event::CommandEvent;
use super::parser::convert_arguments;
use super::preconditions::PreconditionEvaluator;
use super::recommender::CommandRecommender;
use super::tokenizer::{clean_command_message, is_command_invocation};
use crate::core::{sanitise_mentions, FrameworkConfig};
use crate::events::{EventBus, FrameworkEvent};
use crate::transport::{InboundMessage, Transport, ACKNOWLEDGE_REACTION};

pub const GUILD_REQUIRED_MESSAGE: &str =
    "This command must be invoked in a guild channel and not through PM";

/// What happened to one inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Bot author, oversized, or not prefixed
    Ignored,
    /// Only the prefix was typed
    EmptyCommand,
    PreconditionFailed { reason: Option<String> },
    NotFound { name: String, suggestion: Option<String> },
    GuildRequired,
    InvalidArguments { message: String },
    Invoked { command: String },
}

pub struct Dispatcher {
    config: FrameworkConfig,
    container: Arc<CommandsContainer>,
    preconditions: PreconditionEvaluator,
    recommender: CommandRecommender,
    events: EventBus,
}

impl Dispatcher {
    pub fn new(
        config: FrameworkConfig,
        container: Arc<CommandsContainer>,
        preconditions: PreconditionEvaluator,
        recommender: CommandRecommender,
        events: EventBus,
    ) -> Self {
        Self {
            config,
            container,
            preconditions,
            recommender,
            events,
        }
    }

    pub fn container(&self) -> &Arc<CommandsContainer> {
        &self.container
    }

    pub fn recommender(&self) -> &CommandRecommender {
        &self.recommender
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    /// Cheap checks run before any tokenization
    pub fn is_usable(&self, message: &InboundMessage) -> bool {
        if message.author.is_bot {
            return false;
        }
        if message.content.chars().count() > self.config.max_message_length {
            return false;
        }
        is_command_invocation(&message.content, &self.config.prefix)
    }

    pub async fn dispatch(
        &self,
        transport: Arc<dyn Transport>,
        message: InboundMessage,
    ) -> DispatchOutcome {
        if !self.is_usable(&message) {
            return DispatchOutcome::Ignored;
        }

        let request_id = Uuid::new_v4();
        let command_struct = clean_command_message(&message.content, &self.config.prefix);
        if command_struct.command_name.is_empty() {
            return DispatchOutcome::EmptyCommand;
        }

        debug!(
            "[{request_id}] 📥 Invocation '{}' by {} | Channel: {} | Guild: {:?}",
            command_struct.command_name,
            message.author.descriptor(),
            message.channel_id,
            message.guild_id
        );

        let invoked_in_guild = message.guild_id.is_some();
        let should_delete = invoked_in_guild
            && self.config.delete_mode.should_delete(command_struct.double_invocation);

        let mut event = CommandEvent {
            command: self.container.get(&command_struct.command_name),
            command_struct,
            message,
            args: Vec::new(),
            container: Arc::clone(&self.container),
            stealth_invocation: should_delete,
            transport,
        };

        let gate = self.preconditions.evaluate(&event);
        if !gate.is_pass() {
            let reason = gate.visible_reason().map(String::from);
            match &reason {
                Some(reason) => {
                    debug!("[{request_id}] 🚫 Precondition failed: {reason}");
                    self.report_error(&event, reason).await;
                    self.delete_invocation(&event).await;
                }
                None => debug!("[{request_id}] 🚫 Precondition failed silently"),
            }
            return DispatchOutcome::PreconditionFailed { reason };
        }

        let Some(command) = event.command.clone() else {
            let name = event.command_name().to_string();
            let author = event.author().clone();
            let (channel, guild) = (event.channel_id(), event.guild_id());
            let suggestion = self.recommender.recommend(&name, |candidate| {
                self.config.is_visible(candidate, &author, channel, guild)
            });

            let clean_name = sanitise_mentions(&name);
            let reply = match &suggestion {
                Some(recommended) => {
                    format!("I don't know what {clean_name} is, perhaps you meant {recommended}?")
                }
                None => format!("I don't know what {clean_name} is."),
            };
            debug!("[{request_id}] ❓ Unknown command '{name}', suggested {suggestion:?}");
            self.report_error(&event, &reply).await;
            self.delete_invocation(&event).await;
            return DispatchOutcome::NotFound { name, suggestion };
        };

        if command.requires_guild && !invoked_in_guild {
            self.report_error(&event, GUILD_REQUIRED_MESSAGE).await;
            self.delete_invocation(&event).await;
            return DispatchOutcome::GuildRequired;
        }

        let ctx = event.argument_context();
        match convert_arguments(&command.expected_args, &event.command_struct.args, &ctx).await {
            Ok(values) => event.args = values,
            Err(failure) => {
                debug!("[{request_id}] ⚠️ Argument conversion failed: {}", failure.message);
                self.report_error(&event, &failure.message).await;
                self.delete_invocation(&event).await;
                return DispatchOutcome::InvalidArguments {
                    message: failure.message,
                };
            }
        }

        self.events.publish(FrameworkEvent::CommandInvoked {
            command: command.name.clone(),
            author: event.author().id,
            channel: event.channel_id(),
            guild: event.guild_id(),
        });

        if let Err(e) = command.invoke(event.clone()).await {
            error!("[{request_id}] ❌ Command '{}' failed: {e:#}", command.name);
        }

        if !should_delete && self.config.react_to_commands {
            if let Err(e) = event
                .transport
                .add_reaction(event.channel_id(), event.message.id, ACKNOWLEDGE_REACTION)
                .await
            {
                warn!("[{request_id}] Failed to acknowledge invocation: {e}");
            }
        }

        info!(
            "[{request_id}] {} -- invoked {} in {}",
            event.author().descriptor(),
            command.name,
            event.channel_id()
        );

        self.delete_invocation(&event).await;
        DispatchOutcome::Invoked {
            command: command.name.clone(),
        }
    }

    /// Send a user-facing error, scheduling its removal when `delete_errors` is set
    async fn report_error(&self, event: &CommandEvent, text: &str) {
        let sent = match event.respond(text).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Failed to send error reply: {e}");
                return;
            }
        };

        if !self.config.delete_errors || sent.is_empty() {
            return;
        }

        let transport = Arc::clone(&event.transport);
        let channel = event.channel_id();
        let delay = self.config.error_delete_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            for id in sent {
                if let Err(e) = transport.delete_message(channel, id).await {
                    debug!("Failed to delete error reply {id}: {e}");
                }
            }
        });
    }

    async fn delete_invocation(&self, event: &CommandEvent) {
        if !event.stealth_invocation {
            return;
        }
        if let Err(e) = event
            .transport
            .delete_message(event.channel_id(), event.message.id)
            .await
        {
            debug!("Failed to delete invoking message {}: {e}", event.message.id);
        }
    }
}
