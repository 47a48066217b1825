//! # Conversation Definitions
//!
//! A conversation is an ordered list of prompts, each expecting one typed
//! answer, plus a completion callback receiving every answer in order.

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::arguments::{ArgValue, ArgumentKind, ArgumentType};
use crate::commands::BoxFuture;
use crate::core::sanitise_mentions;
use crate::transport::{ChannelId, Embed, GuildId, MessageId, Transport, UserInfo};

pub type CompletionFn =
    Arc<dyn Fn(ConversationContext, Vec<ArgValue>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// What is sent to the user when a step starts or is retried
#[derive(Debug, Clone, PartialEq)]
pub enum Prompt {
    Text(String),
    Embed(Embed),
}

impl From<&str> for Prompt {
    fn from(text: &str) -> Self {
        Prompt::Text(text.to_string())
    }
}

impl From<String> for Prompt {
    fn from(text: String) -> Self {
        Prompt::Text(text)
    }
}

impl From<Embed> for Prompt {
    fn from(embed: Embed) -> Self {
        Prompt::Embed(embed)
    }
}

#[derive(Clone)]
pub struct Step {
    pub prompt: Prompt,
    pub expect: ArgumentKind,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("prompt", &self.prompt)
            .field("expect", &self.expect.name())
            .finish()
    }
}

/// Who the conversation was with, handed to the completion callback
#[derive(Clone)]
pub struct ConversationContext {
    pub user: UserInfo,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub transport: Arc<dyn Transport>,
}

impl ConversationContext {
    pub async fn respond(&self, text: &str) -> Result<Vec<MessageId>> {
        self.transport
            .send_text(self.channel_id, &sanitise_mentions(text))
            .await
    }

    pub async fn respond_embed(&self, embed: &Embed) -> Result<MessageId> {
        self.transport.send_embed(self.channel_id, embed).await
    }
}

impl fmt::Debug for ConversationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversationContext")
            .field("user", &self.user)
            .field("channel_id", &self.channel_id)
            .field("guild_id", &self.guild_id)
            .finish_non_exhaustive()
    }
}

/// A named, multi-step guided dialogue
///
/// # Example
///
/// ```ignore
/// let setup = Conversation::new("setup")
///     .prompt("Who should be notified?", UserArg::default())
///     .prompt("What should the message say?", SentenceArg::default())
///     .on_complete(|ctx, answers| async move {
///         ctx.respond(&format!("Saved {} answers", answers.len())).await?;
///         Ok(())
///     });
/// ```
#[derive(Clone)]
pub struct Conversation {
    pub name: String,
    pub description: String,
    pub steps: Vec<Step>,
    on_complete: CompletionFn,
}

impl Conversation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
            on_complete: Arc::new(
                |_: ConversationContext, _: Vec<ArgValue>| -> BoxFuture<'static, Result<()>> {
                    Box::pin(async { Ok(()) })
                },
            ),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Append a step asking `prompt` and expecting an answer of type `expect`
    pub fn prompt(mut self, prompt: impl Into<Prompt>, expect: impl ArgumentType + 'static) -> Self {
        self.steps.push(Step {
            prompt: prompt.into(),
            expect: Arc::new(expect),
        });
        self
    }

    pub fn on_complete<F, Fut>(mut self, complete: F) -> Self
    where
        F: Fn(ConversationContext, Vec<ArgValue>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.on_complete = Arc::new(
            move |ctx: ConversationContext, answers: Vec<ArgValue>| -> BoxFuture<'static, Result<()>> {
                Box::pin(complete(ctx, answers))
            },
        );
        self
    }

    pub(crate) async fn complete(&self, ctx: ConversationContext, answers: Vec<ArgValue>) -> Result<()> {
        (self.on_complete)(ctx, answers).await
    }
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("name", &self.name)
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}
