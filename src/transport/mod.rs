//! # Transport Boundary
//!
//! Everything the framework needs from the chat platform: inbound message
//! shape, outbound operations and the entity lookups used by argument types.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add emoji lookups for guild-scoped argument types
//! - 1.0.0: Initial extraction from the serenity event handler

pub mod discord;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use discord::{FrameworkHandler, SerenityTransport};

pub type UserId = u64;
pub type ChannelId = u64;
pub type GuildId = u64;
pub type MessageId = u64;

/// Reaction added to acknowledged commands
pub const ACKNOWLEDGE_REACTION: &str = "👀";

/// Minimal view of a platform user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub name: String,
    pub is_bot: bool,
}

impl UserInfo {
    /// Mention markup understood by the platform
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// `name (id)` form used in log lines
    pub fn descriptor(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}

/// Custom emoji owned by a guild
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiInfo {
    pub id: u64,
    pub name: String,
    pub animated: bool,
    pub guild_id: Option<GuildId>,
}

impl EmojiInfo {
    pub fn mention(&self) -> String {
        if self.animated {
            format!("<a:{}:{}>", self.name, self.id)
        } else {
            format!("<:{}:{}>", self.name, self.id)
        }
    }
}

/// A single message delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub author: UserInfo,
    pub content: String,
}

/// Field of a rich embed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// Platform-neutral rich content
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<u32>,
    pub fields: Vec<EmbedField>,
    pub footer: Option<String>,
}

impl Embed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Outbound operations and lookups supplied by the chat platform
///
/// Implementations must be cheap to share; the framework holds them as
/// `Arc<dyn Transport>` for the lifetime of one inbound message.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send text, split into as many messages as the platform limit requires.
    ///
    /// Returns the ids of the sent messages in send order.
    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<Vec<MessageId>>;

    async fn send_embed(&self, channel: ChannelId, embed: &Embed) -> Result<MessageId>;

    async fn add_reaction(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()>;

    /// Delete a message. A message that no longer exists is not an error.
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserInfo>>;

    async fn guild_emojis(&self, guild: GuildId) -> Result<Vec<EmojiInfo>>;

    /// Every emoji visible to the bot across all guilds
    async fn all_emojis(&self) -> Result<Vec<EmojiInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn Transport) {}

    #[test]
    fn test_emoji_mention_formats() {
        let still = EmojiInfo {
            id: 42,
            name: "wave".to_string(),
            animated: false,
            guild_id: None,
        };
        let animated = EmojiInfo {
            animated: true,
            ..still.clone()
        };
        assert_eq!(still.mention(), "<:wave:42>");
        assert_eq!(animated.mention(), "<a:wave:42>");
    }

    #[test]
    fn test_embed_builder_collects_fields() {
        let embed = Embed::new()
            .title("Summary")
            .field("Step 1", "done", false)
            .field("Step 2", "done", true)
            .color(0x00FF00);
        assert_eq!(embed.title.as_deref(), Some("Summary"));
        assert_eq!(embed.fields.len(), 2);
        assert!(embed.fields[1].inline);
    }

    #[test]
    fn test_user_descriptor() {
        let user = UserInfo {
            id: 7,
            name: "fox".to_string(),
            is_bot: false,
        };
        assert_eq!(user.descriptor(), "fox (7)");
        assert_eq!(user.mention(), "<@7>");
    }
}
