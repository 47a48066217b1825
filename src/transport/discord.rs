//! # Discord Transport
//!
//! [`Transport`] over serenity's HTTP client and cache, and the gateway
//! event handler that feeds messages into a [`Framework`].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, info};
use serenity::builder::CreateEmbed;
use serenity::cache::Cache;
use serenity::http::Http;
use serenity::model::channel::{Message, ReactionType};
use serenity::model::gateway::Ready;
use serenity::model::guild::Emoji;
use serenity::model::id::{ChannelId as SerenityChannelId, GuildId as SerenityGuildId};
use serenity::model::id::{MessageId as SerenityMessageId, UserId as SerenityUserId};
use serenity::model::user::User;
use serenity::prelude::{Context, EventHandler};
use std::sync::Arc;

use super::{
    ChannelId, Embed, EmojiInfo, GuildId, InboundMessage, MessageId, Transport, UserId, UserInfo,
};
use crate::core::{chunk_for_message, truncate_for_embed};
use crate::framework::{Framework, MessageOutcome};

pub struct SerenityTransport {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    pub fn from_context(ctx: &Context) -> Self {
        Self::new(Arc::clone(&ctx.http), Arc::clone(&ctx.cache))
    }
}

#[async_trait]
impl Transport for SerenityTransport {
    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<Vec<MessageId>> {
        let mut ids = Vec::new();
        for chunk in chunk_for_message(text) {
            let sent = SerenityChannelId(channel).say(&self.http, chunk).await?;
            ids.push(sent.id.0);
        }
        Ok(ids)
    }

    async fn send_embed(&self, channel: ChannelId, embed: &Embed) -> Result<MessageId> {
        let built = build_embed(embed);
        let sent = SerenityChannelId(channel)
            .send_message(&self.http, |m| m.set_embed(built))
            .await?;
        Ok(sent.id.0)
    }

    async fn add_reaction(&self, channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        let reaction = ReactionType::try_from(emoji)
            .map_err(|_| anyhow!("Invalid reaction emoji: {emoji}"))?;
        SerenityChannelId(channel)
            .create_reaction(&self.http, SerenityMessageId(message), reaction)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        match SerenityChannelId(channel)
            .delete_message(&self.http, SerenityMessageId(message))
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if is_not_found(&e) => {
                debug!("Message {message} was already deleted");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserInfo>> {
        if let Some(user) = self.cache.user(SerenityUserId(id)) {
            return Ok(Some(user_info(&user)));
        }
        match self.http.get_user(id).await {
            Ok(user) => Ok(Some(user_info(&user))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn guild_emojis(&self, guild: GuildId) -> Result<Vec<EmojiInfo>> {
        if let Some(cached) = self.cache.guild(SerenityGuildId(guild)) {
            return Ok(cached.emojis.values().map(|e| emoji_info(e, guild)).collect());
        }
        let emojis = self.http.get_emojis(guild).await?;
        Ok(emojis.iter().map(|e| emoji_info(e, guild)).collect())
    }

    async fn all_emojis(&self) -> Result<Vec<EmojiInfo>> {
        let mut emojis = Vec::new();
        for guild_id in self.cache.guilds() {
            if let Some(guild) = self.cache.guild(guild_id) {
                emojis.extend(guild.emojis.values().map(|e| emoji_info(e, guild_id.0)));
            }
        }
        Ok(emojis)
    }
}

fn is_not_found(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(http) => http.status_code().map(|s| s.as_u16()) == Some(404),
        _ => false,
    }
}

fn build_embed(embed: &Embed) -> CreateEmbed {
    let mut built = CreateEmbed::default();
    if let Some(title) = &embed.title {
        built.title(title);
    }
    if let Some(description) = &embed.description {
        built.description(truncate_for_embed(description));
    }
    if let Some(color) = embed.color {
        built.color(color);
    }
    for field in &embed.fields {
        built.field(&field.name, &field.value, field.inline);
    }
    if let Some(footer) = &embed.footer {
        built.footer(|f| f.text(footer));
    }
    built
}

fn user_info(user: &User) -> UserInfo {
    UserInfo {
        id: user.id.0,
        name: user.name.clone(),
        is_bot: user.bot,
    }
}

fn emoji_info(emoji: &Emoji, guild: GuildId) -> EmojiInfo {
    EmojiInfo {
        id: emoji.id.0,
        name: emoji.name.clone(),
        animated: emoji.animated,
        guild_id: Some(guild),
    }
}

/// Platform-neutral view of a gateway message
pub fn inbound_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        id: msg.id.0,
        channel_id: msg.channel_id.0,
        guild_id: msg.guild_id.map(|g| g.0),
        author: user_info(&msg.author),
        content: msg.content.clone(),
    }
}

/// Gateway event handler routing every message through the framework
pub struct FrameworkHandler {
    framework: Arc<Framework>,
}

impl FrameworkHandler {
    pub fn new(framework: Arc<Framework>) -> Self {
        Self { framework }
    }
}

#[serenity::async_trait]
impl EventHandler for FrameworkHandler {
    async fn message(&self, ctx: Context, msg: Message) {
        let transport: Arc<dyn Transport> = Arc::new(SerenityTransport::from_context(&ctx));
        let outcome = self
            .framework
            .handle_message(transport, inbound_message(&msg))
            .await;
        if outcome != MessageOutcome::Dispatched(crate::commands::DispatchOutcome::Ignored) {
            debug!("Message {} handled: {outcome:?}", msg.id);
        }
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!(
            "⌨️ Listening for prefix '{}' across {} commands",
            self.framework.config().prefix,
            self.framework.container().len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_embed_with_all_parts() {
        let embed = Embed::new()
            .title("Help")
            .description("x".repeat(5000))
            .color(0x5865F2)
            .field("Utility", "`help`", false)
            .footer("page 1");
        // CreateEmbed is opaque; building without panic is the contract
        let _built = build_embed(&embed);
    }

    #[test]
    fn test_build_empty_embed() {
        let _built = build_embed(&Embed::new());
    }
}
