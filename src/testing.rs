//! In-memory transport and fixtures shared by unit tests

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::arguments::ArgumentContext;
use crate::core::chunk_for_message;
use crate::transport::{
    ChannelId, Embed, EmojiInfo, GuildId, InboundMessage, MessageId, Transport, UserId, UserInfo,
};

pub const AUTHOR: UserId = 100;
pub const OTHER_USER: UserId = 200;
pub const BOT_USER: UserId = 300;
pub const CHANNEL: ChannelId = 10;
pub const GUILD: GuildId = 1;
pub const OTHER_GUILD: GuildId = 2;
pub const GUILD_EMOJI: &str = "<:wave:500>";
pub const FOREIGN_EMOJI: &str = "<:dance:600>";

/// Records every outbound operation for later assertions
pub struct RecordingTransport {
    next_id: AtomicU64,
    users: Vec<UserInfo>,
    emojis: Vec<EmojiInfo>,
    pub texts: Mutex<Vec<(ChannelId, String)>>,
    pub embeds: Mutex<Vec<(ChannelId, Embed)>>,
    pub reactions: Mutex<Vec<(MessageId, String)>>,
    pub deletions: Mutex<Vec<MessageId>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(10_000),
            users: vec![
                author(),
                UserInfo {
                    id: OTHER_USER,
                    name: "badger".to_string(),
                    is_bot: false,
                },
                UserInfo {
                    id: BOT_USER,
                    name: "robot".to_string(),
                    is_bot: true,
                },
            ],
            emojis: vec![
                EmojiInfo {
                    id: 500,
                    name: "wave".to_string(),
                    animated: false,
                    guild_id: Some(GUILD),
                },
                EmojiInfo {
                    id: 600,
                    name: "dance".to_string(),
                    animated: false,
                    guild_id: Some(OTHER_GUILD),
                },
            ],
            texts: Mutex::new(Vec::new()),
            embeds: Mutex::new(Vec::new()),
            reactions: Mutex::new(Vec::new()),
            deletions: Mutex::new(Vec::new()),
        })
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent_texts().pop()
    }

    pub fn sent_embeds(&self) -> Vec<Embed> {
        self.embeds.lock().unwrap().iter().map(|(_, e)| e.clone()).collect()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.deletions.lock().unwrap().clone()
    }

    pub fn reacted(&self) -> Vec<(MessageId, String)> {
        self.reactions.lock().unwrap().clone()
    }

    fn next_message_id(&self) -> MessageId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<Vec<MessageId>> {
        let mut ids = Vec::new();
        for chunk in chunk_for_message(text) {
            self.texts.lock().unwrap().push((channel, chunk));
            ids.push(self.next_message_id());
        }
        Ok(ids)
    }

    async fn send_embed(&self, channel: ChannelId, embed: &Embed) -> Result<MessageId> {
        self.embeds.lock().unwrap().push((channel, embed.clone()));
        Ok(self.next_message_id())
    }

    async fn add_reaction(&self, _channel: ChannelId, message: MessageId, emoji: &str) -> Result<()> {
        self.reactions.lock().unwrap().push((message, emoji.to_string()));
        Ok(())
    }

    async fn delete_message(&self, _channel: ChannelId, message: MessageId) -> Result<()> {
        self.deletions.lock().unwrap().push(message);
        Ok(())
    }

    async fn fetch_user(&self, id: UserId) -> Result<Option<UserInfo>> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn guild_emojis(&self, guild: GuildId) -> Result<Vec<EmojiInfo>> {
        Ok(self
            .emojis
            .iter()
            .filter(|e| e.guild_id == Some(guild))
            .cloned()
            .collect())
    }

    async fn all_emojis(&self) -> Result<Vec<EmojiInfo>> {
        Ok(self.emojis.clone())
    }
}

pub fn author() -> UserInfo {
    UserInfo {
        id: AUTHOR,
        name: "fox".to_string(),
        is_bot: false,
    }
}

pub fn tokens(input: &str) -> Vec<String> {
    input.split_whitespace().map(String::from).collect()
}

pub fn argument_context(transport: Arc<RecordingTransport>, guild: Option<GuildId>) -> ArgumentContext {
    ArgumentContext {
        author: author(),
        channel_id: CHANNEL,
        guild_id: guild,
        transport,
    }
}

/// A message from [`author`] in [`CHANNEL`]
pub fn message(id: MessageId, content: &str, guild: Option<GuildId>) -> InboundMessage {
    InboundMessage {
        id,
        channel_id: CHANNEL,
        guild_id: guild,
        author: author(),
        content: content.to_string(),
    }
}
