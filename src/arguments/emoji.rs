//! Custom guild emojis

use async_trait::async_trait;
use log::debug;

use super::{single_token, trim_to_id, ArgValue, ArgumentContext, ArgumentResult, ArgumentType};
use crate::transport::EmojiInfo;

/// Accepts a custom emoji by mention (`<:name:id>`) or id.
///
/// By default only emojis of the invoking guild are searched; with
/// [`allow_global`](GuildEmojiArg::allow_global) every guild the bot can see
/// is searched.
#[derive(Debug, Clone)]
pub struct GuildEmojiArg {
    name: String,
    allows_global: bool,
}

impl GuildEmojiArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allows_global: false,
        }
    }

    pub fn allow_global(mut self) -> Self {
        self.allows_global = true;
        self
    }

    async fn candidates(&self, ctx: &ArgumentContext) -> Vec<EmojiInfo> {
        let lookup = if self.allows_global {
            ctx.transport.all_emojis().await
        } else if let Some(guild) = ctx.guild_id {
            ctx.transport.guild_emojis(guild).await
        } else {
            Ok(Vec::new())
        };

        lookup.unwrap_or_else(|e| {
            debug!("Emoji lookup failed: {e}");
            Vec::new()
        })
    }
}

impl Default for GuildEmojiArg {
    fn default() -> Self {
        Self::named("Guild Emoji")
    }
}

fn parse_emoji_id(raw: &str) -> Option<u64> {
    let parts: Vec<&str> = trim_to_id(raw).split(':').collect();
    let id = match parts.as_slice() {
        [id] => id,
        [_, _, id] => id,
        _ => return None,
    };
    id.parse().ok()
}

#[async_trait]
impl ArgumentType for GuildEmojiArg {
    fn name(&self) -> &str {
        &self.name
    }

    async fn examples(&self, ctx: &ArgumentContext) -> Vec<String> {
        let scoped = match ctx.guild_id {
            Some(guild) => ctx.transport.guild_emojis(guild).await.unwrap_or_default(),
            None => Vec::new(),
        };
        scoped.iter().map(EmojiInfo::mention).collect()
    }

    async fn convert(
        &self,
        tokens: &[String],
        _remaining: &[String],
        ctx: &ArgumentContext,
    ) -> ArgumentResult {
        let raw = match single_token(tokens) {
            Ok(raw) => raw,
            Err(error) => return error,
        };

        let Some(id) = parse_emoji_id(raw) else {
            return ArgumentResult::error("Couldn't find that emoji");
        };

        match self.candidates(ctx).await.into_iter().find(|e| e.id == id) {
            Some(emoji) => ArgumentResult::Success(ArgValue::Emoji(emoji)),
            None => ArgumentResult::error("Couldn't find that emoji"),
        }
    }
}
