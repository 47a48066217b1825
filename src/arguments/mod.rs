//! # Argument Types
//!
//! Converters that turn raw message tokens into typed values. Commands and
//! conversation steps both describe their inputs as argument types, so the
//! same conversion rules apply to a one-line invocation and to a guided
//! multi-message dialogue.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 2.0.0: Async conversion with transport-backed entity lookups
//! - 1.1.0: Add Multiple consumption for fixed-width arguments
//! - 1.0.0: Initial word, sentence, integer and choice converters

pub mod choice;
pub mod double;
pub mod emoji;
pub mod integer;
pub mod range;
pub mod sentence;
pub mod splitter;
pub mod url;
pub mod user;
pub mod word;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::transport::{ChannelId, EmojiInfo, GuildId, Transport, UserInfo};

pub use choice::ChoiceArg;
pub use double::DoubleArg;
pub use emoji::GuildEmojiArg;
pub use integer::IntegerArg;
pub use range::IntegerRangeArg;
pub use sentence::SentenceArg;
pub use splitter::SplitterArg;
pub use url::UrlArg;
pub use user::UserArg;
pub use word::WordArg;

/// How many tokens an argument type takes from the token stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumptionType {
    /// Exactly one token
    Single,
    /// A fixed number of tokens
    Multiple(usize),
    /// Every remaining token (at least one)
    All,
}

/// A converted argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Text(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    List(Vec<ArgValue>),
    User(UserInfo),
    Emoji(EmojiInfo),
}

impl ArgValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ArgValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            ArgValue::Double(value) => Some(*value),
            ArgValue::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ArgValue]> {
        match self {
            ArgValue::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserInfo> {
        match self {
            ArgValue::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn as_emoji(&self) -> Option<&EmojiInfo> {
        match self {
            ArgValue::Emoji(emoji) => Some(emoji),
            _ => None,
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Text(text) => write!(f, "{text}"),
            ArgValue::Integer(value) => write!(f, "{value}"),
            ArgValue::Double(value) => write!(f, "{value}"),
            ArgValue::Boolean(value) => write!(f, "{value}"),
            ArgValue::List(values) => {
                let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(", "))
            }
            ArgValue::User(user) => write!(f, "{}", user.name),
            ArgValue::Emoji(emoji) => write!(f, "{}", emoji.mention()),
        }
    }
}

/// Outcome of converting one argument
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentResult {
    Success(ArgValue),
    Error(String),
}

impl ArgumentResult {
    pub fn error(reason: impl Into<String>) -> Self {
        ArgumentResult::Error(reason.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ArgumentResult::Success(_))
    }
}

/// Where a conversion is happening, used to scope entity lookups
#[derive(Clone)]
pub struct ArgumentContext {
    pub author: UserInfo,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub transport: Arc<dyn Transport>,
}

impl fmt::Debug for ArgumentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentContext")
            .field("author", &self.author)
            .field("channel_id", &self.channel_id)
            .field("guild_id", &self.guild_id)
            .finish_non_exhaustive()
    }
}

/// A typed converter for command and conversation inputs
///
/// `tokens` holds exactly the tokens this argument consumed (per
/// [`consumption_type`](ArgumentType::consumption_type)); `remaining` is the
/// token stream from this argument's position onwards.
///
/// Conversion must not mutate shared state. Lookups through
/// `ctx.transport` are allowed.
#[async_trait]
pub trait ArgumentType: Send + Sync {
    fn name(&self) -> &str;

    fn consumption_type(&self) -> ConsumptionType {
        ConsumptionType::Single
    }

    /// Literal inputs that convert successfully in the given context
    async fn examples(&self, ctx: &ArgumentContext) -> Vec<String>;

    async fn convert(
        &self,
        tokens: &[String],
        remaining: &[String],
        ctx: &ArgumentContext,
    ) -> ArgumentResult;
}

/// Shared handle to an argument type
pub type ArgumentKind = Arc<dyn ArgumentType>;

/// First consumed token, or an error for converters handed nothing
pub(crate) fn single_token(tokens: &[String]) -> Result<&str, ArgumentResult> {
    tokens
        .first()
        .map(String::as_str)
        .ok_or_else(|| ArgumentResult::error("Expected an argument"))
}

/// Strip mention markup (`<@!123>`, `<#123>`, `<:name:123>`) down to its inner text
pub(crate) fn trim_to_id(raw: &str) -> &str {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(trimmed);
    inner.trim_start_matches(['@', '#', '!', '&'])
}
