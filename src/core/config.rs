//! Framework and process configuration
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.2.0: Add conversation idle timeout and error deletion delay
//! - 1.1.0: Add visibility predicate for help and recommendations
//! - 1.0.0: Initial environment-driven configuration

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::transport::{ChannelId, GuildId, UserInfo};

/// Which prefix form causes the invoking message to be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrefixDeleteMode {
    /// Delete when invoked with a single prefix; a doubled prefix keeps the message
    #[default]
    Single,
    /// Delete only when invoked with a doubled prefix
    Double,
    /// Never delete invoking messages
    None,
}

impl PrefixDeleteMode {
    /// Whether an invocation with the given prefix form should be deleted
    pub fn should_delete(self, double_invocation: bool) -> bool {
        match self {
            PrefixDeleteMode::Single => !double_invocation,
            PrefixDeleteMode::Double => double_invocation,
            PrefixDeleteMode::None => false,
        }
    }
}

impl FromStr for PrefixDeleteMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(PrefixDeleteMode::Single),
            "double" => Ok(PrefixDeleteMode::Double),
            "none" => Ok(PrefixDeleteMode::None),
            other => Err(anyhow!("Unknown prefix delete mode: {other}")),
        }
    }
}

/// Decides whether a command is visible to a user in a channel/guild
pub type VisibilityPredicate =
    Arc<dyn Fn(&str, &UserInfo, ChannelId, Option<GuildId>) -> bool + Send + Sync>;

/// Options recognised by the dispatcher, help service and conversation engine
#[derive(Clone)]
pub struct FrameworkConfig {
    pub prefix: String,
    pub delete_mode: PrefixDeleteMode,
    pub react_to_commands: bool,
    pub delete_errors: bool,
    pub error_delete_delay: Duration,
    pub documentation_sort_order: Vec<String>,
    pub max_message_length: usize,
    pub conversation_idle_timeout: Duration,
    /// Reply that abandons an open conversation, with or without the prefix
    pub conversation_cancel_keyword: Option<String>,
    pub visibility: VisibilityPredicate,
}

impl Default for FrameworkConfig {
    fn default() -> Self {
        Self {
            prefix: "+".to_string(),
            delete_mode: PrefixDeleteMode::Single,
            react_to_commands: true,
            delete_errors: false,
            error_delete_delay: Duration::from_secs(5),
            documentation_sort_order: Vec::new(),
            max_message_length: 1500,
            conversation_idle_timeout: Duration::from_secs(600),
            conversation_cancel_keyword: Some("cancel".to_string()),
            visibility: Arc::new(|_, _, _, _| true),
        }
    }
}

impl FrameworkConfig {
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_visibility<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str, &UserInfo, ChannelId, Option<GuildId>) -> bool + Send + Sync + 'static,
    {
        self.visibility = Arc::new(predicate);
        self
    }

    /// Accepted spellings of the cancel keyword: bare and prefixed
    pub fn conversation_cancel_keywords(&self) -> Vec<String> {
        match &self.conversation_cancel_keyword {
            Some(keyword) => vec![keyword.clone(), format!("{}{keyword}", self.prefix)],
            None => Vec::new(),
        }
    }

    pub fn is_visible(
        &self,
        command: &str,
        author: &UserInfo,
        channel: ChannelId,
        guild: Option<GuildId>,
    ) -> bool {
        (self.visibility)(command, author, channel, guild)
    }
}

impl fmt::Debug for FrameworkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameworkConfig")
            .field("prefix", &self.prefix)
            .field("delete_mode", &self.delete_mode)
            .field("react_to_commands", &self.react_to_commands)
            .field("delete_errors", &self.delete_errors)
            .field("documentation_sort_order", &self.documentation_sort_order)
            .field("max_message_length", &self.max_message_length)
            .field("conversation_cancel_keyword", &self.conversation_cancel_keyword)
            .finish_non_exhaustive()
    }
}

/// Process configuration for the bundled bot binary
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub log_level: String,
    pub data_path: String,
    pub framework: FrameworkConfig,
}

impl BotConfig {
    /// Read configuration from the environment (call `dotenvy::dotenv()` first)
    pub fn from_env() -> Result<Self> {
        let discord_token =
            std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN must be set")?;

        let mut framework = FrameworkConfig::default();
        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            framework.prefix = prefix;
        }
        if let Ok(mode) = std::env::var("PREFIX_DELETE_MODE") {
            framework.delete_mode = mode.parse()?;
        }
        if let Ok(react) = std::env::var("REACT_TO_COMMANDS") {
            framework.react_to_commands = parse_flag(&react)?;
        }
        if let Ok(delete) = std::env::var("DELETE_ERRORS") {
            framework.delete_errors = parse_flag(&delete)?;
        }
        if let Ok(order) = std::env::var("DOCUMENTATION_SORT_ORDER") {
            framework.documentation_sort_order = order
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }

        Ok(Self {
            discord_token,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            data_path: std::env::var("DATA_PATH").unwrap_or_else(|_| "data".to_string()),
            framework,
        })
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Expected a boolean flag, got: {other}")),
    }
}
