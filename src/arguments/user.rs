//! Platform users, by mention or raw id

use async_trait::async_trait;
use log::debug;

use super::{single_token, trim_to_id, ArgValue, ArgumentContext, ArgumentResult, ArgumentType};

/// Resolves a user mention (`<@123>`, `<@!123>`) or a raw id through the transport
#[derive(Debug, Clone)]
pub struct UserArg {
    name: String,
    allows_bot: bool,
}

impl UserArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allows_bot: true,
        }
    }

    /// Reject bot accounts
    pub fn humans_only(mut self) -> Self {
        self.allows_bot = false;
        self
    }
}

impl Default for UserArg {
    fn default() -> Self {
        Self::named("User")
    }
}

#[async_trait]
impl ArgumentType for UserArg {
    fn name(&self) -> &str {
        &self.name
    }

    async fn examples(&self, ctx: &ArgumentContext) -> Vec<String> {
        vec![ctx.author.mention(), ctx.author.id.to_string()]
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

        let Ok(id) = trim_to_id(raw).parse::<u64>() else {
            return ArgumentResult::error("Invalid user ID");
        };

        match ctx.transport.fetch_user(id).await {
            Ok(Some(user)) if user.is_bot && !self.allows_bot => {
                ArgumentResult::error("Bots are not allowed here")
            }
            Ok(Some(user)) => ArgumentResult::Success(ArgValue::User(user)),
            Ok(None) => ArgumentResult::error("Couldn't find a user with that ID"),
            Err(e) => {
                debug!("User lookup for {id} failed: {e}");
                ArgumentResult::error("Couldn't find a user with that ID")
            }
        }
    }
}
