//! Single whitespace-free token

use async_trait::async_trait;

use super::{single_token, ArgValue, ArgumentContext, ArgumentResult, ArgumentType};

/// Accepts any single token as text
#[derive(Debug, Clone)]
pub struct WordArg {
    name: String,
}

impl WordArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for WordArg {
    fn default() -> Self {
        Self::named("Word")
    }
}

#[async_trait]
impl ArgumentType for WordArg {
    fn name(&self) -> &str {
        &self.name
    }

    async fn examples(&self, _ctx: &ArgumentContext) -> Vec<String> {
        vec!["Hello".to_string(), "World".to_string()]
    }

    async fn convert(
        &self,
        tokens: &[String],
        _remaining: &[String],
        _ctx: &ArgumentContext,
    ) -> ArgumentResult {
        match single_token(tokens) {
            Ok(word) if !word.is_empty() && !word.chars().any(char::is_whitespace) => {
                ArgumentResult::Success(ArgValue::Text(word.to_string()))
            }
            Ok(_) => ArgumentResult::error("Expected a single word"),
            Err(error) => error,
        }
    }
}
