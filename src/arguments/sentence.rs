//! Free text consuming every remaining token

use async_trait::async_trait;

use super::{ArgValue, ArgumentContext, ArgumentResult, ArgumentType, ConsumptionType};

/// Consumes all remaining tokens and joins them with single spaces.
/// Empty input is rejected.
#[derive(Debug, Clone)]
pub struct SentenceArg {
    name: String,
}

impl SentenceArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for SentenceArg {
    fn default() -> Self {
        Self::named("Text")
    }
}

#[async_trait]
impl ArgumentType for SentenceArg {
    fn name(&self) -> &str {
        &self.name
    }

    fn consumption_type(&self) -> ConsumptionType {
        ConsumptionType::All
    }

    async fn examples(&self, _ctx: &ArgumentContext) -> Vec<String> {
        vec!["This is a sample sentence.".to_string()]
    }

    async fn convert(
        &self,
        tokens: &[String],
        _remaining: &[String],
        _ctx: &ArgumentContext,
    ) -> ArgumentResult {
        let joined = tokens
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if joined.is_empty() {
            ArgumentResult::error("Expected some text")
        } else {
            ArgumentResult::Success(ArgValue::Text(joined))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{argument_context, tokens, RecordingTransport};

    #[tokio::test]
    async fn test_sentence_joins_tokens() {
        let ctx = argument_context(RecordingTransport::new(), None);
        for (input, expected) in [("HELLO", "HELLO"), ("world", "world"), ("hello world", "hello world")] {
            let input = tokens(input);
            let result = SentenceArg::default().convert(&input, &input, &ctx).await;
            assert_eq!(result, ArgumentResult::Success(ArgValue::Text(expected.into())));
        }
    }

    #[tokio::test]
    async fn test_sentence_rejects_empty() {
        let ctx = argument_context(RecordingTransport::new(), None);
        let empty = vec![String::new()];
        assert!(!SentenceArg::default().convert(&empty, &empty, &ctx).await.is_success());
        assert!(!SentenceArg::default().convert(&[], &[], &ctx).await.is_success());
    }
}
