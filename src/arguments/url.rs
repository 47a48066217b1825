//! Web addresses

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;

use super::{single_token, ArgValue, ArgumentContext, ArgumentResult, ArgumentType};

static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)^(https?://)?(www\.)?[-a-z0-9@:%._+~#=]{1,256}\.[a-z0-9()]{1,6}\b([-a-z0-9()@:%_+.~#?&/=]*)$",
        )
        .expect("URL pattern is a valid regex")
    })
}

/// Accepts a token that looks like a URL
#[derive(Debug, Clone)]
pub struct UrlArg {
    name: String,
}

impl UrlArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for UrlArg {
    fn default() -> Self {
        Self::named("URL")
    }
}

#[async_trait]
impl ArgumentType for UrlArg {
    fn name(&self) -> &str {
        &self.name
    }

    async fn examples(&self, _ctx: &ArgumentContext) -> Vec<String> {
        vec!["http://www.google.com".to_string()]
    }

    async fn convert(
        &self,
        tokens: &[String],
        _remaining: &[String],
        _ctx: &ArgumentContext,
    ) -> ArgumentResult {
        match single_token(tokens) {
            Ok(raw) if url_pattern().is_match(raw) => {
                ArgumentResult::Success(ArgValue::Text(raw.to_string()))
            }
            Ok(_) => ArgumentResult::error("Invalid format"),
            Err(error) => error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{argument_context, tokens, RecordingTransport};

    #[tokio::test]
    async fn test_url_accepts_common_forms() {
        let ctx = argument_context(RecordingTransport::new(), None);
        for good in ["https://docs.rs/serenity", "example.com", "http://a.b.io/path?q=1"] {
            let input = tokens(good);
            assert!(UrlArg::default().convert(&input, &input, &ctx).await.is_success(), "{good}");
        }
    }

    #[tokio::test]
    async fn test_url_rejects_plain_words() {
        let ctx = argument_context(RecordingTransport::new(), None);
        for bad in ["hello", "http://", "not a url"] {
            let input = vec![bad.to_string()];
            assert!(!UrlArg::default().convert(&input, &input, &ctx).await.is_success(), "{bad}");
        }
    }
}
