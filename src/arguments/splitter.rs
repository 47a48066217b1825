//! `|`-separated lists of phrases

use async_trait::async_trait;

use super::{ArgValue, ArgumentContext, ArgumentResult, ArgumentType, ConsumptionType};

/// Consumes all remaining tokens and splits the text on `|`.
///
/// Produces a list of trimmed, non-empty phrases. Useful when one
/// invocation needs several multi-word values.
#[derive(Debug, Clone)]
pub struct SplitterArg {
    name: String,
    separator: char,
}

impl SplitterArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            separator: '|',
        }
    }
}

impl Default for SplitterArg {
    fn default() -> Self {
        Self::named("Split Text")
    }
}

#[async_trait]
impl ArgumentType for SplitterArg {
    fn name(&self) -> &str {
        &self.name
    }

    fn consumption_type(&self) -> ConsumptionType {
        ConsumptionType::All
    }

    async fn examples(&self, _ctx: &ArgumentContext) -> Vec<String> {
        vec!["this|that|the other".to_string(), "red apples | green pears".to_string()]
    }

    async fn convert(
        &self,
        tokens: &[String],
        _remaining: &[String],
        _ctx: &ArgumentContext,
    ) -> ArgumentResult {
        let joined = tokens.join(" ");
        let parts: Vec<ArgValue> = joined
            .split(self.separator)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| ArgValue::Text(part.to_string()))
            .collect();

        if parts.is_empty() {
            ArgumentResult::Error(format!("Expected text separated by {}", self.separator))
        } else {
            ArgumentResult::Success(ArgValue::List(parts))
        }
    }
}
