//! Two-token inclusive integer ranges

use async_trait::async_trait;

use super::integer::parse_integer;
use super::{ArgValue, ArgumentContext, ArgumentResult, ArgumentType, ConsumptionType};

/// Consumes exactly two tokens, `low high`, with `low <= high`.
///
/// Produces `ArgValue::List([Integer(low), Integer(high)])`.
#[derive(Debug, Clone)]
pub struct IntegerRangeArg {
    name: String,
}

impl IntegerRangeArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IntegerRangeArg {
    fn default() -> Self {
        Self::named("Integer Range")
    }
}

#[async_trait]
impl ArgumentType for IntegerRangeArg {
    fn name(&self) -> &str {
        &self.name
    }

    fn consumption_type(&self) -> ConsumptionType {
        ConsumptionType::Multiple(2)
    }

    async fn examples(&self, _ctx: &ArgumentContext) -> Vec<String> {
        vec!["1 10".to_string(), "-5 5".to_string()]
    }

    async fn convert(
        &self,
        tokens: &[String],
        _remaining: &[String],
        _ctx: &ArgumentContext,
    ) -> ArgumentResult {
        let [low, high] = tokens else {
            return ArgumentResult::error("Expected two whole numbers");
        };

        let (low, high) = match (parse_integer(low), parse_integer(high)) {
            (Ok(low), Ok(high)) => (low, high),
            (Err(reason), _) | (_, Err(reason)) => return ArgumentResult::Error(reason),
        };

        if low > high {
            return ArgumentResult::Error(format!("{low} is greater than {high}"));
        }

        ArgumentResult::Success(ArgValue::List(vec![
            ArgValue::Integer(low),
            ArgValue::Integer(high),
        ]))
    }
}
