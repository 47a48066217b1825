//! Base-10 whole numbers

use async_trait::async_trait;

use super::{single_token, ArgValue, ArgumentContext, ArgumentResult, ArgumentType};

/// Accepts a whole number in the `i64` range
#[derive(Debug, Clone)]
pub struct IntegerArg {
    name: String,
}

impl IntegerArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for IntegerArg {
    fn default() -> Self {
        Self::named("Integer")
    }
}

/// Parse a base-10 integer, distinguishing overflow from malformed input
pub(crate) fn parse_integer(raw: &str) -> Result<i64, String> {
    use std::num::IntErrorKind;

    raw.parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            format!("{raw} is out of range")
        }
        _ => format!("Expected a whole number, got {raw}"),
    })
}

#[async_trait]
impl ArgumentType for IntegerArg {
    fn name(&self) -> &str {
        &self.name
    }

    async fn examples(&self, _ctx: &ArgumentContext) -> Vec<String> {
        (0..=10).map(|n| n.to_string()).collect()
    }

    async fn convert(
        &self,
        tokens: &[String],
        _remaining: &[String],
        _ctx: &ArgumentContext,
    ) -> ArgumentResult {
        let raw = match single_token(tokens) {
            Ok(raw) => raw,
            Err(error) => return error,
        };
        match parse_integer(raw) {
            Ok(value) => ArgumentResult::Success(ArgValue::Integer(value)),
            Err(reason) => ArgumentResult::Error(reason),
        }
    }
}
