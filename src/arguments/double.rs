//! Locale-invariant decimal numbers

use async_trait::async_trait;

use super::{single_token, ArgValue, ArgumentContext, ArgumentResult, ArgumentType};

/// Accepts a finite decimal number written with `.` as the separator
#[derive(Debug, Clone)]
pub struct DoubleArg {
    name: String,
}

impl DoubleArg {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for DoubleArg {
    fn default() -> Self {
        Self::named("Decimal")
    }
}

#[async_trait]
impl ArgumentType for DoubleArg {
    fn name(&self) -> &str {
        &self.name
    }

    async fn examples(&self, _ctx: &ArgumentContext) -> Vec<String> {
        ["2.3", "5.6", "64.442234", "664.3443", "25.00"]
            .iter()
            .map(|s| s.to_string())
            .collect()
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
        // f64::from_str also accepts "inf" and "NaN"; those are not user input
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => ArgumentResult::Success(ArgValue::Double(value)),
            _ => ArgumentResult::Error(format!("Expected a decimal number, got {raw}")),
        }
    }
}
