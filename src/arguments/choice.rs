//! Case-insensitive selection from a fixed set of literals

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{single_token, ArgValue, ArgumentContext, ArgumentResult, ArgumentType};

/// Accepts one of a fixed set of literals, ignoring case.
///
/// Each literal maps to the value produced on a match; [`ChoiceArg::new`]
/// maps literals to themselves, [`ChoiceArg::binary`] maps `true`/`false`
/// to booleans.
#[derive(Debug, Clone)]
pub struct ChoiceArg {
    name: String,
    options: Vec<(String, ArgValue)>,
}

impl ChoiceArg {
    /// Build a choice over text literals.
    ///
    /// Fails if two literals are equal after case-folding.
    pub fn new<I, S>(name: impl Into<String>, choices: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let choices = choices
            .into_iter()
            .map(|choice| {
                let literal: String = choice.into();
                (literal.clone(), ArgValue::Text(literal))
            })
            .collect();
        Self::with_values(name, choices)
    }

    /// Build a choice where each literal produces its own value
    pub fn with_values(name: impl Into<String>, choices: Vec<(String, ArgValue)>) -> Result<Self> {
        let name = name.into();
        let mut options: Vec<(String, ArgValue)> = Vec::with_capacity(choices.len());

        for (literal, value) in choices {
            let folded = literal.to_lowercase();
            if folded.is_empty() {
                bail!("{name}: choice literals must not be empty");
            }
            if options.iter().any(|(existing, _)| *existing == folded) {
                bail!("{name}: duplicate choice '{literal}' (choices are case-insensitive)");
            }
            options.push((folded, value));
        }

        if options.is_empty() {
            bail!("{name}: at least one choice is required");
        }

        Ok(Self { name, options })
    }

    /// `true` / `false`, converted to booleans
    pub fn binary() -> Self {
        Self {
            name: "Choice".to_string(),
            options: vec![
                ("true".to_string(), ArgValue::Boolean(true)),
                ("false".to_string(), ArgValue::Boolean(false)),
            ],
        }
    }

    /// Case-folded literals in declaration order
    pub fn literals(&self) -> Vec<&str> {
        self.options.iter().map(|(literal, _)| literal.as_str()).collect()
    }
}

#[async_trait]
impl ArgumentType for ChoiceArg {
    fn name(&self) -> &str {
        &self.name
    }

    async fn examples(&self, _ctx: &ArgumentContext) -> Vec<String> {
        self.literals().into_iter().map(String::from).collect()
    }

    async fn convert(
        &self,
        tokens: &[String],
        _remaining: &[String],
        _ctx: &ArgumentContext,
    ) -> ArgumentResult {
        let raw = match single_token(tokens) {
            Ok(raw) => raw.to_lowercase(),
            Err(error) => return error,
        };

        match self.options.iter().find(|(literal, _)| *literal == raw) {
            Some((_, value)) => ArgumentResult::Success(value.clone()),
            None => ArgumentResult::Error(format!(
                "Invalid choice. Available choices: {}",
                self.literals().join(", ")
            )),
        }
    }
}
