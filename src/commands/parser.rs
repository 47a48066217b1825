//! Slot-by-slot conversion of invocation tokens into argument values

use crate::arguments::{ArgValue, ArgumentContext, ArgumentResult, ConsumptionType};

use super::command::CommandArgument;

/// Why an invocation's arguments could not be converted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentFailure {
    /// Zero-based slot index, `None` for unmatched trailing tokens
    pub slot: Option<usize>,
    pub message: String,
}

/// Convert `tokens` against `expected`, in order.
///
/// Each slot takes tokens according to its consumption type. A slot whose
/// tokens are exhausted falls back to its default when optional; otherwise
/// conversion stops at the first missing or rejected slot. Tokens left over
/// after the last slot are an error. Nothing is partially applied.
pub async fn convert_arguments(
    expected: &[CommandArgument],
    tokens: &[String],
    ctx: &ArgumentContext,
) -> Result<Vec<ArgValue>, ArgumentFailure> {
    let mut values = Vec::with_capacity(expected.len());
    let mut position = 0;

    for (index, slot) in expected.iter().enumerate() {
        let remaining = &tokens[position..];
        let wanted = match slot.kind.consumption_type() {
            ConsumptionType::Single => 1,
            ConsumptionType::Multiple(count) => count,
            ConsumptionType::All => remaining.len(),
        };

        if remaining.is_empty() || remaining.len() < wanted {
            if slot.optional {
                values.push(slot.default.resolve(ctx));
                continue;
            }
            return Err(missing_argument(index, slot, ctx).await);
        }

        let consumed = &remaining[..wanted];
        match slot.kind.convert(consumed, remaining, ctx).await {
            ArgumentResult::Success(value) => {
                values.push(value);
                position += wanted;
            }
            ArgumentResult::Error(reason) => {
                return Err(rejected_argument(index, slot, &reason, ctx).await);
            }
        }
    }

    if position < tokens.len() {
        return Err(ArgumentFailure {
            slot: None,
            message: format!("Unmatched arguments: {}", tokens[position..].join(" ")),
        });
    }

    Ok(values)
}

async fn example_hint(slot: &CommandArgument, ctx: &ArgumentContext) -> String {
    match slot.kind.examples(ctx).await.into_iter().next() {
        Some(example) => format!(" (e.g. `{example}`)"),
        None => String::new(),
    }
}

async fn missing_argument(index: usize, slot: &CommandArgument, ctx: &ArgumentContext) -> ArgumentFailure {
    ArgumentFailure {
        slot: Some(index),
        message: format!(
            "Missing argument {}: expected {}{}",
            index + 1,
            slot.kind.name(),
            example_hint(slot, ctx).await
        ),
    }
}

async fn rejected_argument(
    index: usize,
    slot: &CommandArgument,
    reason: &str,
    ctx: &ArgumentContext,
) -> ArgumentFailure {
    ArgumentFailure {
        slot: Some(index),
        message: format!(
            "Invalid argument {} ({}): {}{}",
            index + 1,
            slot.kind.name(),
            reason,
            example_hint(slot, ctx).await
        ),
    }
}
