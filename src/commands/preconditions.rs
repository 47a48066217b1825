//! Gate functions run before any command executes
//!
//! Two lists are kept. Overriding (OneOf) preconditions grant access: if any
//! of them passes, evaluation passes immediately. Standard (AllOf)
//! preconditions are safety checks: the first failure ends evaluation.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.2.0

use std::fmt;
use std::sync::Arc;

use super::event::CommandEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionResult {
    Pass,
    /// A missing or empty reason fails silently
    Fail(Option<String>),
}

impl PreconditionResult {
    pub fn fail(reason: impl Into<String>) -> Self {
        PreconditionResult::Fail(Some(reason.into()))
    }

    pub fn fail_silently() -> Self {
        PreconditionResult::Fail(None)
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, PreconditionResult::Pass)
    }

    /// Reason to show the user, `None` for passes and silent failures
    pub fn visible_reason(&self) -> Option<&str> {
        match self {
            PreconditionResult::Fail(Some(reason)) if !reason.is_empty() => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreconditionKind {
    #[default]
    AllOf,
    OneOf,
}

pub type Precondition = Arc<dyn Fn(&CommandEvent) -> PreconditionResult + Send + Sync>;

/// Wrap a closure as a [`Precondition`]
pub fn precondition<F>(check: F) -> Precondition
where
    F: Fn(&CommandEvent) -> PreconditionResult + Send + Sync + 'static,
{
    Arc::new(check)
}

#[derive(Clone, Default)]
pub struct PreconditionEvaluator {
    overriding: Vec<Precondition>,
    standard: Vec<Precondition>,
}

impl PreconditionEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: PreconditionKind, check: Precondition) {
        match kind {
            PreconditionKind::AllOf => self.standard.push(check),
            PreconditionKind::OneOf => self.overriding.push(check),
        }
    }

    pub fn len(&self) -> usize {
        self.overriding.len() + self.standard.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn evaluate(&self, event: &CommandEvent) -> PreconditionResult {
        if self.overriding.iter().any(|check| check(event).is_pass()) {
            return PreconditionResult::Pass;
        }

        self.standard
            .iter()
            .map(|check| check(event))
            .find(|result| !result.is_pass())
            .unwrap_or(PreconditionResult::Pass)
    }
}

impl fmt::Debug for PreconditionEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreconditionEvaluator")
            .field("overriding", &self.overriding.len())
            .field("standard", &self.standard.len())
            .finish()
    }
}
