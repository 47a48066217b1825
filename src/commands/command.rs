//! Command definitions and the name-keyed command container
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Builder closures replace handler structs; names are case-folded at registration
//! - 1.0.0: Initial registry mapping command names to handlers

use anyhow::Result;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::event::CommandEvent;
use super::BoxFuture;
use crate::arguments::{ArgValue, ArgumentContext, ArgumentKind, ArgumentType};

/// Category given to commands whose set declares none
pub const DEFAULT_CATEGORY: &str = "uncategorized";

pub type CommandHandlerFn = Arc<dyn Fn(CommandEvent) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Value substituted for an omitted optional argument
#[derive(Clone)]
pub enum DefaultValue {
    Literal(ArgValue),
    /// Computed from the invocation when the argument is omitted
    Computed(Arc<dyn Fn(&ArgumentContext) -> ArgValue + Send + Sync>),
}

impl DefaultValue {
    pub fn resolve(&self, ctx: &ArgumentContext) -> ArgValue {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Computed(compute) => compute(ctx),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// One expected argument position of a command
#[derive(Clone)]
pub struct CommandArgument {
    pub kind: ArgumentKind,
    pub optional: bool,
    pub default: DefaultValue,
}

impl CommandArgument {
    pub fn new(kind: ArgumentKind) -> Self {
        Self {
            kind,
            optional: false,
            default: DefaultValue::Literal(ArgValue::Text(String::new())),
        }
    }

    /// Make the argument optional, falling back to `default` when omitted
    pub fn optional(mut self, default: impl Into<ArgValue>) -> Self {
        self.optional = true;
        self.default = DefaultValue::Literal(default.into());
        self
    }

    /// Make the argument optional with a default computed from the invocation
    pub fn optional_with<F>(mut self, compute: F) -> Self
    where
        F: Fn(&ArgumentContext) -> ArgValue + Send + Sync + 'static,
    {
        self.optional = true;
        self.default = DefaultValue::Computed(Arc::new(compute));
        self
    }
}

/// Slots are equal when they share the same argument type instance; defaults are ignored
impl PartialEq for CommandArgument {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.kind, &other.kind)
    }
}

impl fmt::Debug for CommandArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandArgument")
            .field("kind", &self.kind.name())
            .field("optional", &self.optional)
            .field("default", &self.default)
            .finish()
    }
}

/// Shorthand for a required argument of the given type
pub fn arg(kind: impl ArgumentType + 'static) -> CommandArgument {
    CommandArgument::new(Arc::new(kind))
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Text(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Text(value)
    }
}

impl From<i64> for ArgValue {
    fn from(value: i64) -> Self {
        ArgValue::Integer(value)
    }
}

impl From<i32> for ArgValue {
    fn from(value: i32) -> Self {
        ArgValue::Integer(value.into())
    }
}

impl From<f64> for ArgValue {
    fn from(value: f64) -> Self {
        ArgValue::Double(value)
    }
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        ArgValue::Boolean(value)
    }
}

/// A named, invocable command
#[derive(Clone)]
pub struct Command {
    pub name: String,
    pub category: String,
    pub description: String,
    pub requires_guild: bool,
    pub expected_args: Vec<CommandArgument>,
    handler: CommandHandlerFn,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            description: "No Description Provided".to_string(),
            requires_guild: false,
            expected_args: Vec::new(),
            handler: Arc::new(|_: CommandEvent| -> BoxFuture<'static, Result<()>> { Box::pin(async { Ok(()) }) }),
        }
    }

    pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self
    }

    pub fn category(&mut self, category: impl Into<String>) -> &mut Self {
        self.category = category.into();
        self
    }

    pub fn requires_guild(&mut self, requires_guild: bool) -> &mut Self {
        self.requires_guild = requires_guild;
        self
    }

    pub fn expect(&mut self, args: impl IntoIterator<Item = CommandArgument>) -> &mut Self {
        self.expected_args = args.into_iter().collect();
        self
    }

    pub fn execute<F, Fut>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(CommandEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        self.handler = Arc::new(move |event: CommandEvent| -> BoxFuture<'static, Result<()>> {
            Box::pin(handler(event))
        });
        self
    }

    pub fn parameter_count(&self) -> usize {
        self.expected_args.len()
    }

    pub async fn invoke(&self, event: CommandEvent) -> Result<()> {
        (self.handler)(event).await
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("requires_guild", &self.requires_guild)
            .field("expected_args", &self.expected_args)
            .finish_non_exhaustive()
    }
}

/// Commands keyed by lower-cased name
///
/// # Example
///
/// ```ignore
/// let mut container = CommandsContainer::new();
/// container.command("ping", |cmd| {
///     cmd.description("Replies with pong")
///         .execute(|event| async move { event.respond("Pong!").await });
/// });
/// assert!(container.get("PING").is_some());
/// ```
#[derive(Clone, Default)]
pub struct CommandsContainer {
    commands: HashMap<String, Arc<Command>>,
}

impl CommandsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a command by running `construct` against a fresh definition
    pub fn command(&mut self, name: &str, construct: impl FnOnce(&mut Command)) -> &mut Self {
        let mut command = Command::new(name);
        construct(&mut command);
        self.commands.insert(name.to_lowercase(), Arc::new(command));
        self
    }

    /// Fill in `category` for every command that has none
    pub fn with_category(mut self, category: &str) -> Self {
        for command in self.commands.values_mut() {
            if command.category.is_empty() {
                Arc::make_mut(command).category = category.to_string();
            }
        }
        self
    }

    /// Right-biased union: later containers overwrite commands of the same name
    pub fn join(mut self, others: impl IntoIterator<Item = CommandsContainer>) -> Self {
        for other in others {
            self.commands.extend(other.commands);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<Command>> {
        self.commands.get(&name.to_lowercase()).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_lowercase())
    }

    /// Registered names, sorted
    pub fn list_commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn commands(&self) -> impl Iterator<Item = &Arc<Command>> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandsContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandsContainer")
            .field("commands", &self.list_commands())
            .finish()
    }
}

/// Build a container with a construction closure
pub fn commands(construct: impl FnOnce(&mut CommandsContainer)) -> CommandsContainer {
    let mut container = CommandsContainer::new();
    construct(&mut container);
    container
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{ChoiceArg, IntegerArg, SentenceArg, WordArg};

    #[test]
    fn test_container_new_is_empty() {
        let container = CommandsContainer::new();
        assert!(container.is_empty());
        assert_eq!(container.len(), 0);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let container = commands(|c| {
            c.command("Ping", |cmd| {
                cmd.description("pong");
            });
        });

        let lower = container.get("ping").unwrap();
        let upper = container.get("PING").unwrap();
        assert!(Arc::ptr_eq(&lower, &upper));
        assert!(container.has("pInG"));
        assert_eq!(container.list_commands(), vec!["ping"]);
    }

    #[test]
    fn test_join_is_right_biased() {
        let first = commands(|c| {
            c.command("echo", |cmd| {
                cmd.description("first");
            });
            c.command("only-first", |_| {});
        });
        let second = commands(|c| {
            c.command("echo", |cmd| {
                cmd.description("second");
            });
        });

        let merged = first.join([second]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("echo").unwrap().description, "second");
    }

    #[test]
    fn test_category_backfill_keeps_preset() {
        let container = commands(|c| {
            c.command("plain", |_| {});
            c.command("preset", |cmd| {
                cmd.category("Admin");
            });
        })
        .with_category("Utility");

        assert_eq!(container.get("plain").unwrap().category, "Utility");
        assert_eq!(container.get("preset").unwrap().category, "Admin");
    }

    #[test]
    fn test_argument_equality_ignores_defaults() {
        let word = Arc::new(WordArg::default()) as ArgumentKind;
        let a = CommandArgument::new(word.clone()).optional("x");
        let b = CommandArgument::new(word);
        assert_eq!(a, b);
        assert_ne!(arg(IntegerArg::default()), arg(SentenceArg::default()));
    }

    #[test]
    fn test_argument_equality_is_type_identity() {
        let colors = ChoiceArg::new("Choice", ["red", "blue"]).unwrap();
        let sizes = ChoiceArg::new("Choice", ["small", "large"]).unwrap();
        assert_ne!(arg(colors), arg(sizes));

        let shared = Arc::new(IntegerArg::default()) as ArgumentKind;
        assert_eq!(CommandArgument::new(shared.clone()), CommandArgument::new(shared));
        assert_ne!(arg(IntegerArg::default()), arg(IntegerArg::default()));
    }

    #[test]
    fn test_expect_sets_parameter_count() {
        let container = commands(|c| {
            c.command("add", |cmd| {
                cmd.expect([arg(IntegerArg::default()), arg(IntegerArg::default()).optional(0)]);
            });
        });
        let add = container.get("add").unwrap();
        assert_eq!(add.parameter_count(), 2);
        assert!(add.expected_args[1].optional);
    }
}
