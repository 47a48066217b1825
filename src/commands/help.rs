//! Built-in `help` command
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//!
//! ## Changelog
//! - 1.1.0: Categories follow the configured documentation order
//! - 1.0.0: Initial help menu

use std::collections::BTreeMap;

use super::command::{arg, commands, Command, CommandsContainer};
use super::event::CommandEvent;
use super::recommender::CommandRecommender;
use crate::arguments::{ArgumentContext, WordArg};
use crate::core::FrameworkConfig;
use crate::transport::Embed;

pub const HELP_CATEGORY: &str = "Utility";
const HELP_COLOR: u32 = 0x5865F2;

/// The `help` command set, bound to the final configuration and name index
pub fn help_commands(config: FrameworkConfig, recommender: CommandRecommender) -> CommandsContainer {
    commands(move |c| {
        c.command("help", move |cmd| {
            cmd.description("Display a help menu, or details for a single command")
                .category(HELP_CATEGORY)
                .expect([arg(WordArg::named("Command")).optional("")])
                .execute(move |event| {
                    let config = config.clone();
                    let recommender = recommender.clone();
                    async move {
                        let target = event.arg(0).and_then(|v| v.as_str()).unwrap_or_default();
                        if target.is_empty() {
                            event.respond_embed(&help_menu(&event, &config)).await?;
                            return Ok(());
                        }

                        let visible = |name: &str| {
                            config.is_visible(name, event.author(), event.channel_id(), event.guild_id())
                        };
                        match event.container.get(target).filter(|command| visible(&command.name)) {
                            Some(command) => {
                                let embed =
                                    command_help(&command, &config.prefix, &event.argument_context()).await;
                                event.respond_embed(&embed).await?;
                            }
                            None => {
                                let reply = match recommender.recommend(target, visible) {
                                    Some(name) => {
                                        format!("I don't know what {target} is, perhaps you meant {name}?")
                                    }
                                    None => format!("I don't know what {target} is."),
                                };
                                event.respond(&reply).await?;
                            }
                        }
                        Ok(())
                    }
                });
        });
    })
}

/// Categories listed in `sort_order` first (in that order), then the rest alphabetically
pub fn ordered_categories<'a>(
    categories: impl IntoIterator<Item = &'a str>,
    sort_order: &[String],
) -> Vec<String> {
    let mut remaining: Vec<String> = categories.into_iter().map(String::from).collect();
    remaining.sort();
    remaining.dedup();

    let mut ordered = Vec::with_capacity(remaining.len());
    for wanted in sort_order {
        if let Some(pos) = remaining.iter().position(|c| c.eq_ignore_ascii_case(wanted)) {
            ordered.push(remaining.remove(pos));
        }
    }
    ordered.extend(remaining);
    ordered
}

fn help_menu(event: &CommandEvent, config: &FrameworkConfig) -> Embed {
    let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for command in event.container.commands() {
        if config.is_visible(&command.name, event.author(), event.channel_id(), event.guild_id()) {
            by_category.entry(command.category.as_str()).or_default().push(&command.name);
        }
    }

    let mut embed = Embed::new()
        .title("Help menu")
        .description(format!(
            "Use `{}help <command>` for more information",
            config.prefix
        ))
        .color(HELP_COLOR);

    for category in ordered_categories(by_category.keys().copied(), &config.documentation_sort_order) {
        let Some(names) = by_category.get_mut(category.as_str()) else {
            continue;
        };
        names.sort_unstable();
        let listing = names
            .iter()
            .map(|name| format!("`{name}`"))
            .collect::<Vec<_>>()
            .join(", ");
        embed = embed.field(category, listing, false);
    }
    embed
}

/// Usage line such as `+add <Integer> [Integer]`
pub fn usage(command: &Command, prefix: &str) -> String {
    let mut line = format!("{prefix}{}", command.name);
    for slot in &command.expected_args {
        if slot.optional {
            line.push_str(&format!(" [{}]", slot.kind.name()));
        } else {
            line.push_str(&format!(" <{}>", slot.kind.name()));
        }
    }
    line
}

async fn command_help(command: &Command, prefix: &str, ctx: &ArgumentContext) -> Embed {
    let mut example = format!("{prefix}{}", command.name);
    for slot in &command.expected_args {
        if let Some(sample) = slot.kind.examples(ctx).await.into_iter().next() {
            example.push(' ');
            example.push_str(&sample);
        }
    }

    Embed::new()
        .title(command.name.clone())
        .description(command.description.clone())
        .color(HELP_COLOR)
        .field("Category", command.category.clone(), true)
        .field("Usage", format!("`{}`", usage(command, prefix)), false)
        .field("Example", format!("`{example}`"), false)
}
