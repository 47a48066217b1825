use anyhow::Result;
use dashmap::DashMap;
use dotenvy::dotenv;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serenity::prelude::{Client, GatewayIntents};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kordkit::arguments::{
    ChoiceArg, GuildEmojiArg, IntegerArg, IntegerRangeArg, SentenceArg, SplitterArg, UserArg,
    WordArg,
};
use kordkit::features::permissions::PERMISSIONS_FILE;
use kordkit::{
    arg, commands, precondition, ArgValue, BotConfig, ConversationService, ConversationStart,
    Conversation, Data, Dependencies, Dependency, EventBus, Framework, FrameworkEvent,
    FrameworkHandler, JsonFileStore, PermissionManager, PreconditionKind, PreconditionResult,
    Service, StartupError,
};

/// How often idle conversations are swept
const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Default, Serialize, Deserialize)]
struct BotSettings {
    owner_id: u64,
    /// Gate every command on permissions.json (the owner always passes)
    restrict_commands: bool,
}

impl Data for BotSettings {
    const PATH: &'static str = "settings.json";
}

struct Uptime {
    started: Instant,
}

impl Service for Uptime {
    fn construct(_deps: &Dependencies) -> Result<Self> {
        Ok(Self {
            started: Instant::now(),
        })
    }
}

/// Invocation counts fed from the event bus
struct UsageStats {
    counts: Arc<DashMap<String, u64>>,
}

impl Service for UsageStats {
    fn dependencies() -> Vec<Dependency> {
        vec![Dependency::of::<EventBus>()]
    }

    fn construct(deps: &Dependencies) -> Result<Self> {
        let counts: Arc<DashMap<String, u64>> = Arc::new(DashMap::new());
        let mut subscription = deps.get::<EventBus>()?.subscribe();
        let tally = Arc::clone(&counts);
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if let FrameworkEvent::CommandInvoked { command, .. } = event {
                    *tally.entry(command).or_insert(0) += 1;
                }
            }
        });
        Ok(Self { counts })
    }
}

impl UsageStats {
    fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut counts: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(n);
        counts
    }
}

fn format_duration(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
}

fn integer(value: Option<&ArgValue>) -> i64 {
    value.and_then(ArgValue::as_integer).unwrap_or_default()
}

fn build_framework(config: &BotConfig, permissions: Arc<PermissionManager>) -> Result<Framework, StartupError> {
    Framework::builder(config.framework.clone())
        .data_store(JsonFileStore::new(&config.data_path))
        .data::<BotSettings>()
        .service::<Uptime>()
        .service::<UsageStats>()
        .shared(permissions)
        .command_set(
            "Utility",
            vec![Dependency::of::<Uptime>(), Dependency::of::<UsageStats>()],
            |deps| {
                let uptime = deps.get::<Uptime>()?;
                let stats = deps.get::<UsageStats>()?;
                Ok(commands(|c| {
                    c.command("ping", |cmd| {
                        cmd.description("Check that the bot is alive").execute(move |event| {
                            let uptime = Arc::clone(&uptime);
                            async move {
                                let elapsed = format_duration(uptime.started.elapsed());
                                event.respond(&format!("Pong! Up for {elapsed}")).await?;
                                Ok(())
                            }
                        });
                    });
                    c.command("stats", |cmd| {
                        cmd.description("Most used commands since startup").execute(move |event| {
                            let stats = Arc::clone(&stats);
                            async move {
                                let top = stats.top(5);
                                let reply = if top.is_empty() {
                                    "No commands used yet".to_string()
                                } else {
                                    top.iter()
                                        .map(|(name, count)| format!("`{name}`: {count}"))
                                        .collect::<Vec<_>>()
                                        .join("\n")
                                };
                                event.respond(&reply).await?;
                                Ok(())
                            }
                        });
                    });
                }))
            },
        )
        .command_set("Fun", vec![], |_| {
            Ok(commands(|c| {
                c.command("echo", |cmd| {
                    cmd.description("Repeat a sentence back")
                        .expect([arg(SentenceArg::default())])
                        .execute(|event| async move {
                            let text = event.arg(0).map(ToString::to_string).unwrap_or_default();
                            event.respond(&text).await?;
                            Ok(())
                        });
                });
                c.command("add", |cmd| {
                    cmd.description("Add two numbers")
                        .expect([arg(IntegerArg::default()), arg(IntegerArg::default()).optional(0)])
                        .execute(|event| async move {
                            let sum = integer(event.arg(0)).saturating_add(integer(event.arg(1)));
                            event.respond(&sum.to_string()).await?;
                            Ok(())
                        });
                });
                c.command("roll", |cmd| {
                    cmd.description("Roll a number in an inclusive range")
                        .expect([arg(IntegerRangeArg::default())
                            .optional(ArgValue::List(vec![ArgValue::Integer(1), ArgValue::Integer(6)]))])
                        .execute(|event| async move {
                            let bounds = event.arg(0).and_then(ArgValue::as_list).unwrap_or_default();
                            let (low, high) = (integer(bounds.first()), integer(bounds.get(1)));
                            let rolled = rand::random_range(low..=high);
                            event.respond(&format!("🎲 {rolled}")).await?;
                            Ok(())
                        });
                });
                c.command("choose", |cmd| {
                    cmd.description("Pick one of several `|`-separated options")
                        .expect([arg(SplitterArg::named("Options"))])
                        .execute(|event| async move {
                            let options = event.arg(0).and_then(ArgValue::as_list).unwrap_or_default();
                            if options.is_empty() {
                                event.respond("Nothing to choose from").await?;
                                return Ok(());
                            }
                            let picked = &options[rand::random_range(0..options.len())];
                            event.respond(&format!("I choose **{picked}**")).await?;
                            Ok(())
                        });
                });
                c.command("emote", |cmd| {
                    cmd.description("Show a custom emoji from this server")
                        .requires_guild(true)
                        .expect([arg(GuildEmojiArg::default())])
                        .execute(|event| async move {
                            let Some(emoji) = event.arg(0).and_then(ArgValue::as_emoji) else {
                                return Ok(());
                            };
                            event.respond(&emoji.mention()).await?;
                            Ok(())
                        });
                });
                c.command("whois", |cmd| {
                    cmd.description("Look up a user")
                        .expect([arg(UserArg::default())])
                        .execute(|event| async move {
                            let Some(user) = event.arg(0).and_then(ArgValue::as_user) else {
                                return Ok(());
                            };
                            let kind = if user.is_bot { "bot" } else { "user" };
                            event
                                .respond(&format!("{} ({kind}, id {})", user.name, user.id))
                                .await?;
                            Ok(())
                        });
                });
            }))
        })
        .command_set(
            "Feedback",
            vec![Dependency::of::<ConversationService>()],
            |deps| {
                let conversations = deps.get::<ConversationService>()?;
                let cancelling = Arc::clone(&conversations);
                Ok(commands(|c| {
                    c.command("feedback", |cmd| {
                        cmd.description("Tell us what you think").execute(move |event| {
                            let conversations = Arc::clone(&conversations);
                            async move {
                                let started = conversations
                                    .start(
                                        "feedback",
                                        event.author(),
                                        event.channel_id(),
                                        event.guild_id(),
                                        Arc::clone(&event.transport),
                                    )
                                    .await?;
                                if started == ConversationStart::AlreadyActive {
                                    event
                                        .respond("Finish your open conversation first, or use `cancel`")
                                        .await?;
                                }
                                Ok(())
                            }
                        });
                    });
                    c.command("cancel", |cmd| {
                        cmd.description("Abandon your open conversation").execute(move |event| {
                            let conversations = Arc::clone(&cancelling);
                            async move {
                                let reply = if conversations.cancel(event.author().id, event.guild_id()) {
                                    "Conversation cancelled"
                                } else {
                                    "You have no open conversation"
                                };
                                event.respond(reply).await?;
                                Ok(())
                            }
                        });
                    });
                }))
            },
        )
        .command_set(
            "Admin",
            vec![Dependency::of::<PermissionManager>()],
            |deps| {
                let permissions = deps.get::<PermissionManager>()?;
                Ok(commands(|c| {
                    c.command("grant", |cmd| {
                        cmd.description("Allow or deny a user an action")
                            .expect([
                                arg(UserArg::default()),
                                arg(WordArg::named("Action")),
                                arg(ChoiceArg::binary()).optional(true),
                            ])
                            .execute(move |event| {
                                let permissions = Arc::clone(&permissions);
                                async move {
                                    let (Some(user), Some(action)) = (
                                        event.arg(0).and_then(ArgValue::as_user),
                                        event.arg(1).and_then(ArgValue::as_str),
                                    ) else {
                                        return Ok(());
                                    };
                                    let allow = event.arg(2).and_then(ArgValue::as_bool).unwrap_or(true);
                                    permissions.set_user_permission(action, user.id, allow);
                                    permissions.save()?;
                                    let verb = if allow { "may now" } else { "may no longer" };
                                    event.respond(&format!("{} {verb} use `{action}`", user.name)).await?;
                                    Ok(())
                                }
                            });
                    });
                }))
            },
        )
        .precondition(
            PreconditionKind::OneOf,
            vec![Dependency::of::<BotSettings>()],
            |deps| {
                let settings = deps.get::<BotSettings>()?;
                Ok(precondition(move |event| {
                    if event.author().id == settings.owner_id {
                        PreconditionResult::Pass
                    } else {
                        PreconditionResult::fail_silently()
                    }
                }))
            },
        )
        .precondition(PreconditionKind::AllOf, vec![], |_| {
            Ok(precondition(|event| {
                if event.command_name().eq_ignore_ascii_case("grant") {
                    PreconditionResult::fail("Only the bot owner can do that")
                } else {
                    PreconditionResult::Pass
                }
            }))
        })
        .precondition(
            PreconditionKind::AllOf,
            vec![Dependency::of::<BotSettings>(), Dependency::of::<PermissionManager>()],
            |deps| {
                let settings = deps.get::<BotSettings>()?;
                let permissions = deps.get::<PermissionManager>()?.produce_precondition();
                Ok(precondition(move |event| {
                    if settings.restrict_commands && !event.command_name().is_empty() {
                        permissions(event)
                    } else {
                        PreconditionResult::Pass
                    }
                }))
            },
        )
        .conversation(vec![], |_| {
            Ok(Conversation::new("feedback")
                .description("Collects a rating and a comment")
                .prompt("How would you rate the bot from 1 to 10?", IntegerArg::named("Rating"))
                .prompt("Anything else you'd like to tell us?", SentenceArg::named("Comment"))
                .on_complete(|ctx, answers| async move {
                    let rating = integer(answers.first());
                    let comment = answers.get(1).map(ToString::to_string).unwrap_or_default();
                    info!("📬 Feedback from {}: {rating}/10 \"{comment}\"", ctx.user.name);
                    ctx.respond("Thanks for the feedback!").await?;
                    Ok(())
                }))
        })
        .build()
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = BotConfig::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting kordkit demo bot...");

    let permissions_path = Path::new(&config.data_path).join(PERMISSIONS_FILE);
    let permissions = Arc::new(PermissionManager::open(&permissions_path)?);
    info!("🔐 Permissions file: {}", permissions_path.display());

    let framework = match build_framework(&config, permissions) {
        Ok(framework) => Arc::new(framework),
        Err(StartupError::DataGenerated(paths)) => {
            warn!("📝 Generated new data files, fill them in and restart:");
            for path in paths {
                warn!("  - {path}");
            }
            return Ok(());
        }
        Err(e) => {
            error!("❌ Framework startup failed: {e}");
            return Err(e.into());
        }
    };

    // Sweep conversations nobody is answering
    let sweeper = Arc::clone(&framework);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(EVICTION_INTERVAL);
        loop {
            interval.tick().await;
            sweeper.evict_idle_conversations();
        }
    });

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_EMOJIS_AND_STICKERS
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(FrameworkHandler::new(framework))
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
