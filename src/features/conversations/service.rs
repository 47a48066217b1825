//! # Conversation Service
//!
//! Tracks at most one open conversation per (user, guild) and feeds that
//! user's messages through the current step's argument type.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//!
//! ## Changelog
//! - 1.1.0: Cancel keywords and an answer length bound; eviction re-checks idleness on removal
//! - 1.0.0: Initial per-key state machine

use anyhow::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::conversation::{Conversation, ConversationContext, Prompt};
use crate::arguments::{ArgValue, ArgumentContext, ArgumentResult, ConsumptionType};
use crate::core::MESSAGE_LIMIT;
use crate::events::{EventBus, FrameworkEvent};
use crate::transport::{ChannelId, GuildId, InboundMessage, Transport, UserId, UserInfo};

/// Conversations are scoped per user and guild; `None` is the direct-message scope
pub type ConversationKey = (UserId, Option<GuildId>);

pub const CANCELLED_MESSAGE: &str = "Conversation cancelled";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationStart {
    Started,
    /// The key already has an open conversation, which is left untouched
    AlreadyActive,
    Unknown,
}

struct ConversationState {
    step: usize,
    answers: Vec<ArgValue>,
    attempts: usize,
    last_activity: Instant,
}

/// Map entry; the definition sits outside the lock so it is readable while
/// an answer is being processed
#[derive(Clone)]
struct OpenConversation {
    conversation: Arc<Conversation>,
    state: Arc<Mutex<ConversationState>>,
}

impl OpenConversation {
    fn is(&self, other: &OpenConversation) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

pub struct ConversationService {
    definitions: DashMap<String, Arc<Conversation>>,
    active: DashMap<ConversationKey, OpenConversation>,
    events: EventBus,
    cancel_keywords: Vec<String>,
    max_answer_length: usize,
}

impl ConversationService {
    pub fn new(events: EventBus) -> Self {
        Self {
            definitions: DashMap::new(),
            active: DashMap::new(),
            events,
            cancel_keywords: Vec::new(),
            max_answer_length: MESSAGE_LIMIT,
        }
    }

    /// Replies (case-insensitive, trimmed) that abandon the open conversation
    /// instead of answering the current step
    pub fn with_cancel_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.cancel_keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self
    }

    /// Longer replies are rejected and the step is asked again
    pub fn with_max_answer_length(mut self, max_chars: usize) -> Self {
        self.max_answer_length = max_chars;
        self
    }

    /// Register a definition; a later registration with the same name replaces it
    pub fn register(&self, conversation: Conversation) {
        debug!("Registered conversation '{}'", conversation.name);
        self.definitions
            .insert(conversation.name.to_lowercase(), Arc::new(conversation));
    }

    pub fn conversation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.definitions.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn has_conversation(&self, user: UserId, guild: Option<GuildId>) -> bool {
        self.active.contains_key(&(user, guild))
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Open `name` for `user` and send its first prompt to `channel`
    pub async fn start(
        &self,
        name: &str,
        user: &UserInfo,
        channel: ChannelId,
        guild: Option<GuildId>,
        transport: Arc<dyn Transport>,
    ) -> Result<ConversationStart> {
        let Some(conversation) = self
            .definitions
            .get(&name.to_lowercase())
            .map(|e| Arc::clone(e.value()))
        else {
            return Ok(ConversationStart::Unknown);
        };

        let ctx = ConversationContext {
            user: user.clone(),
            channel_id: channel,
            guild_id: guild,
            transport,
        };

        if conversation.steps.is_empty() {
            if self.has_conversation(user.id, guild) {
                return Ok(ConversationStart::AlreadyActive);
            }
            self.publish_started(&conversation.name, user.id, guild);
            self.finish(&conversation, ctx, Vec::new()).await;
            return Ok(ConversationStart::Started);
        }

        match self.active.entry((user.id, guild)) {
            Entry::Occupied(_) => return Ok(ConversationStart::AlreadyActive),
            Entry::Vacant(slot) => {
                slot.insert(OpenConversation {
                    conversation: Arc::clone(&conversation),
                    state: Arc::new(Mutex::new(ConversationState {
                        step: 0,
                        answers: Vec::with_capacity(conversation.steps.len()),
                        attempts: 0,
                        last_activity: Instant::now(),
                    })),
                });
            }
        }

        info!(
            "💬 Conversation '{}' started with {}",
            conversation.name,
            user.descriptor()
        );
        self.publish_started(&conversation.name, user.id, guild);
        send_prompt(ctx.transport.as_ref(), channel, &conversation.steps[0].prompt).await?;
        Ok(ConversationStart::Started)
    }

    /// Feed `message` to the author's open conversation.
    ///
    /// Returns `false` when the author has no open conversation in this scope,
    /// meaning the message should go through normal dispatch.
    pub async fn handle_response(&self, transport: Arc<dyn Transport>, message: &InboundMessage) -> bool {
        if message.author.is_bot {
            return false;
        }

        let key = (message.author.id, message.guild_id);
        let Some(open) = self.active.get(&key).map(|e| e.value().clone()) else {
            return false;
        };

        let mut state = open.state.lock().await;
        // Completed, cancelled or evicted while this message waited for the lock
        let still_open = self.active.get(&key).is_some_and(|e| e.value().is(&open));
        if !still_open {
            return false;
        }

        let conversation = Arc::clone(&open.conversation);
        let channel = message.channel_id;

        if self.is_cancel_keyword(&message.content) {
            self.active.remove_if(&key, |_, v| v.is(&open));
            drop(state);
            self.announce_cancelled(&conversation.name, key.0, key.1);
            if let Err(e) = transport.send_text(channel, CANCELLED_MESSAGE).await {
                warn!("Failed to confirm conversation cancellation: {e}");
            }
            return true;
        }

        state.last_activity = Instant::now();
        let step = &conversation.steps[state.step];

        let result = if message.content.chars().count() > self.max_answer_length {
            ArgumentResult::Error(format!(
                "Responses are limited to {} characters",
                self.max_answer_length
            ))
        } else {
            let ctx = ArgumentContext {
                author: message.author.clone(),
                channel_id: channel,
                guild_id: message.guild_id,
                transport: Arc::clone(&transport),
            };
            match answer_tokens(&message.content, step.expect.consumption_type()) {
                Ok(tokens) => step.expect.convert(&tokens, &tokens, &ctx).await,
                Err(reason) => ArgumentResult::Error(reason),
            }
        };

        match result {
            ArgumentResult::Success(value) => {
                state.answers.push(value);
                state.step += 1;
                state.attempts = 0;

                if state.step < conversation.steps.len() {
                    let next = &conversation.steps[state.step].prompt;
                    if let Err(e) = send_prompt(transport.as_ref(), channel, next).await {
                        warn!("Failed to send conversation prompt: {e}");
                    }
                    return true;
                }

                let answers = std::mem::take(&mut state.answers);
                self.active.remove_if(&key, |_, v| v.is(&open));
                drop(state);

                let ctx = ConversationContext {
                    user: message.author.clone(),
                    channel_id: channel,
                    guild_id: message.guild_id,
                    transport,
                };
                self.finish(&conversation, ctx, answers).await;
            }
            ArgumentResult::Error(reason) => {
                state.attempts += 1;
                debug!(
                    "Conversation '{}' step {} rejected answer from {} (attempt {}): {reason}",
                    conversation.name,
                    state.step + 1,
                    message.author.descriptor(),
                    state.attempts
                );
                if let Err(e) = transport.send_text(channel, &reason).await {
                    warn!("Failed to send conversation error: {e}");
                }
                if let Err(e) = send_prompt(transport.as_ref(), channel, &step.prompt).await {
                    warn!("Failed to re-send conversation prompt: {e}");
                }
            }
        }

        true
    }

    /// Drop the open conversation for a key without completing it
    pub fn cancel(&self, user: UserId, guild: Option<GuildId>) -> bool {
        let Some((_, open)) = self.active.remove(&(user, guild)) else {
            return false;
        };
        self.announce_cancelled(&open.conversation.name, user, guild);
        true
    }

    /// Cancel every conversation idle for longer than `max_idle`; returns how many
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let candidates: Vec<ConversationKey> = self.active.iter().map(|entry| *entry.key()).collect();

        let mut evicted = 0;
        for key in candidates {
            // Idleness is decided under the map's write lock; a held state lock
            // means an answer is being processed right now
            let removed = self.active.remove_if(&key, |_, open| {
                open.state
                    .try_lock()
                    .is_ok_and(|state| state.last_activity.elapsed() > max_idle)
            });
            if let Some(((user, guild), open)) = removed {
                self.announce_cancelled(&open.conversation.name, user, guild);
                evicted += 1;
            }
        }
        evicted
    }

    fn is_cancel_keyword(&self, content: &str) -> bool {
        let reply = content.trim().to_lowercase();
        self.cancel_keywords.iter().any(|keyword| *keyword == reply)
    }

    fn announce_cancelled(&self, name: &str, user: UserId, guild: Option<GuildId>) {
        info!("💬 Conversation '{name}' cancelled for user {user}");
        self.events.publish(FrameworkEvent::ConversationCancelled {
            conversation: name.to_string(),
            user,
            guild,
        });
    }

    async fn finish(&self, conversation: &Conversation, ctx: ConversationContext, answers: Vec<ArgValue>) {
        let (user, guild) = (ctx.user.id, ctx.guild_id);
        info!(
            "💬 Conversation '{}' completed by {}",
            conversation.name,
            ctx.user.descriptor()
        );
        self.events.publish(FrameworkEvent::ConversationCompleted {
            conversation: conversation.name.clone(),
            user,
            guild,
        });
        if let Err(e) = conversation.complete(ctx, answers).await {
            error!("Conversation '{}' completion failed: {e:#}", conversation.name);
        }
    }

    fn publish_started(&self, name: &str, user: UserId, guild: Option<GuildId>) {
        self.events.publish(FrameworkEvent::ConversationStarted {
            conversation: name.to_string(),
            user,
            guild,
        });
    }
}

/// Split a reply according to the step's consumption type.
/// A single-token step receives the whole trimmed reply.
fn answer_tokens(content: &str, consumption: ConsumptionType) -> Result<Vec<String>, String> {
    let trimmed = content.trim();
    match consumption {
        ConsumptionType::Single if trimmed.is_empty() => Err("Please enter a response".to_string()),
        ConsumptionType::Single => Ok(vec![trimmed.to_string()]),
        ConsumptionType::Multiple(count) => {
            let tokens: Vec<String> = trimmed.split_whitespace().map(String::from).collect();
            if tokens.len() == count {
                Ok(tokens)
            } else {
                Err(format!("Expected {count} values separated by spaces"))
            }
        }
        ConsumptionType::All => Ok(trimmed.split_whitespace().map(String::from).collect()),
    }
}

async fn send_prompt(transport: &dyn Transport, channel: ChannelId, prompt: &Prompt) -> Result<()> {
    match prompt {
        Prompt::Text(text) => transport.send_text(channel, text).await.map(|_| ()),
        Prompt::Embed(embed) => transport.send_embed(channel, embed).await.map(|_| ()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::{IntegerRangeArg, SentenceArg, UserArg};
    use crate::testing::{author, message, RecordingTransport, CHANNEL, GUILD, OTHER_USER};
    use crate::transport::Embed;
    use std::sync::Mutex as StdMutex;

    fn service_with(conversation: Conversation) -> (ConversationService, EventBus) {
        let events = EventBus::new();
        let service = ConversationService::new(events.clone());
        service.register(conversation);
        (service, events)
    }

    fn capturing(name: &str, sink: Arc<StdMutex<Vec<Vec<ArgValue>>>>) -> Conversation {
        Conversation::new(name)
            .prompt("Who?", UserArg::default())
            .prompt("What?", SentenceArg::default())
            .on_complete(move |ctx, answers| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(answers);
                    ctx.respond("Done").await?;
                    Ok(())
                }
            })
    }

    #[tokio::test]
    async fn test_two_step_conversation() {
        let sink = Arc::new(StdMutex::new(Vec::new()));
        let (service, events) = service_with(capturing("notify", Arc::clone(&sink)));
        let mut subscription = events.subscribe();
        let transport = RecordingTransport::new();

        let started = service
            .start("notify", &author(), CHANNEL, Some(GUILD), transport.clone())
            .await
            .unwrap();
        assert_eq!(started, ConversationStart::Started);
        assert_eq!(transport.sent_texts(), vec!["Who?"]);

        // Invalid id: stays on step 0 and repeats the prompt
        assert!(service.handle_response(transport.clone(), &message(1, "nobody", Some(GUILD))).await);
        assert_eq!(transport.last_text().unwrap(), "Who?");
        assert_eq!(transport.sent_texts().len(), 3);

        assert!(service
            .handle_response(transport.clone(), &message(2, &OTHER_USER.to_string(), Some(GUILD)))
            .await);
        assert_eq!(transport.last_text().unwrap(), "What?");

        assert!(service.handle_response(transport.clone(), &message(3, "hello there", Some(GUILD))).await);
        let captured = sink.lock().unwrap().clone();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0][0].as_user().unwrap().id, OTHER_USER);
        assert_eq!(captured[0][1], ArgValue::Text("hello there".into()));
        assert_eq!(transport.last_text().unwrap(), "Done");

        assert!(!service.has_conversation(author().id, Some(GUILD)));
        assert!(!service.handle_response(transport.clone(), &message(4, "again", Some(GUILD))).await);

        assert!(matches!(subscription.try_recv(), Some(FrameworkEvent::ConversationStarted { .. })));
        assert!(matches!(subscription.try_recv(), Some(FrameworkEvent::ConversationCompleted { .. })));
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let sink = Arc::new(StdMutex::new(Vec::new()));
        let (service, _) = service_with(capturing("notify", sink));
        let transport = RecordingTransport::new();

        service.start("notify", &author(), CHANNEL, None, transport.clone()).await.unwrap();
        let again = service.start("NOTIFY", &author(), CHANNEL, None, transport.clone()).await.unwrap();

        assert_eq!(again, ConversationStart::AlreadyActive);
        assert_eq!(transport.sent_texts().len(), 1);
        assert_eq!(
            service.start("missing", &author(), CHANNEL, None, transport).await.unwrap(),
            ConversationStart::Unknown
        );
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let sink = Arc::new(StdMutex::new(Vec::new()));
        let (service, _) = service_with(capturing("notify", sink));
        let transport = RecordingTransport::new();

        service.start("notify", &author(), CHANNEL, Some(GUILD), transport.clone()).await.unwrap();

        assert!(service.has_conversation(author().id, Some(GUILD)));
        assert!(!service.has_conversation(author().id, None));
        assert!(!service.handle_response(transport, &message(1, "hi", None)).await);
    }

    #[tokio::test]
    async fn test_cancel_and_evict() {
        let sink = Arc::new(StdMutex::new(Vec::new()));
        let (service, events) = service_with(capturing("notify", Arc::clone(&sink)));
        let mut subscription = events.subscribe();
        let transport = RecordingTransport::new();

        service.start("notify", &author(), CHANNEL, None, transport.clone()).await.unwrap();
        assert!(service.cancel(author().id, None));
        assert!(!service.cancel(author().id, None));

        service.start("notify", &author(), CHANNEL, Some(GUILD), transport.clone()).await.unwrap();
        assert_eq!(service.evict_idle(Duration::from_secs(60)), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(service.evict_idle(Duration::from_millis(5)), 1);
        assert_eq!(service.active_count(), 0);
        assert!(sink.lock().unwrap().is_empty());

        let cancelled = std::iter::from_fn(|| subscription.try_recv())
            .filter(|e| matches!(e, FrameworkEvent::ConversationCancelled { .. }))
            .count();
        assert_eq!(cancelled, 2);
    }

    #[tokio::test]
    async fn test_multiple_arity_step_and_embed_prompt() {
        let sink = Arc::new(StdMutex::new(Vec::new()));
        let answers = Arc::clone(&sink);
        let conversation = Conversation::new("range")
            .prompt(Embed::new().title("Pick a range"), IntegerRangeArg::default())
            .on_complete(move |_, values| {
                let answers = Arc::clone(&answers);
                async move {
                    answers.lock().unwrap().push(values);
                    Ok(())
                }
            });
        let (service, _) = service_with(conversation);
        let transport = RecordingTransport::new();

        service.start("range", &author(), CHANNEL, None, transport.clone()).await.unwrap();
        assert_eq!(transport.sent_embeds().len(), 1);

        service.handle_response(transport.clone(), &message(1, "5", None)).await;
        assert!(transport.sent_texts()[0].contains("Expected 2 values"));
        assert_eq!(transport.sent_embeds().len(), 2);

        service.handle_response(transport.clone(), &message(2, "1 9", None)).await;
        let captured = sink.lock().unwrap();
        assert_eq!(
            captured[0][0],
            ArgValue::List(vec![ArgValue::Integer(1), ArgValue::Integer(9)])
        );
    }

    fn three_steps() -> Conversation {
        Conversation::new("survey")
            .prompt("A?", SentenceArg::default())
            .prompt("B?", SentenceArg::default())
            .prompt("C?", SentenceArg::default())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_answers_advance_one_step_each() {
        let (service, _) = service_with(three_steps());
        let service = Arc::new(service);
        let transport = RecordingTransport::new();

        service.start("survey", &author(), CHANNEL, None, transport.clone()).await.unwrap();

        let handles: Vec<_> = ["first", "second"]
            .into_iter()
            .enumerate()
            .map(|(i, answer)| {
                let service = Arc::clone(&service);
                let transport = transport.clone();
                tokio::spawn(async move {
                    service
                        .handle_response(transport, &message(i as u64 + 1, answer, None))
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert!(handle.await.unwrap());
        }

        assert_eq!(transport.sent_texts(), vec!["A?", "B?", "C?"]);
        assert!(service.has_conversation(author().id, None));
    }

    #[tokio::test]
    async fn test_cancel_keyword_abandons_conversation() {
        let sink = Arc::new(StdMutex::new(Vec::new()));
        let events = EventBus::new();
        let service = ConversationService::new(events.clone()).with_cancel_keywords(["cancel", "+cancel"]);
        service.register(capturing("notify", Arc::clone(&sink)));
        let mut subscription = events.subscribe();
        let transport = RecordingTransport::new();

        service.start("notify", &author(), CHANNEL, None, transport.clone()).await.unwrap();
        subscription.try_recv();

        assert!(service.handle_response(transport.clone(), &message(1, "  +CANCEL ", None)).await);
        assert!(!service.has_conversation(author().id, None));
        assert_eq!(transport.last_text().unwrap(), CANCELLED_MESSAGE);
        assert!(sink.lock().unwrap().is_empty());
        assert_eq!(
            subscription.try_recv(),
            Some(FrameworkEvent::ConversationCancelled {
                conversation: "notify".into(),
                user: author().id,
                guild: None,
            })
        );

        // Without an open conversation the keyword is ordinary input
        assert!(!service.handle_response(transport, &message(2, "cancel", None)).await);
    }

    #[tokio::test]
    async fn test_overlong_answer_is_asked_again() {
        let (service, _) = service_with(three_steps());
        let service = service.with_max_answer_length(10);
        let transport = RecordingTransport::new();

        service.start("survey", &author(), CHANNEL, None, transport.clone()).await.unwrap();
        assert!(service.handle_response(transport.clone(), &message(1, &"x".repeat(11), None)).await);

        assert_eq!(
            transport.sent_texts(),
            vec!["A?", "Responses are limited to 10 characters", "A?"]
        );
        assert!(service.handle_response(transport.clone(), &message(2, "ok", None)).await);
        assert_eq!(transport.last_text().unwrap(), "B?");
    }

    #[tokio::test]
    async fn test_cancel_names_conversation_while_answer_in_flight() {
        let sink = Arc::new(StdMutex::new(Vec::new()));
        let (service, events) = service_with(capturing("notify", sink));
        let mut subscription = events.subscribe();
        let transport = RecordingTransport::new();

        service.start("notify", &author(), CHANNEL, None, transport).await.unwrap();
        subscription.try_recv();

        let state = Arc::clone(&service.active.get(&(author().id, None)).unwrap().state);
        let _processing = state.lock().await;
        assert!(service.cancel(author().id, None));

        assert!(matches!(
            subscription.try_recv(),
            Some(FrameworkEvent::ConversationCancelled { conversation, .. }) if conversation == "notify"
        ));
    }

    #[tokio::test]
    async fn test_eviction_skips_conversation_being_answered() {
        let (service, _) = service_with(three_steps());
        let transport = RecordingTransport::new();

        service.start("survey", &author(), CHANNEL, None, transport).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        let state = Arc::clone(&service.active.get(&(author().id, None)).unwrap().state);
        let processing = state.lock().await;
        assert_eq!(service.evict_idle(Duration::from_millis(5)), 0);
        assert!(service.has_conversation(author().id, None));

        drop(processing);
        assert_eq!(service.evict_idle(Duration::from_millis(5)), 1);
        assert!(!service.has_conversation(author().id, None));
    }

    #[test]
    fn test_answer_tokens() {
        assert_eq!(
            answer_tokens("  hello world ", ConsumptionType::Single).unwrap(),
            vec!["hello world"]
        );
        assert!(answer_tokens("   ", ConsumptionType::Single).is_err());
        assert_eq!(answer_tokens("a b", ConsumptionType::All).unwrap().len(), 2);
    }
}
