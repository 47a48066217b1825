//! # Framework
//!
//! Startup assembly and the single inbound message entry point.
//!
//! Build order: data objects, services, command sets, recommender index,
//! preconditions, conversations, then the built-in help command.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false

use log::{debug, info};
use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

use crate::commands::{
    help_commands, CommandRecommender, CommandsContainer, DispatchOutcome, Dispatcher,
    Precondition, PreconditionEvaluator, PreconditionKind,
};
use crate::core::FrameworkConfig;
use crate::events::EventBus;
use crate::features::conversations::{Conversation, ConversationService};
use crate::features::permissions::PermissionManager;
use crate::injection::{
    Data, DataStore, Dependencies, Dependency, InjectionError, Injector, JsonFileStore, Service,
};
use crate::transport::{InboundMessage, Transport};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Injection(#[from] InjectionError),
    /// Not a failure: the listed files were created and must be filled in
    #[error("generated data files that must be filled in: {}", .0.join(", "))]
    DataGenerated(Vec<String>),
    #[error("invalid command set '{category}': {reason}")]
    InvalidCommandSet { category: String, reason: String },
}

type Registration = Box<dyn FnOnce(&mut Injector)>;
type DataLoader = Box<dyn FnOnce(&mut Injector) -> Result<(), InjectionError>>;
type Provide<T> = Box<dyn FnOnce(&Dependencies) -> anyhow::Result<T>>;

struct CommandSetProvider {
    category: String,
    dependencies: Vec<Dependency>,
    provide: Provide<CommandsContainer>,
}

struct PreconditionProvider {
    kind: PreconditionKind,
    dependencies: Vec<Dependency>,
    provide: Provide<Precondition>,
}

struct ConversationProvider {
    dependencies: Vec<Dependency>,
    provide: Provide<Conversation>,
}

pub struct FrameworkBuilder {
    config: FrameworkConfig,
    store: Arc<dyn DataStore>,
    registrations: Vec<Registration>,
    data: Vec<DataLoader>,
    command_sets: Vec<CommandSetProvider>,
    preconditions: Vec<PreconditionProvider>,
    conversations: Vec<ConversationProvider>,
    permissions: Option<Arc<PermissionManager>>,
}

impl FrameworkBuilder {
    fn new(config: FrameworkConfig) -> Self {
        Self {
            config,
            store: Arc::new(JsonFileStore::new(".")),
            registrations: Vec::new(),
            data: Vec::new(),
            command_sets: Vec::new(),
            preconditions: Vec::new(),
            conversations: Vec::new(),
            permissions: None,
        }
    }

    /// Where data objects are read from and generated into
    pub fn data_store(mut self, store: impl DataStore + 'static) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Register a pre-built injectable instance
    pub fn element<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.registrations.push(Box::new(move |injector: &mut Injector| {
            injector.add_element(value);
        }));
        self
    }

    /// Register an instance the caller also keeps a handle to
    pub fn shared<T: Any + Send + Sync>(mut self, value: Arc<T>) -> Self {
        self.registrations.push(Box::new(move |injector: &mut Injector| {
            injector.add_shared(value);
        }));
        self
    }

    pub fn data<T: Data>(mut self) -> Self {
        self.data.push(Box::new(|injector: &mut Injector| {
            injector.register_data::<T>().map(|_| ())
        }));
        self
    }

    pub fn service<T: Service>(mut self) -> Self {
        self.registrations.push(Box::new(|injector: &mut Injector| {
            injector.register_service::<T>();
        }));
        self
    }

    /// Commands produced from resolved dependencies; commands without a
    /// category are placed in `category`
    pub fn command_set<F>(mut self, category: &str, dependencies: Vec<Dependency>, provide: F) -> Self
    where
        F: FnOnce(&Dependencies) -> anyhow::Result<CommandsContainer> + 'static,
    {
        self.command_sets.push(CommandSetProvider {
            category: category.to_string(),
            dependencies,
            provide: Box::new(provide),
        });
        self
    }

    pub fn precondition<F>(mut self, kind: PreconditionKind, dependencies: Vec<Dependency>, provide: F) -> Self
    where
        F: FnOnce(&Dependencies) -> anyhow::Result<Precondition> + 'static,
    {
        self.preconditions.push(PreconditionProvider {
            kind,
            dependencies,
            provide: Box::new(provide),
        });
        self
    }

    pub fn conversation<F>(mut self, dependencies: Vec<Dependency>, provide: F) -> Self
    where
        F: FnOnce(&Dependencies) -> anyhow::Result<Conversation> + 'static,
    {
        self.conversations.push(ConversationProvider {
            dependencies,
            provide: Box::new(provide),
        });
        self
    }

    /// Gate every command on the manager's per-user permissions
    pub fn permissions(mut self, manager: Arc<PermissionManager>) -> Self {
        self.permissions = Some(manager);
        self
    }

    pub fn build(self) -> Result<Framework, StartupError> {
        let events = EventBus::new();
        let conversations = Arc::new(
            ConversationService::new(events.clone())
                .with_cancel_keywords(self.config.conversation_cancel_keywords())
                .with_max_answer_length(self.config.max_message_length),
        );

        let mut injector = Injector::with_store(self.store);
        injector.add_element(self.config.clone());
        injector.add_element(events.clone());
        injector.add_shared(Arc::clone(&conversations));
        if let Some(manager) = &self.permissions {
            injector.add_shared(Arc::clone(manager));
        }
        for register in self.registrations {
            register(&mut injector);
        }

        for load in self.data {
            load(&mut injector)?;
        }
        if !injector.generated_data().is_empty() {
            return Err(StartupError::DataGenerated(injector.generated_data().to_vec()));
        }

        let constructed = injector.build_all()?;
        debug!("Constructed services: {constructed:?}");

        let mut sets = Vec::with_capacity(self.command_sets.len());
        for set in self.command_sets {
            let container = injector.invoke(&set.dependencies, set.provide)?;
            validate_command_set(&set.category, &container)?;
            sets.push(container.with_category(&set.category));
        }
        let mut container = CommandsContainer::new().join(sets);

        let mut recommender = CommandRecommender::new();
        recommender.add_all(container.list_commands());

        let mut preconditions = PreconditionEvaluator::new();
        for provider in self.preconditions {
            let check = injector.invoke(&provider.dependencies, provider.provide)?;
            preconditions.add(provider.kind, check);
        }
        if let Some(manager) = &self.permissions {
            preconditions.add(PreconditionKind::AllOf, manager.produce_precondition());
        }

        for provider in self.conversations {
            conversations.register(injector.invoke(&provider.dependencies, provider.provide)?);
        }

        if !container.has("help") {
            recommender.add_all(["help".to_string()]);
            container = container.join([help_commands(self.config.clone(), recommender.clone())]);
        }

        info!(
            "🚀 Framework ready: {} commands, {} preconditions, {} conversations",
            container.len(),
            preconditions.len(),
            conversations.conversation_names().len()
        );

        Ok(Framework {
            dispatcher: Dispatcher::new(
                self.config,
                Arc::new(container),
                preconditions,
                recommender,
                events.clone(),
            ),
            conversations,
            events,
            injector,
        })
    }
}

fn validate_command_set(category: &str, container: &CommandsContainer) -> Result<(), StartupError> {
    for command in container.commands() {
        if command.name.is_empty() || command.name.chars().any(char::is_whitespace) {
            return Err(StartupError::InvalidCommandSet {
                category: category.to_string(),
                reason: format!("'{}' is not a valid command name", command.name),
            });
        }
    }
    Ok(())
}

/// What happened to an inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    /// Consumed as an answer to the author's open conversation
    Conversation,
    Dispatched(DispatchOutcome),
}

pub struct Framework {
    dispatcher: Dispatcher,
    conversations: Arc<ConversationService>,
    events: EventBus,
    injector: Injector,
}

impl Framework {
    pub fn builder(config: FrameworkConfig) -> FrameworkBuilder {
        FrameworkBuilder::new(config)
    }

    /// Route one inbound message: open conversations first, then dispatch
    pub async fn handle_message(&self, transport: Arc<dyn Transport>, message: InboundMessage) -> MessageOutcome {
        if self
            .conversations
            .handle_response(Arc::clone(&transport), &message)
            .await
        {
            return MessageOutcome::Conversation;
        }
        MessageOutcome::Dispatched(self.dispatcher.dispatch(transport, message).await)
    }

    /// Cancel conversations idle past the configured timeout
    pub fn evict_idle_conversations(&self) -> usize {
        let evicted = self
            .conversations
            .evict_idle(self.dispatcher.config().conversation_idle_timeout);
        if evicted > 0 {
            info!("🧹 Evicted {evicted} idle conversations");
        }
        evicted
    }

    pub fn container(&self) -> &Arc<CommandsContainer> {
        self.dispatcher.container()
    }

    pub fn config(&self) -> &FrameworkConfig {
        self.dispatcher.config()
    }

    pub fn conversations(&self) -> &Arc<ConversationService> {
        &self.conversations
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// A constructed service, element or data object
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.injector.get::<T>()
    }
}
