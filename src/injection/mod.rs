//! # Dependency Injection
//!
//! Type-keyed container that builds services from their declared
//! dependencies. Registration is explicit: each provider lists the types it
//! needs, and resolution constructs them depth-first, once, rejecting cycles.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Persisted data objects with generate-and-halt bootstrap
//! - 1.0.0: Initial service container

pub mod data;
pub mod error;

use log::debug;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use data::{save_data, Data, DataStore, JsonFileStore};
pub use error::InjectionError;

type Instance = Arc<dyn Any + Send + Sync>;
type Constructor = Arc<dyn Fn(&Dependencies) -> Result<Instance, InjectionError> + Send + Sync>;

/// A requested type, identified at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    id: TypeId,
    name: &'static str,
}

impl Dependency {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Resolved instances handed to a constructor or provider
#[derive(Default)]
pub struct Dependencies {
    resolved: HashMap<TypeId, Instance>,
}

impl Dependencies {
    /// Fetch a declared dependency
    pub fn get<T: Any + Send + Sync>(&self) -> Result<Arc<T>, InjectionError> {
        let instance = self
            .resolved
            .get(&TypeId::of::<T>())
            .cloned()
            .ok_or_else(|| InjectionError::Unresolved {
                type_name: type_name::<T>().to_string(),
                required_by: "an undeclared dependency lookup".to_string(),
            })?;
        downcast(instance)
    }
}

/// A type the container can construct from other registered types
pub trait Service: Any + Send + Sync + Sized {
    fn dependencies() -> Vec<Dependency> {
        Vec::new()
    }

    fn construct(deps: &Dependencies) -> anyhow::Result<Self>;
}

#[derive(Clone)]
struct Provider {
    dependencies: Vec<Dependency>,
    construct: Constructor,
}

pub struct Injector {
    instances: HashMap<TypeId, Instance>,
    providers: HashMap<TypeId, Provider>,
    registration_order: Vec<Dependency>,
    construction_order: Vec<&'static str>,
    store: Arc<dyn DataStore>,
    generated: Vec<String>,
}

impl Injector {
    pub fn new(store: impl DataStore + 'static) -> Self {
        Self::with_store(Arc::new(store))
    }

    pub fn with_store(store: Arc<dyn DataStore>) -> Self {
        Self {
            instances: HashMap::new(),
            providers: HashMap::new(),
            registration_order: Vec::new(),
            construction_order: Vec::new(),
            store,
            generated: Vec::new(),
        }
    }

    pub fn store(&self) -> Arc<dyn DataStore> {
        Arc::clone(&self.store)
    }

    /// Register a pre-built instance
    pub fn add_element<T: Any + Send + Sync>(&mut self, value: T) -> Arc<T> {
        let shared = Arc::new(value);
        self.add_shared(Arc::clone(&shared));
        shared
    }

    pub fn add_shared<T: Any + Send + Sync>(&mut self, value: Arc<T>) {
        debug!("Registered instance of {}", type_name::<T>());
        self.instances.insert(TypeId::of::<T>(), value);
    }

    pub fn register_service<T: Service>(&mut self) {
        self.register_provider::<T, _>(T::dependencies(), |deps| T::construct(deps));
    }

    /// Register a constructor closure for `T` with explicit dependencies
    pub fn register_provider<T, F>(&mut self, dependencies: Vec<Dependency>, construct: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Dependencies) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        let provider = Provider {
            dependencies,
            construct: Arc::new(move |deps| {
                construct(deps)
                    .map(|value| Arc::new(value) as Instance)
                    .map_err(|source| InjectionError::Construction {
                        type_name: type_name::<T>().to_string(),
                        source,
                    })
            }),
        };
        let dependency = Dependency::of::<T>();
        if self.providers.insert(dependency.id, provider).is_none() {
            self.registration_order.push(dependency);
        }
    }

    /// Load a data object from the store, generating its default when missing
    pub fn register_data<T: Data>(&mut self) -> Result<Arc<T>, InjectionError> {
        let loaded = data::load_or_generate::<T>(self.store.as_ref())?;
        if loaded.generated && T::KILL_IF_GENERATED {
            self.generated.push(T::PATH.to_string());
        }
        Ok(self.add_element(loaded.value))
    }

    /// Paths of data files created during this startup that must be filled in
    pub fn generated_data(&self) -> &[String] {
        &self.generated
    }

    /// Already-available instance, without constructing anything
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.instances
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|instance| downcast(instance).ok())
    }

    pub fn contains<T: Any>(&self) -> bool {
        let id = TypeId::of::<T>();
        self.instances.contains_key(&id) || self.providers.contains_key(&id)
    }

    pub fn resolve<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>, InjectionError> {
        let instance = self.resolve_dependency(Dependency::of::<T>(), &mut Vec::new())?;
        downcast(instance)
    }

    /// Resolve `dependencies` and run `f` against them
    pub fn invoke<R>(
        &mut self,
        dependencies: &[Dependency],
        f: impl FnOnce(&Dependencies) -> anyhow::Result<R>,
    ) -> Result<R, InjectionError> {
        let resolved = self.resolve_all(dependencies, &mut Vec::new())?;
        f(&resolved).map_err(|source| InjectionError::Construction {
            type_name: type_name::<R>().to_string(),
            source,
        })
    }

    /// Construct every registered provider, returning the construction order
    pub fn build_all(&mut self) -> Result<Vec<&'static str>, InjectionError> {
        for dependency in self.registration_order.clone() {
            self.resolve_dependency(dependency, &mut Vec::new())?;
        }
        Ok(self.construction_order.clone())
    }

    fn resolve_all(
        &mut self,
        dependencies: &[Dependency],
        in_progress: &mut Vec<Dependency>,
    ) -> Result<Dependencies, InjectionError> {
        let mut resolved = Dependencies::default();
        for dependency in dependencies {
            let instance = self.resolve_dependency(*dependency, in_progress)?;
            resolved.resolved.insert(dependency.id, instance);
        }
        Ok(resolved)
    }

    fn resolve_dependency(
        &mut self,
        dependency: Dependency,
        in_progress: &mut Vec<Dependency>,
    ) -> Result<Instance, InjectionError> {
        if let Some(instance) = self.instances.get(&dependency.id) {
            return Ok(Arc::clone(instance));
        }

        if let Some(start) = in_progress.iter().position(|d| d.id == dependency.id) {
            let chain = in_progress[start..]
                .iter()
                .chain(std::iter::once(&dependency))
                .map(|d| d.name)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(InjectionError::Cycle { chain });
        }

        let provider = self
            .providers
            .get(&dependency.id)
            .cloned()
            .ok_or_else(|| InjectionError::Unresolved {
                type_name: dependency.name.to_string(),
                required_by: in_progress
                    .last()
                    .map_or("startup", |d| d.name)
                    .to_string(),
            })?;

        in_progress.push(dependency);
        let resolved = self.resolve_all(&provider.dependencies, in_progress);
        in_progress.pop();

        let instance = (provider.construct)(&resolved?)?;
        debug!("Constructed {}", dependency.name);
        self.instances.insert(dependency.id, Arc::clone(&instance));
        self.construction_order.push(dependency.name);
        Ok(instance)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("instances", &self.instances.len())
            .field("providers", &self.providers.len())
            .field("generated", &self.generated)
            .finish_non_exhaustive()
    }
}

fn downcast<T: Any + Send + Sync>(instance: Instance) -> Result<Arc<T>, InjectionError> {
    instance
        .downcast::<T>()
        .map_err(|_| InjectionError::TypeMismatch {
            expected: type_name::<T>().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::fs;

    struct Settings {
        greeting: String,
    }

    #[derive(Debug)]
    struct A;

    #[derive(Debug)]
    struct B {
        a: Arc<A>,
    }

    struct C {
        a: Arc<A>,
        b: Arc<B>,
    }

    impl Service for A {
        fn construct(_: &Dependencies) -> anyhow::Result<Self> {
            Ok(A)
        }
    }

    impl Service for B {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<A>()]
        }

        fn construct(deps: &Dependencies) -> anyhow::Result<Self> {
            Ok(B { a: deps.get()? })
        }
    }

    impl Service for C {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<A>(), Dependency::of::<B>()]
        }

        fn construct(deps: &Dependencies) -> anyhow::Result<Self> {
            Ok(C {
                a: deps.get()?,
                b: deps.get()?,
            })
        }
    }

    #[derive(Debug)]
    struct Left;
    #[derive(Debug)]
    struct Right;

    impl Service for Left {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<Right>()]
        }

        fn construct(_: &Dependencies) -> anyhow::Result<Self> {
            Ok(Left)
        }
    }

    impl Service for Right {
        fn dependencies() -> Vec<Dependency> {
            vec![Dependency::of::<Left>()]
        }

        fn construct(_: &Dependencies) -> anyhow::Result<Self> {
            Ok(Right)
        }
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct BotData {
        owner: u64,
        motd: String,
    }

    impl Default for BotData {
        fn default() -> Self {
            Self {
                owner: 0,
                motd: "Welcome".to_string(),
            }
        }
    }

    impl Data for BotData {
        const PATH: &'static str = "config/bot.json";
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Counters {
        hits: u64,
    }

    impl Data for Counters {
        const PATH: &'static str = "counters.json";
        const KILL_IF_GENERATED: bool = false;
    }

    fn injector(dir: &tempfile::TempDir) -> Injector {
        Injector::new(JsonFileStore::new(dir.path()))
    }

    #[test]
    fn test_dependencies_are_built_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut injector = injector(&dir);
        injector.register_service::<C>();
        injector.register_service::<B>();
        injector.register_service::<A>();

        let order = injector.build_all().unwrap();
        let position = |name: &str| order.iter().position(|n| *n == name).unwrap();
        assert!(position(type_name::<A>()) < position(type_name::<B>()));
        assert!(position(type_name::<B>()) < position(type_name::<C>()));

        let c = injector.resolve::<C>().unwrap();
        assert!(Arc::ptr_eq(&c.a, &c.b.a));
        assert!(Arc::ptr_eq(&c.b, &injector.resolve::<B>().unwrap()));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut injector = injector(&dir);
        injector.register_service::<Left>();
        injector.register_service::<Right>();

        match injector.resolve::<Left>() {
            Err(InjectionError::Cycle { chain }) => {
                assert!(chain.starts_with(type_name::<Left>()));
                assert!(chain.ends_with(type_name::<Left>()));
                assert!(chain.contains(type_name::<Right>()));
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_dependency_is_unresolved() {
        let dir = tempfile::tempdir().unwrap();
        let mut injector = injector(&dir);
        injector.register_service::<B>();

        match injector.resolve::<B>() {
            Err(InjectionError::Unresolved { type_name: missing, required_by }) => {
                assert_eq!(missing, type_name::<A>());
                assert_eq!(required_by, type_name::<B>());
            }
            other => panic!("expected unresolved, got {other:?}"),
        }
    }

    #[test]
    fn test_elements_satisfy_providers() {
        let dir = tempfile::tempdir().unwrap();
        let mut injector = injector(&dir);
        injector.add_element(Settings {
            greeting: "hi".to_string(),
        });

        let greeting = injector
            .invoke(&[Dependency::of::<Settings>()], |deps| {
                Ok(deps.get::<Settings>()?.greeting.clone())
            })
            .unwrap();
        assert_eq!(greeting, "hi");
    }

    #[test]
    fn test_undeclared_lookup_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut injector = injector(&dir);
        injector.add_element(A);

        let result = injector.invoke(&[], |deps| Ok(deps.get::<A>()?));
        assert!(matches!(result, Err(InjectionError::Construction { .. })));
    }

    #[test]
    fn test_construction_errors_name_the_type() {
        struct Broken;
        impl Service for Broken {
            fn construct(_: &Dependencies) -> anyhow::Result<Self> {
                anyhow::bail!("no token")
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let mut injector = injector(&dir);
        injector.register_service::<Broken>();

        let err = injector.build_all().unwrap_err();
        assert!(err.to_string().contains("Broken"));
    }

    #[test]
    fn test_missing_data_is_generated_and_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut injector = injector(&dir);

        let data = injector.register_data::<BotData>().unwrap();
        assert_eq!(*data, BotData::default());
        assert_eq!(injector.generated_data(), &["config/bot.json".to_string()]);

        let written = fs::read_to_string(dir.path().join("config/bot.json")).unwrap();
        assert!(written.contains("\n  \"motd\": \"Welcome\""));

        injector.register_data::<Counters>().unwrap();
        assert_eq!(injector.generated_data().len(), 1);
        assert!(dir.path().join("counters.json").exists());
    }

    #[test]
    fn test_existing_data_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        fs::write(
            dir.path().join("config/bot.json"),
            r#"{ "owner": 42, "motd": "Hello" }"#,
        )
        .unwrap();

        let mut injector = injector(&dir);
        let data = injector.register_data::<BotData>().unwrap();
        assert_eq!(data.owner, 42);
        assert!(injector.generated_data().is_empty());
        assert_eq!(injector.resolve::<BotData>().unwrap().motd, "Hello");
    }

    #[test]
    fn test_malformed_data_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("counters.json"), "{ not json").unwrap();

        let mut injector = injector(&dir);
        let err = injector.register_data::<Counters>().unwrap_err();
        assert!(matches!(err, InjectionError::MalformedData { ref path, .. } if path == "counters.json"));
    }

    #[test]
    fn test_save_data_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        save_data(&store, &Counters { hits: 3 }).unwrap();

        let mut injector = Injector::new(store);
        assert_eq!(injector.register_data::<Counters>().unwrap().hits, 3);
    }
}
