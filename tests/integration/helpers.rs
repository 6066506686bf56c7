//! Shared sample extensions for integration tests.

use std::any::{Any, TypeId};
use std::sync::{Arc, Mutex};

use extcore_core::config::AppConfig;
use extcore_core::error::AppError;
use extcore_data::{CONNECTION_STRING_PROPERTY, Repository, Storage};
use extcore_events::{Event, EventHandler};
use extcore_infrastructure::prelude::*;

/// Ordered record of what the sample extensions did.
pub type Journal = Arc<Mutex<Vec<String>>>;

/// Snapshot of `journal`.
pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

/// Modules of the extension crates linked into the test binary.
pub fn linked_modules() -> Vec<Module> {
    vec![extcore_events::register(), extcore_data::register()]
}

/// Notes repository served by [`MemoryStorage`].
#[derive(Default)]
pub struct Notes(Mutex<Vec<String>>);

impl Notes {
    pub fn add(&self, note: &str) {
        self.0.lock().unwrap().push(note.to_string());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Repository for Notes {}

pub struct MemoryStorage {
    connection: Option<String>,
    notes: Arc<Notes>,
    journal: Journal,
}

impl Storage for MemoryStorage {
    fn repository_of(&self, repository: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        (repository == TypeId::of::<Notes>())
            .then(|| Arc::clone(&self.notes) as Arc<dyn Any + Send + Sync>)
    }

    fn save(&self) -> AppResult<()> {
        record(
            &self.journal,
            format!("save:{}", self.connection.as_deref().unwrap_or("-")),
        );
        Ok(())
    }
}

/// Service registered by the host action.
pub struct Greeting(pub &'static str);

/// Raised by the `save` task once it finished.
pub trait TaskCompleted: EventHandler<(String,)> {}

pub struct AuditHandler {
    journal: Journal,
}

impl Prioritized for AuditHandler {
    fn priority(&self) -> i32 {
        0
    }
}

impl EventHandler<(String,)> for AuditHandler {
    fn handle_event(&self, (task,): &(String,)) {
        record(&self.journal, format!("audit:{}", task));
    }
}

impl TaskCompleted for AuditHandler {}

/// Registers [`Greeting`] and queues the `greet` task.
pub struct QueueGreeting {
    journal: Journal,
}

impl Prioritized for QueueGreeting {
    fn priority(&self) -> i32 {
        10
    }
}

impl ConfigureHostAction<ConsoleHost> for QueueGreeting {
    fn execute(&self, host: &mut ConsoleHost, services: &mut ServiceCollection) -> AppResult<()> {
        services.add_singleton(Arc::new(Greeting("hello")));

        let journal = Arc::clone(&self.journal);
        host.add_task("greet", move |provider| {
            let greeting = provider.require::<Greeting>()?;
            record(&journal, format!("greet:{}", greeting.0));
            Ok(())
        });
        Ok(())
    }
}

/// Queues the `save` task writing a note through the registered storage.
pub struct QueueSave {
    journal: Journal,
}

impl Prioritized for QueueSave {
    fn priority(&self) -> i32 {
        20
    }
}

impl ConfigureAction<ConsoleHost> for QueueSave {
    fn execute(&self, host: &mut ConsoleHost, _: &ServiceProvider) -> AppResult<()> {
        let journal = Arc::clone(&self.journal);
        host.add_task("save", move |provider| {
            let storage = provider.require::<dyn Storage>()?;
            storage.repository::<Notes>()?.add("note");
            storage.save()?;

            let manager = provider.require::<ExtensionManager>()?;
            let invoked = Event::<dyn TaskCompleted>::broadcast(&manager, &("save".to_string(),));
            record(&journal, format!("handlers:{}", invoked.len()));
            Ok(())
        });
        Ok(())
    }
}

/// An action that always fails.
pub struct Broken;

impl Prioritized for Broken {
    fn priority(&self) -> i32 {
        0
    }
}

impl ConfigureAction<ConsoleHost> for Broken {
    fn execute(&self, _: &mut ConsoleHost, _: &ServiceProvider) -> AppResult<()> {
        Err(AppError::internal("pipeline refused"))
    }
}

impl ConfigureHostAction<ConsoleHost> for Broken {
    fn execute(&self, _: &mut ConsoleHost, _: &mut ServiceCollection) -> AppResult<()> {
        Err(AppError::internal("host refused"))
    }
}

/// Module exporting a [`Broken`] pipeline action.
pub fn broken_pipeline_module() -> Module {
    Module::builder("broken-pipeline")
        .export(
            TypeExport::<Broken>::new("broken::Pipeline")
                .implements::<dyn ConfigureAction<ConsoleHost>>(|t| Box::new(t))
                .constructor(|| Broken),
        )
        .build()
}

/// Module exporting a [`Broken`] host action.
pub fn broken_host_module() -> Module {
    Module::builder("broken-host")
        .export(
            TypeExport::<Broken>::new("broken::Host")
                .implements::<dyn ConfigureHostAction<ConsoleHost>>(|t| Box::new(t))
                .constructor(|| Broken),
        )
        .build()
}

/// A host wired with the linked extension crates and one sample module.
pub struct TestHost {
    pub manager: Arc<ExtensionManager>,
    pub journal: Journal,
    pub notes: Arc<Notes>,
    pub config: AppConfig,
}

impl TestHost {
    /// Sample module named `sample-data-memory`, so the storage action
    /// picks up its backend.
    pub fn new(connection_string: Option<&str>) -> Self {
        Self::with_sample("sample-data-memory", connection_string, Vec::new())
    }

    pub fn with_sample(
        sample_name: &str,
        connection_string: Option<&str>,
        extra: Vec<Module>,
    ) -> Self {
        let journal = Journal::default();
        let notes = Arc::new(Notes::default());

        let mut config = AppConfig::default();
        config.data.default_connection.connection_string = connection_string.map(str::to_string);

        let modules = linked_modules()
            .into_iter()
            .chain(std::iter::once(sample_module(sample_name, &journal, &notes)))
            .chain(extra);

        Self {
            manager: Arc::new(ExtensionManager::with_modules(modules)),
            journal,
            notes,
            config,
        }
    }

    /// Runs every lifecycle phase, then the host.
    ///
    /// Returns the number of tasks run.
    pub fn run(&self) -> AppResult<usize> {
        let mut host = ConsoleHost::new("test-host");
        let mut services = ServiceCollection::new();
        services.add_singleton::<AppConfig>(Arc::new(self.config.clone()));

        extcore_infrastructure::use_extcore_host(&self.manager, &mut host, &mut services)?;
        let provider = extcore_infrastructure::add_extcore(&mut services, Arc::clone(&self.manager))?;
        extcore_infrastructure::use_extcore(&self.manager, &mut host, &provider)?;

        host.run(&provider)
    }

    pub fn entries(&self) -> Vec<String> {
        entries(&self.journal)
    }
}

fn sample_module(name: &str, journal: &Journal, notes: &Arc<Notes>) -> Module {
    let connection = Arc::new(Mutex::new(None::<String>));

    let storage = {
        let (connection, journal, notes) =
            (Arc::clone(&connection), Arc::clone(journal), Arc::clone(notes));
        TypeExport::<MemoryStorage>::new("sample::MemoryStorage")
            .implements::<dyn Storage>(|t| Box::new(t))
            .constructor(move || MemoryStorage {
                connection: connection.lock().unwrap().clone(),
                notes: Arc::clone(&notes),
                journal: Arc::clone(&journal),
            })
    };
    let storage = storage.property(CONNECTION_STRING_PROPERTY, move |value| {
        *connection.lock().unwrap() = Some(value.to_string());
    });

    let (greet_journal, save_journal, audit_journal) =
        (Arc::clone(journal), Arc::clone(journal), Arc::clone(journal));

    Module::builder(name)
        .export(storage)
        .export(
            TypeExport::<QueueGreeting>::new("sample::QueueGreeting")
                .implements::<dyn ConfigureHostAction<ConsoleHost>>(|t| Box::new(t))
                .constructor(move || QueueGreeting {
                    journal: Arc::clone(&greet_journal),
                }),
        )
        .export(
            TypeExport::<QueueSave>::new("sample::QueueSave")
                .implements::<dyn ConfigureAction<ConsoleHost>>(|t| Box::new(t))
                .constructor(move || QueueSave {
                    journal: Arc::clone(&save_journal),
                }),
        )
        .export(
            TypeExport::<AuditHandler>::new("sample::AuditHandler")
                .implements::<dyn TaskCompleted>(|t| Box::new(t))
                .constructor(move || AuditHandler {
                    journal: Arc::clone(&audit_journal),
                }),
        )
        .build()
}
