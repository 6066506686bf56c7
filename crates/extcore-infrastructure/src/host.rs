//! Console host.

use std::fmt;

use tracing::info;

use extcore_core::error::AppError;
use extcore_core::result::AppResult;

use crate::services::ServiceProvider;

type RunTask = Box<dyn FnOnce(&ServiceProvider) -> AppResult<()> + Send>;

/// A minimal host that runs named tasks in registration order.
///
/// Configure-host actions and configure actions add tasks; the host runs
/// them once services are final.
pub struct ConsoleHost {
    name: String,
    tasks: Vec<(String, RunTask)>,
}

impl ConsoleHost {
    /// Creates a host called `name` with no tasks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    /// Host name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a task.
    pub fn add_task<F>(&mut self, name: impl Into<String>, task: F) -> &mut Self
    where
        F: FnOnce(&ServiceProvider) -> AppResult<()> + Send + 'static,
    {
        self.tasks.push((name.into(), Box::new(task)));
        self
    }

    /// Names of the queued tasks, in run order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.tasks.iter().map(|(name, _)| name.as_str())
    }

    /// Runs every task in order, stopping at the first failure.
    ///
    /// Returns the number of tasks run.
    pub fn run(self, provider: &ServiceProvider) -> AppResult<usize> {
        let total = self.tasks.len();
        info!(host = %self.name, tasks = total, "Host starting");

        for (name, task) in self.tasks {
            info!(host = %self.name, task = %name, "Running task");
            task(provider).map_err(|e| {
                AppError::new(e.kind, format!("Task '{}' failed: {}", name, e.message))
            })?;
        }

        info!(host = %self.name, "Host finished");
        Ok(total)
    }
}

impl fmt::Debug for ConsoleHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleHost")
            .field("name", &self.name)
            .field("tasks", &self.task_names().collect::<Vec<_>>())
            .finish()
    }
}
