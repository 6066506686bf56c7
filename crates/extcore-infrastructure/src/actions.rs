//! Lifecycle action capabilities.
//!
//! Each host lifecycle phase dispatches one of these capabilities exactly
//! once, in priority order. See [`crate::bootstrap`] for the phase entry
//! points.

use extcore_core::result::AppResult;

use crate::dispatch::Prioritized;
use crate::services::{ServiceCollection, ServiceProvider};

/// Registers services during the configure-services phase.
///
/// `provider` is a snapshot of everything registered before this action
/// ran, including registrations made by lower-priority actions.
pub trait ConfigureServicesAction: Prioritized {
    /// Runs the action.
    fn execute(
        &self,
        services: &mut ServiceCollection,
        provider: &ServiceProvider,
    ) -> AppResult<()>;
}

/// Configures the application pipeline `App` once services are final.
pub trait ConfigureAction<App: 'static>: Prioritized {
    /// Runs the action.
    fn execute(&self, app: &mut App, provider: &ServiceProvider) -> AppResult<()>;
}

/// Configures the host `Host` before services are finalized.
pub trait ConfigureHostAction<Host: 'static>: Prioritized {
    /// Runs the action.
    fn execute(&self, host: &mut Host, services: &mut ServiceCollection) -> AppResult<()>;
}
