//! Prioritized dispatch.
//!
//! A handler capability is any trait extending [`Prioritized`]. Broadcasting
//! to it resolves every concrete implementation, orders the instances by
//! ascending priority and invokes them one after another on the calling
//! thread. Instances with equal priority keep their discovery order (module
//! registration order, then type declaration order).
//!
//! The invocation itself is a closure, so a single mechanism serves every
//! handler shape: lifecycle actions taking mutable registries as well as the
//! zero to three argument events in `extcore-events`.

use tracing::{debug, info};

use extcore_core::result::AppResult;

use crate::factory::{Instance, InstantiationPolicy};
use crate::manager::ExtensionManager;
use crate::resolver::ResolveOptions;

/// A handler with an execution priority. Lower values run first.
pub trait Prioritized {
    /// Execution priority.
    fn priority(&self) -> i32;
}

/// Sorts `handlers` by ascending priority, keeping the relative order of
/// equal priorities.
pub fn sort_by_priority<H: ?Sized + Prioritized>(handlers: &mut [Instance<H>]) {
    handlers.sort_by_key(|handler| handler.priority());
}

impl ExtensionManager {
    /// Broadcasts to every handler implementing `H`.
    ///
    /// `invoke` is called once per handler in priority order. Under
    /// [`InstantiationPolicy::Strict`] the first construction or invocation
    /// failure aborts the broadcast; under [`InstantiationPolicy::Lenient`]
    /// failures are logged and the remaining handlers still run.
    ///
    /// Returns every invoked handler in invocation order, including handlers
    /// whose invocation failed under the lenient policy.
    pub fn broadcast_with<H, F>(
        &self,
        options: &ResolveOptions,
        policy: InstantiationPolicy,
        mut invoke: F,
    ) -> AppResult<Vec<Instance<H>>>
    where
        H: ?Sized + Prioritized + 'static,
        F: FnMut(&H) -> AppResult<()>,
    {
        let mut handlers = self.create_instances::<H>(options, policy)?;
        sort_by_priority(&mut handlers);

        debug!(
            capability = %std::any::type_name::<H>(),
            handlers = handlers.len(),
            policy = ?policy,
            "Broadcasting"
        );

        let mut invoked = Vec::with_capacity(handlers.len());
        for handler in handlers {
            info!(
                module = %handler.module(),
                handler = %handler.type_name(),
                priority = handler.priority(),
                "Executing handler"
            );

            if let Err(e) = invoke(&*handler) {
                policy.recover(handler.implementation(), e, "invoke")?;
            }
            invoked.push(handler);
        }

        Ok(invoked)
    }
}
