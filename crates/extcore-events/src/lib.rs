//! # extcore-events
//!
//! Application events for ExtCore extensions.
//!
//! An event is a handler capability: a trait extending
//! [`EventHandler<Args>`], where `Args` is a tuple of zero to three
//! arguments. Extensions export handler types; [`Event::broadcast`]
//! instantiates every exported handler and invokes them in priority order.
//!
//! ```rust,ignore
//! pub trait UserCreated: EventHandler<(User,)> {}
//!
//! Event::<dyn UserCreated>::broadcast(&manager, &(user,));
//! ```
//!
//! Handlers cannot fail or stop the broadcast. A handler type that fails to
//! instantiate is logged and skipped.

use std::marker::PhantomData;

use tracing::{debug, warn};

use extcore_infrastructure::prelude::*;

mod sealed {
    pub trait Sealed {}

    impl Sealed for () {}
    impl<A> Sealed for (A,) {}
    impl<A, B> Sealed for (A, B) {}
    impl<A, B, C> Sealed for (A, B, C) {}
}

/// Argument tuples an event may carry: `()`, `(A,)`, `(A, B)` or
/// `(A, B, C)`.
pub trait EventArgs: sealed::Sealed {
    /// Number of arguments.
    const ARITY: usize;
}

impl EventArgs for () {
    const ARITY: usize = 0;
}

impl<A> EventArgs for (A,) {
    const ARITY: usize = 1;
}

impl<A, B> EventArgs for (A, B) {
    const ARITY: usize = 2;
}

impl<A, B, C> EventArgs for (A, B, C) {
    const ARITY: usize = 3;
}

/// A handler of events carrying `Args`.
pub trait EventHandler<Args: EventArgs = ()>: Prioritized {
    /// Handles one event.
    fn handle_event(&self, args: &Args);
}

/// Broadcasts events to handler capability `H`.
pub struct Event<H: ?Sized>(PhantomData<fn(&H)>);

impl<H: ?Sized + 'static> Event<H> {
    /// Invokes every exported `H` with `args`, in priority order.
    ///
    /// Returns the invoked handlers in invocation order.
    pub fn broadcast<Args>(manager: &ExtensionManager, args: &Args) -> Vec<Instance<H>>
    where
        Args: EventArgs,
        H: EventHandler<Args>,
    {
        Self::broadcast_with(manager, &ResolveOptions::new(), args)
    }

    /// Like [`broadcast`](Self::broadcast), restricted by `options`.
    pub fn broadcast_with<Args>(
        manager: &ExtensionManager,
        options: &ResolveOptions,
        args: &Args,
    ) -> Vec<Instance<H>>
    where
        Args: EventArgs,
        H: EventHandler<Args>,
    {
        debug!(
            event = %std::any::type_name::<H>(),
            arity = Args::ARITY,
            "Broadcasting event"
        );

        let result = manager.broadcast_with::<H, _>(
            options,
            InstantiationPolicy::Lenient,
            |handler| {
                handler.handle_event(args);
                Ok(())
            },
        );

        match result {
            Ok(invoked) => invoked,
            Err(e) => {
                warn!(
                    event = %std::any::type_name::<H>(),
                    error = %e,
                    "Event broadcast failed"
                );
                Vec::new()
            }
        }
    }
}

/// Descriptor of this crate's module.
pub struct EventsExtension;

impl Extension for EventsExtension {
    fn name(&self) -> &str {
        "ExtCore.Events"
    }

    fn description(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_DESCRIPTION"))
    }

    fn url(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_HOMEPAGE"))
    }

    fn version(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_VERSION"))
    }

    fn authors(&self) -> Option<&str> {
        Some(env!("CARGO_PKG_AUTHORS"))
    }
}

/// Builds this crate's module.
pub fn register() -> Module {
    Module::builder(env!("CARGO_PKG_NAME"))
        .descriptor("extcore_events::EventsExtension", || EventsExtension)
        .build()
}

link_module!(env!("CARGO_PKG_NAME"), register);
