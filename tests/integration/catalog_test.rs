//! Integration tests for capability lookup and dispatch across modules.

use std::sync::{Arc, Mutex};

use extcore_data::Storage;
use extcore_events::{Event, EventHandler};
use extcore_infrastructure::prelude::*;

use crate::helpers::TestHost;

trait Ping: EventHandler<(Arc<Mutex<Vec<i32>>>,)> {}

struct Pinger(i32);

impl Prioritized for Pinger {
    fn priority(&self) -> i32 {
        self.0
    }
}

impl EventHandler<(Arc<Mutex<Vec<i32>>>,)> for Pinger {
    fn handle_event(&self, (seen,): &(Arc<Mutex<Vec<i32>>>,)) {
        seen.lock().unwrap().push(self.0);
    }
}

impl Ping for Pinger {}

fn pinger_module(name: &str, priorities: &[i32]) -> Module {
    priorities
        .iter()
        .fold(Module::builder(name), |builder, &priority| {
            builder.export(
                TypeExport::<Pinger>::new(format!("{}::Pinger{}", name, priority))
                    .implements::<dyn Ping>(|t| Box::new(t))
                    .constructor(move || Pinger(priority)),
            )
        })
        .build()
}

#[test]
fn test_broadcast_orders_handlers_across_modules() {
    let manager = ExtensionManager::with_modules([
        pinger_module("first", &[30]),
        pinger_module("second", &[10, 20]),
    ]);
    let seen = Arc::new(Mutex::new(Vec::new()));

    Event::<dyn Ping>::broadcast(&manager, &(Arc::clone(&seen),));

    assert_eq!(*seen.lock().unwrap(), [10, 20, 30]);
}

#[test]
fn test_cached_lookup_follows_module_replacement() {
    let host = TestHost::new(None);
    let options = ResolveOptions::new()
        .filter(ModuleFilter::name_contains("data"))
        .cached();

    let before = host.manager.find_implementations::<dyn Storage>(&options);
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].module(), "sample-data-memory");

    host.manager.set_modules(crate::helpers::linked_modules());

    let after = host.manager.find_implementations::<dyn Storage>(&options);
    assert!(after.is_empty());
    // Implementations resolved earlier stay usable.
    assert!(before[0].instantiate::<dyn Storage>().is_ok());
}

#[test]
fn test_lookup_before_discovery_is_empty() {
    let manager = ExtensionManager::new();

    assert!(manager
        .find_implementations::<dyn Storage>(&ResolveOptions::new())
        .is_empty());
    assert!(manager.modules().is_err());
}
