//! Service registry.
//!
//! [`ServiceCollection`] is the mutable registration list the configure
//! phases write to; [`ServiceProvider`] is an immutable snapshot of it used
//! to resolve services. Later registrations of a service type take
//! precedence over earlier ones.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::{Arc, OnceLock};

use extcore_core::error::AppError;
use extcore_core::result::AppResult;

use crate::resolver::Implementation;

/// Type-erased `Arc<T>`.
type AnyArc = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&ServiceProvider) -> AppResult<AnyArc> + Send + Sync>;

/// Lifetime of a factory-backed service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Created once, on first resolution, and shared afterwards.
    Singleton,
    /// Created on every resolution.
    Transient,
}

#[derive(Clone)]
enum Source {
    Instance(AnyArc),
    Factory {
        factory: Factory,
        lifetime: Lifetime,
        cell: Arc<OnceLock<AnyArc>>,
    },
}

#[derive(Clone)]
struct Registration {
    service: TypeId,
    service_name: &'static str,
    implementation: Option<String>,
    source: Source,
}

impl Registration {
    fn resolve(&self, provider: &ServiceProvider) -> AppResult<AnyArc> {
        match &self.source {
            Source::Instance(value) => Ok(Arc::clone(value)),
            Source::Factory {
                factory,
                lifetime: Lifetime::Transient,
                ..
            } => factory(provider),
            Source::Factory {
                factory,
                lifetime: Lifetime::Singleton,
                cell,
            } => {
                if let Some(value) = cell.get() {
                    return Ok(Arc::clone(value));
                }
                let created = factory(provider)?;
                Ok(Arc::clone(cell.get_or_init(|| created)))
            }
        }
    }
}

/// Description of one registration, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Service type name.
    pub service: &'static str,
    /// Implementation type name, when registered from a discovered type.
    pub implementation: Option<String>,
    /// `None` for pre-built instances.
    pub lifetime: Option<Lifetime>,
}

/// Mutable, ordered list of service registrations.
#[derive(Clone, Default)]
pub struct ServiceCollection {
    registrations: Vec<Registration>,
}

impl ServiceCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a shared instance of `T`.
    pub fn add_singleton<T>(&mut self, instance: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.push::<T>(None, Source::Instance(Arc::new(instance)))
    }

    /// Registers a factory creating `T` once, on first resolution.
    pub fn add_singleton_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> AppResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(Lifetime::Singleton, None, factory)
    }

    /// Registers a factory creating `T` on every resolution.
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> AppResult<Arc<T>> + Send + Sync + 'static,
    {
        self.add_factory::<T, F>(Lifetime::Transient, None, factory)
    }

    /// Registers a discovered implementation as service `C`.
    ///
    /// The implementation is instantiated through its parameterless
    /// constructor whenever the lifetime calls for a new instance.
    pub fn add_implementation<C>(
        &mut self,
        implementation: Implementation,
        lifetime: Lifetime,
    ) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let type_name = implementation.type_name().to_string();
        self.add_factory::<C, _>(lifetime, Some(type_name), move |_| {
            // The implementation is captured, so its module stays loaded for
            // as long as the registration exists.
            let instance = implementation.instantiate::<C>()?;
            Ok(Arc::from(instance.into_box()))
        })
    }

    /// Whether any registration for `T` exists.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registrations
            .iter()
            .any(|r| r.service == TypeId::of::<T>())
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registrations in order.
    pub fn registrations(&self) -> Vec<ServiceInfo> {
        self.registrations.iter().map(info_of).collect()
    }

    /// Snapshot of the current registrations.
    pub fn build_provider(&self) -> ServiceProvider {
        ServiceProvider {
            registrations: self.registrations.clone().into(),
        }
    }

    fn add_factory<T, F>(
        &mut self,
        lifetime: Lifetime,
        implementation: Option<String>,
        factory: F,
    ) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> AppResult<Arc<T>> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |provider: &ServiceProvider| {
            factory(provider).map(|value| Arc::new(value) as AnyArc)
        });
        self.push::<T>(
            implementation,
            Source::Factory {
                factory,
                lifetime,
                cell: Arc::new(OnceLock::new()),
            },
        )
    }

    fn push<T: ?Sized + 'static>(
        &mut self,
        implementation: Option<String>,
        source: Source,
    ) -> &mut Self {
        self.registrations.push(Registration {
            service: TypeId::of::<T>(),
            service_name: type_name::<T>(),
            implementation,
            source,
        });
        self
    }
}

impl fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCollection")
            .field("registrations", &self.registrations())
            .finish()
    }
}

/// Read-only snapshot of a [`ServiceCollection`].
#[derive(Clone, Default)]
pub struct ServiceProvider {
    registrations: Arc<[Registration]>,
}

impl ServiceProvider {
    /// The most recent registration of `T`, resolved.
    pub fn get<T>(&self) -> AppResult<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registrations_of::<T>()
            .next_back()
            .map(|registration| self.resolve_as::<T>(registration))
            .transpose()
    }

    /// Like [`get`](Self::get), failing with `NotFound` when `T` is not
    /// registered.
    pub fn require<T>(&self) -> AppResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>()?.ok_or_else(|| {
            AppError::not_found(format!("Service '{}' is not registered", type_name::<T>()))
        })
    }

    /// Every registration of `T`, resolved in registration order.
    pub fn get_all<T>(&self) -> AppResult<Vec<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registrations_of::<T>()
            .map(|registration| self.resolve_as::<T>(registration))
            .collect()
    }

    /// Whether `T` is registered.
    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.registrations_of::<T>().next().is_some()
    }

    /// Number of registrations in the snapshot.
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Registrations in order.
    pub fn registrations(&self) -> Vec<ServiceInfo> {
        self.registrations.iter().map(info_of).collect()
    }

    fn registrations_of<T: ?Sized + 'static>(
        &self,
    ) -> impl DoubleEndedIterator<Item = &Registration> + '_ {
        let service = TypeId::of::<T>();
        self.registrations
            .iter()
            .filter(move |registration| registration.service == service)
    }

    fn resolve_as<T>(&self, registration: &Registration) -> AppResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let value = registration.resolve(self)?;
        value.downcast_ref::<Arc<T>>().cloned().ok_or_else(|| {
            AppError::internal(format!(
                "Registration of '{}' produced a value of another type",
                registration.service_name
            ))
        })
    }
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registrations", &self.registrations.len())
            .finish()
    }
}

fn info_of(registration: &Registration) -> ServiceInfo {
    ServiceInfo {
        service: registration.service_name,
        implementation: registration.implementation.clone(),
        lifetime: match &registration.source {
            Source::Instance(_) => None,
            Source::Factory { lifetime, .. } => Some(*lifetime),
        },
    }
}
