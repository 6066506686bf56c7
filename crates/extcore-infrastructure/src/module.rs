//! Module registration.
//!
//! A module is the unit the host discovers: a plugin library or a crate
//! linked into the host. Instead of being scanned by reflection, each module
//! hands the host a [`Module`] built with [`ModuleBuilder`], listing every
//! exported type together with the capabilities it implements and the
//! constructors that produce it.
//!
//! ```rust,ignore
//! let module = Module::builder("extension-a")
//!     .descriptor("extension_a::Extension", || ExtensionA)
//!     .export(
//!         TypeExport::<AddGreeter>::new("extension_a::AddGreeter")
//!             .implements::<dyn ConfigureServicesAction>(|t| Box::new(t))
//!             .constructor(AddGreeter::default),
//!     )
//!     .build();
//! ```

use std::any::{Any, TypeId, type_name};
use std::convert::Infallible;
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use extcore_core::error::AppError;
use extcore_core::result::AppResult;

use crate::capability::CapabilityId;
use crate::extension::Extension;

type Constructor = Arc<dyn Fn(&dyn Any) -> Result<Box<dyn Any>, String> + Send + Sync>;
type Caster = Arc<dyn Fn(Box<dyn Any>) -> Option<Box<dyn Any>> + Send + Sync>;
type PropertySetter = Arc<dyn Fn(&str) + Send + Sync>;

/// Keeps the code backing a module's factories mapped in memory.
pub(crate) type Anchor = Arc<dyn Any + Send + Sync>;

/// A constructor keyed by the type of its argument tuple.
struct ConstructorEntry {
    args: TypeId,
    args_name: &'static str,
    construct: Constructor,
}

/// A capability implemented by an exported type.
///
/// Abstract types carry no caster: they can be found but never instantiated.
struct CapabilityEntry {
    id: CapabilityId,
    cast: Option<Caster>,
}

/// A type exported by a module.
pub struct ExportedType {
    name: String,
    is_abstract: bool,
    capabilities: Vec<CapabilityEntry>,
    constructors: Vec<ConstructorEntry>,
    properties: Vec<(String, PropertySetter)>,
}

impl ExportedType {
    /// Fully-qualified name of the type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the type is abstract (never instantiated).
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Whether the type implements `capability`.
    pub fn implements(&self, capability: CapabilityId) -> bool {
        self.capabilities.iter().any(|c| c.id == capability)
    }

    /// Capabilities implemented by the type, in declaration order.
    pub fn capabilities(&self) -> impl Iterator<Item = CapabilityId> + '_ {
        self.capabilities.iter().map(|c| c.id)
    }

    /// Whether a constructor accepting `A` is registered.
    pub fn accepts<A: 'static>(&self) -> bool {
        self.constructors.iter().any(|c| c.args == TypeId::of::<A>())
    }

    /// Argument signatures of the registered constructors.
    pub fn constructor_signatures(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.iter().map(|c| c.args_name)
    }

    /// Names of the settable properties.
    pub fn property_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    /// Assigns `value` to the property called `name`.
    ///
    /// Returns `false` if the type declares no such property.
    pub fn set_property(&self, name: &str, value: &str) -> bool {
        match self.properties.iter().find(|(n, _)| n == name) {
            Some((_, setter)) => {
                setter(value);
                true
            }
            None => false,
        }
    }

    /// Constructs the type with the constructor accepting `A` and returns it
    /// as capability `C`.
    pub(crate) fn construct<C: ?Sized + 'static, A: 'static>(&self, args: &A) -> AppResult<Box<C>> {
        if self.is_abstract {
            return Err(AppError::instantiation(format!(
                "'{}' is abstract and cannot be constructed",
                self.name
            )));
        }

        let capability = CapabilityId::of::<C>();
        let cast = self
            .capabilities
            .iter()
            .find(|c| c.id == capability)
            .and_then(|c| c.cast.as_ref())
            .ok_or_else(|| {
                AppError::instantiation(format!(
                    "'{}' does not implement '{}'",
                    self.name, capability
                ))
            })?;

        let constructor = self
            .constructors
            .iter()
            .find(|c| c.args == TypeId::of::<A>())
            .ok_or_else(|| {
                AppError::instantiation(format!(
                    "'{}' has no constructor accepting {}",
                    self.name,
                    type_name::<A>()
                ))
            })?;

        let instance = (constructor.construct)(args as &dyn Any).map_err(|e| {
            AppError::instantiation(format!("Constructor of '{}' failed: {}", self.name, e))
        })?;

        cast(instance)
            .and_then(|upcast| upcast.downcast::<Box<C>>().ok())
            .map(|boxed| *boxed)
            .ok_or_else(|| {
                AppError::instantiation(format!(
                    "'{}' produced an instance that is not a '{}'",
                    self.name, capability
                ))
            })
    }
}

impl fmt::Debug for ExportedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportedType")
            .field("name", &self.name)
            .field("is_abstract", &self.is_abstract)
            .field("capabilities", &self.capabilities().collect::<Vec<_>>())
            .field(
                "constructors",
                &self.constructor_signatures().collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for a concrete exported type `T`.
pub struct TypeExport<T> {
    name: String,
    capabilities: Vec<CapabilityEntry>,
    constructors: Vec<ConstructorEntry>,
    properties: Vec<(String, PropertySetter)>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TypeExport<T> {
    /// Starts describing the type exported under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
            constructors: Vec::new(),
            properties: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Declares that `T` implements capability `C`.
    ///
    /// `cast` performs the unsizing coercion, usually `|t| Box::new(t)`.
    pub fn implements<C: ?Sized + 'static>(mut self, cast: fn(T) -> Box<C>) -> Self {
        let id = CapabilityId::of::<C>();
        let caster: Caster = Arc::new(move |instance: Box<dyn Any>| {
            instance
                .downcast::<T>()
                .ok()
                .map(|concrete| Box::new(cast(*concrete)) as Box<dyn Any>)
        });

        self.capabilities.retain(|c| c.id != id);
        self.capabilities.push(CapabilityEntry {
            id,
            cast: Some(caster),
        });
        self
    }

    /// Registers the parameterless constructor.
    pub fn constructor<F>(self, construct: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.try_constructor_with(move |_: &()| Ok::<T, Infallible>(construct()))
    }

    /// Registers a fallible parameterless constructor.
    pub fn try_constructor<F, E>(self, construct: F) -> Self
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        self.try_constructor_with(move |_: &()| construct())
    }

    /// Registers a constructor taking the argument tuple `A`.
    pub fn constructor_with<A, F>(self, construct: F) -> Self
    where
        A: 'static,
        F: Fn(&A) -> T + Send + Sync + 'static,
    {
        self.try_constructor_with(move |args: &A| Ok::<T, Infallible>(construct(args)))
    }

    /// Registers a fallible constructor taking the argument tuple `A`.
    ///
    /// A later registration for the same `A` replaces the earlier one.
    pub fn try_constructor_with<A, F, E>(mut self, construct: F) -> Self
    where
        A: 'static,
        F: Fn(&A) -> Result<T, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        let constructor: Constructor = Arc::new(move |args: &dyn Any| {
            let args = args
                .downcast_ref::<A>()
                .ok_or_else(|| format!("expected arguments of type {}", type_name::<A>()))?;
            construct(args)
                .map(|value| Box::new(value) as Box<dyn Any>)
                .map_err(|e| e.to_string())
        });

        let args = TypeId::of::<A>();
        self.constructors.retain(|c| c.args != args);
        self.constructors.push(ConstructorEntry {
            args,
            args_name: type_name::<A>(),
            construct: constructor,
        });
        self
    }

    /// Declares a settable property, typically type-level configuration
    /// such as a connection string.
    pub fn property<F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let name = name.into();
        self.properties.retain(|(n, _)| *n != name);
        self.properties.push((name, Arc::new(setter)));
        self
    }
}

impl<T: 'static> From<TypeExport<T>> for ExportedType {
    fn from(export: TypeExport<T>) -> Self {
        Self {
            name: export.name,
            is_abstract: false,
            capabilities: export.capabilities,
            constructors: export.constructors,
            properties: export.properties,
        }
    }
}

/// Builder for an abstract exported type.
///
/// Abstract types show up in implementation lookups but are never
/// instantiated.
pub struct AbstractExport {
    name: String,
    capabilities: Vec<CapabilityEntry>,
}

impl AbstractExport {
    /// Starts describing the abstract type exported under `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capabilities: Vec::new(),
        }
    }

    /// Declares that the type implements capability `C`.
    pub fn implements<C: ?Sized + 'static>(mut self) -> Self {
        let id = CapabilityId::of::<C>();
        if !self.capabilities.iter().any(|c| c.id == id) {
            self.capabilities.push(CapabilityEntry { id, cast: None });
        }
        self
    }
}

impl From<AbstractExport> for ExportedType {
    fn from(export: AbstractExport) -> Self {
        Self {
            name: export.name,
            is_abstract: true,
            capabilities: export.capabilities,
            constructors: Vec::new(),
            properties: Vec::new(),
        }
    }
}

/// Where a module came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOrigin {
    /// Built and registered directly by the host or a test.
    Registered,
    /// Linked into the host binary.
    Linked,
    /// Loaded from a shared library file.
    File(PathBuf),
}

impl fmt::Display for ModuleOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered => write!(f, "registered"),
            Self::Linked => write!(f, "linked"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Builds a [`Module`].
pub struct ModuleBuilder {
    name: String,
    types: Vec<ExportedType>,
    descriptor: Option<usize>,
}

impl ModuleBuilder {
    /// Starts a module called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
            descriptor: None,
        }
    }

    /// Adds an exported type. Declaration order is preserved and drives
    /// the tie-break of equal handler priorities.
    pub fn export(mut self, exported: impl Into<ExportedType>) -> Self {
        self.types.push(exported.into());
        self
    }

    /// Adds the module's root [`Extension`] descriptor type.
    pub fn descriptor<T, F>(mut self, type_name: impl Into<String>, construct: F) -> Self
    where
        T: Extension + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let export = TypeExport::<T>::new(type_name)
            .implements::<dyn Extension>(|extension| Box::new(extension))
            .constructor(construct);

        self.descriptor = Some(self.types.len());
        self.types.push(export.into());
        self
    }

    /// Finishes the module.
    pub fn build(self) -> Module {
        Module {
            name: Arc::from(self.name),
            types: self.types.into_iter().map(Arc::new).collect(),
            descriptor: self.descriptor,
            origin: ModuleOrigin::Registered,
            loaded_at: Utc::now(),
            anchor: None,
        }
    }
}

/// A discovered extension module. Immutable once built.
#[derive(Clone)]
pub struct Module {
    name: Arc<str>,
    types: Arc<[Arc<ExportedType>]>,
    descriptor: Option<usize>,
    origin: ModuleOrigin,
    loaded_at: DateTime<Utc>,
    anchor: Option<Anchor>,
}

impl Module {
    /// Starts building a module called `name`.
    pub fn builder(name: impl Into<String>) -> ModuleBuilder {
        ModuleBuilder::new(name)
    }

    /// Unique module name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// Exported types in declaration order.
    pub fn types(&self) -> &[Arc<ExportedType>] {
        &self.types
    }

    /// The root descriptor type, if the module declares one.
    pub fn descriptor_type(&self) -> Option<&Arc<ExportedType>> {
        self.descriptor.and_then(|index| self.types.get(index))
    }

    /// Where the module came from.
    pub fn origin(&self) -> &ModuleOrigin {
        &self.origin
    }

    /// When the module was built or loaded.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub(crate) fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    pub(crate) fn with_origin(mut self, origin: ModuleOrigin) -> Self {
        self.origin = origin;
        self
    }

    #[cfg_attr(not(feature = "dynamic"), allow(dead_code))]
    pub(crate) fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = Some(anchor);
        self
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("types", &self.types.len())
            .field("origin", &self.origin)
            .field("has_descriptor", &self.descriptor.is_some())
            .finish()
    }
}
