//! Instance construction.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::warn;

use extcore_core::error::AppError;
use extcore_core::result::AppResult;

use crate::manager::ExtensionManager;
use crate::resolver::{Implementation, ResolveOptions};

/// How construction failures are handled when several types are
/// instantiated at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstantiationPolicy {
    /// The first failure aborts the whole operation.
    Strict,
    /// Failures are logged and the type is skipped.
    #[default]
    Lenient,
}

impl InstantiationPolicy {
    /// Applies the policy to a failure raised while handling `implementation`.
    pub(crate) fn recover(
        self,
        implementation: &Implementation,
        error: AppError,
        stage: &str,
    ) -> AppResult<()> {
        match self {
            Self::Strict => Err(error),
            Self::Lenient => {
                warn!(
                    module = %implementation.module(),
                    type_name = %implementation.type_name(),
                    stage = stage,
                    error = %error,
                    "Skipping failed implementation"
                );
                Ok(())
            }
        }
    }
}

/// A live instance of an implementation, viewed as capability `C`.
///
/// The instance keeps its implementation (and with it the code of a
/// dynamically loaded module) alive.
pub struct Instance<C: ?Sized> {
    value: Box<C>,
    implementation: Implementation,
}

impl<C: ?Sized> Instance<C> {
    /// The implementation the instance was created from.
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Fully-qualified name of the instance's type.
    pub fn type_name(&self) -> &str {
        self.implementation.type_name()
    }

    /// Name of the module that exported the instance's type.
    pub fn module(&self) -> &str {
        self.implementation.module()
    }

    /// Unwraps the instance. The caller becomes responsible for not
    /// outliving the module that exported the type.
    pub fn into_box(self) -> Box<C> {
        self.value
    }
}

impl<C: ?Sized> Deref for Instance<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.value
    }
}

impl<C: ?Sized> DerefMut for Instance<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.value
    }
}

impl<C: ?Sized> fmt::Debug for Instance<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("module", &self.module())
            .field("type_name", &self.type_name())
            .finish()
    }
}

impl Implementation {
    /// Constructs the type with its parameterless constructor.
    pub fn instantiate<C: ?Sized + 'static>(&self) -> AppResult<Instance<C>> {
        self.instantiate_with::<C, ()>(&())
    }

    /// Constructs the type with the constructor accepting `A`.
    pub fn instantiate_with<C: ?Sized + 'static, A: 'static>(
        &self,
        args: &A,
    ) -> AppResult<Instance<C>> {
        let value = self.exported_type().construct::<C, A>(args)?;
        Ok(Instance {
            value,
            implementation: self.clone(),
        })
    }
}

impl ExtensionManager {
    /// One instance of every concrete type implementing `C`.
    pub fn create_instances<C: ?Sized + 'static>(
        &self,
        options: &ResolveOptions,
        policy: InstantiationPolicy,
    ) -> AppResult<Vec<Instance<C>>> {
        self.create_instances_with::<C, ()>(options, policy, &())
    }

    /// One instance of every concrete type implementing `C`, each built by
    /// its constructor accepting `A`.
    ///
    /// Abstract types are never instantiated.
    pub fn create_instances_with<C: ?Sized + 'static, A: 'static>(
        &self,
        options: &ResolveOptions,
        policy: InstantiationPolicy,
        args: &A,
    ) -> AppResult<Vec<Instance<C>>> {
        let implementations = self.find_implementations::<C>(options);
        let mut instances = Vec::with_capacity(implementations.len());

        for implementation in implementations.iter().filter(|i| !i.is_abstract()) {
            match implementation.instantiate_with::<C, A>(args) {
                Ok(instance) => instances.push(instance),
                Err(e) => policy.recover(implementation, e, "instantiate")?,
            }
        }

        Ok(instances)
    }

    /// An instance of the first concrete type implementing `C`.
    ///
    /// `Ok(None)` when no concrete type exists; a construction failure is
    /// returned as an error.
    pub fn create_instance<C: ?Sized + 'static>(
        &self,
        options: &ResolveOptions,
    ) -> AppResult<Option<Instance<C>>> {
        self.create_instance_with::<C, ()>(options, &())
    }

    /// Like [`create_instance`](Self::create_instance), using the constructor
    /// accepting `A`.
    pub fn create_instance_with<C: ?Sized + 'static, A: 'static>(
        &self,
        options: &ResolveOptions,
        args: &A,
    ) -> AppResult<Option<Instance<C>>> {
        self.find_implementations::<C>(options)
            .iter()
            .find(|i| !i.is_abstract())
            .map(|implementation| implementation.instantiate_with::<C, A>(args))
            .transpose()
    }
}
