//! Modules linked into the host binary.

use std::hint::black_box;

use crate::module::{Module, ModuleOrigin};

/// Registration of a module compiled into the host.
///
/// Crates submit one with [`link_module!`](crate::link_module); the host
/// collects every submission at discovery time.
pub struct LinkedModule {
    name: &'static str,
    register: fn() -> Module,
}

impl LinkedModule {
    /// Creates the registration of the module `name`.
    pub const fn new(name: &'static str, register: fn() -> Module) -> Self {
        Self { name, register }
    }

    /// Module name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Builds the module.
    pub fn register(&self) -> Module {
        (self.register)().with_origin(ModuleOrigin::Linked)
    }

    /// Every linked module, sorted by name.
    pub fn all() -> Vec<&'static LinkedModule> {
        let mut linked: Vec<&'static LinkedModule> =
            inventory::iter::<LinkedModule>.into_iter().collect();
        linked.sort_by_key(|module| module.name);
        linked
    }

    /// Every linked module, keeping the crates behind `registers` in the
    /// final link.
    ///
    /// A crate the binary never references is dropped by the linker along
    /// with its submission, so host binaries name the register function of
    /// each extension crate they ship.
    pub fn retaining(registers: &[fn() -> Module]) -> Vec<&'static LinkedModule> {
        black_box(registers);
        Self::all()
    }
}

impl std::fmt::Debug for LinkedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LinkedModule").field(&self.name).finish()
    }
}

inventory::collect!(LinkedModule);
