//! Module export macros.

/// Submits a module linked into the host binary.
///
/// `$register` is a `fn() -> Module` building the module.
///
/// # Example
/// ```rust,ignore
/// fn register() -> Module {
///     Module::builder("extcore-data").build()
/// }
///
/// link_module!("extcore-data", register);
/// ```
#[macro_export]
macro_rules! link_module {
    ($name:expr, $register:path) => {
        $crate::inventory::submit! {
            $crate::loader::LinkedModule::new($name, $register)
        }
    };
}

/// Generates the entry symbols of a module shared library.
///
/// The crate must be built as a `cdylib`. `$register` is a
/// `fn() -> Module` building the module.
///
/// # Example
/// ```rust,ignore
/// fn register() -> Module {
///     Module::builder("extension-a")
///         .descriptor("extension_a::ExtensionA", || ExtensionA)
///         .build()
/// }
///
/// export_module!(register);
/// ```
#[macro_export]
macro_rules! export_module {
    ($register:path) => {
        #[unsafe(no_mangle)]
        pub extern "C" fn extcore_abi_version() -> u32 {
            $crate::loader::dynamic::ABI_VERSION
        }

        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn extcore_module_entry() -> *mut $crate::module::Module {
            ::std::boxed::Box::into_raw(::std::boxed::Box::new($register()))
        }
    };
}
