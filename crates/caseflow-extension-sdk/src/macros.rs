//! Declarative macro for exporting an extension from a `cdylib`.

/// Export one or more extension constructors from an extension library.
///
/// Emits the descriptor static the host looks for, plus the registration
/// function that instantiates each listed constructor. Use it once per
/// library, at crate root.
///
/// # Example
///
/// ```rust
/// use caseflow_extension_sdk::prelude::*;
///
/// #[derive(Default)]
/// struct HelloExtension;
///
/// impl Extension for HelloExtension {
///     fn name(&self) -> &str {
///         "hello"
///     }
///
///     fn version(&self) -> &str {
///         "1.0.0"
///     }
///
///     fn command(&self) -> CommandNode {
///         CommandNode::leaf("hello", |_| Ok(()))
///     }
/// }
///
/// declare_extension!(HelloExtension::default);
/// ```
///
/// A host version requirement can be declared up front:
///
/// ```rust,ignore
/// declare_extension!(host: "^0.4", HelloExtension::default);
/// ```
///
/// Listing several constructors registers several instances; the host
/// keeps the first and warns about the rest, so a library should normally
/// export exactly one.
#[macro_export]
macro_rules! declare_extension {
    ($($constructor:expr),+ $(,)?) => {
        $crate::declare_extension!(host: "*", $($constructor),+);
    };
    (host: $requirement:expr, $($constructor:expr),+ $(,)?) => {
        #[doc(hidden)]
        #[no_mangle]
        pub static caseflow_extension_descriptor: $crate::ExtensionDescriptor =
            $crate::ExtensionDescriptor {
                abi_version: $crate::CASEFLOW_EXT_ABI_VERSION,
                host_requirement: concat!($requirement, "\0").as_ptr(),
                host_requirement_len: concat!($requirement, "\0").len() - 1,
                register: __caseflow_extension_register,
            };

        #[doc(hidden)]
        unsafe extern "C" fn __caseflow_extension_register(
            registrar: *mut $crate::ExtensionRegistrar,
        ) {
            // SAFETY: the host passes a valid, exclusive registrar pointer
            // for the duration of this call.
            let registrar = unsafe { &mut *registrar };
            $(
                registrar.register(Box::new(($constructor)()));
            )+
        }
    };
}
