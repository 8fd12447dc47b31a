//! FFI descriptor exported by extension libraries.
//!
//! Every dynamic extension (.so/.dylib/.dll) exports one symbol, named by
//! [`DESCRIPTOR_SYMBOL`], pointing at an [`ExtensionDescriptor`]. The host
//! checks the ABI version, then calls the descriptor's registration
//! function with an [`ExtensionRegistrar`] the extension fills in.
//!
//! Trait objects cross the library boundary here, so host and extension
//! must be built with the same Rust toolchain; the ABI version guards
//! against drift in this crate's own types, not against compiler changes.
//! The [`declare_extension!`](crate::declare_extension) macro emits all of
//! this boilerplate.

use crate::types::Extension;

/// Current extension ABI version.
///
/// Bumped whenever the descriptor layout, the [`Extension`] trait, or the
/// command types change incompatibly. Artifacts declaring a different
/// version are refused.
pub const CASEFLOW_EXT_ABI_VERSION: u32 = 1;

/// Symbol name under which extension libraries export their descriptor.
pub const DESCRIPTOR_SYMBOL: &[u8] = b"caseflow_extension_descriptor";

/// Registration function exported through the descriptor.
pub type RegisterFn = unsafe extern "C" fn(registrar: *mut ExtensionRegistrar);

/// Descriptor exported by every extension library.
#[repr(C)]
pub struct ExtensionDescriptor {
    /// Must equal [`CASEFLOW_EXT_ABI_VERSION`].
    pub abi_version: u32,

    /// Semver requirement on the host version (e.g. `"^0.4"`, `"*"`).
    pub host_requirement: *const u8,
    pub host_requirement_len: usize,

    /// Called by the host to collect the extension instances.
    pub register: RegisterFn,
}

// The raw pointers reference 'static string data baked into the artifact.
unsafe impl Sync for ExtensionDescriptor {}

impl ExtensionDescriptor {
    /// The host version requirement as a string slice.
    ///
    /// Returns `None` when the field is null, empty, or not UTF-8.
    pub fn host_requirement(&self) -> Option<&str> {
        if self.host_requirement.is_null() || self.host_requirement_len == 0 {
            return None;
        }
        // SAFETY: the descriptor is produced by declare_extension!, which
        // points these fields at a NUL-terminated string literal.
        let bytes =
            unsafe { std::slice::from_raw_parts(self.host_requirement, self.host_requirement_len) };
        std::str::from_utf8(bytes).ok()
    }
}

/// Collects the extension instances a library registers.
///
/// The host constructs one registrar per load and passes it to the
/// descriptor's registration function. Registering more than one instance
/// is allowed; the host keeps the first and warns about the rest.
#[derive(Default)]
pub struct ExtensionRegistrar {
    extensions: Vec<Box<dyn Extension>>,
}

impl ExtensionRegistrar {
    /// Create an empty registrar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an extension instance.
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        self.extensions.push(extension);
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Consume the registrar, yielding the instances in registration order.
    pub fn into_extensions(self) -> Vec<Box<dyn Extension>> {
        self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandNode;

    struct Probe;

    impl Extension for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn version(&self) -> &str {
            "1.0.0"
        }

        fn command(&self) -> CommandNode {
            CommandNode::leaf("probe", |_| Ok(()))
        }
    }

    unsafe extern "C" fn register_probe(registrar: *mut ExtensionRegistrar) {
        let registrar = unsafe { &mut *registrar };
        registrar.register(Box::new(Probe));
    }

    #[test]
    fn test_registrar_collects_in_order() {
        let mut registrar = ExtensionRegistrar::new();
        assert!(registrar.is_empty());

        registrar.register(Box::new(Probe));
        registrar.register(Box::new(Probe));
        assert_eq!(registrar.len(), 2);

        let extensions = registrar.into_extensions();
        assert_eq!(extensions.len(), 2);
        assert_eq!(extensions[0].name(), "probe");
    }

    #[test]
    fn test_descriptor_host_requirement() {
        let descriptor = ExtensionDescriptor {
            abi_version: CASEFLOW_EXT_ABI_VERSION,
            host_requirement: "^0.4\0".as_ptr(),
            host_requirement_len: 4,
            register: register_probe,
        };

        assert_eq!(descriptor.host_requirement(), Some("^0.4"));
        assert_eq!(descriptor.abi_version, 1);
    }

    #[test]
    fn test_descriptor_null_requirement() {
        let descriptor = ExtensionDescriptor {
            abi_version: CASEFLOW_EXT_ABI_VERSION,
            host_requirement: std::ptr::null(),
            host_requirement_len: 0,
            register: register_probe,
        };

        assert_eq!(descriptor.host_requirement(), None);
    }

    #[test]
    fn test_register_through_descriptor() {
        let descriptor = ExtensionDescriptor {
            abi_version: CASEFLOW_EXT_ABI_VERSION,
            host_requirement: std::ptr::null(),
            host_requirement_len: 0,
            register: register_probe,
        };

        let mut registrar = ExtensionRegistrar::new();
        unsafe { (descriptor.register)(&mut registrar) };
        assert_eq!(registrar.len(), 1);
    }
}
