//! Method attribute flags.
//!
//! # Key Types
//! - [`MethodAttributes`]: Access, vtable layout and modifier flags
//! - [`MethodImplAttributes`]: Implementation flags

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Method attribute flags (ECMA-335 `MethodAttributes`).
    ///
    /// The low three bits are an access enumeration; compare [`MethodAttributes::access`]
    /// rather than testing them with `contains`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MethodAttributes: u16 {
        /// Mask for the access enumeration
        const MEMBER_ACCESS_MASK = 0x0007;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessibly by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessibly by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessibly by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method always gets a new slot in the vtable
        const NEW_SLOT = 0x0100;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// Implementation is forwarded through `PInvoke`
        const PINVOKE_IMPL = 0x2000;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RT_SPECIAL_NAME = 0x1000;
    }
}

impl MethodAttributes {
    /// Extract the access enumeration
    #[must_use]
    pub fn access(self) -> MethodAttributes {
        self & MethodAttributes::MEMBER_ACCESS_MASK
    }

    /// True if the access is public
    #[must_use]
    pub fn is_public(self) -> bool {
        self.access() == MethodAttributes::PUBLIC
    }

    /// Returns the flags with the access enumeration replaced by `access`
    #[must_use]
    pub fn with_access(self, access: MethodAttributes) -> MethodAttributes {
        (self - MethodAttributes::MEMBER_ACCESS_MASK) | access.access()
    }

    /// True for instance methods
    #[must_use]
    pub fn has_this(self) -> bool {
        !self.contains(MethodAttributes::STATIC)
    }

    /// True if the method occupies a vtable slot
    #[must_use]
    pub fn is_virtual(self) -> bool {
        self.contains(MethodAttributes::VIRTUAL)
    }
}

bitflags! {
    /// Method implementation flags (ECMA-335 `MethodImplAttributes`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct MethodImplAttributes: u16 {
        /// Method impl is native
        const NATIVE = 0x0001;
        /// Method impl is provided by the runtime
        const RUNTIME = 0x0003;
        /// Method impl is unmanaged, otherwise managed
        const UNMANAGED = 0x0004;
        /// Method cannot be inlined
        const NO_INLINING = 0x0008;
        /// Method is a synchronized method
        const SYNCHRONIZED = 0x0020;
        /// Method signature is not mangled for `PInvoke`
        const PRESERVE_SIG = 0x0080;
        /// Method is implemented inside the runtime
        const INTERNAL_CALL = 0x1000;
    }
}
