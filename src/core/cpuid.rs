//! Hardware Query Layer
//! Thin wrappers over the CPUID and XGETBV instructions.

#[cfg(target_arch = "x86")]
use std::arch::x86 as arch;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64 as arch;

/// Basic leaf 0: highest supported basic leaf in EAX.
pub const LEAF_VENDOR: u32 = 0;
/// Basic leaf 1: processor info and feature bits.
pub const LEAF_FEATURES: u32 = 1;
/// Structured extended feature flags (sub-leaf 0).
pub const LEAF_EXTENDED_FEATURES: u32 = 7;
/// XCR0, the OS-enabled XSAVE state components.
pub const XCR_XFEATURE_ENABLED_MASK: u32 = 0;

/// The four registers returned by one CPUID invocation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawRegisters {
    pub eax: u32,
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
}

impl RawRegisters {
    pub const fn new(eax: u32, ebx: u32, ecx: u32, edx: u32) -> Self {
        Self { eax, ebx, ecx, edx }
    }
}

impl From<arch::CpuidResult> for RawRegisters {
    fn from(r: arch::CpuidResult) -> Self {
        Self::new(r.eax, r.ebx, r.ecx, r.edx)
    }
}

/// Anything that can answer CPUID / XGETBV queries.
///
/// Unsupported leaves are not errors: the hardware returns leaf-specific
/// content (usually zeros) and the resolver reads that as "feature absent".
pub trait CpuidSource {
    fn cpuid(&self, leaf: u32) -> RawRegisters;

    fn cpuid_count(&self, leaf: u32, subleaf: u32) -> RawRegisters;

    /// Read extended control register `index`.
    ///
    /// # Safety
    /// The caller must have seen CPUID.1:ECX.OSXSAVE set. Without it the
    /// instruction raises #UD.
    unsafe fn xgetbv(&self, index: u32) -> u64;
}

/// The CPU this process is running on.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeCpuid;

impl CpuidSource for NativeCpuid {
    #[inline]
    #[allow(unused_unsafe)]
    fn cpuid(&self, leaf: u32) -> RawRegisters {
        unsafe { arch::__cpuid(leaf) }.into()
    }

    #[inline]
    #[allow(unused_unsafe)]
    fn cpuid_count(&self, leaf: u32, subleaf: u32) -> RawRegisters {
        unsafe { arch::__cpuid_count(leaf, subleaf) }.into()
    }

    #[inline]
    unsafe fn xgetbv(&self, index: u32) -> u64 {
        read_xcr(index)
    }
}

#[target_feature(enable = "xsave")]
unsafe fn read_xcr(index: u32) -> u64 {
    unsafe { arch::_xgetbv(index) }
}
