//! Hardware Detection Module
//! Resolves raw CPUID/XGETBV bits into the capability flags kernels dispatch on.
use serde::{Deserialize, Serialize};

use crate::core::cpuid::{
    CpuidSource, NativeCpuid, LEAF_EXTENDED_FEATURES, LEAF_FEATURES, LEAF_VENDOR,
    XCR_XFEATURE_ENABLED_MASK,
};
use crate::core::xsave::XsaveState;

// CPUID.01H:EDX
const SSE2: u32 = 1 << 26;
// CPUID.01H:ECX
const PCLMULQDQ: u32 = 1 << 1;
const SSSE3: u32 = 1 << 9;
const SSE41: u32 = 1 << 19;
const SSE42: u32 = 1 << 20;
const OSXSAVE: u32 = 1 << 27;
// CPUID.(EAX=07H,ECX=0):EBX
const BMI1: u32 = 1 << 3;
const AVX2: u32 = 1 << 5;
const AVX512F: u32 = 1 << 16;
// CPUID.(EAX=07H,ECX=0):ECX
const VPCLMULQDQ: u32 = 1 << 10;
const AVX512_VNNI: u32 = 1 << 11;

/// One immutable snapshot of what the CPU and OS jointly support.
///
/// Wide-vector flags are only ever true together with the matching OS-save
/// flag: `avx2` implies `os_save_ymm`, `avx512`/`avx512vnni` imply `os_save_zmm`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CpuFeatures {
    pub sse2: bool,
    pub ssse3: bool,
    pub sse41: bool,
    pub sse42: bool,
    pub pclmulqdq: bool,
    pub vpclmulqdq: bool,
    /// BMI1, which carries TZCNT.
    pub tzcnt: bool,
    pub avx2: bool,
    /// AVX-512 Foundation.
    pub avx512: bool,
    pub avx512vnni: bool,
    pub os_save_ymm: bool,
    pub os_save_zmm: bool,
}

impl CpuFeatures {
    /// Probe the CPU this process runs on.
    pub fn detect() -> Self {
        Self::detect_with(&NativeCpuid)
    }

    /// Run the probe against any register source.
    ///
    /// Issues leaf 0 and leaf 1, XCR0 only when OSXSAVE is set, and leaf 7.0
    /// only when the CPU reports `max_basic >= 7`. Everything not confirmed
    /// by hardware stays false.
    pub fn detect_with<S: CpuidSource + ?Sized>(cpu: &S) -> Self {
        let max_basic = cpu.cpuid(LEAF_VENDOR).eax;
        let leaf1 = cpu.cpuid(LEAF_FEATURES);

        let mut features = Self {
            sse2: leaf1.edx & SSE2 != 0,
            ssse3: leaf1.ecx & SSSE3 != 0,
            sse41: leaf1.ecx & SSE41 != 0,
            sse42: leaf1.ecx & SSE42 != 0,
            pclmulqdq: leaf1.ecx & PCLMULQDQ != 0,
            ..Self::default()
        };

        if leaf1.ecx & OSXSAVE != 0 {
            // Safe: OSXSAVE means the OS enabled CR4.OSXSAVE, so XGETBV is legal.
            let xcr0 = unsafe { cpu.xgetbv(XCR_XFEATURE_ENABLED_MASK) };
            let state = XsaveState::from_xcr0(xcr0);
            features.os_save_ymm = state.saves_ymm();
            features.os_save_zmm = state.saves_zmm();
        }

        if max_basic >= LEAF_EXTENDED_FEATURES {
            let leaf7 = cpu.cpuid_count(LEAF_EXTENDED_FEATURES, 0);

            features.tzcnt = leaf7.ebx & BMI1 != 0;
            features.vpclmulqdq = leaf7.ecx & VPCLMULQDQ != 0;
            features.avx2 = features.os_save_ymm && leaf7.ebx & AVX2 != 0;
            features.avx512 = features.os_save_zmm && leaf7.ebx & AVX512F != 0;
            features.avx512vnni = features.os_save_zmm && leaf7.ecx & AVX512_VNNI != 0;
        }

        tracing::debug!(
            max_basic,
            osxsave = leaf1.ecx & OSXSAVE != 0,
            features = ?features,
            "x86 capability probe complete"
        );

        features
    }

    /// `(name, present)` for every flag, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, bool)> {
        [
            ("sse2", self.sse2),
            ("ssse3", self.ssse3),
            ("sse4.1", self.sse41),
            ("sse4.2", self.sse42),
            ("pclmulqdq", self.pclmulqdq),
            ("vpclmulqdq", self.vpclmulqdq),
            ("tzcnt", self.tzcnt),
            ("avx2", self.avx2),
            ("avx512", self.avx512),
            ("avx512vnni", self.avx512vnni),
            ("os_save_ymm", self.os_save_ymm),
            ("os_save_zmm", self.os_save_zmm),
        ]
        .into_iter()
    }

    /// Names of the flags that are set.
    pub fn names(&self) -> Vec<&'static str> {
        self.iter()
            .filter_map(|(name, present)| present.then_some(name))
            .collect()
    }
}
