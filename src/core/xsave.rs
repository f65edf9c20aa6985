use bitflags::bitflags;

bitflags! {
    /// XCR0 state components the OS has enabled for XSAVE.
    /// Intel SDM Vol. 1, 13.1 "XSAVE-Supported Features and State-Component Bitmaps".
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct XsaveState: u64 {
        /// x87 FPU state (bit 0).
        const X87 = 1 << 0;
        /// XMM registers (bit 1).
        const SSE = 1 << 1;
        /// Upper halves of YMM0-15 (bit 2).
        const AVX = 1 << 2;
        /// AVX-512 opmask registers k0-k7 (bit 5).
        const OPMASK = 1 << 5;
        /// Upper 256 bits of ZMM0-15 (bit 6).
        const ZMM_HI256 = 1 << 6;
        /// ZMM16-31 (bit 7).
        const HI16_ZMM = 1 << 7;

        const _ = !0;
    }
}

/// Components that must all be enabled before 256-bit code is safe (0x06).
pub const YMM_STATE: XsaveState = XsaveState::SSE.union(XsaveState::AVX);

/// Components that must all be enabled before 512-bit code is safe (0xe6).
pub const ZMM_STATE: XsaveState = YMM_STATE
    .union(XsaveState::OPMASK)
    .union(XsaveState::ZMM_HI256)
    .union(XsaveState::HI16_ZMM);

impl XsaveState {
    pub const fn from_xcr0(xcr0: u64) -> Self {
        Self::from_bits_retain(xcr0)
    }

    pub const fn saves_ymm(self) -> bool {
        self.contains(YMM_STATE)
    }

    pub const fn saves_zmm(self) -> bool {
        self.contains(ZMM_STATE)
    }
}
