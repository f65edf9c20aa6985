//! Kernel tier selection on top of the published capability flags.
use serde::Serialize;

use crate::core::hardware::CpuFeatures;
use crate::core::runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SimdTier {
    Scalar,
    Sse2,
    Ssse3,
    Sse41,
    Sse42,
    Avx2,
    Avx512,
}

impl SimdTier {
    pub const ALL: [SimdTier; 7] = [
        SimdTier::Scalar,
        SimdTier::Sse2,
        SimdTier::Ssse3,
        SimdTier::Sse41,
        SimdTier::Sse42,
        SimdTier::Avx2,
        SimdTier::Avx512,
    ];

    pub fn is_supported(self, features: &CpuFeatures) -> bool {
        match self {
            SimdTier::Scalar => true,
            SimdTier::Sse2 => features.sse2,
            SimdTier::Ssse3 => features.ssse3,
            SimdTier::Sse41 => features.sse41,
            SimdTier::Sse42 => features.sse42,
            SimdTier::Avx2 => features.avx2,
            SimdTier::Avx512 => features.avx512,
        }
    }

    /// Highest tier the flag set allows.
    pub fn best(features: &CpuFeatures) -> Self {
        Self::ALL
            .into_iter()
            .rev()
            .find(|tier| tier.is_supported(features))
            .unwrap_or(SimdTier::Scalar)
    }
}

/// A family of functionally equivalent kernels, one per tier.
///
/// ```
/// use x86_features::simd::{Dispatch, SimdTier};
///
/// fn sum_scalar(v: &[u32]) -> u32 { v.iter().sum() }
/// fn sum_wide(v: &[u32]) -> u32 { v.iter().sum() }
///
/// let sum = Dispatch::new(sum_scalar as fn(&[u32]) -> u32)
///     .with(SimdTier::Avx2, sum_wide)
///     .native();
/// assert_eq!(sum(&[1, 2, 3]), 6);
/// ```
#[derive(Debug, Clone)]
pub struct Dispatch<F> {
    scalar: F,
    candidates: Vec<(SimdTier, F)>,
}

impl<F: Copy> Dispatch<F> {
    pub fn new(scalar: F) -> Self {
        Self {
            scalar,
            candidates: Vec::new(),
        }
    }

    /// Register `kernel` for `tier`, replacing an earlier one for the same tier.
    pub fn with(mut self, tier: SimdTier, kernel: F) -> Self {
        self.candidates.retain(|(t, _)| *t != tier);
        self.candidates.push((tier, kernel));
        self.candidates.sort_by_key(|(t, _)| *t);
        self
    }

    /// Pick the highest registered tier `features` allows, else the scalar kernel.
    pub fn select(&self, features: &CpuFeatures) -> F {
        self.select_tier(features).1
    }

    pub fn select_tier(&self, features: &CpuFeatures) -> (SimdTier, F) {
        self.candidates
            .iter()
            .rev()
            .find(|(tier, _)| tier.is_supported(features))
            .copied()
            .unwrap_or((SimdTier::Scalar, self.scalar))
    }

    /// Select against the process-wide snapshot.
    pub fn native(&self) -> F {
        self.select(runtime::get())
    }
}
