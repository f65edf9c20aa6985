use std::sync::OnceLock;

use bitflags::bitflags;
use thiserror::Error;

use crate::core::diagnostics::Diagnostics;
use crate::core::hardware::CpuFeatures;

/// Comma or whitespace separated feature names to mask off after detection.
pub const DISABLE_ENV: &str = "X86_FEATURES_DISABLE";

bitflags! {
    /// One bit per published capability flag.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeatureMask: u32 {
        const SSE2 = 1 << 0;
        const SSSE3 = 1 << 1;
        const SSE41 = 1 << 2;
        const SSE42 = 1 << 3;
        const PCLMULQDQ = 1 << 4;
        const VPCLMULQDQ = 1 << 5;
        const TZCNT = 1 << 6;
        const AVX2 = 1 << 7;
        const AVX512 = 1 << 8;
        const AVX512VNNI = 1 << 9;
        const OS_SAVE_YMM = 1 << 10;
        const OS_SAVE_ZMM = 1 << 11;
    }
}

impl FeatureMask {
    /// Looks a flag up by name, ignoring case and `.`/`_`/`-` separators,
    /// so `sse4.1`, `SSE41` and `os-save-ymm` all resolve.
    pub fn from_feature_name(name: &str) -> Option<Self> {
        let wanted = normalize(name);
        Self::all()
            .iter_names()
            .find(|(flag_name, _)| normalize(flag_name) == wanted)
            .map(|(_, flag)| flag)
    }

    /// Adds the flags that can no longer hold once `self` is cleared.
    fn with_dependents(self) -> Self {
        let mut mask = self;
        if mask.contains(Self::OS_SAVE_YMM) {
            mask |= Self::OS_SAVE_ZMM | Self::AVX2;
        }
        if mask.contains(Self::OS_SAVE_ZMM) {
            mask |= Self::AVX512 | Self::AVX512VNNI;
        }
        mask
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '.' | '_' | '-'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown feature name: {0}")]
    UnknownFeature(String),
    #[error("X86_FEATURES_DISABLE is not valid unicode")]
    NotUnicode,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub disabled: FeatureMask,
}

impl RuntimeConfig {
    /// Parse a disable list such as `"avx512, avx2"`.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let mut disabled = FeatureMask::empty();
        for name in list.split(|c: char| c == ',' || c.is_whitespace()) {
            if name.is_empty() {
                continue;
            }
            disabled |= FeatureMask::from_feature_name(name)
                .ok_or_else(|| ConfigError::UnknownFeature(name.to_string()))?;
        }
        Ok(Self { disabled })
    }

    /// Read [`DISABLE_ENV`]. Unset means nothing is disabled.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(DISABLE_ENV) {
            Ok(list) => Self::parse(&list),
            Err(std::env::VarError::NotPresent) => Ok(Self::default()),
            Err(std::env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode),
        }
    }

    /// Clear every disabled flag, plus anything that depended on it.
    pub fn apply(&self, features: CpuFeatures) -> CpuFeatures {
        let off = self.disabled.with_dependents();
        let keep = |flag: FeatureMask, present: bool| present && !off.contains(flag);

        CpuFeatures {
            sse2: keep(FeatureMask::SSE2, features.sse2),
            ssse3: keep(FeatureMask::SSSE3, features.ssse3),
            sse41: keep(FeatureMask::SSE41, features.sse41),
            sse42: keep(FeatureMask::SSE42, features.sse42),
            pclmulqdq: keep(FeatureMask::PCLMULQDQ, features.pclmulqdq),
            vpclmulqdq: keep(FeatureMask::VPCLMULQDQ, features.vpclmulqdq),
            tzcnt: keep(FeatureMask::TZCNT, features.tzcnt),
            avx2: keep(FeatureMask::AVX2, features.avx2),
            avx512: keep(FeatureMask::AVX512, features.avx512),
            avx512vnni: keep(FeatureMask::AVX512VNNI, features.avx512vnni),
            os_save_ymm: keep(FeatureMask::OS_SAVE_YMM, features.os_save_ymm),
            os_save_zmm: keep(FeatureMask::OS_SAVE_ZMM, features.os_save_zmm),
        }
    }
}

static FEATURES: OnceLock<CpuFeatures> = OnceLock::new();

/// Run capability detection and publish the result for the whole process.
///
/// Only the first call probes; later calls return the same snapshot.
/// Concurrent first callers block until the snapshot is complete.
pub fn init() -> &'static CpuFeatures {
    FEATURES.get_or_init(|| {
        let config = RuntimeConfig::from_env().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring {}", DISABLE_ENV);
            RuntimeConfig::default()
        });
        let features = config.apply(CpuFeatures::detect());
        debug_assert!(Diagnostics::check(&features).is_healthy());

        tracing::info!(
            features = ?features.names(),
            disabled = ?config.disabled,
            "published x86 capabilities"
        );
        features
    })
}

/// The published snapshot, detecting on first use.
#[inline]
pub fn get() -> &'static CpuFeatures {
    match FEATURES.get() {
        Some(features) => features,
        None => init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let first = init();
        let second = init();
        assert!(std::ptr::eq(first, second));
        assert!(std::ptr::eq(first, get()));
    }

    #[test]
    fn test_concurrent_readers_see_one_snapshot() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| get() as *const CpuFeatures as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_parse_names() {
        let config = RuntimeConfig::parse("AVX512, sse4.1 os-save-ymm,,").unwrap();
        assert_eq!(
            config.disabled,
            FeatureMask::AVX512 | FeatureMask::SSE41 | FeatureMask::OS_SAVE_YMM
        );
        assert_eq!(RuntimeConfig::parse("").unwrap(), RuntimeConfig::default());
        assert_eq!(
            RuntimeConfig::parse("avx2,neon"),
            Err(ConfigError::UnknownFeature("neon".to_string()))
        );
    }

    #[test]
    fn test_apply_only_clears() {
        let full = CpuFeatures {
            sse2: true,
            sse42: true,
            avx2: true,
            avx512: true,
            os_save_ymm: true,
            os_save_zmm: true,
            ..Default::default()
        };

        let config = RuntimeConfig::parse("avx512").unwrap();
        let masked = config.apply(full);
        assert!(!masked.avx512);
        assert!(masked.avx2 && masked.os_save_zmm && masked.sse42);

        // Nothing appears that was not detected.
        let config = RuntimeConfig::parse("").unwrap();
        assert_eq!(config.apply(CpuFeatures::default()), CpuFeatures::default());
    }

    #[test]
    fn test_disabling_os_state_cascades() {
        let full = CpuFeatures {
            avx2: true,
            avx512: true,
            avx512vnni: true,
            os_save_ymm: true,
            os_save_zmm: true,
            tzcnt: true,
            ..Default::default()
        };

        let no_ymm = RuntimeConfig::parse("os_save_ymm").unwrap().apply(full);
        assert_eq!(no_ymm, CpuFeatures { tzcnt: true, ..Default::default() });
        assert!(Diagnostics::check(&no_ymm).is_healthy());

        let no_zmm = RuntimeConfig::parse("os_save_zmm").unwrap().apply(full);
        assert!(no_zmm.avx2 && no_zmm.os_save_ymm);
        assert!(!no_zmm.avx512 && !no_zmm.avx512vnni);
        assert!(Diagnostics::check(&no_zmm).is_healthy());
    }
}
