use crate::core::hardware::CpuFeatures;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "details", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Inconsistent(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

pub struct Diagnostics;

impl Diagnostics {
    /// Audits a flag set against the wide-register dependency rules.
    /// Reports the first violation found. Flags are never corrected here.
    pub fn check(features: &CpuFeatures) -> HealthStatus {
        // Check 1: ZMM state is a superset of YMM state
        if features.os_save_zmm && !features.os_save_ymm {
            return HealthStatus::Inconsistent("ZMM state saved without YMM state".to_string());
        }

        // Check 2: 256-bit features need YMM save
        if features.avx2 && !features.os_save_ymm {
            return HealthStatus::Inconsistent("avx2 reported without OS YMM save".to_string());
        }

        // Check 3: AVX-512 family needs ZMM save
        for (name, present) in [("avx512", features.avx512), ("avx512vnni", features.avx512vnni)] {
            if present && !features.os_save_zmm {
                return HealthStatus::Inconsistent(format!("{} reported without OS ZMM save", name));
            }
        }

        HealthStatus::Healthy
    }
}
