use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::core::diagnostics::{Diagnostics, HealthStatus};
use crate::core::hardware::CpuFeatures;
use crate::simd::SimdTier;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub arch: &'static str,
    pub features: CpuFeatures,
    pub best_tier: SimdTier,
    pub health: HealthStatus,
}

impl Report {
    pub fn new(features: CpuFeatures) -> Self {
        Self {
            arch: std::env::consts::ARCH,
            features,
            best_tier: SimdTier::best(&features),
            health: Diagnostics::check(&features),
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ReportError> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
