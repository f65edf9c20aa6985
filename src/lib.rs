//! Once-per-process x86 capability detection for SIMD kernel dispatch.
//!
//! ```no_run
//! let features = x86_features::init();
//! if features.avx2 {
//!     // 256-bit path
//! }
//! ```

#[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
compile_error!("x86_features only supports x86 and x86_64 targets");

pub mod core;
pub mod simd;

pub use crate::core::hardware::CpuFeatures;
pub use crate::core::runtime::{get, init};
