pub mod cpuid;
pub mod diagnostics;
pub mod hardware;
pub mod report;
pub mod runtime;
pub mod xsave;
