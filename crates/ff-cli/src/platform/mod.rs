//! Desktop samplers for the current platform.

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "linux")]
pub use linux::X11Sampler as NativeSampler;

use std::sync::Arc;

use ff_core::SamplerError;

/// Opens the platform sampler once for both focus and idle queries.
pub fn connect() -> Result<Arc<NativeSampler>, SamplerError> {
    NativeSampler::connect().map(Arc::new)
}

// Stub for other platforms: never sees a window, never goes idle.
#[cfg(not(target_os = "linux"))]
#[derive(Debug)]
pub struct NativeSampler;

#[cfg(not(target_os = "linux"))]
impl NativeSampler {
    pub fn connect() -> Result<Self, SamplerError> {
        tracing::warn!("no desktop sampler for this platform, reports will not be sent");
        Ok(Self)
    }
}

#[cfg(not(target_os = "linux"))]
impl ff_core::FocusSampler for NativeSampler {
    fn active_window(&self) -> Result<Option<ff_core::ActiveWindow>, SamplerError> {
        Ok(None)
    }
}

#[cfg(not(target_os = "linux"))]
impl ff_core::IdleSampler for NativeSampler {
    fn idle_seconds(&self) -> Result<u64, SamplerError> {
        Ok(0)
    }
}
